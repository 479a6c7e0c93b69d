//! Storage ownership.
//!
//! A store has at most one owner, the only identity allowed to write. The
//! owner is claimed once with [`OwnerStore::init_storage_owner`] and can only
//! change afterwards through [`OwnerStore::transfer_storage_owner`], called by
//! the current owner. This is how a replacement logic instance takes over an
//! existing store.

use crate::StoreError;
use vreg_types::Address;

pub trait OwnerStore {
    /// The current owner, `None` before initialization.
    fn storage_owner(&self) -> Result<Option<Address>, StoreError>;

    /// Claim an unowned store.
    ///
    /// Fails with [`StoreError::AlreadyInitialized`] if an owner is set and
    /// [`StoreError::InvalidOwner`] if `new_owner` is the zero address.
    fn init_storage_owner(&self, new_owner: &Address) -> Result<(), StoreError>;

    /// Hand the write capability to `new_owner`. Only the current owner may
    /// call this.
    fn transfer_storage_owner(&self, caller: &Address, new_owner: &Address) -> Result<(), StoreError>;
}

/// Shared owner check for backends.
pub fn ensure_owner(owner: Option<&Address>, caller: &Address) -> Result<(), StoreError> {
    match owner {
        Some(owner) if owner == caller => Ok(()),
        _ => Err(StoreError::AccessDenied(caller.to_string())),
    }
}
