//! Address and name index traits.

use crate::StoreError;
use vreg_types::Address;

/// The append-only list of verifier ids in registration order.
pub trait AddressIndexStore {
    /// The id registered at position `index`.
    fn address_at(&self, index: u64) -> Result<Option<Address>, StoreError>;

    /// Number of ids in the index.
    fn address_count(&self) -> Result<u64, StoreError>;
}

/// The set of normalized names currently in use.
pub trait NameIndexStore {
    fn is_name_taken(&self, normalized: &str) -> Result<bool, StoreError>;
}
