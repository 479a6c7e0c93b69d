//! Deployment and upgrade wiring.
//!
//! A logic instance is only ever built against a store it owns. `deploy`
//! claims an unowned store; `attach` takes over a store whose previous logic
//! already called [`RegistryLogic::hand_off_storage`].

use std::sync::Arc;

use tracing::info;

use vreg_directory::ContractLocator;
use vreg_store::RegistryStore;
use vreg_types::Address;

use crate::event::{EventBus, RegistryEvent};
use crate::{RegistryError, RegistryLogic};

pub struct RegistryBuilder {
    address: Address,
    owner: Address,
    locator: Arc<dyn ContractLocator>,
    events: EventBus,
}

impl RegistryBuilder {
    /// `address` is the identity the logic writes to storage as; `owner` is
    /// the registry administrator.
    pub fn new(address: Address, owner: Address, locator: Arc<dyn ContractLocator>) -> Self {
        Self {
            address,
            owner,
            locator,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(mut self, listener: Box<dyn Fn(&RegistryEvent) + Send + Sync>) -> Self {
        self.events.subscribe(listener);
        self
    }

    /// Claim a fresh store and build the logic over it.
    pub fn deploy<S: RegistryStore>(self, store: Arc<S>) -> Result<RegistryLogic<S>, RegistryError> {
        self.validate()?;
        store.init_storage_owner(&self.address)?;
        info!(logic = %self.address, owner = %self.owner, "registry deployed");
        Ok(self.finish(store))
    }

    /// Build the logic over a store this address already owns.
    pub fn attach<S: RegistryStore>(self, store: Arc<S>) -> Result<RegistryLogic<S>, RegistryError> {
        self.validate()?;
        if store.storage_owner()? != Some(self.address) {
            return Err(RegistryError::AccessDenied(self.address.to_string()));
        }
        info!(logic = %self.address, owner = %self.owner, "registry attached to existing store");
        Ok(self.finish(store))
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.address.is_zero() || self.owner.is_zero() {
            return Err(RegistryError::InvalidOwner);
        }
        Ok(())
    }

    fn finish<S: RegistryStore>(self, store: Arc<S>) -> RegistryLogic<S> {
        RegistryLogic::from_parts(self.address, self.owner, store, self.locator, self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vreg_directory::ContractDirectory;
    use vreg_nullables::NullRegistryStore;
    use vreg_store::OwnerStore;

    fn builder(logic: u8) -> RegistryBuilder {
        RegistryBuilder::new(
            Address::repeat_byte(logic),
            Address::repeat_byte(0xad),
            Arc::new(ContractDirectory::new()),
        )
    }

    #[test]
    fn deploy_claims_storage() {
        let store = Arc::new(NullRegistryStore::default());
        let reg = builder(1).deploy(Arc::clone(&store)).unwrap();
        assert_eq!(store.storage_owner().unwrap(), Some(reg.address()));
    }

    #[test]
    fn second_deploy_on_same_store_fails() {
        let store = Arc::new(NullRegistryStore::default());
        builder(1).deploy(Arc::clone(&store)).unwrap();
        let err = builder(2).deploy(Arc::clone(&store)).err().unwrap();
        assert!(matches!(err, RegistryError::AlreadyInitialized));
        assert_eq!(store.storage_owner().unwrap(), Some(Address::repeat_byte(1)));
    }

    #[test]
    fn attach_requires_ownership() {
        let store = Arc::new(NullRegistryStore::default());
        builder(1).deploy(Arc::clone(&store)).unwrap();
        let err = builder(2).attach(Arc::clone(&store)).err().unwrap();
        assert!(matches!(err, RegistryError::AccessDenied(_)));
    }

    #[test]
    fn zero_identities_are_rejected() {
        let store = Arc::new(NullRegistryStore::default());
        let err = RegistryBuilder::new(
            Address::ZERO,
            Address::repeat_byte(0xad),
            Arc::new(ContractDirectory::new()),
        )
        .deploy(Arc::clone(&store))
        .err()
        .unwrap();
        assert!(matches!(err, RegistryError::InvalidOwner));
        assert_eq!(store.storage_owner().unwrap(), None);
    }
}
