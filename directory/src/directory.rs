//! The directory itself and the lookup seam.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::info;

use vreg_types::Address;

use crate::DirectoryError;

/// A component that can be bound in the directory.
pub trait Contract {
    fn address(&self) -> Address;

    /// The name this component registers under.
    fn contract_name(&self) -> &str;
}

/// Name resolution, injected into components that authorize by name.
pub trait ContractLocator: Send + Sync {
    /// The address bound to `name`, or [`Address::ZERO`] when unbound.
    fn contract_by_name(&self, name: &str) -> Address;
}

/// A name → address directory with self-registration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContractDirectory {
    entries: BTreeMap<String, Address>,
}

impl ContractDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `contract` under the name it reports.
    ///
    /// Re-adding the same binding is a no-op. Fails with
    /// [`DirectoryError::NameCollision`] if the name is bound elsewhere.
    pub fn add(&mut self, contract: &dyn Contract) -> Result<(), DirectoryError> {
        let name = contract.contract_name();
        let address = contract.address();
        if address.is_zero() {
            return Err(DirectoryError::InvalidAddress(name.to_string()));
        }
        match self.entries.get(name) {
            Some(bound) if *bound == address => Ok(()),
            Some(bound) => Err(DirectoryError::NameCollision {
                name: name.to_string(),
                bound: bound.to_string(),
            }),
            None => {
                self.entries.insert(name.to_string(), address);
                info!(contract = name, %address, "contract registered");
                Ok(())
            }
        }
    }

    /// Rebind an existing name to `contract`'s address.
    pub fn update(&mut self, contract: &dyn Contract) -> Result<(), DirectoryError> {
        let name = contract.contract_name();
        let address = contract.address();
        if address.is_zero() {
            return Err(DirectoryError::InvalidAddress(name.to_string()));
        }
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))?;
        let previous = std::mem::replace(entry, address);
        info!(contract = name, from = %previous, to = %address, "contract rebound");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Address> {
        self.entries.get(name).copied()
    }

    pub fn contract_by_name(&self, name: &str) -> Address {
        self.get(name).unwrap_or(Address::ZERO)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContractLocator for ContractDirectory {
    fn contract_by_name(&self, name: &str) -> Address {
        ContractDirectory::contract_by_name(self, name)
    }
}

impl ContractLocator for RwLock<ContractDirectory> {
    fn contract_by_name(&self, name: &str) -> Address {
        match self.read() {
            Ok(directory) => directory.contract_by_name(name),
            Err(poisoned) => poisoned.into_inner().contract_by_name(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, Address);

    impl Contract for Named {
        fn address(&self) -> Address {
            self.1
        }

        fn contract_name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn add_then_lookup() {
        let mut dir = ContractDirectory::new();
        dir.add(&Named("StakingBank", Address::repeat_byte(1))).unwrap();
        assert_eq!(dir.contract_by_name("StakingBank"), Address::repeat_byte(1));
        assert_eq!(dir.get("StakingBank"), Some(Address::repeat_byte(1)));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn unbound_name_resolves_to_zero() {
        let dir = ContractDirectory::new();
        assert_eq!(dir.contract_by_name("Nope"), Address::ZERO);
        assert_eq!(dir.get("Nope"), None);
        assert!(dir.is_empty());
    }

    #[test]
    fn add_collision_keeps_first_binding() {
        let mut dir = ContractDirectory::new();
        dir.add(&Named("StakingBank", Address::repeat_byte(1))).unwrap();
        let err = dir.add(&Named("StakingBank", Address::repeat_byte(2))).unwrap_err();
        assert!(matches!(err, DirectoryError::NameCollision { .. }));
        assert_eq!(dir.contract_by_name("StakingBank"), Address::repeat_byte(1));
    }

    #[test]
    fn re_adding_same_binding_is_noop() {
        let mut dir = ContractDirectory::new();
        dir.add(&Named("StakingBank", Address::repeat_byte(1))).unwrap();
        dir.add(&Named("StakingBank", Address::repeat_byte(1))).unwrap();
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn add_rejects_zero_address() {
        let mut dir = ContractDirectory::new();
        let err = dir.add(&Named("StakingBank", Address::ZERO)).unwrap_err();
        assert_eq!(err, DirectoryError::InvalidAddress("StakingBank".into()));
        assert!(dir.is_empty());
    }

    #[test]
    fn update_rebinds_existing_name() {
        let mut dir = ContractDirectory::new();
        dir.add(&Named("StakingBank", Address::repeat_byte(1))).unwrap();
        dir.update(&Named("StakingBank", Address::repeat_byte(2))).unwrap();
        assert_eq!(dir.contract_by_name("StakingBank"), Address::repeat_byte(2));
    }

    #[test]
    fn update_unknown_name_fails() {
        let mut dir = ContractDirectory::new();
        let err = dir.update(&Named("StakingBank", Address::repeat_byte(2))).unwrap_err();
        assert_eq!(err, DirectoryError::NotFound("StakingBank".into()));
        assert!(dir.is_empty());
    }

    #[test]
    fn shared_directory_sees_rebinds_immediately() {
        let dir = RwLock::new(ContractDirectory::new());
        dir.write().unwrap().add(&Named("StakingBank", Address::repeat_byte(1))).unwrap();
        let locator: &dyn ContractLocator = &dir;
        assert_eq!(locator.contract_by_name("StakingBank"), Address::repeat_byte(1));

        dir.write().unwrap().update(&Named("StakingBank", Address::repeat_byte(2))).unwrap();
        assert_eq!(locator.contract_by_name("StakingBank"), Address::repeat_byte(2));
    }
}
