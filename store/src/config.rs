//! Registry configuration storage trait.

use crate::StoreError;
use vreg_types::{Address, RegistryParams};

pub trait ConfigStore {
    fn verifiers_per_shard(&self) -> Result<u64, StoreError>;

    fn token_address(&self) -> Result<Address, StoreError>;

    fn params(&self) -> Result<RegistryParams, StoreError> {
        Ok(RegistryParams {
            verifiers_per_shard: self.verifiers_per_shard()?,
            token_address: self.token_address()?,
        })
    }
}
