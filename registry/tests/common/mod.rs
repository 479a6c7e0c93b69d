#![allow(dead_code)]

use std::sync::Arc;

use vreg_directory::{Contract, ContractDirectory};
use vreg_nullables::NullRegistryStore;
use vreg_registry::{RegistryBuilder, RegistryLogic, STAKING_BANK_NAME};
use vreg_types::{Address, RegistryParams};

pub const ADMIN: u8 = 0xad;
pub const BANK: u8 = 0xba;
pub const LOGIC: u8 = 0x10;

pub fn addr(b: u8) -> Address {
    Address::repeat_byte(b)
}

pub struct Bank(pub Address);

impl Contract for Bank {
    fn address(&self) -> Address {
        self.0
    }

    fn contract_name(&self) -> &str {
        STAKING_BANK_NAME
    }
}

pub fn directory_with_bank() -> ContractDirectory {
    let mut directory = ContractDirectory::new();
    directory.add(&Bank(addr(BANK))).unwrap();
    directory
}

pub fn builder(verifiers_per_shard: u64) -> (RegistryBuilder, Arc<NullRegistryStore>) {
    let store = Arc::new(NullRegistryStore::new(RegistryParams {
        verifiers_per_shard,
        token_address: Address::ZERO,
    }));
    let builder = RegistryBuilder::new(addr(LOGIC), addr(ADMIN), Arc::new(directory_with_bank()));
    (builder, store)
}

pub fn deploy(verifiers_per_shard: u64) -> (RegistryLogic<NullRegistryStore>, Arc<NullRegistryStore>) {
    let (builder, store) = builder(verifiers_per_shard);
    let registry = builder.deploy(Arc::clone(&store)).unwrap();
    (registry, store)
}
