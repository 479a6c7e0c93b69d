use std::sync::Arc;

use proptest::prelude::*;

use vreg_directory::ContractDirectory;
use vreg_nullables::{NullRegistryStore, NullToken};
use vreg_registry::{RegistryBuilder, RegistryLogic};
use vreg_staking::{StakingError, StakingLedger};
use vreg_types::{Address, StakeAmount};

const ADMIN: u8 = 0xad;
const BANK: u8 = 0xba;

fn addr(b: u8) -> Address {
    Address::repeat_byte(b)
}

fn setup() -> (Arc<RegistryLogic<NullRegistryStore>>, StakingLedger<NullRegistryStore>) {
    let mut directory = ContractDirectory::new();
    let token = Arc::new(NullToken::new(addr(0x70)));
    // The bank address is bound before the registry exists; the directory
    // only needs the name and address.
    struct Bank;
    impl vreg_directory::Contract for Bank {
        fn address(&self) -> Address {
            addr(BANK)
        }
        fn contract_name(&self) -> &str {
            "StakingBank"
        }
    }
    directory.add(&Bank).unwrap();

    let registry = Arc::new(
        RegistryBuilder::new(addr(0x10), addr(ADMIN), Arc::new(directory))
            .deploy(Arc::new(NullRegistryStore::default()))
            .unwrap(),
    );
    let ledger = StakingLedger::new(addr(BANK), addr(ADMIN), registry.clone(), token);
    (registry, ledger)
}

#[test]
fn set_balance_applies_delta() {
    let (registry, ledger) = setup();
    let v = addr(1);
    registry.create(&v, "v", "loc").unwrap();

    ledger.set_balance(&addr(ADMIN), &v, StakeAmount::new(30)).unwrap();
    assert_eq!(registry.verifiers(&v).unwrap().unwrap().balance, StakeAmount::new(30));

    ledger.set_balance(&addr(ADMIN), &v, StakeAmount::new(12)).unwrap();
    assert_eq!(registry.verifiers(&v).unwrap().unwrap().balance, StakeAmount::new(12));
    assert_eq!(registry.balances_per_shard(0).unwrap(), StakeAmount::new(12));
    assert_eq!(ledger.staked_balance(&v), StakeAmount::new(12));

    ledger.set_balance(&addr(ADMIN), &v, StakeAmount::new(12)).unwrap();
    assert_eq!(ledger.total_staked(), StakeAmount::new(12));
}

#[test]
fn set_balance_for_unregistered_verifier_fails() {
    let (_, ledger) = setup();
    let err = ledger
        .set_balance(&addr(ADMIN), &addr(9), StakeAmount::new(1))
        .unwrap_err();
    assert!(matches!(err, StakingError::NotRegistered(_)));

    let err = ledger
        .set_balance(&addr(ADMIN), &addr(9), StakeAmount::ZERO)
        .unwrap_err();
    assert!(matches!(err, StakingError::NotRegistered(_)));
}

#[test]
fn set_balance_is_owner_only() {
    let (registry, ledger) = setup();
    let v = addr(1);
    registry.create(&v, "v", "loc").unwrap();
    let err = ledger.set_balance(&v, &v, StakeAmount::new(1)).unwrap_err();
    assert!(matches!(err, StakingError::AccessDenied(_)));
    assert_eq!(registry.verifiers(&v).unwrap().unwrap().balance, StakeAmount::ZERO);
}

proptest! {
    #[test]
    fn registry_tracks_last_set_balance(amounts in prop::collection::vec(0u64..10_000, 1..20)) {
        let (registry, ledger) = setup();
        let v = addr(1);
        registry.create(&v, "v", "loc").unwrap();

        for amount in &amounts {
            let amount = StakeAmount::new(u128::from(*amount));
            ledger.set_balance(&addr(ADMIN), &v, amount).unwrap();
            prop_assert_eq!(registry.verifiers(&v).unwrap().unwrap().balance, amount);
            prop_assert_eq!(registry.balances_per_shard(0).unwrap(), amount);
        }
    }
}
