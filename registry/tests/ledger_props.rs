mod common;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use proptest::prelude::*;

use common::{addr, deploy, ADMIN, BANK};
use vreg_nullables::{NullRegistryStore, StoreSnapshot};
use vreg_registry::RegistryLogic;
use vreg_types::{Address, ShardId, StakeAmount};

const NAMES: [&str; 6] = ["alice", "Alice", "bob", "BOB", "carol", "dave"];

#[derive(Clone, Debug)]
enum Op {
    Create { who: u8, name: usize },
    Update { who: u8, name: usize },
    SetActive { caller: u8, who: u8, active: bool },
    SetEnabled { admin: bool, who: u8, enable: bool },
    Increase { bank: bool, who: u8, amount: u32 },
    Decrease { bank: bool, who: u8, amount: u32 },
    SetShardSize { n: u8 },
}

fn op() -> impl Strategy<Value = Op> {
    let who = 1u8..7;
    let name = 0..NAMES.len();
    prop_oneof![
        (who.clone(), name.clone()).prop_map(|(who, name)| Op::Create { who, name }),
        (who.clone(), name).prop_map(|(who, name)| Op::Update { who, name }),
        (who.clone(), who.clone(), any::<bool>())
            .prop_map(|(caller, who, active)| Op::SetActive { caller, who, active }),
        (any::<bool>(), who.clone(), any::<bool>())
            .prop_map(|(admin, who, enable)| Op::SetEnabled { admin, who, enable }),
        (any::<bool>(), who.clone(), 0u32..1_000)
            .prop_map(|(bank, who, amount)| Op::Increase { bank, who, amount }),
        (any::<bool>(), who, 0u32..1_000)
            .prop_map(|(bank, who, amount)| Op::Decrease { bank, who, amount }),
        (0u8..4).prop_map(|n| Op::SetShardSize { n }),
    ]
}

fn apply(reg: &RegistryLogic<NullRegistryStore>, op: &Op) -> bool {
    let bank = |yes: bool| if yes { addr(BANK) } else { addr(0x99) };
    match *op {
        Op::Create { who, name } => reg.create(&addr(who), NAMES[name], "loc").is_ok(),
        Op::Update { who, name } => reg.update(&addr(who), NAMES[name], "elsewhere").is_ok(),
        Op::SetActive { caller, who, active } => {
            reg.update_active_status(&addr(caller), &addr(who), active).is_ok()
        }
        Op::SetEnabled { admin, who, enable } => {
            let caller = if admin { addr(ADMIN) } else { addr(who) };
            reg.update_enable_status(&caller, &addr(who), enable).is_ok()
        }
        Op::Increase { bank: b, who, amount } => reg
            .increase_shard_balance(&bank(b), &addr(who), StakeAmount::from(u128::from(amount)))
            .is_ok(),
        Op::Decrease { bank: b, who, amount } => reg
            .decrease_shard_balance(&bank(b), &addr(who), StakeAmount::from(u128::from(amount)))
            .is_ok(),
        Op::SetShardSize { n } => reg.update_verifiers_per_shard(&addr(ADMIN), u64::from(n)).is_ok(),
    }
}

fn expected_aggregates(snapshot: &StoreSnapshot) -> BTreeMap<ShardId, StakeAmount> {
    let mut sums: BTreeMap<ShardId, u128> = BTreeMap::new();
    for v in snapshot.verifiers.values() {
        *sums.entry(v.shard).or_default() += v.visible_balance().raw();
    }
    sums.into_iter()
        .filter(|(_, sum)| *sum != 0)
        .map(|(shard, sum)| (shard, StakeAmount::new(sum)))
        .collect()
}

fn check_invariants(snapshot: &StoreSnapshot, shards: &mut HashMap<Address, ShardId>) {
    assert_eq!(snapshot.shard_balances, expected_aggregates(snapshot));

    let normalized: Vec<String> = snapshot
        .verifiers
        .values()
        .map(|v| v.normalized_name())
        .collect();
    let unique: BTreeSet<String> = normalized.iter().cloned().collect();
    assert_eq!(unique.len(), normalized.len(), "two verifiers share a name");
    assert_eq!(unique, snapshot.names);

    assert_eq!(snapshot.addresses.len(), snapshot.verifiers.len());
    for (id, v) in &snapshot.verifiers {
        assert_eq!(*shards.entry(*id).or_insert(v.shard), v.shard, "shard reassigned");
    }
}

proptest! {
    #[test]
    fn ledger_holds_under_random_operations(ops in prop::collection::vec(op(), 1..60)) {
        let (reg, store) = deploy(2);
        let mut shards = HashMap::new();

        for op in &ops {
            let before = store.snapshot();
            let accepted = apply(&reg, op);
            let after = store.snapshot();
            if !accepted {
                prop_assert_eq!(&before, &after, "rejected {:?} wrote state", op);
            }
            check_invariants(&after, &mut shards);
        }
    }

    #[test]
    fn shard_follows_registration_count(sizes in prop::collection::vec(1u8..4, 1..6)) {
        let (reg, _) = deploy(u64::from(sizes[0]));
        let mut expected = Vec::new();
        for (i, n) in sizes.iter().enumerate() {
            reg.update_verifiers_per_shard(&addr(ADMIN), u64::from(*n)).unwrap();
            let id = addr(i as u8 + 1);
            let v = reg.create(&id, &format!("v{i}"), "loc").unwrap();
            expected.push((id, i as u64 / u64::from(*n)));
            prop_assert_eq!(v.shard, i as u64 / u64::from(*n));
        }
        for (id, shard) in expected {
            prop_assert_eq!(reg.verifiers(&id).unwrap().unwrap().shard, shard);
        }
    }
}
