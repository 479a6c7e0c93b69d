//! Nullable store: thread-safe in-memory registry storage.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use vreg_store::{
    ensure_owner, AddressIndexStore, ConfigStore, NameIndexStore, OwnerStore, RegistryStore,
    ShardBalanceStore, StoreError, StoreWrite, VerifierStore, WriteBatch,
};
use vreg_types::{Address, RegistryParams, ShardId, StakeAmount, Verifier};

#[derive(Default)]
struct State {
    verifiers: HashMap<Address, Verifier>,
    addresses: Vec<Address>,
    names: HashSet<String>,
    shard_balances: HashMap<ShardId, StakeAmount>,
    verifiers_per_shard: u64,
    token_address: Address,
    owner: Option<Address>,
}

impl State {
    fn apply(&mut self, write: StoreWrite) {
        match write {
            StoreWrite::PutVerifier(v) => {
                self.verifiers.insert(v.id, v);
            }
            StoreWrite::AppendAddress(id) => self.addresses.push(id),
            StoreWrite::InsertName(name) => {
                self.names.insert(name);
            }
            StoreWrite::RemoveName(name) => {
                self.names.remove(&name);
            }
            StoreWrite::SetShardBalance { shard, balance } => {
                self.shard_balances.insert(shard, balance);
            }
            StoreWrite::SetVerifiersPerShard(n) => self.verifiers_per_shard = n,
            StoreWrite::SetTokenAddress(token) => self.token_address = token,
        }
    }
}

/// Every persisted field, in a comparable form.
///
/// Zero shard aggregates are omitted so a shard that was written back to
/// zero compares equal to one that was never written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub verifiers: BTreeMap<Address, Verifier>,
    pub addresses: Vec<Address>,
    pub names: BTreeSet<String>,
    pub shard_balances: BTreeMap<ShardId, StakeAmount>,
    pub verifiers_per_shard: u64,
    pub token_address: Address,
    pub owner: Option<Address>,
}

/// An in-memory registry store.
/// Thread-safe; a batch is applied under a single lock so it is atomic.
pub struct NullRegistryStore {
    state: Mutex<State>,
}

impl NullRegistryStore {
    pub fn new(params: RegistryParams) -> Self {
        Self {
            state: Mutex::new(State {
                verifiers_per_shard: params.verifiers_per_shard,
                token_address: params.token_address,
                ..State::default()
            }),
        }
    }

    /// Capture the full persisted state.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock().unwrap();
        StoreSnapshot {
            verifiers: state.verifiers.iter().map(|(k, v)| (*k, v.clone())).collect(),
            addresses: state.addresses.clone(),
            names: state.names.iter().cloned().collect(),
            shard_balances: state
                .shard_balances
                .iter()
                .filter(|(_, b)| !b.is_zero())
                .map(|(s, b)| (*s, *b))
                .collect(),
            verifiers_per_shard: state.verifiers_per_shard,
            token_address: state.token_address,
            owner: state.owner,
        }
    }
}

impl Default for NullRegistryStore {
    fn default() -> Self {
        Self::new(RegistryParams::default())
    }
}

impl VerifierStore for NullRegistryStore {
    fn verifier(&self, id: &Address) -> Result<Option<Verifier>, StoreError> {
        Ok(self.state.lock().unwrap().verifiers.get(id).cloned())
    }
}

impl AddressIndexStore for NullRegistryStore {
    fn address_at(&self, index: u64) -> Result<Option<Address>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| state.addresses.get(i))
            .copied())
    }

    fn address_count(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().addresses.len() as u64)
    }
}

impl NameIndexStore for NullRegistryStore {
    fn is_name_taken(&self, normalized: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().unwrap().names.contains(normalized))
    }
}

impl ShardBalanceStore for NullRegistryStore {
    fn shard_balance(&self, shard: ShardId) -> Result<StakeAmount, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .shard_balances
            .get(&shard)
            .copied()
            .unwrap_or_default())
    }
}

impl ConfigStore for NullRegistryStore {
    fn verifiers_per_shard(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().verifiers_per_shard)
    }

    fn token_address(&self) -> Result<Address, StoreError> {
        Ok(self.state.lock().unwrap().token_address)
    }
}

impl OwnerStore for NullRegistryStore {
    fn storage_owner(&self) -> Result<Option<Address>, StoreError> {
        Ok(self.state.lock().unwrap().owner)
    }

    fn init_storage_owner(&self, new_owner: &Address) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.owner.is_some() {
            return Err(StoreError::AlreadyInitialized);
        }
        if new_owner.is_zero() {
            return Err(StoreError::InvalidOwner);
        }
        state.owner = Some(*new_owner);
        Ok(())
    }

    fn transfer_storage_owner(&self, caller: &Address, new_owner: &Address) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        ensure_owner(state.owner.as_ref(), caller)?;
        if new_owner.is_zero() {
            return Err(StoreError::InvalidOwner);
        }
        state.owner = Some(*new_owner);
        Ok(())
    }
}

impl RegistryStore for NullRegistryStore {
    fn commit(&self, caller: &Address, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        ensure_owner(state.owner.as_ref(), caller)?;
        for write in batch {
            state.apply(write);
        }
        Ok(())
    }
}
