//! LMDB implementation of the registry store traits.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};
use tracing::debug;

use vreg_store::{
    ensure_owner, AddressIndexStore, ConfigStore, NameIndexStore, OwnerStore, RegistryStore,
    ShardBalanceStore, StoreError, StoreWrite, VerifierStore, WriteBatch,
};
use vreg_types::{Address, ShardId, StakeAmount, Verifier};

use crate::LmdbError;

pub(crate) mod meta_key {
    pub const SCHEMA_VERSION: &[u8] = b"schema_version";
    pub const VERIFIERS_PER_SHARD: &[u8] = b"verifiers_per_shard";
    pub const TOKEN_ADDRESS: &[u8] = b"token_address";
    pub const ADDRESS_COUNT: &[u8] = b"address_count";
    pub const STORAGE_OWNER: &[u8] = b"storage_owner";
}

/// LMDB keys must be non-empty, and the empty string is a legal name.
fn name_key(normalized: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(normalized.len() + 1);
    key.push(b'n');
    key.extend_from_slice(normalized.as_bytes());
    key
}

fn decode_u64(bytes: &[u8], what: &str) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("invalid {what} bytes length")))?;
    Ok(u64::from_be_bytes(arr))
}

fn decode_u128(bytes: &[u8], what: &str) -> Result<u128, LmdbError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("invalid {what} bytes length")))?;
    Ok(u128::from_be_bytes(arr))
}

fn decode_address(bytes: &[u8], what: &str) -> Result<Address, LmdbError> {
    let arr: [u8; 20] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("invalid {what} bytes length")))?;
    Ok(Address::new(arr))
}

pub struct LmdbRegistryStore {
    pub(crate) env: Arc<Env>,
    pub(crate) verifiers_db: Database<Bytes, Bytes>,
    pub(crate) addresses_db: Database<Bytes, Bytes>,
    pub(crate) names_db: Database<Bytes, Bytes>,
    pub(crate) shard_balances_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbRegistryStore {
    fn owner_in(&self, txn: &RoTxn<'_>) -> Result<Option<Address>, LmdbError> {
        self.meta_db
            .get(txn, meta_key::STORAGE_OWNER)?
            .map(|bytes| decode_address(bytes, "storage owner"))
            .transpose()
    }

    fn address_count_in(&self, txn: &RoTxn<'_>) -> Result<u64, LmdbError> {
        match self.meta_db.get(txn, meta_key::ADDRESS_COUNT)? {
            Some(bytes) => decode_u64(bytes, "address count"),
            None => Ok(0),
        }
    }

    fn apply(&self, wtxn: &mut RwTxn<'_>, write: StoreWrite) -> Result<(), LmdbError> {
        match write {
            StoreWrite::PutVerifier(v) => {
                let bytes = bincode::serialize(&v)?;
                self.verifiers_db.put(wtxn, v.id.as_bytes(), &bytes)?;
            }
            StoreWrite::AppendAddress(id) => {
                let count = self.address_count_in(wtxn)?;
                self.addresses_db.put(wtxn, &count.to_be_bytes(), id.as_bytes())?;
                self.meta_db
                    .put(wtxn, meta_key::ADDRESS_COUNT, &(count + 1).to_be_bytes())?;
            }
            StoreWrite::InsertName(name) => {
                self.names_db.put(wtxn, &name_key(&name), &[])?;
            }
            StoreWrite::RemoveName(name) => {
                self.names_db.delete(wtxn, &name_key(&name))?;
            }
            StoreWrite::SetShardBalance { shard, balance } => {
                self.shard_balances_db
                    .put(wtxn, &shard.to_be_bytes(), &balance.raw().to_be_bytes())?;
            }
            StoreWrite::SetVerifiersPerShard(n) => {
                self.meta_db
                    .put(wtxn, meta_key::VERIFIERS_PER_SHARD, &n.to_be_bytes())?;
            }
            StoreWrite::SetTokenAddress(token) => {
                self.meta_db
                    .put(wtxn, meta_key::TOKEN_ADDRESS, token.as_bytes())?;
            }
        }
        Ok(())
    }
}

impl VerifierStore for LmdbRegistryStore {
    fn verifier(&self, id: &Address) -> Result<Option<Verifier>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .verifiers_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let v: Verifier = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }
}

impl AddressIndexStore for LmdbRegistryStore {
    fn address_at(&self, index: u64) -> Result<Option<Address>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .addresses_db
            .get(&rtxn, &index.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(val
            .map(|bytes| decode_address(bytes, "address index entry"))
            .transpose()?)
    }

    fn address_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.address_count_in(&rtxn)?)
    }
}

impl NameIndexStore for LmdbRegistryStore {
    fn is_name_taken(&self, normalized: &str) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .names_db
            .get(&rtxn, &name_key(normalized))
            .map_err(LmdbError::from)?;
        Ok(val.is_some())
    }
}

impl ShardBalanceStore for LmdbRegistryStore {
    fn shard_balance(&self, shard: ShardId) -> Result<StakeAmount, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .shard_balances_db
            .get(&rtxn, &shard.to_be_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(StakeAmount::new(decode_u128(bytes, "shard balance")?)),
            None => Ok(StakeAmount::ZERO),
        }
    }
}

impl ConfigStore for LmdbRegistryStore {
    fn verifiers_per_shard(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .meta_db
            .get(&rtxn, meta_key::VERIFIERS_PER_SHARD)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound("meta key 'verifiers_per_shard'".into()))?;
        Ok(decode_u64(bytes, "verifiers per shard")?)
    }

    fn token_address(&self) -> Result<Address, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .meta_db
            .get(&rtxn, meta_key::TOKEN_ADDRESS)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(decode_address(bytes, "token address")?),
            None => Ok(Address::ZERO),
        }
    }
}

impl OwnerStore for LmdbRegistryStore {
    fn storage_owner(&self) -> Result<Option<Address>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.owner_in(&rtxn)?)
    }

    fn init_storage_owner(&self, new_owner: &Address) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self.owner_in(&wtxn)?.is_some() {
            return Err(StoreError::AlreadyInitialized);
        }
        if new_owner.is_zero() {
            return Err(StoreError::InvalidOwner);
        }
        self.meta_db
            .put(&mut wtxn, meta_key::STORAGE_OWNER, new_owner.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        debug!(owner = %new_owner, "storage owner initialized");
        Ok(())
    }

    fn transfer_storage_owner(&self, caller: &Address, new_owner: &Address) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let owner = self.owner_in(&wtxn)?;
        ensure_owner(owner.as_ref(), caller)?;
        if new_owner.is_zero() {
            return Err(StoreError::InvalidOwner);
        }
        self.meta_db
            .put(&mut wtxn, meta_key::STORAGE_OWNER, new_owner.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        debug!(from = %caller, to = %new_owner, "storage owner transferred");
        Ok(())
    }
}

impl RegistryStore for LmdbRegistryStore {
    fn commit(&self, caller: &Address, batch: WriteBatch) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let owner = self.owner_in(&wtxn)?;
        ensure_owner(owner.as_ref(), caller)?;

        let writes = batch.len();
        for write in batch {
            // Returning early drops `wtxn`, which aborts the whole batch.
            self.apply(&mut wtxn, write)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        debug!(writes, "batch committed");
        Ok(())
    }
}
