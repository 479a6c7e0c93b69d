//! Abstract storage traits for the verifier registry.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The registry logic depends only on the traits, which is what lets
//! a replacement logic instance take over an existing store without a data
//! migration.
//!
//! All writes are gated on a single storage owner. Writes are grouped into a
//! [`WriteBatch`] and committed all-or-nothing.

pub mod batch;
pub mod config;
pub mod error;
pub mod index;
pub mod owner;
pub mod shard;
pub mod verifier;

pub use batch::{StoreWrite, WriteBatch};
pub use config::ConfigStore;
pub use error::StoreError;
pub use index::{AddressIndexStore, NameIndexStore};
pub use owner::{ensure_owner, OwnerStore};
pub use shard::ShardBalanceStore;
pub use verifier::VerifierStore;

use vreg_types::{Address, ShardId, StakeAmount, Verifier};

/// The full persistence surface the registry logic runs against.
///
/// Backends implement [`RegistryStore::commit`]; the per-field setters are
/// single-write batches and share its owner check.
pub trait RegistryStore:
    VerifierStore + AddressIndexStore + NameIndexStore + ShardBalanceStore + ConfigStore + OwnerStore
{
    /// Apply every write in `batch`, or none of them.
    ///
    /// Fails with [`StoreError::AccessDenied`] if `caller` is not the
    /// current storage owner.
    fn commit(&self, caller: &Address, batch: WriteBatch) -> Result<(), StoreError>;

    fn put_verifier(&self, caller: &Address, verifier: &Verifier) -> Result<(), StoreError> {
        self.commit(caller, WriteBatch::single(StoreWrite::PutVerifier(verifier.clone())))
    }

    fn append_address(&self, caller: &Address, id: &Address) -> Result<(), StoreError> {
        self.commit(caller, WriteBatch::single(StoreWrite::AppendAddress(*id)))
    }

    fn insert_name(&self, caller: &Address, normalized: &str) -> Result<(), StoreError> {
        self.commit(caller, WriteBatch::single(StoreWrite::InsertName(normalized.to_string())))
    }

    fn remove_name(&self, caller: &Address, normalized: &str) -> Result<(), StoreError> {
        self.commit(caller, WriteBatch::single(StoreWrite::RemoveName(normalized.to_string())))
    }

    fn set_shard_balance(
        &self,
        caller: &Address,
        shard: ShardId,
        balance: StakeAmount,
    ) -> Result<(), StoreError> {
        self.commit(caller, WriteBatch::single(StoreWrite::SetShardBalance { shard, balance }))
    }

    fn set_verifiers_per_shard(&self, caller: &Address, n: u64) -> Result<(), StoreError> {
        self.commit(caller, WriteBatch::single(StoreWrite::SetVerifiersPerShard(n)))
    }

    fn set_token_address(&self, caller: &Address, token: &Address) -> Result<(), StoreError> {
        self.commit(caller, WriteBatch::single(StoreWrite::SetTokenAddress(*token)))
    }

    /// Every registered id in registration order.
    fn addresses(&self) -> Result<Vec<Address>, StoreError> {
        let count = self.address_count()?;
        let mut out = Vec::with_capacity(count as usize);
        for i in 0..count {
            let id = self
                .address_at(i)?
                .ok_or_else(|| StoreError::Corruption(format!("address index hole at {i}")))?;
            out.push(id);
        }
        Ok(out)
    }
}
