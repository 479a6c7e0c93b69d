//! Write batches: the unit of atomic commit.

use serde::{Deserialize, Serialize};
use vreg_types::{Address, ShardId, StakeAmount, Verifier};

/// A single field-level write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreWrite {
    /// Insert or overwrite a verifier record.
    PutVerifier(Verifier),
    /// Append an id to the end of the address index.
    AppendAddress(Address),
    /// Mark a normalized name as taken.
    InsertName(String),
    /// Release a normalized name.
    RemoveName(String),
    /// Overwrite a shard aggregate.
    SetShardBalance { shard: ShardId, balance: StakeAmount },
    SetVerifiersPerShard(u64),
    SetTokenAddress(Address),
}

/// An ordered group of writes that a backend commits all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<StoreWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(write: StoreWrite) -> Self {
        Self {
            writes: vec![write],
        }
    }

    pub fn push(&mut self, write: StoreWrite) {
        self.writes.push(write);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoreWrite> {
        self.writes.iter()
    }
}

impl IntoIterator for WriteBatch {
    type Item = StoreWrite;
    type IntoIter = std::vec::IntoIter<StoreWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
