//! Shard aggregate storage trait.

use crate::StoreError;
use vreg_types::{ShardId, StakeAmount};

/// Persistent per-shard balance aggregates.
pub trait ShardBalanceStore {
    /// The aggregate for `shard`. Shards never written read as zero.
    fn shard_balance(&self, shard: ShardId) -> Result<StakeAmount, StoreError>;
}
