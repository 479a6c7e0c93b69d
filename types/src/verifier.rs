//! The verifier record.

use serde::{Deserialize, Serialize};

use crate::{Address, StakeAmount};

/// Shard number. Assigned once at registration.
pub type ShardId = u64;

/// A registered verifier.
///
/// `active` is controlled by the verifier itself and `enabled` by the
/// registry administrator. Only when both are set does `balance` count
/// toward the shard aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verifier {
    pub id: Address,
    pub name: String,
    pub location: String,
    pub active: bool,
    pub enabled: bool,
    pub balance: StakeAmount,
    pub shard: ShardId,
}

impl Verifier {
    /// A freshly registered verifier: active, enabled, no stake.
    pub fn new(id: Address, name: impl Into<String>, location: impl Into<String>, shard: ShardId) -> Self {
        Self {
            id,
            name: name.into(),
            location: location.into(),
            active: true,
            enabled: true,
            balance: StakeAmount::ZERO,
            shard,
        }
    }

    /// Whether this verifier's balance counts toward its shard.
    pub fn is_visible(&self) -> bool {
        self.active && self.enabled
    }

    /// The contribution of this verifier to its shard aggregate.
    pub fn visible_balance(&self) -> StakeAmount {
        if self.is_visible() {
            self.balance
        } else {
            StakeAmount::ZERO
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Case-fold a verifier name for uniqueness checks.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}
