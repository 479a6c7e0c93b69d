//! Registry parameters.

use serde::{Deserialize, Serialize};

use crate::Address;

/// Admin-mutable registry configuration.
///
/// `verifiers_per_shard` only affects verifiers registered after it changes;
/// existing shard assignments are never rebalanced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryParams {
    /// Number of verifiers that fill one shard before the next one opens.
    #[serde(default = "default_verifiers_per_shard")]
    pub verifiers_per_shard: u64,

    /// Informational pointer to the bridged stake token.
    #[serde(default)]
    pub token_address: Address,
}

fn default_verifiers_per_shard() -> u64 {
    3
}

impl Default for RegistryParams {
    fn default() -> Self {
        Self {
            verifiers_per_shard: default_verifiers_per_shard(),
            token_address: Address::ZERO,
        }
    }
}
