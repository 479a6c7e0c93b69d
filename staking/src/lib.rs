//! Staking bank.
//!
//! Holds stake tokens on behalf of verifiers and mirrors every custody
//! change into the registry through `increase_shard_balance` and
//! `decrease_shard_balance`. The registry only accepts those calls from the
//! address the directory binds to [`vreg_registry::STAKING_BANK_NAME`], so a
//! ledger must be added to the directory before it can move balances.

pub mod error;
pub mod ledger;

pub use error::StakingError;
pub use ledger::StakingLedger;
