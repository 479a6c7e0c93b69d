//! Verifier registry logic.
//!
//! The registry enforces the business rules over a [`vreg_store::RegistryStore`]:
//! - one record per identity, names unique case-insensitively
//! - shard assignment at registration (`count / verifiers_per_shard`), never revisited
//! - `active` toggled by the verifier, `enabled` by the administrator
//! - balances mutated only by whichever address the directory currently
//!   binds to [`STAKING_BANK_NAME`]
//!
//! Ledger invariant: for every shard `s`, the stored aggregate equals the sum
//! of balances of verifiers in `s` that are both active and enabled. Every
//! operation stages all of its writes (record, indexes, aggregate) into one
//! batch, so the invariant holds after every commit and a rejected operation
//! writes nothing.

pub mod builder;
pub mod error;
pub mod event;
pub mod guard;
pub mod registry;

pub use builder::RegistryBuilder;
pub use error::RegistryError;
pub use event::{EventBus, RegistryEvent};
pub use guard::TransitionGuard;
pub use registry::RegistryLogic;

/// Name the registry registers under in the contract directory.
pub const REGISTRY_NAME: &str = "VerifierRegistry";

/// Directory name whose binding is authorized to mutate balances.
pub const STAKING_BANK_NAME: &str = "StakingBank";
