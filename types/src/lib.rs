//! Fundamental types for the verifier registry.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! participant addresses, stake amounts, the verifier record and registry parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod params;
pub mod verifier;

pub use address::Address;
pub use amount::StakeAmount;
pub use error::TypesError;
pub use params::RegistryParams;
pub use verifier::{normalize_name, ShardId, Verifier};
