//! LMDB storage backend for the verifier registry.
//!
//! Implements the `vreg-store` traits using the `heed` LMDB bindings. Each
//! logical structure (verifiers, address index, name index, shard
//! aggregates, metadata) maps to one LMDB database within a single
//! environment. A [`vreg_store::WriteBatch`] is committed in one LMDB write
//! transaction; if anything in it fails the transaction is aborted.

pub mod environment;
pub mod error;
pub mod registry;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use registry::LmdbRegistryStore;
