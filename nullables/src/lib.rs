//! Nullable infrastructure for deterministic testing.
//!
//! External collaborators of the registry (persistent storage and the stake
//! token) are abstracted behind traits. This crate provides in-memory
//! implementations that:
//! - Never touch the filesystem
//! - Can be inspected and steered programmatically
//!
//! Usage: swap real implementations for nullables in tests, or embed the
//! in-memory store where persistence is not needed.

pub mod store;
pub mod token;

pub use store::{NullRegistryStore, StoreSnapshot};
pub use token::NullToken;
