//! Contract directory: a name → address map used for service discovery.
//!
//! Components register themselves under the name they report through
//! [`Contract::contract_name`]. Consumers resolve a name through the
//! [`ContractLocator`] seam at call time, so rebinding a name takes effect
//! on the very next lookup.

pub mod directory;
pub mod error;

pub use directory::{Contract, ContractDirectory, ContractLocator};
pub use error::DirectoryError;
