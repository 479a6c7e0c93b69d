//! Verifier record storage trait.

use crate::StoreError;
use vreg_types::{Address, Verifier};

/// Read access to verifier records keyed by id.
pub trait VerifierStore {
    /// Get a verifier record, `None` if the id never registered.
    fn verifier(&self, id: &Address) -> Result<Option<Verifier>, StoreError>;

    fn is_registered(&self, id: &Address) -> Result<bool, StoreError> {
        Ok(self.verifier(id)?.is_some())
    }
}
