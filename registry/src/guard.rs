//! Busy flag around state transitions.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::RegistryError;

/// Held for the whole of a mutating operation, event delivery included.
///
/// A second entry while the flag is set (a subscriber calling back in, or a
/// collaborator re-entering through a callback) fails with
/// [`RegistryError::ReentrantCall`] instead of observing a half-finished
/// transition.
pub struct TransitionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TransitionGuard<'a> {
    pub fn enter(flag: &'a AtomicBool) -> Result<Self, RegistryError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| RegistryError::ReentrantCall)?;
        Ok(Self { flag })
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_entry_is_rejected_until_release() {
        let flag = AtomicBool::new(false);
        let guard = TransitionGuard::enter(&flag).unwrap();
        assert!(matches!(
            TransitionGuard::enter(&flag),
            Err(RegistryError::ReentrantCall)
        ));
        drop(guard);
        assert!(TransitionGuard::enter(&flag).is_ok());
    }
}
