//! Error types for pagesim.
//!
//! - [`ConfigError`]: a constructor got a parameter outside its domain (zero
//!   capacity, zero CLOCK life, a sampling rate outside `[0, 1]`).
//! - [`InvariantError`]: [`Engine::check_invariants`](crate::engine::Engine::check_invariants)
//!   found bookkeeping that no longer matches the occupancy model.
//!
//! Neither is produced on the access path: `consume` has no failure mode, and
//! "nothing to evict" is `None`.
//!
//! ```
//! use pagesim::policy::clock::ClockCore;
//!
//! assert!(ClockCore::try_new(64, 2).is_ok());
//! let err = ClockCore::try_new(64, 0).unwrap_err();
//! assert!(err.message().contains("max_life"));
//! ```

use thiserror::Error;

/// An occupancy or policy invariant no longer holds.
///
/// The message names the structure and the values that broke it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Error returned when configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`ClockCore::try_new`](crate::policy::clock::ClockCore::try_new) and
/// [`EngineBuilder::build`](crate::builder::EngineBuilder::build).
///
/// # Example
///
/// ```
/// use pagesim::builder::EngineBuilder;
///
/// let err = EngineBuilder::new(0).build().unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }

    pub(crate) fn check_capacity(capacity: usize) -> Result<(), ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("capacity must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyKind;

    #[test]
    fn invariant_error_carries_description() {
        let err = InvariantError::new("3 tracked + 2 untracked exceeds capacity 4");
        assert_eq!(err.message(), "3 tracked + 2 untracked exceeds capacity 4");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn zero_capacity_is_rejected_everywhere() {
        assert!(ConfigError::check_capacity(1).is_ok());
        let kinds = [
            PolicyKind::Lru,
            PolicyKind::LruK { k: 2 },
            PolicyKind::Clock { max_life: 1 },
            PolicyKind::Arc,
            PolicyKind::Car,
        ];
        for kind in kinds {
            let err = kind.build(0).unwrap_err();
            assert_eq!(err, ConfigError::new("capacity must be > 0"));
        }
    }

    #[test]
    fn errors_are_std_errors() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<InvariantError>();
        assert_error::<ConfigError>();
    }
}
