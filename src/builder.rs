//! Validated engine construction.
//!
//! [`EngineConfig`] is the serializable description of one engine, suitable
//! for loading run matrices from JSON. [`EngineBuilder`] is the fluent form.
//!
//! ## Example
//!
//! ```rust
//! use pagesim::builder::EngineBuilder;
//! use pagesim::policy::PolicyKind;
//! use pagesim::untracked::UntrackedEviction;
//!
//! let engine = EngineBuilder::new(128)
//!     .policy(PolicyKind::Arc)
//!     .untracked(UntrackedEviction::Random { seed: 42 })
//!     .build()
//!     .unwrap();
//! assert_eq!(engine.capacity(), 128);
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::ConfigError;
use crate::policy::PolicyKind;
use crate::untracked::UntrackedEviction;

/// Everything needed to construct one [`Engine`].
///
/// `policy` and `untracked` default to LRU and FIFO when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub capacity: usize,
    #[serde(default)]
    pub policy: PolicyKind,
    #[serde(default)]
    pub untracked: UntrackedEviction,
}

impl EngineConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: PolicyKind::default(),
            untracked: UntrackedEviction::default(),
        }
    }

    /// Builds the engine, validating every parameter.
    pub fn build(&self) -> Result<Engine, ConfigError> {
        Engine::try_new(self.capacity, self.policy, self.untracked)
    }
}

/// Builder for [`Engine`] instances.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a new engine builder with the specified capacity in pages.
    pub fn new(capacity: usize) -> Self {
        Self {
            config: EngineConfig::new(capacity),
        }
    }

    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Select the tracked policy.
    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.config.policy = policy;
        self
    }

    /// Select the untracked eviction strategy.
    pub fn untracked(mut self, untracked: UntrackedEviction) -> Self {
        self.config.untracked = untracked;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for zero capacity or an invalid policy
    /// parameter (`max_life == 0`, `k == 0`).
    pub fn build(self) -> Result<Engine, ConfigError> {
        self.config.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::traits::TrackedPolicy;

    #[test]
    fn test_all_policies_basic_ops() {
        let policies = [
            PolicyKind::Lru,
            PolicyKind::LruK { k: 2 },
            PolicyKind::Clock { max_life: 1 },
            PolicyKind::Clock { max_life: 3 },
            PolicyKind::Arc,
            PolicyKind::Car,
        ];

        for policy in policies {
            let mut engine = EngineBuilder::new(10).policy(policy).build().unwrap();
            let (a, b) = (Page::from_raw(0x1000), Page::from_raw(0x2000));

            assert_eq!(engine.consume(a, true), None);
            assert_eq!(engine.consume(b, false), None);
            assert!(!engine.is_page_fault(a));
            assert!(!engine.is_page_fault(b));
            assert_eq!(engine.tracked_size(), 1);
            assert_eq!(engine.untracked_size(), 1);
            assert_eq!(engine.policy_kind(), policy);
            assert!(engine.check_invariants().is_ok());
        }
    }

    #[test]
    fn test_defaults_are_lru_and_fifo() {
        let builder = EngineBuilder::new(4);
        assert_eq!(builder.config().policy, PolicyKind::Lru);
        assert_eq!(builder.config().untracked, UntrackedEviction::Fifo);
        let engine = builder.build().unwrap();
        assert_eq!(engine.policy().name(), "LRU");
    }

    #[test]
    fn test_invalid_parameters_are_errors() {
        assert!(EngineBuilder::new(0).build().is_err());
        let err = EngineBuilder::new(4)
            .policy(PolicyKind::LruK { k: 0 })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("k"));
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            capacity: 3,
            policy: PolicyKind::Car,
            untracked: UntrackedEviction::Random { seed: 9 },
        };
        let engine = EngineBuilder::from_config(config).build().unwrap();
        assert_eq!(engine.capacity(), 3);
        assert_eq!(engine.policy_kind(), PolicyKind::Car);
        assert_eq!(
            engine.untracked().strategy(),
            UntrackedEviction::Random { seed: 9 }
        );
    }

    #[test]
    fn test_capacity_enforcement() {
        let mut engine = EngineBuilder::new(2).build().unwrap();
        let p = |n: u64| Page::from_raw(n * 4096);

        engine.consume(p(1), true);
        engine.consume(p(2), true);
        assert_eq!(engine.consume(p(3), true), Some(p(1)));

        assert_eq!(engine.total_size(), 2);
        assert!(engine.is_page_fault(p(1)));
        assert!(!engine.is_page_fault(p(2)));
        assert!(!engine.is_page_fault(p(3)));
    }
}
