//! Tracked replacement policies.
//!
//! Each policy owns its recency/frequency structures and implements
//! [`TrackedPolicy`]. [`Policy`] is the closed set the engine dispatches over;
//! [`PolicyKind`] is its serializable selector.
//!
//! | Policy    | Module     | Resident structure                | Ghosts |
//! |-----------|------------|-----------------------------------|--------|
//! | LRU       | [`lru`]    | one recency list                  | no     |
//! | LRU-K     | [`lru_k`]  | K-distance ordered set            | no     |
//! | CLOCK     | [`clock`]  | slot ring with aging counters     | no     |
//! | ARC       | [`arc`]    | `T1`/`T2` recency lists           | B1/B2  |
//! | CAR       | [`car`]    | `T1`/`T2` clocks with ref bits    | B1/B2  |

pub mod arc;
pub mod car;
pub mod clock;
pub mod lru;
pub mod lru_k;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvariantError};
use crate::page::Page;
use crate::traits::TrackedPolicy;

use self::arc::ArcCore;
use self::car::CarCore;
use self::clock::ClockCore;
use self::lru::LruCore;
use self::lru_k::LrukCore;

/// Available tracked policies and their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyKind {
    /// Least Recently Used.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// LRU-K with history depth `k`.
    #[serde(rename = "LRU_K", alias = "LruK")]
    LruK { k: usize },
    /// Generalized CLOCK; `max_life = 1` is classic CLOCK.
    #[serde(alias = "Clock")]
    Clock { max_life: u8 },
    /// Adaptive Replacement Cache.
    #[serde(alias = "Arc")]
    Arc,
    /// Clock with Adaptive Replacement.
    #[serde(alias = "Car")]
    Car,
}

impl PolicyKind {
    /// Builds the policy for `capacity` pages, validating parameters.
    pub fn build(self, capacity: usize) -> Result<Policy, ConfigError> {
        Ok(match self {
            Self::Lru => Policy::Lru(LruCore::try_new(capacity)?),
            Self::LruK { k } => Policy::LruK(LrukCore::try_new(capacity, k)?),
            Self::Clock { max_life } => Policy::Clock(ClockCore::try_new(capacity, max_life)?),
            Self::Arc => Policy::Arc(ArcCore::try_new(capacity)?),
            Self::Car => Policy::Car(CarCore::try_new(capacity)?),
        })
    }
}

/// One of the concrete tracked policies.
#[derive(Debug)]
pub enum Policy {
    Lru(LruCore),
    LruK(LrukCore),
    Clock(ClockCore),
    Arc(ArcCore),
    Car(CarCore),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Policy::Lru($inner) => $body,
            Policy::LruK($inner) => $body,
            Policy::Clock($inner) => $body,
            Policy::Arc($inner) => $body,
            Policy::Car($inner) => $body,
        }
    };
}

impl Policy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Lru(_) => PolicyKind::Lru,
            Policy::LruK(lru_k) => PolicyKind::LruK { k: lru_k.k() },
            Policy::Clock(clock) => PolicyKind::Clock {
                max_life: clock.max_life(),
            },
            Policy::Arc(_) => PolicyKind::Arc,
            Policy::Car(_) => PolicyKind::Car,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        dispatch!(self, inner => inner.debug_validate_invariants())
    }
}

impl TrackedPolicy for Policy {
    fn name(&self) -> &'static str {
        dispatch!(self, inner => inner.name())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, inner => inner.capacity())
    }

    fn consume_tracked(&mut self, page: Page, limit: usize) -> Option<Page> {
        dispatch!(self, inner => inner.consume_tracked(page, limit))
    }

    fn is_tracked_fault(&self, page: Page) -> bool {
        dispatch!(self, inner => inner.is_tracked_fault(page))
    }

    fn evict_from_tracked(&mut self) -> Option<Page> {
        dispatch!(self, inner => inner.evict_from_tracked())
    }

    fn tracked_size(&self) -> usize {
        dispatch!(self, inner => inner.tracked_size())
    }

    fn resident_pages(&self) -> Vec<Page> {
        dispatch!(self, inner => inner.resident_pages())
    }

    fn temperature_order(&self) -> Vec<Page> {
        dispatch!(self, inner => inner.temperature_order())
    }

    fn reorders(&self, page: Page) -> bool {
        dispatch!(self, inner => inner.reorders(page))
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        dispatch!(self, inner => inner.check_invariants())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_kind_builds_matching_variant() {
        let kinds = [
            PolicyKind::Lru,
            PolicyKind::LruK { k: 2 },
            PolicyKind::Clock { max_life: 3 },
            PolicyKind::Arc,
            PolicyKind::Car,
        ];
        for kind in kinds {
            let policy = kind.build(8).unwrap();
            assert_eq!(policy.kind(), kind);
            assert_eq!(policy.capacity(), 8);
            assert_eq!(policy.tracked_size(), 0);
        }
    }

    #[test]
    fn policy_names() {
        let name = |kind: PolicyKind| kind.build(4).unwrap().name();
        assert_eq!(name(PolicyKind::Lru), "LRU");
        assert_eq!(name(PolicyKind::LruK { k: 2 }), "LRU-K");
        assert_eq!(name(PolicyKind::Clock { max_life: 1 }), "CLOCK");
        assert_eq!(name(PolicyKind::Clock { max_life: 4 }), "GCLOCK");
        assert_eq!(name(PolicyKind::Arc), "ARC");
        assert_eq!(name(PolicyKind::Car), "CAR");
    }

    #[test]
    fn policy_kind_rejects_bad_parameters() {
        assert!(PolicyKind::Clock { max_life: 0 }.build(4).is_err());
        assert!(PolicyKind::LruK { k: 0 }.build(4).is_err());
        assert!(PolicyKind::Arc.build(0).is_err());
    }
}
