//! Untracked occupancy containers.
//!
//! Pages placed here occupy capacity but are not governed by the exact
//! policy: they arrived on accesses the sampling strategy skipped. The engine
//! evicts from this bucket before touching the tracked structures.
//!
//! - [`FifoSet`]: evicts the earliest-inserted page.
//! - [`RandomSet`]: evicts a uniformly random page (seeded).
//! - [`Untracked`]: closed variant over the two, selected by
//!   [`UntrackedEviction`].

pub mod fifo;
pub mod random;

use serde::{Deserialize, Serialize};

pub use fifo::FifoSet;
pub use random::RandomSet;

use crate::page::Page;
use crate::traits::OccupancySet;

/// Victim selection strategy for the untracked container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UntrackedEviction {
    /// Evict the oldest untracked page.
    #[default]
    #[serde(alias = "Fifo")]
    Fifo,
    /// Evict a uniformly random untracked page.
    #[serde(alias = "Random")]
    Random {
        #[serde(default)]
        seed: u64,
    },
}

impl UntrackedEviction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::Random { .. } => "RANDOM",
        }
    }
}

/// The untracked bucket owned by an engine.
#[derive(Debug)]
pub enum Untracked {
    Fifo(FifoSet),
    Random(RandomSet),
}

impl Untracked {
    /// Creates the container for `strategy`, reserving room for `capacity` pages.
    pub fn new(strategy: UntrackedEviction, capacity: usize) -> Self {
        match strategy {
            UntrackedEviction::Fifo => Self::Fifo(FifoSet::with_capacity(capacity)),
            UntrackedEviction::Random { seed } => {
                Self::Random(RandomSet::with_capacity(capacity, seed))
            },
        }
    }

    pub fn strategy(&self) -> UntrackedEviction {
        match self {
            Self::Fifo(_) => UntrackedEviction::Fifo,
            Self::Random(set) => UntrackedEviction::Random { seed: set.seed() },
        }
    }

    /// Member pages; oldest first for FIFO, storage order for Random.
    pub fn pages(&self) -> Vec<Page> {
        match self {
            Self::Fifo(set) => set.iter().collect(),
            Self::Random(set) => set.iter().collect(),
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        match self {
            Self::Fifo(set) => set.debug_validate_invariants(),
            Self::Random(set) => set.debug_validate_invariants(),
        }
    }
}

impl OccupancySet for Untracked {
    fn contains(&self, page: Page) -> bool {
        match self {
            Self::Fifo(set) => set.contains(page),
            Self::Random(set) => set.contains(page),
        }
    }

    fn insert(&mut self, page: Page) -> bool {
        match self {
            Self::Fifo(set) => set.insert(page),
            Self::Random(set) => set.insert(page),
        }
    }

    fn erase(&mut self, page: Page) -> bool {
        match self {
            Self::Fifo(set) => set.erase(page),
            Self::Random(set) => set.erase(page),
        }
    }

    fn evict(&mut self) -> Option<Page> {
        match self {
            Self::Fifo(set) => set.evict(),
            Self::Random(set) => set.evict(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Fifo(set) => set.len(),
            Self::Random(set) => set.len(),
        }
    }
}
