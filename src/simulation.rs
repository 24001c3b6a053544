//! Simulation driver.
//!
//! A [`Simulation`] pairs one [`Engine`] with one [`Sampler`] and replays an
//! access stream through them in order, accumulating [`RunStats`].
//!
//! ```text
//!   for access in stream:
//!     seen += 1
//!     fault      = engine.is_page_fault(page)
//!     considered = sampler.consider(direction, fault, stats)
//!     evicted    = engine.consume(page, considered)
//!     update counters
//! ```
//!
//! ## Order distance
//!
//! With [`Simulation::with_order_distance`], every considered access that
//! reorders the tracked pages is also measured. A page's temperature is its
//! rank in [`TrackedPolicy::temperature_order`]; the step's distance is the
//! sum of `|rank_after - rank_before|` over pages resident on both sides.
//! Sums are kept separately for faults and hits.
//!
//! Simulations share nothing, so a harness may run many of them on separate
//! threads over the same read-only access buffer.
//!
//! ## Example
//!
//! ```
//! use pagesim::builder::EngineBuilder;
//! use pagesim::page::Access;
//! use pagesim::policy::PolicyKind;
//! use pagesim::sampling::Consideration;
//! use pagesim::simulation::Simulation;
//!
//! let engine = EngineBuilder::new(2).policy(PolicyKind::Lru).build().unwrap();
//! let mut sim = Simulation::try_new(engine, Consideration::Always).unwrap();
//!
//! let trace = [0x1000, 0x2000, 0x1008, 0x3000].map(Access::load);
//! let stats = sim.run(trace);
//! assert_eq!(stats.seen, 4);
//! assert_eq!(stats.faults, 3);
//! assert_eq!(stats.evictions, 1);
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::EngineConfig;
use crate::engine::Engine;
use crate::error::ConfigError;
use crate::page::{Access, Direction, Page};
use crate::sampling::{Consideration, Sampler};
use crate::traits::TrackedPolicy;

/// Accesses between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Accesses processed, considered or not.
    pub seen: u64,
    /// Accesses whose page was resident in neither tier.
    pub faults: u64,
    pub considered_loads: u64,
    pub considered_stores: u64,
    /// Considered accesses that were also faults.
    pub considered_faults: u64,
    /// Pages evicted by either tier.
    pub evictions: u64,
    /// Order distance summed over considered faults.
    #[serde(default)]
    pub fault_distance: u64,
    /// Order distance summed over considered hits.
    #[serde(default)]
    pub hit_distance: u64,
}

impl RunStats {
    #[inline]
    pub fn considered(&self) -> u64 {
        self.considered_loads + self.considered_stores
    }

    /// Fraction of accesses that faulted, or 0 before any access.
    pub fn fault_rate(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            self.faults as f64 / self.seen as f64
        }
    }

    /// Mean order distance per considered fault.
    pub fn fault_distance_average(&self) -> f64 {
        ratio(self.fault_distance, self.considered_faults)
    }

    /// Mean order distance per considered hit.
    pub fn hit_distance_average(&self) -> f64 {
        ratio(self.hit_distance, self.considered() - self.considered_faults)
    }
}

fn ratio(sum: u64, count: u64) -> f64 {
    if count == 0 { 0.0 } else { sum as f64 / count as f64 }
}

/// What one access did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub fault: bool,
    pub considered: bool,
    pub evicted: Option<Page>,
    /// The tracked temperature order changed.
    pub reordered: bool,
    /// Order distance of a considered access, when measured.
    pub distance: Option<u64>,
}

/// One engine driven by one consideration strategy.
#[derive(Debug)]
pub struct Simulation {
    engine: Engine,
    sampler: Sampler,
    stats: RunStats,
    progress_interval: u64,
    /// Tracked temperature ranks after the last reorder, when measuring.
    ranks: Option<FxHashMap<Page, usize>>,
}

impl Simulation {
    pub fn try_new(engine: Engine, strategy: Consideration) -> Result<Self, ConfigError> {
        let sampler = Sampler::try_new(strategy)?;
        debug!(
            capacity = engine.capacity(),
            policy = engine.policy().name(),
            untracked = engine.untracked().strategy().name(),
            strategy = strategy.name(),
            "simulation created"
        );
        Ok(Self {
            engine,
            sampler,
            stats: RunStats::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            ranks: None,
        })
    }

    /// Builds the engine from `config` and pairs it with `strategy`.
    pub fn from_config(config: &EngineConfig, strategy: Consideration) -> Result<Self, ConfigError> {
        Self::try_new(config.build()?, strategy)
    }

    /// Sets how many accesses pass between progress lines; 0 disables them.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Measures the order distance of every considered access.
    pub fn with_order_distance(mut self) -> Self {
        self.ranks = Some(temperature_ranks(&self.engine));
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn strategy(&self) -> Consideration {
        self.sampler.strategy()
    }

    /// Processes one access.
    pub fn step(&mut self, access: Access) -> Step {
        self.stats.seen += 1;
        self.log_progress();

        let fault = self.engine.is_page_fault(access.page);
        let considered = self.sampler.consider(access.direction, fault, &self.stats);
        let tracked_before = self.engine.tracked_size();
        let reordered = if considered {
            self.engine.policy().reorders(access.page)
        } else {
            false
        };
        let evicted = self.engine.consume(access.page, considered);
        // An untracked fault may still take its victim from the tracked tier.
        let reordered = reordered || self.engine.tracked_size() < tracked_before;
        let distance = self.measure(considered, reordered);

        if fault {
            self.stats.faults += 1;
        }
        if considered {
            match access.direction {
                Direction::Load => self.stats.considered_loads += 1,
                Direction::Store => self.stats.considered_stores += 1,
            }
            if fault {
                self.stats.considered_faults += 1;
            }
            if let Some(distance) = distance {
                if fault {
                    self.stats.fault_distance += distance;
                } else {
                    self.stats.hit_distance += distance;
                }
            }
        }
        if evicted.is_some() {
            self.stats.evictions += 1;
        }

        Step {
            fault,
            considered,
            evicted,
            reordered,
            distance,
        }
    }

    /// Refreshes the rank snapshot after a reorder and returns the distance
    /// of a considered access. `None` unless measuring.
    fn measure(&mut self, considered: bool, reordered: bool) -> Option<u64> {
        let previous = self.ranks.as_mut()?;
        if !reordered {
            return considered.then_some(0);
        }
        let current = temperature_ranks(&self.engine);
        let distance = current
            .iter()
            .filter_map(|(page, &rank)| {
                previous
                    .get(page)
                    .map(|&before| rank.abs_diff(before) as u64)
            })
            .sum();
        *previous = current;
        considered.then_some(distance)
    }

    /// Processes every access in `accesses`, in order.
    pub fn run<I>(&mut self, accesses: I) -> &RunStats
    where
        I: IntoIterator<Item = Access>,
    {
        for access in accesses {
            self.step(access);
        }
        &self.stats
    }

    /// Consumes the simulation, returning its engine and final counters.
    pub fn finish(self) -> (Engine, RunStats) {
        (self.engine, self.stats)
    }

    fn log_progress(&self) {
        if self.progress_interval == 0 || self.stats.seen % self.progress_interval != 0 {
            return;
        }
        info!(
            seen = self.stats.seen,
            considered = self.stats.considered(),
            considered_loads = self.stats.considered_loads,
            considered_stores = self.stats.considered_stores,
            faults = self.stats.faults,
            policy = self.engine.policy().name(),
            strategy = self.sampler.strategy().name(),
            "progress"
        );
    }
}

fn temperature_ranks(engine: &Engine) -> FxHashMap<Page, usize> {
    engine
        .policy()
        .temperature_order()
        .into_iter()
        .enumerate()
        .map(|(rank, page)| (page, rank))
        .collect()
}
