//! Consideration strategies.
//!
//! A strategy decides, per access, whether the exact tracked policy sees it
//! (`considered = true`) or the page only occupies the untracked bucket.
//! Decisions read the running counters of the simulation they belong to, so
//! a [`Sampler`] is always owned by exactly one [`Simulation`](crate::simulation::Simulation).
//!
//! | Strategy         | Considers                                                        |
//! |------------------|------------------------------------------------------------------|
//! | `Always`         | every access                                                     |
//! | `Never`          | nothing                                                          |
//! | `SampleRate`     | while `considered / seen <= rate`; faults too if `faults_always` |
//! | `LoadStoreRatio` | `SampleRate`, and only while loads:stores tracks `ratio`         |
//! | `Bernoulli`      | an independent seeded coin per access                            |
//!
//! ## Example
//!
//! ```
//! use pagesim::page::Direction;
//! use pagesim::sampling::{Consideration, Sampler};
//! use pagesim::simulation::RunStats;
//!
//! let mut sampler = Sampler::try_new(Consideration::SampleRate {
//!     rate: 0.5,
//!     faults_always: false,
//! })
//! .unwrap();
//!
//! let stats = RunStats { seen: 1, ..RunStats::default() };
//! assert!(sampler.consider(Direction::Load, false, &stats));
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::page::Direction;
use crate::simulation::RunStats;

/// Serializable selector for a consideration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consideration {
    #[default]
    Always,
    Never,
    /// Keep the considered fraction of accesses at or below `rate`.
    ///
    /// With `faults_always`, every page fault is considered regardless.
    SampleRate {
        rate: f64,
        #[serde(default)]
        faults_always: bool,
    },
    /// As `SampleRate`, additionally steering considered loads per store
    /// toward `ratio`.
    LoadStoreRatio {
        rate: f64,
        ratio: f64,
        #[serde(default)]
        faults_always: bool,
    },
    /// Consider each access independently with `probability`.
    Bernoulli {
        probability: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl Consideration {
    /// Checks every parameter against its domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Always | Self::Never => Ok(()),
            Self::SampleRate { rate, .. } => check_unit("sample rate", rate),
            Self::LoadStoreRatio { rate, ratio, .. } => {
                check_unit("sample rate", rate)?;
                if !ratio.is_finite() || ratio <= 0.0 {
                    return Err(ConfigError::new(format!(
                        "load/store ratio must be finite and > 0, got {ratio}"
                    )));
                }
                Ok(())
            },
            Self::Bernoulli { probability, .. } => check_unit("probability", probability),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::SampleRate { .. } => "sample_rate",
            Self::LoadStoreRatio { .. } => "load_store_ratio",
            Self::Bernoulli { .. } => "bernoulli",
        }
    }
}

fn check_unit(what: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::new(format!(
            "{what} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// A validated strategy plus whatever state it needs between accesses.
#[derive(Debug, Clone)]
pub struct Sampler {
    strategy: Consideration,
    rng: Option<SmallRng>,
}

impl Sampler {
    pub fn try_new(strategy: Consideration) -> Result<Self, ConfigError> {
        strategy.validate()?;
        let rng = match strategy {
            Consideration::Bernoulli { seed, .. } => Some(SmallRng::seed_from_u64(seed)),
            _ => None,
        };
        Ok(Self { strategy, rng })
    }

    pub fn strategy(&self) -> Consideration {
        self.strategy
    }

    /// Decides whether the current access is considered.
    ///
    /// `stats.seen` must already count the current access; the considered
    /// counters must not.
    pub fn consider(&mut self, direction: Direction, is_fault: bool, stats: &RunStats) -> bool {
        match self.strategy {
            Consideration::Always => true,
            Consideration::Never => false,
            Consideration::SampleRate {
                rate,
                faults_always,
            } => (faults_always && is_fault) || within_rate(stats, rate),
            Consideration::LoadStoreRatio {
                rate,
                ratio,
                faults_always,
            } => {
                ((faults_always && is_fault) || within_rate(stats, rate))
                    && keeps_ratio(stats, direction, ratio)
            },
            Consideration::Bernoulli { probability, .. } => match self.rng.as_mut() {
                Some(rng) => rng.random_bool(probability),
                None => false,
            },
        }
    }
}

fn within_rate(stats: &RunStats, rate: f64) -> bool {
    if stats.seen == 0 {
        return true;
    }
    stats.considered() as f64 / stats.seen as f64 <= rate
}

fn keeps_ratio(stats: &RunStats, direction: Direction, ratio: f64) -> bool {
    if stats.considered_stores == 0 {
        return true;
    }
    let current = stats.considered_loads as f64 / stats.considered_stores as f64;
    match direction {
        Direction::Load => current <= ratio,
        Direction::Store => ratio <= current,
    }
}
