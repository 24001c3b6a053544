//! Seeded access-stream generators for the policy benchmarks.

use pagesim::page::{Access, PAGE_SIZE};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Zipf};

#[derive(Debug, Clone, Copy)]
pub enum Workload {
    /// Uniform random pages in `[0, universe)`.
    Uniform,
    /// Hot/cold split: `hot_prob` of accesses land in the first `hot_fraction` of pages.
    HotSet { hot_fraction: f64, hot_prob: f64 },
    /// Sequential scan over `[0, universe)`, wrapping.
    Scan,
    /// Zipfian page popularity; higher `exponent` is more skewed.
    Zipfian { exponent: f64 },
    /// Zipfian baseline interrupted by `scan_length`-page scans with
    /// probability `scan_prob` per access.
    ScanResistance {
        exponent: f64,
        scan_prob: f64,
        scan_length: u64,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct WorkloadSpec {
    pub universe: u64,
    pub workload: Workload,
    /// Fraction of accesses that are stores.
    pub store_fraction: f64,
    pub seed: u64,
}

impl WorkloadSpec {
    /// Generates `len` accesses; equal parameters always yield the same trace.
    pub fn trace(self, len: usize) -> Vec<Access> {
        let universe = self.universe.max(1);
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let zipf = match self.workload {
            Workload::Zipfian { exponent } | Workload::ScanResistance { exponent, .. } => {
                Zipf::new(universe as f64, exponent).ok()
            },
            _ => None,
        };
        let mut scan_pos = 0u64;
        let mut scan_left = 0u64;

        (0..len)
            .map(|_| {
                let page = match self.workload {
                    Workload::Uniform => rng.random_range(0..universe),
                    Workload::HotSet {
                        hot_fraction,
                        hot_prob,
                    } => {
                        let hot = ((universe as f64 * hot_fraction) as u64).clamp(1, universe);
                        if hot == universe || rng.random_bool(hot_prob) {
                            rng.random_range(0..hot)
                        } else {
                            rng.random_range(hot..universe)
                        }
                    },
                    Workload::Scan => {
                        let page = scan_pos;
                        scan_pos = (scan_pos + 1) % universe;
                        page
                    },
                    Workload::Zipfian { .. } => zipf_page(zipf.as_ref(), &mut rng, universe),
                    Workload::ScanResistance {
                        scan_prob,
                        scan_length,
                        ..
                    } => {
                        if scan_left == 0 && rng.random_bool(scan_prob) {
                            scan_left = scan_length;
                            scan_pos = rng.random_range(0..universe);
                        }
                        if scan_left > 0 {
                            scan_left -= 1;
                            scan_pos = (scan_pos + 1) % universe;
                            scan_pos
                        } else {
                            zipf_page(zipf.as_ref(), &mut rng, universe)
                        }
                    },
                };
                let addr = page * PAGE_SIZE + rng.random_range(0..PAGE_SIZE);
                if rng.random_bool(self.store_fraction) {
                    Access::store(addr)
                } else {
                    Access::load(addr)
                }
            })
            .collect()
    }
}

fn zipf_page(zipf: Option<&Zipf<f64>>, rng: &mut SmallRng, universe: u64) -> u64 {
    match zipf {
        Some(zipf) => {
            let sample: f64 = zipf.sample(rng);
            (sample as u64).saturating_sub(1).min(universe - 1)
        },
        None => rng.random_range(0..universe),
    }
}
