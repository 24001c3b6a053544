//! # LRU-K
//!
//! Evicts the tracked page whose K-th most recent reference lies furthest in
//! the past. Pages referenced fewer than K times have an infinite backward
//! K-distance and go first, oldest last reference first. This keeps one-shot
//! scan pages from displacing pages with an established reference history.
//!
//! ## Architecture
//!
//! ```text
//!   records: FxHashMap<Page, VecDeque<u64>>     last K reference stamps
//!   order:   BTreeSet<(kth, last, Page)>        eviction order, first = victim
//!
//!   K = 2, tick after each reference:
//!
//!     A@1  B@2  A@3  C@4
//!
//!     A: [1, 3]  → (1, 3, A)      kth = 1
//!     B: [2]     → (0, 2, B)      kth = 0 (fewer than K refs)
//!     C: [4]     → (0, 4, C)
//!
//!     order: (0,2,B) < (0,4,C) < (1,3,A)     → B is evicted first
//! ```
//!
//! Stamps start at 1 so that 0 can stand for "infinitely old". History is
//! dropped when a page is evicted. `K = 1` reduces to LRU.

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::FxHashMap;

use crate::error::{ConfigError, InvariantError};
use crate::page::Page;
use crate::traits::TrackedPolicy;

/// Default K, as in LRU-2.
pub const DEFAULT_K: usize = 2;

type OrderKey = (u64, u64, Page);

#[derive(Debug)]
pub struct LrukCore {
    k: usize,
    capacity: usize,
    tick: u64,
    records: FxHashMap<Page, VecDeque<u64>>,
    order: BTreeSet<OrderKey>,
}

impl LrukCore {
    /// Creates an LRU-K policy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `k` is zero. See [`try_new`](Self::try_new).
    pub fn new(capacity: usize, k: usize) -> Self {
        match Self::try_new(capacity, k) {
            Ok(lru_k) => lru_k,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new(capacity: usize, k: usize) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        if k == 0 {
            return Err(ConfigError::new("LRU-K history depth k must be > 0"));
        }
        Ok(Self {
            k,
            capacity,
            tick: 0,
            records: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: BTreeSet::new(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Reference stamps of `page`, most recent first (at most K).
    ///
    /// # Panics
    ///
    /// Panics if `page` is not tracked.
    pub fn history(&self, page: Page) -> Vec<u64> {
        match self.records.get(&page) {
            Some(history) => history.iter().rev().copied().collect(),
            None => panic!("history of non-resident page {page}"),
        }
    }

    fn order_key(&self, page: Page, history: &VecDeque<u64>) -> OrderKey {
        let kth = if history.len() >= self.k {
            history.front().copied().unwrap_or(0)
        } else {
            0
        };
        let last = history.back().copied().unwrap_or(0);
        (kth, last, page)
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn pop_victim(&mut self) -> Option<Page> {
        let (_, _, page) = self.order.pop_first()?;
        self.records.remove(&page);
        Some(page)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(e) = self.check_invariants() {
            panic!("{e}");
        }
    }
}

impl TrackedPolicy for LrukCore {
    fn name(&self) -> &'static str {
        "LRU-K"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn consume_tracked(&mut self, page: Page, limit: usize) -> Option<Page> {
        let tick = self.next_tick();

        if let Some(mut history) = self.records.remove(&page) {
            let old_key = self.order_key(page, &history);
            self.order.remove(&old_key);
            history.push_back(tick);
            if history.len() > self.k {
                history.pop_front();
            }
            self.order.insert(self.order_key(page, &history));
            self.records.insert(page, history);
            return None;
        }

        let evicted = if self.records.len() >= limit {
            self.pop_victim()
        } else {
            None
        };

        let mut history = VecDeque::with_capacity(self.k);
        history.push_back(tick);
        self.order.insert(self.order_key(page, &history));
        self.records.insert(page, history);
        evicted
    }

    fn is_tracked_fault(&self, page: Page) -> bool {
        !self.records.contains_key(&page)
    }

    fn evict_from_tracked(&mut self) -> Option<Page> {
        self.pop_victim()
    }

    fn tracked_size(&self) -> usize {
        self.records.len()
    }

    fn resident_pages(&self) -> Vec<Page> {
        self.order.iter().map(|&(_, _, page)| page).collect()
    }

    fn reorders(&self, page: Page) -> bool {
        self.order.last().map(|&(_, _, hottest)| hottest) != Some(page)
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.order.len() != self.records.len() {
            return Err(InvariantError::new(format!(
                "LRU-K order holds {} keys for {} records",
                self.order.len(),
                self.records.len()
            )));
        }
        if self.records.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "LRU-K tracks {} pages over capacity {}",
                self.records.len(),
                self.capacity
            )));
        }
        for (&page, history) in &self.records {
            if history.is_empty() || history.len() > self.k {
                return Err(InvariantError::new(format!(
                    "LRU-K history of {page} has {} stamps (k = {})",
                    history.len(),
                    self.k
                )));
            }
            if !history.iter().zip(history.iter().skip(1)).all(|(a, b)| a < b) {
                return Err(InvariantError::new(format!(
                    "LRU-K history of {page} is not increasing"
                )));
            }
            if !self.order.contains(&self.order_key(page, history)) {
                return Err(InvariantError::new(format!(
                    "LRU-K order key for {page} is stale"
                )));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Size stays within limit and the order index stays consistent.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_invariants_hold(
            capacity in 1usize..16,
            k in 1usize..4,
            pages in prop::collection::vec(0u64..32, 0..300)
        ) {
            let mut lru_k = LrukCore::new(capacity, k);
            for n in pages {
                let page = Page::from_raw(n * 4096);
                let evicted = lru_k.consume_tracked(page, capacity);
                prop_assert!(lru_k.tracked_size() <= capacity);
                prop_assert!(!lru_k.is_tracked_fault(page));
                if let Some(victim) = evicted {
                    prop_assert_ne!(victim, page);
                    prop_assert!(lru_k.is_tracked_fault(victim));
                }
                lru_k.debug_validate_invariants();
            }
        }
    }
}
