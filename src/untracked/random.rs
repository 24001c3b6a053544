//! Uniform-random occupancy container.
//!
//! Dense page array plus a page → index map. Erase swaps the removed page with
//! the last slot before shrinking, so only the moved page's index changes.
//! `evict()` draws a uniform index from a seeded [`SmallRng`], which keeps
//! simulations reproducible.
//!
//! ```text
//!   pages: [A, B, C, D]      index: { A:0, B:1, C:2, D:3 }
//!
//!   erase(B):  swap(1, 3) → [A, D, C, B], index[D] = 1, pop → [A, D, C]
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::page::Page;
use crate::traits::OccupancySet;

#[derive(Debug)]
pub struct RandomSet {
    pages: Vec<Page>,
    index: FxHashMap<Page, usize>,
    rng: SmallRng,
    seed: u64,
}

impl RandomSet {
    /// Creates an empty set whose victim sequence is determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_capacity(0, seed)
    }

    pub fn with_capacity(capacity: usize, seed: u64) -> Self {
        Self {
            pages: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            rng: SmallRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Member pages in storage order (not meaningful as an eviction order).
    pub fn iter(&self) -> impl Iterator<Item = Page> + '_ {
        self.pages.iter().copied()
    }

    fn swap_remove_at(&mut self, idx: usize) -> Page {
        let page = self.pages.swap_remove(idx);
        if let Some(&moved) = self.pages.get(idx) {
            self.index.insert(moved, idx);
        }
        self.index.remove(&page);
        page
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.pages.len(), self.index.len());
        for (i, page) in self.pages.iter().enumerate() {
            assert_eq!(self.index.get(page), Some(&i), "stale index for {page}");
        }
    }
}

impl OccupancySet for RandomSet {
    fn contains(&self, page: Page) -> bool {
        self.index.contains_key(&page)
    }

    fn insert(&mut self, page: Page) -> bool {
        if self.index.contains_key(&page) {
            return false;
        }
        self.index.insert(page, self.pages.len());
        self.pages.push(page);
        true
    }

    fn erase(&mut self, page: Page) -> bool {
        match self.index.get(&page) {
            Some(&idx) => {
                self.swap_remove_at(idx);
                true
            },
            None => false,
        }
    }

    fn evict(&mut self) -> Option<Page> {
        if self.pages.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..self.pages.len());
        Some(self.swap_remove_at(idx))
    }

    fn len(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> Page {
        Page::from_raw(n * 4096)
    }

    #[test]
    fn random_erase_updates_moved_index() {
        let mut set = RandomSet::new(7);
        for i in 1..=4 {
            set.insert(p(i));
        }
        assert!(set.erase(p(2)));
        assert!(!set.contains(p(2)));
        assert!(set.contains(p(4)));
        assert_eq!(set.len(), 3);
        set.debug_validate_invariants();

        assert!(set.erase(p(4)));
        set.debug_validate_invariants();
    }

    #[test]
    fn random_erase_last_element() {
        let mut set = RandomSet::new(0);
        set.insert(p(1));
        set.insert(p(2));
        assert!(set.erase(p(2)));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![p(1)]);
        set.debug_validate_invariants();
    }

    #[test]
    fn random_evict_drains_every_member_once() {
        let mut set = RandomSet::new(42);
        for i in 0..16 {
            set.insert(p(i));
        }
        let mut drained = Vec::new();
        while let Some(page) = set.evict() {
            assert!(!set.contains(page));
            drained.push(page);
            set.debug_validate_invariants();
        }
        drained.sort();
        assert_eq!(drained, (0..16).map(p).collect::<Vec<_>>());
        assert_eq!(set.evict(), None);
    }

    #[test]
    fn random_same_seed_same_victims() {
        let mut a = RandomSet::new(99);
        let mut b = RandomSet::new(99);
        for i in 0..32 {
            a.insert(p(i));
            b.insert(p(i));
        }
        for _ in 0..32 {
            assert_eq!(a.evict(), b.evict());
        }
    }

    #[test]
    fn random_duplicate_insert_rejected() {
        let mut set = RandomSet::new(1);
        assert!(set.insert(p(3)));
        assert!(!set.insert(p(3)));
        assert_eq!(set.len(), 1);
    }
}
