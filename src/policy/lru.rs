//! # Least Recently Used (LRU)
//!
//! Tracked pages sit on one recency list. A fault evicts the tail when the
//! tracked share is exhausted and inserts at the head; a hit moves the page to
//! the head.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                             LruCore                                  │
//!   │                                                                      │
//!   │   index: FxHashMap<Page, SlotId>                                     │
//!   │   ┌─────────┬────────┐                                               │
//!   │   │ page A  │ id_1   │──┐                                            │
//!   │   │ page B  │ id_2   │──┼──┐                                         │
//!   │   │ page C  │ id_3   │──┼──┼──┐                                      │
//!   │   └─────────┴────────┘  ▼  ▼  ▼                                      │
//!   │   list:     head ──► [A] ◄──► [B] ◄──► [C] ◄── tail                  │
//!   │                      MRU                LRU                          │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   consume_tracked(D, limit = 3)          consume_tracked(B, _)
//!     1. D not indexed: fault               1. B indexed: hit
//!     2. len 3 >= limit: pop tail (C)       2. move_to_front(B)
//!     3. push_front(D)                      [B] ◄──► [A] ◄──► [C]
//!     [D] ◄──► [A] ◄──► [B]
//! ```
//!
//! ## Operations
//!
//! | Method                  | Complexity | Notes                              |
//! |-------------------------|------------|------------------------------------|
//! | `consume_tracked`       | O(1)       | hit = move to front, fault = push  |
//! | `evict_from_tracked`    | O(1)       | pops the tail                      |
//! | `recency(page)`         | O(n)       | 0 = MRU; panics if not resident    |
//!
//! ## Example
//!
//! ```
//! use pagesim::page::Page;
//! use pagesim::policy::lru::LruCore;
//! use pagesim::traits::TrackedPolicy;
//!
//! let mut lru = LruCore::new(2);
//! let (a, b, c) = (Page::from_raw(0x1000), Page::from_raw(0x2000), Page::from_raw(0x3000));
//!
//! lru.consume_tracked(a, 2);
//! lru.consume_tracked(b, 2);
//! lru.consume_tracked(a, 2);
//! assert_eq!(lru.consume_tracked(c, 2), Some(b));
//! assert_eq!(lru.recency(c), 0);
//! assert_eq!(lru.recency(a), 1);
//! ```

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{ConfigError, InvariantError};
use crate::page::Page;
use crate::traits::TrackedPolicy;

/// Single-list LRU over tracked pages.
#[derive(Debug)]
pub struct LruCore {
    list: IntrusiveList<Page>,
    index: FxHashMap<Page, SlotId>,
    capacity: usize,
}

impl LruCore {
    /// Creates an LRU policy for `capacity` pages.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. See [`try_new`](Self::try_new).
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(lru) => lru,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates an LRU policy, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        Ok(Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        })
    }

    /// Position of `page` in recency order, 0 being the most recent.
    ///
    /// # Panics
    ///
    /// Panics if `page` is not tracked.
    pub fn recency(&self, page: Page) -> usize {
        assert!(self.index.contains_key(&page), "recency of non-resident page {page}");
        self.list
            .iter()
            .position(|&p| p == page)
            .unwrap_or_else(|| panic!("page {page} indexed but not linked"))
    }

    /// Tracked pages from MRU to LRU.
    pub fn iter(&self) -> impl Iterator<Item = Page> + '_ {
        self.list.iter().copied()
    }

    fn pop_lru(&mut self) -> Option<Page> {
        let page = self.list.pop_back()?;
        self.index.remove(&page);
        Some(page)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        if let Err(e) = self.check_invariants() {
            panic!("{e}");
        }
    }
}

impl TrackedPolicy for LruCore {
    fn name(&self) -> &'static str {
        "LRU"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn consume_tracked(&mut self, page: Page, limit: usize) -> Option<Page> {
        if let Some(&id) = self.index.get(&page) {
            self.list.move_to_front(id);
            return None;
        }

        let evicted = if self.list.len() >= limit {
            self.pop_lru()
        } else {
            None
        };
        let id = self.list.push_front(page);
        self.index.insert(page, id);
        evicted
    }

    fn is_tracked_fault(&self, page: Page) -> bool {
        !self.index.contains_key(&page)
    }

    fn evict_from_tracked(&mut self) -> Option<Page> {
        self.pop_lru()
    }

    fn tracked_size(&self) -> usize {
        self.index.len()
    }

    fn resident_pages(&self) -> Vec<Page> {
        self.list.iter().rev().copied().collect()
    }

    fn reorders(&self, page: Page) -> bool {
        self.list.front() != Some(&page)
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.list.len() != self.index.len() {
            return Err(InvariantError::new(format!(
                "LRU list holds {} pages but index holds {}",
                self.list.len(),
                self.index.len()
            )));
        }
        if self.list.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "LRU tracks {} pages over capacity {}",
                self.list.len(),
                self.capacity
            )));
        }
        for (page, &id) in &self.index {
            if self.list.get(id) != Some(page) {
                return Err(InvariantError::new(format!("LRU index for {page} is stale")));
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
        /// Tracked size never exceeds the limit passed in.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_size_within_limit(
            capacity in 1usize..32,
            pages in prop::collection::vec(0u64..64, 0..300)
        ) {
            let mut lru = LruCore::new(capacity);
            for n in pages {
                lru.consume_tracked(Page::from_raw(n * 4096), capacity);
                prop_assert!(lru.tracked_size() <= capacity);
                lru.debug_validate_invariants();
            }
        }

        /// The resident set is always the `capacity` most recently used pages.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_holds_most_recent_distinct(
            capacity in 1usize..16,
            pages in prop::collection::vec(0u64..32, 1..200)
        ) {
            let mut lru = LruCore::new(capacity);
            for &n in &pages {
                lru.consume_tracked(Page::from_raw(n * 4096), capacity);
            }

            let mut expected = Vec::new();
            for &n in pages.iter().rev() {
                let page = Page::from_raw(n * 4096);
                if !expected.contains(&page) {
                    expected.push(page);
                }
                if expected.len() == capacity {
                    break;
                }
            }
            prop_assert_eq!(lru.iter().collect::<Vec<_>>(), expected);
        }
    }
}
