//! Bounded recency list of ghost pages.
//!
//! Shared by ARC and CAR for their `B1`/`B2` history lists: pages that were
//! evicted but are still remembered. Ghosts cost no residency; they only feed
//! the adaptation of `p`. Implemented as an `IntrusiveList` plus an index.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<Page, SlotId>      list: IntrusiveList<Page>
//!   ┌─────────┬─────────┐               head ─► [A] ◄──► [B] ◄──► [C] ◄── tail
//!   │ page A  │  id_1   │                  MRU                       LRU
//!   │ page B  │  id_2   │
//!   └─────────┴─────────┘
//! ```
//!
//! ## Behavior
//! - `record(p)`: inserts at MRU; if the list is at capacity the LRU ghost is
//!   dropped first and returned
//! - `pop_lru()`: drops the oldest ghost
//! - `remove(p)`: O(1) removal from anywhere (ghost hit)
//!
//! Policies trim explicitly before recording, so the capacity bound is a
//! backstop rather than the normal trimming path.

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::page::Page;

#[derive(Debug)]
pub struct GhostList {
    list: IntrusiveList<Page>,
    index: FxHashMap<Page, SlotId>,
    capacity: usize,
}

impl GhostList {
    /// Creates a ghost list holding at most `capacity` pages.
    pub fn new(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, page: Page) -> bool {
        self.index.contains_key(&page)
    }

    /// Records `page` as the most recent ghost.
    ///
    /// Returns the ghost dropped to stay within capacity, if any. Recording a
    /// page that is already present only refreshes its position.
    pub fn record(&mut self, page: Page) -> Option<Page> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(&id) = self.index.get(&page) {
            self.list.move_to_front(id);
            return None;
        }

        let dropped = if self.list.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let id = self.list.push_front(page);
        self.index.insert(page, id);
        dropped
    }

    /// Drops and returns the least recently recorded ghost.
    pub fn pop_lru(&mut self) -> Option<Page> {
        let page = self.list.pop_back()?;
        self.index.remove(&page);
        Some(page)
    }

    /// Removes `page`; returns `true` if it was present.
    pub fn remove(&mut self, page: Page) -> bool {
        match self.index.remove(&page) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    /// Ghost pages from MRU to LRU.
    pub fn iter(&self) -> impl Iterator<Item = Page> + '_ {
        self.list.iter().copied()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        assert_eq!(self.list.len(), self.index.len());
        assert!(self.list.len() <= self.capacity);
        for (page, &id) in &self.index {
            assert_eq!(self.list.get(id), Some(page));
        }
    }
}
