//! First-in, first-out occupancy container.
//!
//! Holds untracked pages in insertion order; `evict()` always removes the
//! earliest-inserted page still present.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<Page, SlotId>       order: IntrusiveList<Page>
//!                                        head ─► [A] ◄──► [B] ◄──► [C] ◄── tail
//!                                              oldest              newest
//!
//!   insert(D)  → push_back            [A, B, C, D]
//!   erase(B)   → unlink by SlotId     [A, C, D]
//!   evict()    → pop_front → A        [C, D]
//! ```
//!
//! Re-inserting a present page keeps its original position.

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::page::Page;
use crate::traits::OccupancySet;

#[derive(Debug, Default)]
pub struct FifoSet {
    order: IntrusiveList<Page>,
    index: FxHashMap<Page, SlotId>,
}

impl FifoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Member pages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Page> + '_ {
        self.order.iter().copied()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.order.debug_validate_invariants();
        assert_eq!(self.order.len(), self.index.len());
        for (page, &id) in &self.index {
            assert_eq!(self.order.get(id), Some(page));
        }
    }
}

impl OccupancySet for FifoSet {
    fn contains(&self, page: Page) -> bool {
        self.index.contains_key(&page)
    }

    fn insert(&mut self, page: Page) -> bool {
        if self.index.contains_key(&page) {
            return false;
        }
        let id = self.order.push_back(page);
        self.index.insert(page, id);
        true
    }

    fn erase(&mut self, page: Page) -> bool {
        match self.index.remove(&page) {
            Some(id) => {
                self.order.remove(id);
                true
            },
            None => false,
        }
    }

    fn evict(&mut self) -> Option<Page> {
        let page = self.order.pop_front()?;
        self.index.remove(&page);
        Some(page)
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> Page {
        Page::from_raw(n * 4096)
    }

    #[test]
    fn fifo_evicts_in_insertion_order() {
        let mut set = FifoSet::new();
        for i in 1..=3 {
            assert!(set.insert(p(i)));
        }
        assert_eq!(set.evict(), Some(p(1)));
        assert_eq!(set.evict(), Some(p(2)));
        assert_eq!(set.evict(), Some(p(3)));
        assert_eq!(set.evict(), None);
        assert!(set.is_empty());
    }

    #[test]
    fn fifo_duplicate_insert_keeps_position() {
        let mut set = FifoSet::new();
        set.insert(p(1));
        set.insert(p(2));
        assert!(!set.insert(p(1)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![p(1), p(2)]);
        set.debug_validate_invariants();
    }

    #[test]
    fn fifo_erase_skips_removed_page() {
        let mut set = FifoSet::with_capacity(4);
        for i in 1..=3 {
            set.insert(p(i));
        }
        assert!(set.erase(p(1)));
        assert!(!set.erase(p(1)));
        assert!(!set.contains(p(1)));
        assert_eq!(set.evict(), Some(p(2)));
        set.debug_validate_invariants();
    }

    #[test]
    fn fifo_erase_missing_is_false() {
        let mut set = FifoSet::new();
        assert!(!set.erase(p(7)));
        assert_eq!(set.len(), 0);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    proptest! {
        /// Behaves like a de-duplicating queue under insert/erase/evict.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_queue_model(
            ops in prop::collection::vec((0u8..3, 0u64..32), 0..200)
        ) {
            let mut set = FifoSet::new();
            let mut model: VecDeque<Page> = VecDeque::new();

            for (op, n) in ops {
                let page = Page::from_raw(n * 4096);
                match op {
                    0 => {
                        let fresh = !model.contains(&page);
                        if fresh {
                            model.push_back(page);
                        }
                        prop_assert_eq!(set.insert(page), fresh);
                    },
                    1 => {
                        let pos = model.iter().position(|&q| q == page);
                        if let Some(pos) = pos {
                            model.remove(pos);
                        }
                        prop_assert_eq!(set.erase(page), pos.is_some());
                    },
                    _ => prop_assert_eq!(set.evict(), model.pop_front()),
                }
                prop_assert_eq!(set.len(), model.len());
                set.debug_validate_invariants();
            }
        }
    }
}
