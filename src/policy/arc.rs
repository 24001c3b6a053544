//! Adaptive Replacement Cache (ARC) replacement policy.
//!
//! Balances recency against frequency with four lists and an adaptive target
//! `p` for the size of `T1`. Ghost hits steer `p`: a hit in `B1` means `T1`
//! was too small, a hit in `B2` means `T2` was.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              ArcCore Layout                                 │
//! │                                                                             │
//! │   index: FxHashMap<Page, (ArcList, SlotId)>      resident pages only        │
//! │                                                                             │
//! │   T1 (seen once)                       T2 (seen at least twice)             │
//! │   ┌─────────────────────────┐          ┌─────────────────────────┐          │
//! │   │ MRU               LRU   │          │ MRU               LRU   │          │
//! │   │ [D] ◄──► [C] ◄──► ...   │          │ [A] ◄──► ...            │          │
//! │   └────────────────┬────────┘          └────────────────┬────────┘          │
//! │                    │ replace()                          │ replace()         │
//! │                    ▼                                    ▼                   │
//! │   B1 (ghosts of T1): GhostList         B2 (ghosts of T2): GhostList         │
//! │                                                                             │
//! │   p: f64 in [0, capacity]    B1 hit → p grows    B2 hit → p shrinks         │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tracked consume
//!
//! ```text
//!   hit in T1/T2   → move to T2 MRU
//!   ghost hit B1   → p += max(1, |B2|/|B1|) (cap c); B1 → T2 MRU
//!   ghost hit B2   → p -= max(1, |B1|/|B2|) (floor 0); B2 → T2 MRU
//!                    both run replace(from_b2) first if T1+T2 is at limit
//!   true miss      → if |T1|+|B1| >= c:
//!                        |T1| < c  → drop B1 LRU
//!                        otherwise → evict T1 LRU outright (no ghost)
//!                    else if |T1|+|T2|+|B1|+|B2| >= 2c → drop B2 LRU
//!                    then replace(false) if no page left yet and T1+T2 is at limit
//!                    insert at T1 MRU
//!
//!   replace(from_b2):
//!     if |T1| > 0 and (|T1| >= ⌊p⌋ or (from_b2 and |T1| == ⌊p⌋)): T1 LRU → B1 MRU
//!     else:                                                      T2 LRU → B2 MRU
//! ```
//!
//! `replace` preserves `|T1|+|B1|` and the four-list total, so the
//! no-incoming-page path (`evict_from_tracked`) needs no ghost trim.
//!
//! ## Example
//!
//! ```
//! use pagesim::page::Page;
//! use pagesim::policy::arc::{ArcCore, ArcList};
//! use pagesim::traits::TrackedPolicy;
//!
//! let pages: Vec<Page> = (1..=4).map(|n| Page::from_raw(n * 0x1000)).collect();
//! let (a, b, c, d) = (pages[0], pages[1], pages[2], pages[3]);
//!
//! let mut arc = ArcCore::new(3);
//! for page in [a, b, c, a] {
//!     assert_eq!(arc.consume_tracked(page, 3), None);
//! }
//! assert_eq!(arc.list_of(a), ArcList::T2);
//!
//! assert_eq!(arc.consume_tracked(d, 3), Some(b));
//! assert_eq!(arc.t1_pages(), vec![d, c]);
//! assert_eq!(arc.b1_pages(), vec![b]);
//! ```

use rustc_hash::FxHashMap;

use crate::ds::ghost_list::GhostList;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{ConfigError, InvariantError};
use crate::page::Page;
use crate::traits::TrackedPolicy;

/// Resident list a tracked ARC page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcList {
    /// Seen once since it last entered the cache.
    T1,
    /// Seen at least twice.
    T2,
}

#[derive(Debug)]
pub struct ArcCore {
    t1: IntrusiveList<Page>,
    t2: IntrusiveList<Page>,
    b1: GhostList,
    b2: GhostList,
    index: FxHashMap<Page, (ArcList, SlotId)>,
    p: f64,
    capacity: usize,
}

impl ArcCore {
    /// Creates an ARC policy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. See [`try_new`](Self::try_new).
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(arc) => arc,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        Ok(Self {
            t1: IntrusiveList::with_capacity(capacity),
            t2: IntrusiveList::with_capacity(capacity),
            b1: GhostList::new(capacity),
            b2: GhostList::new(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            p: 0.0,
            capacity,
        })
    }

    /// Current target size for `T1`.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// The resident list holding `page`.
    ///
    /// # Panics
    ///
    /// Panics if `page` is not resident (ghost entries are not resident).
    pub fn list_of(&self, page: Page) -> ArcList {
        match self.index.get(&page) {
            Some(&(list, _)) => list,
            None => panic!("list of non-resident page {page}"),
        }
    }

    pub fn is_ghost(&self, page: Page) -> bool {
        self.b1.contains(page) || self.b2.contains(page)
    }

    /// `T1` from MRU to LRU.
    pub fn t1_pages(&self) -> Vec<Page> {
        self.t1.iter().copied().collect()
    }

    /// `T2` from MRU to LRU.
    pub fn t2_pages(&self) -> Vec<Page> {
        self.t2.iter().copied().collect()
    }

    /// `B1` from MRU to LRU.
    pub fn b1_pages(&self) -> Vec<Page> {
        self.b1.iter().collect()
    }

    /// `B2` from MRU to LRU.
    pub fn b2_pages(&self) -> Vec<Page> {
        self.b2.iter().collect()
    }

    fn list(&self, list: ArcList) -> &IntrusiveList<Page> {
        match list {
            ArcList::T1 => &self.t1,
            ArcList::T2 => &self.t2,
        }
    }

    fn list_mut(&mut self, list: ArcList) -> &mut IntrusiveList<Page> {
        match list {
            ArcList::T1 => &mut self.t1,
            ArcList::T2 => &mut self.t2,
        }
    }

    fn directory_size(&self) -> usize {
        self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len()
    }

    fn push_t2_mru(&mut self, page: Page) {
        let id = self.t2.push_front(page);
        self.index.insert(page, (ArcList::T2, id));
    }

    /// Demotes one resident page into its ghost list and returns it.
    fn replace(&mut self, from_b2: bool) -> Option<Page> {
        let t1 = self.t1.len();
        let target = self.p as usize;
        let prefer_t1 = t1 != 0 && (t1 >= target || (from_b2 && t1 == target));

        let from = match (prefer_t1, self.t2.is_empty()) {
            (true, _) | (false, true) => ArcList::T1,
            (false, false) => ArcList::T2,
        };
        let victim = self.list_mut(from).pop_back()?;
        self.index.remove(&victim);
        match from {
            ArcList::T1 => self.b1.record(victim),
            ArcList::T2 => self.b2.record(victim),
        };
        Some(victim)
    }

    /// Demotes a resident page only when the tracked share is used up.
    fn replace_at_limit(&mut self, from_b2: bool, limit: usize) -> Option<Page> {
        if self.t1.len() + self.t2.len() >= limit {
            self.replace(from_b2)
        } else {
            None
        }
    }

    fn on_b1_hit(&mut self, page: Page, limit: usize) -> Option<Page> {
        let delta = (self.b2.len() as f64 / self.b1.len() as f64).max(1.0);
        self.p = (self.p + delta).min(self.capacity as f64);
        let evicted = self.replace_at_limit(false, limit);
        self.b1.remove(page);
        self.push_t2_mru(page);
        evicted
    }

    fn on_b2_hit(&mut self, page: Page, limit: usize) -> Option<Page> {
        let delta = (self.b1.len() as f64 / self.b2.len() as f64).max(1.0);
        self.p = (self.p - delta).max(0.0);
        let evicted = self.replace_at_limit(true, limit);
        self.b2.remove(page);
        self.push_t2_mru(page);
        evicted
    }

    fn on_miss(&mut self, page: Page, limit: usize) -> Option<Page> {
        let mut evicted = None;
        if self.t1.len() + self.b1.len() >= self.capacity {
            if self.t1.len() < self.capacity {
                self.b1.pop_lru();
            } else if let Some(victim) = self.t1.pop_back() {
                self.index.remove(&victim);
                evicted = Some(victim);
            }
        } else if self.directory_size() >= 2 * self.capacity {
            self.b2.pop_lru();
        }

        if evicted.is_none() {
            evicted = self.replace_at_limit(false, limit);
        }

        let id = self.t1.push_front(page);
        self.index.insert(page, (ArcList::T1, id));
        evicted
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.t1.debug_validate_invariants();
        self.t2.debug_validate_invariants();
        self.b1.debug_validate_invariants();
        self.b2.debug_validate_invariants();
        if let Err(e) = self.check_invariants() {
            panic!("{e}");
        }
    }
}

impl TrackedPolicy for ArcCore {
    fn name(&self) -> &'static str {
        "ARC"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn consume_tracked(&mut self, page: Page, limit: usize) -> Option<Page> {
        if let Some(&(list, id)) = self.index.get(&page) {
            match list {
                ArcList::T1 => {
                    self.t1.remove(id);
                    self.push_t2_mru(page);
                },
                ArcList::T2 => {
                    self.t2.move_to_front(id);
                },
            }
            return None;
        }

        if self.b1.contains(page) {
            self.on_b1_hit(page, limit)
        } else if self.b2.contains(page) {
            self.on_b2_hit(page, limit)
        } else {
            self.on_miss(page, limit)
        }
    }

    fn is_tracked_fault(&self, page: Page) -> bool {
        !self.index.contains_key(&page)
    }

    fn evict_from_tracked(&mut self) -> Option<Page> {
        self.replace(false)
    }

    fn tracked_size(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    fn resident_pages(&self) -> Vec<Page> {
        self.t1.iter().rev().chain(self.t2.iter().rev()).copied().collect()
    }

    fn reorders(&self, page: Page) -> bool {
        self.t2.front() != Some(&page)
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        let c = self.capacity;
        let (t1, t2, b1, b2) = (self.t1.len(), self.t2.len(), self.b1.len(), self.b2.len());

        if t1 + t2 != self.index.len() {
            return Err(InvariantError::new(format!(
                "ARC index holds {} pages but T1 + T2 = {}",
                self.index.len(),
                t1 + t2
            )));
        }
        if t1 + t2 > c {
            return Err(InvariantError::new(format!("ARC |T1|+|T2| = {} > {c}", t1 + t2)));
        }
        if t1 + b1 > c {
            return Err(InvariantError::new(format!("ARC |T1|+|B1| = {} > {c}", t1 + b1)));
        }
        if t1 + t2 + b1 + b2 > 2 * c {
            return Err(InvariantError::new(format!(
                "ARC directory size {} > {}",
                t1 + t2 + b1 + b2,
                2 * c
            )));
        }
        if !(0.0..=c as f64).contains(&self.p) {
            return Err(InvariantError::new(format!("ARC p = {} outside [0, {c}]", self.p)));
        }

        for (list, kind) in [(&self.t1, ArcList::T1), (&self.t2, ArcList::T2)] {
            for &page in list.iter() {
                match self.index.get(&page) {
                    Some(&(indexed, id)) if indexed == kind && self.list(kind).get(id) == Some(&page) => {},
                    _ => {
                        return Err(InvariantError::new(format!(
                            "ARC {kind:?} page {page} is not indexed there"
                        )));
                    },
                }
                if self.is_ghost(page) {
                    return Err(InvariantError::new(format!(
                        "ARC page {page} is both resident and a ghost"
                    )));
                }
            }
        }
        if let Some(page) = self.b1.iter().find(|&page| self.b2.contains(page)) {
            return Err(InvariantError::new(format!("ARC ghost {page} is in B1 and B2")));
        }
        Ok(())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Structural invariants, size and ghost bounds hold after every step.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_invariants_hold(
            capacity in 1usize..16,
            ops in prop::collection::vec((0u64..40, any::<bool>()), 0..300)
        ) {
            let mut arc = ArcCore::new(capacity);
            for (n, evict) in ops {
                if evict {
                    arc.evict_from_tracked();
                } else {
                    arc.consume_tracked(Page::from_raw(n * 4096), capacity);
                }
                prop_assert!(arc.tracked_size() <= capacity);
                arc.debug_validate_invariants();
            }
        }

        /// B1 hits never lower p; B2 hits never raise it.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_p_moves_with_ghost_hits(
            capacity in 1usize..12,
            pages in prop::collection::vec(0u64..30, 0..300)
        ) {
            let mut arc = ArcCore::new(capacity);
            for n in pages {
                let page = Page::from_raw(n * 4096);
                let in_b1 = arc.b1.contains(page);
                let in_b2 = arc.b2.contains(page);
                let before = arc.p();
                arc.consume_tracked(page, capacity);
                if in_b1 {
                    prop_assert!(arc.p() >= before);
                }
                if in_b2 {
                    prop_assert!(arc.p() <= before);
                }
                prop_assert!(arc.p() >= 0.0 && arc.p() <= capacity as f64);
            }
        }
    }
}
