//! Clock with Adaptive Replacement (CAR) replacement policy.
//!
//! ARC's four-list topology and `p` adaptation, but `T1` and `T2` are clocks:
//! a hit only sets the page's reference bit, and eviction scans from the
//! clock head, giving referenced pages a second chance in `T2`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              CarCore Layout                                 │
//! │                                                                             │
//! │   index: FxHashMap<Page, (CarList, SlotId)>                                 │
//! │                                                                             │
//! │   T1 clock (recency)                   T2 clock (frequency)                 │
//! │   head ─► [A:0] [B:1] [C:0] ◄─ tail    head ─► [X:1] [Y:0] ◄─ tail          │
//! │    hand                    append       hand               append           │
//! │                                                                             │
//! │   Scanned head, unreferenced → demote to B1 / B2, stop                      │
//! │   Scanned head, referenced   → clear bit, requeue at T2 tail, continue      │
//! │                                                                             │
//! │   B1, B2: GhostList     p: f64 in [0, capacity], adapted as in ARC          │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tracked consume
//!
//! ```text
//!   hit              → referenced = true
//!   miss (any kind)  → replace() if |T1|+|T2| is at limit
//!   true miss        → drop B1 LRU if |T1|+|B1| >= c, else B2 LRU if directory >= 2c
//!                      append at T1 tail, unreferenced
//!   ghost hit B1     → p = min(p + max(1, |B2|/|B1|), c); move to T2 tail
//!   ghost hit B2     → p = max(p - max(1, |B1|/|B2|), 0); move to T2 tail
//!
//!   replace():
//!     loop:
//!       if |T1| >= max(1, ⌊p⌋): scan T1 head, else scan T2 head
//!       unreferenced → demote to matching ghost list, return it
//!       referenced   → clear bit, move to T2 tail
//! ```
//!
//! Every resident page loses its bit at most once per `replace`, so the scan
//! ends within `|T1| + |T2| + 1` steps.

use rustc_hash::FxHashMap;

use crate::ds::ghost_list::GhostList;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{ConfigError, InvariantError};
use crate::page::Page;
use crate::traits::TrackedPolicy;

/// Resident clock a tracked CAR page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarList {
    T1,
    T2,
}

#[derive(Debug, Clone, Copy)]
struct ClockEntry {
    page: Page,
    referenced: bool,
}

#[derive(Debug)]
pub struct CarCore {
    t1: IntrusiveList<ClockEntry>,
    t2: IntrusiveList<ClockEntry>,
    b1: GhostList,
    b2: GhostList,
    index: FxHashMap<Page, (CarList, SlotId)>,
    p: f64,
    capacity: usize,
}

impl CarCore {
    /// Creates a CAR policy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. See [`try_new`](Self::try_new).
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(car) => car,
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

    pub fn p(&self) -> f64 {
        self.p
    }

    /// The clock holding `page`.
    ///
    /// # Panics
    ///
    /// Panics if `page` is not resident.
    pub fn list_of(&self, page: Page) -> CarList {
        match self.index.get(&page) {
            Some(&(list, _)) => list,
            None => panic!("list of non-resident page {page}"),
        }
    }

    /// Reference bit of a resident page.
    ///
    /// # Panics
    ///
    /// Panics if `page` is not resident.
    pub fn is_referenced(&self, page: Page) -> bool {
        let Some(&(list, id)) = self.index.get(&page) else {
            panic!("reference bit of non-resident page {page}");
        };
        match self.clock(list).get(id) {
            Some(entry) => entry.referenced,
            None => panic!("page {page} indexed but not linked"),
        }
    }

    pub fn is_ghost(&self, page: Page) -> bool {
        self.b1.contains(page) || self.b2.contains(page)
    }

    /// `T1` from the clock head to the tail.
    pub fn t1_pages(&self) -> Vec<Page> {
        self.t1.iter().map(|entry| entry.page).collect()
    }

    /// `T2` from the clock head to the tail.
    pub fn t2_pages(&self) -> Vec<Page> {
        self.t2.iter().map(|entry| entry.page).collect()
    }

    /// `B1` from MRU to LRU.
    pub fn b1_pages(&self) -> Vec<Page> {
        self.b1.iter().collect()
    }

    /// `B2` from MRU to LRU.
    pub fn b2_pages(&self) -> Vec<Page> {
        self.b2.iter().collect()
    }

    fn clock(&self, list: CarList) -> &IntrusiveList<ClockEntry> {
        match list {
            CarList::T1 => &self.t1,
            CarList::T2 => &self.t2,
        }
    }

    fn clock_mut(&mut self, list: CarList) -> &mut IntrusiveList<ClockEntry> {
        match list {
            CarList::T1 => &mut self.t1,
            CarList::T2 => &mut self.t2,
        }
    }

    fn directory_size(&self) -> usize {
        self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len()
    }

    fn append(&mut self, list: CarList, page: Page) {
        let id = self.clock_mut(list).push_back(ClockEntry {
            page,
            referenced: false,
        });
        self.index.insert(page, (list, id));
    }

    /// Scans the clocks until an unreferenced head is found, demotes it into
    /// the matching ghost list and returns it.
    fn replace(&mut self) -> Option<Page> {
        loop {
            if self.t1.is_empty() && self.t2.is_empty() {
                return None;
            }
            let target = self.p.max(1.0) as usize;
            let from = if self.t2.is_empty() || self.t1.len() >= target {
                CarList::T1
            } else {
                CarList::T2
            };

            let entry = self.clock_mut(from).pop_front()?;
            if !entry.referenced {
                self.index.remove(&entry.page);
                match from {
                    CarList::T1 => self.b1.record(entry.page),
                    CarList::T2 => self.b2.record(entry.page),
                };
                return Some(entry.page);
            }
            self.append(CarList::T2, entry.page);
        }
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

impl TrackedPolicy for CarCore {
    fn name(&self) -> &'static str {
        "CAR"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn consume_tracked(&mut self, page: Page, limit: usize) -> Option<Page> {
        if let Some(&(list, id)) = self.index.get(&page) {
            if let Some(entry) = self.clock_mut(list).get_mut(id) {
                entry.referenced = true;
            }
            return None;
        }

        // Read before replace(): a demotion may overflow and trim a ghost list.
        let ghost_hit = if self.b1.contains(page) {
            Some(CarList::T1)
        } else if self.b2.contains(page) {
            Some(CarList::T2)
        } else {
            None
        };

        let evicted = if self.t1.len() + self.t2.len() >= limit {
            self.replace()
        } else {
            None
        };

        match ghost_hit {
            Some(CarList::T1) => {
                let delta = (self.b2.len() as f64 / self.b1.len() as f64).max(1.0);
                self.p = (self.p + delta).min(self.capacity as f64);
                self.b1.remove(page);
                self.append(CarList::T2, page);
            },
            Some(CarList::T2) => {
                let delta = (self.b1.len() as f64 / self.b2.len() as f64).max(1.0);
                self.p = (self.p - delta).max(0.0);
                self.b2.remove(page);
                self.append(CarList::T2, page);
            },
            None => {
                if self.t1.len() + self.b1.len() >= self.capacity {
                    self.b1.pop_lru();
                } else if self.directory_size() >= 2 * self.capacity {
                    self.b2.pop_lru();
                }
                self.append(CarList::T1, page);
            },
        }
        evicted
    }

    fn is_tracked_fault(&self, page: Page) -> bool {
        !self.index.contains_key(&page)
    }

    fn evict_from_tracked(&mut self) -> Option<Page> {
        self.replace()
    }

    fn tracked_size(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    fn resident_pages(&self) -> Vec<Page> {
        self.t1
            .iter()
            .chain(self.t2.iter())
            .map(|entry| entry.page)
            .collect()
    }

    /// Per clock, unreferenced pages before referenced ones; `T1` before `T2`.
    fn temperature_order(&self) -> Vec<Page> {
        let mut pages = Vec::with_capacity(self.tracked_size());
        for clock in [&self.t1, &self.t2] {
            for referenced in [false, true] {
                pages.extend(
                    clock
                        .iter()
                        .filter(|entry| entry.referenced == referenced)
                        .map(|entry| entry.page),
                );
            }
        }
        pages
    }

    fn reorders(&self, page: Page) -> bool {
        match self.index.get(&page) {
            Some(&(list, id)) => !self.clock(list).get(id).is_some_and(|entry| entry.referenced),
            None => true,
        }
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        let c = self.capacity;
        let (t1, t2, b1, b2) = (self.t1.len(), self.t2.len(), self.b1.len(), self.b2.len());

        if t1 + t2 != self.index.len() {
            return Err(InvariantError::new(format!(
                "CAR index holds {} pages but T1 + T2 = {}",
                self.index.len(),
                t1 + t2
            )));
        }
        if t1 + t2 > c {
            return Err(InvariantError::new(format!("CAR |T1|+|T2| = {} > {c}", t1 + t2)));
        }
        if t1 + b1 > c {
            return Err(InvariantError::new(format!("CAR |T1|+|B1| = {} > {c}", t1 + b1)));
        }
        if t1 + t2 + b1 + b2 > 2 * c {
            return Err(InvariantError::new(format!(
                "CAR directory size {} > {}",
                t1 + t2 + b1 + b2,
                2 * c
            )));
        }
        if !(0.0..=c as f64).contains(&self.p) {
            return Err(InvariantError::new(format!("CAR p = {} outside [0, {c}]", self.p)));
        }

        for kind in [CarList::T1, CarList::T2] {
            for entry in self.clock(kind).iter() {
                let page = entry.page;
                match self.index.get(&page) {
                    Some(&(indexed, id))
                        if indexed == kind
                            && self.clock(kind).get(id).map(|e| e.page) == Some(page) => {},
                    _ => {
                        return Err(InvariantError::new(format!(
                            "CAR {kind:?} page {page} is not indexed there"
                        )));
                    },
                }
                if self.is_ghost(page) {
                    return Err(InvariantError::new(format!(
                        "CAR page {page} is both resident and a ghost"
                    )));
                }
            }
        }
        if let Some(page) = self.b1.iter().find(|&page| self.b2.contains(page)) {
            return Err(InvariantError::new(format!("CAR ghost {page} is in B1 and B2")));
        }
        Ok(())
    }
}
