//! Clock-sweep ring with per-page aging counters.
//!
//! Fixed-size slot array plus a hand. Each resident page carries a life
//! counter in `[0, max_life]`. References reset the counter to `max_life`;
//! the sweep decrements every counter it passes and evicts the first page
//! whose counter is already zero. `max_life = 1` is classic second-chance
//! CLOCK.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                           ClockRing                                  │
//!   │                                                                      │
//!   │   slots: Vec<Option<Entry>>        index: FxHashMap<Page, usize>     │
//!   │   hand ───────────────┐                                              │
//!   │                       ▼                                              │
//!   │   slot[0] = Entry { page: A, life: 2 }                               │
//!   │   slot[1] = Entry { page: B, life: 0 }                               │
//!   │   slot[2] = Entry { page: C, life: 1 }                               │
//!   │   slot[3] = None  (on the free stack)                                │
//!   │                                                                      │
//!   │   Sweep from hand:                                                   │
//!   │   [A life=2] -> life=1, advance                                      │
//!   │   [B life=0] -> victim, slot reused in place, hand moves past it     │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Notes
//! - Newly inserted pages start at life 0: a page earns protection from the
//!   sweep only by being referenced again after it entered the ring.
//! - The sweep always terminates: every pass lowers each visited counter.
//! - `debug_validate_invariants()` is available in debug/test builds.

use rustc_hash::FxHashMap;

use crate::page::Page;

#[derive(Debug, Clone, Copy)]
struct Entry {
    page: Page,
    life: u8,
}

#[derive(Debug)]
pub struct ClockRing {
    slots: Vec<Option<Entry>>,
    index: FxHashMap<Page, usize>,
    /// Free slot indices; popped lowest-first while the ring fills.
    free: Vec<usize>,
    hand: usize,
    max_life: u8,
}

impl ClockRing {
    /// Creates a ring with `capacity` slots. `max_life` must be at least 1.
    pub fn new(capacity: usize, max_life: u8) -> Self {
        debug_assert!(max_life >= 1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            free: (0..capacity).rev().collect(),
            hand: 0,
            max_life,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn max_life(&self) -> u8 {
        self.max_life
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, page: Page) -> bool {
        self.index.contains_key(&page)
    }

    pub fn hand(&self) -> usize {
        self.hand
    }

    /// Remaining life of `page`, or `None` if it is not in the ring.
    pub fn life(&self, page: Page) -> Option<u8> {
        let idx = *self.index.get(&page)?;
        self.slots[idx].map(|entry| entry.life)
    }

    /// Resets `page`'s counter to `max_life`; returns `false` if missing.
    ///
    /// The page keeps its slot: references age pages, they never move them.
    pub fn touch(&mut self, page: Page) -> bool {
        let Some(&idx) = self.index.get(&page) else {
            return false;
        };
        match self.slots[idx].as_mut() {
            Some(entry) => {
                entry.life = self.max_life;
                true
            },
            None => false,
        }
    }

    /// Inserts a page that is not yet in the ring.
    ///
    /// When `len() >= limit`, the sweep picks a victim whose slot is reused
    /// in place and the victim is returned. Otherwise the page takes the
    /// next free slot.
    pub fn insert(&mut self, page: Page, limit: usize) -> Option<Page> {
        debug_assert!(!self.contains(page));
        if self.len() >= limit.min(self.capacity()) {
            let idx = self.find_victim()?;
            let victim = self.slots[idx].replace(Entry { page, life: 0 })?;
            self.index.remove(&victim.page);
            self.index.insert(page, idx);
            self.advance_hand();
            return Some(victim.page);
        }

        let idx = self.free.pop()?;
        self.slots[idx] = Some(Entry { page, life: 0 });
        self.index.insert(page, idx);
        None
    }

    /// Sweeps to the next victim and frees its slot.
    pub fn pop_victim(&mut self) -> Option<Page> {
        let idx = self.find_victim()?;
        let victim = self.slots[idx].take()?;
        self.index.remove(&victim.page);
        self.free.push(idx);
        self.advance_hand();
        Some(victim.page)
    }

    /// Resident pages in sweep order starting at the hand.
    pub fn iter_from_hand(&self) -> impl Iterator<Item = (Page, u8)> + '_ {
        let cap = self.capacity();
        (0..cap).filter_map(move |offset| {
            self.slots[(self.hand + offset) % cap].map(|entry| (entry.page, entry.life))
        })
    }

    /// Advances the hand, decrementing counters, until it rests on a page
    /// whose counter is already zero. Returns that slot index.
    fn find_victim(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        loop {
            match self.slots[self.hand].as_mut() {
                Some(entry) if entry.life == 0 => return Some(self.hand),
                Some(entry) => entry.life -= 1,
                None => {},
            }
            self.advance_hand();
        }
    }

    fn advance_hand(&mut self) {
        self.hand = (self.hand + 1) % self.capacity().max(1);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(occupied, self.index.len());
        assert_eq!(occupied + self.free.len(), self.capacity());
        assert!(self.capacity() == 0 || self.hand < self.capacity());

        for (page, &idx) in &self.index {
            let entry = self.slots[idx].expect("index points to empty slot");
            assert_eq!(entry.page, *page);
            assert!(entry.life <= self.max_life);
        }
        for &idx in &self.free {
            assert!(self.slots[idx].is_none(), "free slot {idx} is occupied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> Page {
        Page::from_raw(n * 4096)
    }

    #[test]
    fn clock_ring_second_chance() {
        let mut ring = ClockRing::new(2, 1);
        assert_eq!(ring.insert(p(1), 2), None);
        assert_eq!(ring.insert(p(2), 2), None);
        assert!(ring.touch(p(1)));

        assert_eq!(ring.insert(p(3), 2), Some(p(2)));
        assert!(ring.contains(p(1)));
        assert!(ring.contains(p(3)));
        assert_eq!(ring.life(p(1)), Some(0));
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_untouched_pages_leave_in_fifo_order() {
        let mut ring = ClockRing::new(3, 1);
        for i in 1..=3 {
            ring.insert(p(i), 3);
        }
        assert_eq!(ring.insert(p(4), 3), Some(p(1)));
        assert_eq!(ring.insert(p(5), 3), Some(p(2)));
        assert_eq!(ring.insert(p(6), 3), Some(p(3)));
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_max_life_needs_several_sweeps() {
        let mut ring = ClockRing::new(2, 3);
        ring.insert(p(1), 2);
        ring.insert(p(2), 2);
        ring.touch(p(1));
        ring.touch(p(2));
        // Both at life 3: the sweep laps the ring three times before a zero.
        assert_eq!(ring.insert(p(3), 2), Some(p(1)));
        assert_eq!(ring.life(p(2)), Some(0));
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_limit_below_capacity_forces_sweep() {
        let mut ring = ClockRing::new(4, 1);
        ring.insert(p(1), 2);
        ring.insert(p(2), 2);
        assert_eq!(ring.insert(p(3), 2), Some(p(1)));
        assert_eq!(ring.len(), 2);
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_pop_victim_frees_slot() {
        let mut ring = ClockRing::new(2, 1);
        ring.insert(p(1), 2);
        ring.insert(p(2), 2);
        assert_eq!(ring.pop_victim(), Some(p(1)));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.insert(p(3), 2), None);
        assert_eq!(ring.len(), 2);
        ring.debug_validate_invariants();
    }

    #[test]
    fn clock_ring_empty_has_no_victim() {
        let mut ring = ClockRing::new(3, 1);
        assert_eq!(ring.pop_victim(), None);
        assert!(!ring.touch(p(1)));
        assert_eq!(ring.life(p(1)), None);
    }

    #[test]
    fn clock_ring_iter_starts_at_hand() {
        let mut ring = ClockRing::new(3, 1);
        for i in 1..=3 {
            ring.insert(p(i), 3);
        }
        ring.insert(p(4), 3);
        let order: Vec<_> = ring.iter_from_hand().map(|(page, _)| page).collect();
        assert_eq!(order, vec![p(2), p(3), p(4)]);
    }
}
