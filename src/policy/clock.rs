//! Generalized CLOCK replacement policy.
//!
//! Tracked pages live in a fixed ring of slots, each with an aging counter in
//! `[0, max_life]`. A hit resets the counter; a fault sweeps the hand forward,
//! decrementing counters until it reaches a page whose counter is already
//! zero, and replaces that page in place. `max_life = 1` is classic
//! second-chance CLOCK.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          ClockCore Layout                                   │
//! │                                                                             │
//! │   ring: ClockRing  (slots + FxHashMap<Page, usize> + hand)                  │
//! │                                                                             │
//! │    [0]       [1]       [2]       [3]                                        │
//! │   ┌─────┐   ┌─────┐   ┌─────┐   ┌─────┐                                     │
//! │   │ A:2 │   │ B:0 │   │ C:1 │   │ D:0 │         page:life                   │
//! │   └─────┘   └─────┘   └─────┘   └─────┘                                     │
//! │      ▲                                                                      │
//! │     hand                                                                    │
//! │                                                                             │
//! │   hit(C)   : C:1 → C:max_life          (never repositions)                  │
//! │   fault(E) : A:2 → A:1, hand → [1]; B:0 is the victim; E takes slot 1       │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! CONSUME(page, limit):
//!   if page resident: life = max_life; return
//!   if resident >= limit:
//!     loop:
//!       slot = ring[hand]
//!       if slot.life == 0: replace slot with page (life 0); hand += 1; return victim
//!       slot.life -= 1; hand += 1
//!   else:
//!     put page in next free slot (life 0)
//! ```
//!
//! Pages enter with life 0 and earn protection only through a later hit.
//!
//! ## Example
//!
//! ```
//! use pagesim::page::Page;
//! use pagesim::policy::clock::ClockCore;
//! use pagesim::traits::TrackedPolicy;
//!
//! let (a, b, c) = (Page::from_raw(0x1000), Page::from_raw(0x2000), Page::from_raw(0x3000));
//! let mut clock = ClockCore::new(2, 1);
//! clock.consume_tracked(a, 2);
//! clock.consume_tracked(b, 2);
//! clock.consume_tracked(a, 2);
//!
//! assert_eq!(clock.consume_tracked(c, 2), Some(b));
//! assert_eq!(clock.name(), "CLOCK");
//! ```

use crate::ds::clock_ring::ClockRing;
use crate::error::{ConfigError, InvariantError};
use crate::page::Page;
use crate::traits::TrackedPolicy;

/// Generalized CLOCK over tracked pages.
#[derive(Debug)]
pub struct ClockCore {
    ring: ClockRing,
}

impl ClockCore {
    /// Creates a CLOCK policy with `max_life` aging steps.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `max_life` is zero. See [`try_new`](Self::try_new).
    pub fn new(capacity: usize, max_life: u8) -> Self {
        match Self::try_new(capacity, max_life) {
            Ok(clock) => clock,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a CLOCK policy, rejecting zero capacity or zero `max_life`.
    pub fn try_new(capacity: usize, max_life: u8) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        if max_life == 0 {
            return Err(ConfigError::new("CLOCK max_life must be > 0"));
        }
        Ok(Self {
            ring: ClockRing::new(capacity, max_life),
        })
    }

    pub fn max_life(&self) -> u8 {
        self.ring.max_life()
    }

    /// Remaining life of a tracked page.
    ///
    /// # Panics
    ///
    /// Panics if `page` is not tracked.
    pub fn life(&self, page: Page) -> u8 {
        match self.ring.life(page) {
            Some(life) => life,
            None => panic!("life of non-resident page {page}"),
        }
    }

    /// Current slot under the hand.
    pub fn hand(&self) -> usize {
        self.ring.hand()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.ring.debug_validate_invariants();
    }
}

impl TrackedPolicy for ClockCore {
    fn name(&self) -> &'static str {
        if self.ring.max_life() == 1 { "CLOCK" } else { "GCLOCK" }
    }

    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn consume_tracked(&mut self, page: Page, limit: usize) -> Option<Page> {
        if self.ring.touch(page) {
            return None;
        }
        self.ring.insert(page, limit)
    }

    fn is_tracked_fault(&self, page: Page) -> bool {
        !self.ring.contains(page)
    }

    fn evict_from_tracked(&mut self) -> Option<Page> {
        self.ring.pop_victim()
    }

    fn tracked_size(&self) -> usize {
        self.ring.len()
    }

    fn resident_pages(&self) -> Vec<Page> {
        self.ring.iter_from_hand().map(|(page, _)| page).collect()
    }

    /// Lower life first, then sweep position from the hand.
    fn temperature_order(&self) -> Vec<Page> {
        let mut pages: Vec<(Page, u8)> = self.ring.iter_from_hand().collect();
        pages.sort_by_key(|&(_, life)| life);
        pages.into_iter().map(|(page, _)| page).collect()
    }

    fn reorders(&self, page: Page) -> bool {
        self.ring.life(page) != Some(self.ring.max_life())
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        let max_life = self.ring.max_life();
        let mut seen = 0usize;
        for (page, life) in self.ring.iter_from_hand() {
            if life > max_life {
                return Err(InvariantError::new(format!(
                    "CLOCK life of {page} is {life} above max {max_life}"
                )));
            }
            if !self.ring.contains(page) {
                return Err(InvariantError::new(format!("CLOCK slot holds unindexed {page}")));
            }
            seen += 1;
        }
        if seen != self.ring.len() {
            return Err(InvariantError::new(format!(
                "CLOCK ring has {seen} occupied slots but indexes {}",
                self.ring.len()
            )));
        }
        Ok(())
    }
}
