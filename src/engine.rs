//! Two-tier occupancy engine.
//!
//! An [`Engine`] owns a fixed page budget split between two containers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              Engine<P>                                      │
//! │                                                                             │
//! │   capacity ──────────────────────────────────────────────────────────┐      │
//! │                                                                      │      │
//! │   ┌──────────────────────────────┐   ┌──────────────────────────────┐│      │
//! │   │ untracked: Untracked (U)     │   │ policy: P (tracked)          ││      │
//! │   │  FIFO or seeded Random       │   │  LRU / LRU-K / CLOCK /       ││      │
//! │   │  pages from skipped accesses │   │  ARC / CAR residents + ghosts││      │
//! │   └──────────────────────────────┘   └──────────────────────────────┘│      │
//! │              |U|            +          tracked_size()        <= ─────┘      │
//! │                                                                             │
//! │   U ∩ tracked residents = ∅                                                 │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consume protocol
//!
//! ```text
//! consume(page, considered = false):
//!   hit (in U or tracked)   → nothing
//!   fault                   → if full: evict(); U.insert(page)
//!
//! consume(page, considered = true):
//!   U.erase(page)                             adopt a page already resident in U
//!   if fault and full and nothing is tracked  → U.evict()
//!   policy.consume_tracked(page, capacity - |U|)
//!
//! evict():
//!   U non-empty → U.evict()
//!   otherwise   → policy.evict_from_tracked()
//! ```
//!
//! The engine frees space on behalf of the untracked path. On the tracked
//! path the policy frees its own space, since only it knows which internal
//! list should shrink; `capacity - |U|` is the share it may fill.
//!
//! ## Example
//!
//! ```
//! use pagesim::engine::Engine;
//! use pagesim::page::Page;
//! use pagesim::policy::PolicyKind;
//! use pagesim::untracked::UntrackedEviction;
//!
//! let mut engine = Engine::try_new(2, PolicyKind::Lru, UntrackedEviction::Fifo).unwrap();
//! let (a, b, c) = (Page::from_raw(0x1000), Page::from_raw(0x2000), Page::from_raw(0x3000));
//!
//! engine.consume(a, false); // untracked
//! engine.consume(b, true);  // tracked
//! assert!(engine.is_full());
//!
//! // The engine evicts untracked pages first.
//! assert_eq!(engine.consume(c, false), Some(a));
//!
//! // A considered fault stays within the tracked share: one page, so LRU gives up `b`.
//! let d = Page::from_raw(0x4000);
//! assert_eq!(engine.consume(d, true), Some(b));
//! assert_eq!((engine.tracked_size(), engine.untracked_size()), (1, 1));
//! ```

use tracing::{debug, error, trace};

use crate::error::{ConfigError, InvariantError};
use crate::page::Page;
use crate::policy::{Policy, PolicyKind};
use crate::traits::{OccupancySet, TrackedPolicy};
use crate::untracked::{Untracked, UntrackedEviction};

/// A page-replacement engine: one tracked policy plus an untracked bucket.
#[derive(Debug)]
pub struct Engine<P: TrackedPolicy = Policy> {
    capacity: usize,
    untracked: Untracked,
    policy: P,
}

impl Engine<Policy> {
    /// Creates an engine running `kind` over `capacity` pages.
    pub fn try_new(
        capacity: usize,
        kind: PolicyKind,
        untracked: UntrackedEviction,
    ) -> Result<Self, ConfigError> {
        ConfigError::check_capacity(capacity)?;
        let policy = kind.build(capacity)?;
        Ok(Self::with_policy(policy, untracked))
    }

    /// Creates an engine, panicking on invalid parameters.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `kind` carries an invalid parameter.
    pub fn new(capacity: usize, kind: PolicyKind, untracked: UntrackedEviction) -> Self {
        match Self::try_new(capacity, kind, untracked) {
            Ok(engine) => engine,
            Err(e) => panic!("{}", e),
        }
    }

    /// The selector the tracked policy was built from.
    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }
}

impl<P: TrackedPolicy> Engine<P> {
    /// Wraps an already-built policy; the engine takes the policy's capacity.
    pub fn with_policy(policy: P, untracked: UntrackedEviction) -> Self {
        let capacity = policy.capacity();
        debug!(
            capacity,
            policy = policy.name(),
            untracked = untracked.name(),
            "engine created"
        );
        Self {
            capacity,
            untracked: Untracked::new(untracked, capacity),
            policy,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn untracked(&self) -> &Untracked {
        &self.untracked
    }

    /// Returns `true` if `page` is resident in neither tier.
    pub fn is_page_fault(&self, page: Page) -> bool {
        !self.untracked.contains(page) && self.policy.is_tracked_fault(page)
    }

    /// Processes one access and returns the page it evicted, if any.
    ///
    /// `considered` selects the tier: `false` keeps the page in the untracked
    /// bucket (only a fault changes state), `true` hands it to the tracked
    /// policy, adopting it out of the untracked bucket when it lives there.
    /// At most one page is evicted per call.
    pub fn consume(&mut self, page: Page, considered: bool) -> Option<Page> {
        if !considered {
            if !self.is_page_fault(page) {
                return None;
            }
            let evicted = if self.is_full() { self.evict() } else { None };
            self.untracked.insert(page);
            return evicted;
        }

        let adopted = self.untracked.erase(page);
        let mut evicted = None;
        if !adopted
            && self.policy.is_tracked_fault(page)
            && self.is_full()
            && self.policy.tracked_size() == 0
        {
            // Every page is untracked; the policy has nothing of its own to give up.
            evicted = self.evict_untracked();
        }

        let limit = self.capacity - self.untracked.len();
        let tracked_victim = self.policy.consume_tracked(page, limit);
        if let Some(victim) = tracked_victim {
            trace!(victim = %victim, source = "tracked", "evicted");
        }
        debug_assert!(
            evicted.is_none() || tracked_victim.is_none(),
            "consume evicted two pages"
        );
        evicted.or(tracked_victim)
    }

    /// Evicts one page, untracked first.
    ///
    /// Returns `None` only if the engine holds no pages.
    pub fn evict(&mut self) -> Option<Page> {
        if let Some(victim) = self.evict_untracked() {
            return Some(victim);
        }
        let victim = self.policy.evict_from_tracked();
        match victim {
            Some(page) => trace!(victim = %page, source = "tracked", "evicted"),
            None if self.is_full() => {
                error!(
                    capacity = self.capacity,
                    tracked = self.policy.tracked_size(),
                    policy = self.policy.name(),
                    "full engine found nothing to evict"
                );
                debug_assert!(!self.is_full(), "full engine found nothing to evict");
            },
            None => {},
        }
        victim
    }

    fn evict_untracked(&mut self) -> Option<Page> {
        let victim = self.untracked.evict()?;
        trace!(victim = %victim, source = "untracked", "evicted");
        Some(victim)
    }

    #[inline]
    pub fn tracked_size(&self) -> usize {
        self.policy.tracked_size()
    }

    #[inline]
    pub fn untracked_size(&self) -> usize {
        self.untracked.len()
    }

    /// Pages resident in either tier.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.tracked_size() + self.untracked_size()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.total_size() >= self.capacity
    }

    /// All resident pages: untracked first, then tracked in the policy's
    /// eviction order.
    pub fn resident_pages(&self) -> Vec<Page> {
        let mut pages = self.untracked.pages();
        pages.extend(self.policy.resident_pages());
        pages
    }

    /// Verifies the occupancy model and the policy's own invariants.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let total = self.total_size();
        if total > self.capacity {
            return Err(InvariantError::new(format!(
                "{} tracked + {} untracked exceeds capacity {}",
                self.tracked_size(),
                self.untracked_size(),
                self.capacity
            )));
        }
        if let Some(page) = self
            .untracked
            .pages()
            .into_iter()
            .find(|&page| !self.policy.is_tracked_fault(page))
        {
            return Err(InvariantError::new(format!(
                "{page} is both untracked and tracked"
            )));
        }
        self.policy.check_invariants()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(e) = self.check_invariants() {
            panic!("{e}");
        }
        self.untracked.debug_validate_invariants();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::arc::{ArcCore, ArcList};
    use crate::policy::lru::LruCore;

    fn p(n: u64) -> Page {
        Page::from_raw(n * 4096)
    }

    fn lru(capacity: usize) -> Engine {
        Engine::new(capacity, PolicyKind::Lru, UntrackedEviction::Fifo)
    }

    #[test]
    fn rejects_zero_capacity_and_bad_policy() {
        assert!(Engine::try_new(0, PolicyKind::Lru, UntrackedEviction::Fifo).is_err());
        assert!(
            Engine::try_new(4, PolicyKind::Clock { max_life: 0 }, UntrackedEviction::Fifo).is_err()
        );
    }

    #[test]
    fn unconsidered_fault_fills_untracked() {
        let mut engine = lru(2);
        assert!(engine.is_page_fault(p(1)));
        assert_eq!(engine.consume(p(1), false), None);
        assert!(!engine.is_page_fault(p(1)));
        assert_eq!(engine.untracked_size(), 1);
        assert_eq!(engine.tracked_size(), 0);

        // Hit on an untracked page changes nothing.
        assert_eq!(engine.consume(p(1), false), None);
        assert_eq!(engine.untracked_size(), 1);
    }

    #[test]
    fn unconsidered_hit_on_tracked_page_stays_tracked() {
        let mut engine = lru(2);
        engine.consume(p(1), true);
        assert_eq!(engine.consume(p(1), false), None);
        assert_eq!(engine.tracked_size(), 1);
        assert_eq!(engine.untracked_size(), 0);
    }

    #[test]
    fn untracked_pages_are_evicted_first() {
        let mut engine = lru(3);
        engine.consume(p(1), true);
        engine.consume(p(2), false);
        engine.consume(p(3), false);
        assert!(engine.is_full());

        assert_eq!(engine.consume(p(4), false), Some(p(2)));
        assert_eq!(engine.consume(p(5), false), Some(p(3)));
        assert_eq!(engine.consume(p(6), false), Some(p(4)));
        assert!(!engine.is_page_fault(p(1)));
        engine.debug_validate_invariants();
    }

    #[test]
    fn unconsidered_fault_falls_back_to_tracked_victim() {
        let mut engine = lru(2);
        engine.consume(p(1), true);
        engine.consume(p(2), true);
        assert_eq!(engine.consume(p(3), false), Some(p(1)));
        assert_eq!(engine.tracked_size(), 1);
        assert_eq!(engine.untracked_size(), 1);
    }

    #[test]
    fn considered_fault_evicts_within_tracked_share() {
        let mut engine = lru(3);
        engine.consume(p(1), false);
        engine.consume(p(2), true);
        engine.consume(p(3), true);

        // The tracked share is 2; the policy frees its own LRU page.
        assert_eq!(engine.consume(p(4), true), Some(p(2)));
        assert_eq!(engine.untracked_size(), 1);
        assert_eq!(engine.tracked_size(), 2);
        engine.debug_validate_invariants();
    }

    #[test]
    fn considered_fault_with_only_untracked_pages_evicts_untracked() {
        let mut engine = lru(2);
        engine.consume(p(1), false);
        engine.consume(p(2), false);
        assert_eq!(engine.consume(p(3), true), Some(p(1)));
        assert_eq!(engine.untracked_size(), 1);
        assert_eq!(engine.tracked_size(), 1);
        engine.debug_validate_invariants();
    }

    #[test]
    fn considered_access_adopts_untracked_page() {
        let mut engine = lru(2);
        engine.consume(p(1), false);
        engine.consume(p(2), false);

        assert_eq!(engine.consume(p(1), true), None);
        assert!(!engine.untracked().contains(p(1)));
        assert!(!engine.policy().is_tracked_fault(p(1)));
        assert_eq!(engine.total_size(), 2);
        engine.debug_validate_invariants();
    }

    #[test]
    fn evict_prefers_untracked_then_tracked() {
        let mut engine = lru(3);
        engine.consume(p(1), true);
        engine.consume(p(2), true);
        engine.consume(p(3), false);
        assert_eq!(engine.evict(), Some(p(3)));
        assert_eq!(engine.evict(), Some(p(1)));
        assert_eq!(engine.evict(), Some(p(2)));
        assert_eq!(engine.evict(), None);
        assert_eq!(engine.total_size(), 0);
    }

    #[test]
    fn resident_pages_lists_both_tiers() {
        let mut engine = lru(3);
        engine.consume(p(1), false);
        engine.consume(p(2), true);
        engine.consume(p(3), true);
        assert_eq!(engine.resident_pages(), vec![p(1), p(2), p(3)]);
    }

    #[test]
    fn with_policy_takes_policy_capacity() {
        let engine = Engine::with_policy(LruCore::new(5), UntrackedEviction::Random { seed: 7 });
        assert_eq!(engine.capacity(), 5);
        assert_eq!(
            engine.untracked().strategy(),
            UntrackedEviction::Random { seed: 7 }
        );
    }

    #[test]
    fn arc_engine_adopts_into_t1() {
        let mut engine = Engine::with_policy(ArcCore::new(3), UntrackedEviction::Fifo);
        engine.consume(p(1), false);
        engine.consume(p(1), true);
        assert_eq!(engine.policy().list_of(p(1)), ArcList::T1);
        engine.consume(p(1), true);
        assert_eq!(engine.policy().list_of(p(1)), ArcList::T2);
        engine.debug_validate_invariants();
    }

    #[test]
    fn adopting_an_arc_ghost_evicts_nothing() {
        let mut engine = Engine::with_policy(ArcCore::new(3), UntrackedEviction::Fifo);
        engine.consume(p(1), true);
        engine.consume(p(2), true);
        assert_eq!(engine.evict(), Some(p(1)));
        assert!(engine.policy().is_ghost(p(1)));

        // p(1) becomes resident again through the untracked tier.
        engine.consume(p(1), false);
        assert_eq!(engine.total_size(), 2);
        assert!(!engine.is_page_fault(p(1)));

        assert_eq!(engine.consume(p(1), true), None);
        assert_eq!(engine.total_size(), 2);
        assert_eq!(engine.policy().list_of(p(1)), ArcList::T2);
        assert!(!engine.is_page_fault(p(2)));
        engine.debug_validate_invariants();
    }

    #[test]
    fn policy_kind_round_trips() {
        let engine = Engine::new(4, PolicyKind::Clock { max_life: 2 }, UntrackedEviction::Fifo);
        assert_eq!(engine.policy_kind(), PolicyKind::Clock { max_life: 2 });
    }
}
