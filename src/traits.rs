//! # Engine Trait Seams
//!
//! Two contracts split the occupancy model in half:
//!
//! ```text
//!   ┌─────────────────────────────────────────────────────────────────────┐
//!   │                          Engine<P>                                  │
//!   │   capacity, untracked: impl OccupancySet, policy: P: TrackedPolicy  │
//!   │                                                                     │
//!   │   consume(page, considered=false) ──► OccupancySet (cheap bucket)   │
//!   │   consume(page, considered=true)  ──► TrackedPolicy (exact policy)  │
//!   └─────────────────────────────────────────────────────────────────────┘
//!
//!   OccupancySet                         TrackedPolicy
//!   ┌──────────────────────────┐         ┌────────────────────────────────┐
//!   │ contains(page) → bool    │         │ consume_tracked(page, limit)   │
//!   │ insert(page)   → bool    │         │   → Option<Page>               │
//!   │ erase(page)    → bool    │         │ is_tracked_fault(page) → bool  │
//!   │ evict()        → Option  │         │ evict_from_tracked() → Option  │
//!   │ len()          → usize   │         │ tracked_size() → usize         │
//!   └──────────────────────────┘         │ temperature_order() → Vec      │
//!                                        │ reorders(page) → bool          │
//!                                        └────────────────────────────────┘
//! ```
//!
//! Eviction results are always "no page" or "this page". Removal success on
//! [`OccupancySet::insert`]/[`OccupancySet::erase`] is a separate `bool`.

use crate::page::Page;

/// Capability set of the untracked occupancy containers.
///
/// All operations are O(1) expected.
pub trait OccupancySet {
    /// Returns `true` if `page` is a member.
    fn contains(&self, page: Page) -> bool;

    /// Inserts `page`; returns `false` if it was already present.
    fn insert(&mut self, page: Page) -> bool;

    /// Removes `page`; returns `false` if it was absent.
    fn erase(&mut self, page: Page) -> bool;

    /// Removes and returns a victim chosen by the container, or `None` if empty.
    fn evict(&mut self) -> Option<Page>;

    /// Number of member pages.
    fn len(&self) -> usize;

    /// Returns `true` if the container holds no pages.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The tracked half of the two-tier consume/evict protocol.
///
/// Implementations own their recency/frequency structures and free their own
/// space on the tracked path. `limit` is the number of live pages the policy
/// may hold for this call (`capacity - |untracked|`); ghost bounds are always
/// derived from the full capacity the policy was built with.
pub trait TrackedPolicy {
    /// Short policy name used in logs and reports (`"LRU"`, `"GCLOCK"`, ...).
    fn name(&self) -> &'static str;

    /// Capacity the policy was built with.
    fn capacity(&self) -> usize;

    /// Processes one considered reference to `page`.
    ///
    /// Returns the page evicted from the resident set, if any. At most one
    /// resident page is evicted per call. `limit` is always at least one.
    fn consume_tracked(&mut self, page: Page, limit: usize) -> Option<Page>;

    /// Returns `true` if `page` is not resident in the tracked structures.
    ///
    /// Ghost entries are not resident.
    fn is_tracked_fault(&self, page: Page) -> bool;

    /// Removes exactly one resident page from the tracked structures.
    ///
    /// Returns `None` only when nothing is tracked.
    fn evict_from_tracked(&mut self) -> Option<Page>;

    /// Number of resident pages held by the tracked structures.
    fn tracked_size(&self) -> usize;

    /// Resident pages, first-to-be-evicted first where the policy defines an
    /// order.
    fn resident_pages(&self) -> Vec<Page>;

    /// Resident pages ranked coldest first.
    ///
    /// A page's temperature is its index here. Clock-based policies rank by
    /// aging state before ring position, so this can differ from
    /// [`resident_pages`](Self::resident_pages).
    fn temperature_order(&self) -> Vec<Page> {
        self.resident_pages()
    }

    /// Returns `true` if a tracked consume of `page` would change the
    /// temperature order. Faults always do.
    fn reorders(&self, page: Page) -> bool;

    /// Checks the policy's own structural invariants.
    fn check_invariants(&self) -> Result<(), crate::error::InvariantError>;
}
