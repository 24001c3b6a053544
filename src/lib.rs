//! pagesim: trace-driven page replacement simulation.
//!
//! An [`Engine`] holds a fixed page budget split between an exact tracked
//! policy (LRU, LRU-K, Generalized CLOCK, ARC, CAR) and a cheap untracked
//! bucket (FIFO or seeded Random) for accesses a sampling strategy skipped.
//! A [`Simulation`](simulation::Simulation) replays an access stream through
//! one engine and one [`Consideration`](sampling::Consideration) strategy.
//!
//! See `DESIGN.md` for the occupancy model and per-policy decisions.

pub mod builder;
pub mod ds;
pub mod engine;
pub mod error;
pub mod page;
pub mod policy;
pub mod prelude;
pub mod sampling;
pub mod simulation;
pub mod traits;
pub mod untracked;

pub use crate::ds::{ClockRing, GhostList, IntrusiveList, SlotArena, SlotId};
pub use crate::engine::Engine;
pub use crate::page::{Access, Direction, PAGE_SIZE, Page};
pub use crate::policy::{Policy, PolicyKind};
