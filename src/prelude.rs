pub use crate::builder::{EngineBuilder, EngineConfig};
pub use crate::engine::Engine;
pub use crate::error::{ConfigError, InvariantError};
pub use crate::page::{Access, Direction, Page};
pub use crate::policy::arc::{ArcCore, ArcList};
pub use crate::policy::car::{CarCore, CarList};
pub use crate::policy::clock::ClockCore;
pub use crate::policy::lru::LruCore;
pub use crate::policy::lru_k::LrukCore;
pub use crate::policy::{Policy, PolicyKind};
pub use crate::sampling::{Consideration, Sampler};
pub use crate::simulation::{RunStats, Simulation, Step};
pub use crate::traits::{OccupancySet, TrackedPolicy};
pub use crate::untracked::{FifoSet, RandomSet, Untracked, UntrackedEviction};
