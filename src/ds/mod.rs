pub mod clock_ring;
pub mod ghost_list;
pub mod intrusive_list;
pub mod slot_arena;

pub use clock_ring::ClockRing;
pub use ghost_list::GhostList;
pub use intrusive_list::IntrusiveList;
pub use slot_arena::{SlotArena, SlotId};
