//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (arrival order of obstacle pairs)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod rect;
pub mod state;
pub mod tick;

pub use clock::FixedStep;
pub use collision::{PairHalf, first_hit, out_of_bounds, overlaps};
pub use rect::Rect;
pub use state::{
    Actor, ActorPose, GameEvent, ObstaclePair, Phase, Session, Snapshot, TerminalCause,
};
pub use tick::{TickInput, spawn_pair, tick};
