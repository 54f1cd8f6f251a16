//! Flappy Whale - simulation kernel for a flappy-style arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacle queue, collisions, scoring)
//! - `config`: Tunable constants with construction-time validation
//! - `driver`: Cancellable periodic tick source bound to a session
//! - `autopilot`: Simple flap controller for headless runs

pub mod autopilot;
pub mod config;
pub mod driver;
pub mod sim;

pub use config::{ConfigError, SimConfig};
pub use driver::{Driver, Ticker};
pub use sim::{GameEvent, Phase, Session, Snapshot, TerminalCause};

/// Game configuration constants
///
/// These are the workshop defaults; `SimConfig::default()` is built from them.
pub mod consts {
    /// Fixed tick period in milliseconds (50 Hz)
    pub const TICK_MS: u64 = 20;
    /// Maximum ticks a single clock pump may release (prevents spiral of death)
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Actor (whale) defaults
    pub const ACTOR_X: f32 = 50.0;
    pub const ACTOR_START_Y: f32 = 300.0;
    pub const ACTOR_WIDTH: f32 = 40.0;
    pub const ACTOR_HEIGHT: f32 = 30.0;
    pub const GRAVITY: f32 = 0.5;
    /// Velocity set by a flap (negative is up)
    pub const FLAP_IMPULSE: f32 = -10.0;

    /// Obstacle defaults
    pub const OBSTACLE_SPEED: f32 = 3.0;
    pub const OBSTACLE_WIDTH: f32 = 50.0;
    pub const GAP_SIZE: f32 = 150.0;
    /// Smallest distance between the gap and either field edge
    pub const MIN_GAP_OFFSET: f32 = 50.0;
    /// A new pair spawns once the newest pair's x drops below this
    pub const SPAWN_THRESHOLD: f32 = 200.0;

    /// Presentation
    pub const SQUASH_MS: u64 = 150;
    pub const SQUASH_SCALE: f32 = 0.8;
    pub const SQUASH_EASE: f32 = 0.2;
    pub const MAX_TILT_DEG: f32 = 30.0;
    pub const TILT_PER_VELOCITY: f32 = 3.0;
}
