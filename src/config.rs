//! Simulation configuration
//!
//! Every tunable constant of a session lives here. A config is validated
//! before a session is built from it, so degenerate geometry (a gap taller
//! than the field, zero-sized actors) is reported to the caller instead of
//! being simulated.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Reasons a configuration is rejected
#[derive(Debug)]
pub enum ConfigError {
    /// A dimension, speed or period that must be strictly positive is not
    NonPositive { field: &'static str, value: f32 },
    /// A value is NaN or infinite
    NotFinite { field: &'static str },
    /// The gap plus its margins does not fit inside the field
    GapTooLarge {
        gap_size: f32,
        min_gap_offset: f32,
        field_height: f32,
    },
    /// The flap impulse must point up (negative y)
    ImpulseNotUpward { value: f32 },
    /// The actor does not fit the field at its start position
    ActorOutsideField { x: f32, y: f32 },
    /// The spawn threshold lies outside `[0, field_width]`
    SpawnThresholdOutOfRange { value: f32, field_width: f32 },
    /// Squash scale must lie in `(0, 1]`
    SquashScaleOutOfRange { value: f32 },
    /// Config file could not be read
    Io(std::io::Error),
    /// Config text is not valid JSON for a `SimConfig`
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositive { field, value } => {
                write!(f, "{field} must be positive (got {value})")
            }
            ConfigError::NotFinite { field } => write!(f, "{field} must be a finite number"),
            ConfigError::GapTooLarge {
                gap_size,
                min_gap_offset,
                field_height,
            } => write!(
                f,
                "gap of {gap_size} with {min_gap_offset} margins does not fit a field {field_height} high"
            ),
            ConfigError::ImpulseNotUpward { value } => {
                write!(f, "flap_impulse must be negative (got {value})")
            }
            ConfigError::ActorOutsideField { x, y } => {
                write!(f, "actor at ({x}, {y}) does not fit inside the field")
            }
            ConfigError::SpawnThresholdOutOfRange { value, field_width } => write!(
                f,
                "spawn_threshold {value} must lie within [0, {field_width}]"
            ),
            ConfigError::SquashScaleOutOfRange { value } => {
                write!(f, "squash_scale must lie in (0, 1] (got {value})")
            }
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Tunable constants for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,
    /// Tick period in milliseconds
    pub tick_ms: u64,

    // === Actor ===
    pub actor_x: f32,
    pub actor_start_y: f32,
    pub actor_width: f32,
    pub actor_height: f32,
    /// Added to vertical velocity every tick
    pub gravity: f32,
    /// Vertical velocity set by a flap (negative is up)
    pub flap_impulse: f32,

    // === Obstacles ===
    /// Leftward distance per tick
    pub obstacle_speed: f32,
    pub obstacle_width: f32,
    pub gap_size: f32,
    pub min_gap_offset: f32,
    pub spawn_threshold: f32,

    // === Presentation ===
    /// How long the squash lasts after a flap
    pub squash_ms: u64,
    pub squash_scale: f32,
    pub max_tilt_deg: f32,
    pub tilt_per_velocity: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            tick_ms: TICK_MS,

            actor_x: ACTOR_X,
            actor_start_y: ACTOR_START_Y,
            actor_width: ACTOR_WIDTH,
            actor_height: ACTOR_HEIGHT,
            gravity: GRAVITY,
            flap_impulse: FLAP_IMPULSE,

            obstacle_speed: OBSTACLE_SPEED,
            obstacle_width: OBSTACLE_WIDTH,
            gap_size: GAP_SIZE,
            min_gap_offset: MIN_GAP_OFFSET,
            spawn_threshold: SPAWN_THRESHOLD,

            squash_ms: SQUASH_MS,
            squash_scale: SQUASH_SCALE,
            max_tilt_deg: MAX_TILT_DEG,
            tilt_per_velocity: TILT_PER_VELOCITY,
        }
    }
}

impl SimConfig {
    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        // A struct of plain numbers always serializes
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every construction-time invariant
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("actor_x", self.actor_x),
            ("actor_start_y", self.actor_start_y),
            ("actor_width", self.actor_width),
            ("actor_height", self.actor_height),
            ("gravity", self.gravity),
            ("flap_impulse", self.flap_impulse),
            ("obstacle_speed", self.obstacle_speed),
            ("obstacle_width", self.obstacle_width),
            ("gap_size", self.gap_size),
            ("min_gap_offset", self.min_gap_offset),
            ("spawn_threshold", self.spawn_threshold),
            ("squash_scale", self.squash_scale),
            ("max_tilt_deg", self.max_tilt_deg),
            ("tilt_per_velocity", self.tilt_per_velocity),
        ];
        if let Some(&(field, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NotFinite { field });
        }

        let positives = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("actor_width", self.actor_width),
            ("actor_height", self.actor_height),
            ("obstacle_speed", self.obstacle_speed),
            ("obstacle_width", self.obstacle_width),
            ("gap_size", self.gap_size),
        ];
        if let Some(&(field, value)) = positives.iter().find(|(_, v)| *v <= 0.0) {
            return Err(ConfigError::NonPositive { field, value });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "tick_ms",
                value: 0.0,
            });
        }
        let non_negatives = [
            ("min_gap_offset", self.min_gap_offset),
            ("max_tilt_deg", self.max_tilt_deg),
        ];
        if let Some(&(field, value)) = non_negatives.iter().find(|(_, v)| *v < 0.0) {
            return Err(ConfigError::NonPositive { field, value });
        }

        if self.gap_size >= self.field_height
            || self.gap_size + 2.0 * self.min_gap_offset > self.field_height
        {
            return Err(ConfigError::GapTooLarge {
                gap_size: self.gap_size,
                min_gap_offset: self.min_gap_offset,
                field_height: self.field_height,
            });
        }

        if self.flap_impulse >= 0.0 {
            return Err(ConfigError::ImpulseNotUpward {
                value: self.flap_impulse,
            });
        }

        let fits_x = self.actor_x >= 0.0 && self.actor_x + self.actor_width <= self.field_width;
        let fits_y =
            self.actor_start_y >= 0.0 && self.actor_start_y <= self.field_height - self.actor_height;
        if !fits_x || !fits_y {
            return Err(ConfigError::ActorOutsideField {
                x: self.actor_x,
                y: self.actor_start_y,
            });
        }

        if self.spawn_threshold < 0.0 || self.spawn_threshold > self.field_width {
            return Err(ConfigError::SpawnThresholdOutOfRange {
                value: self.spawn_threshold,
                field_width: self.field_width,
            });
        }

        if self.squash_scale <= 0.0 || self.squash_scale > 1.0 {
            return Err(ConfigError::SquashScaleOutOfRange {
                value: self.squash_scale,
            });
        }

        Ok(())
    }

    /// Tick period as a `Duration`
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Number of ticks a flap squash lasts (rounded up, at least one)
    pub fn squash_ticks(&self) -> u32 {
        self.squash_ms.div_ceil(self.tick_ms).max(1) as u32
    }

    /// Inclusive range the top obstacle's height is drawn from
    pub fn gap_offset_range(&self) -> (f32, f32) {
        (
            self.min_gap_offset,
            self.field_height - self.gap_size - self.min_gap_offset,
        )
    }
}
