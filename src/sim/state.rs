//! Session state and core simulation types
//!
//! A `Session` owns everything one round needs: the actor, the obstacle
//! queue, score, phase and the seeded RNG that places gaps. Sessions are
//! independent values; nothing here is global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::config::{ConfigError, SimConfig};
use crate::consts::SQUASH_EASE;

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalCause {
    /// Actor overlapped an obstacle
    Collision,
    /// Actor left the vertical extent of the field
    OutOfBounds,
}

impl std::fmt::Display for TerminalCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalCause::Collision => f.write_str("collision"),
            TerminalCause::OutOfBounds => f.write_str("out of bounds"),
        }
    }
}

/// Two-state round machine; `Session::reset` is the only way back to `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Running,
    Terminal(TerminalCause),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminal(_))
    }
}

/// Something observable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new obstacle pair entered at the leading edge
    Spawned { pair_id: u32, gap_y: f32 },
    /// The actor cleared a pair
    Scored { pair_id: u32, score: u32 },
    /// The round ended
    Terminal { cause: TerminalCause, score: u32 },
    /// The session was re-initialized
    Reset,
}

/// The player-controlled whale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Top-left corner; x stays fixed
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity (positive is down)
    pub vel_y: f32,
    /// Presentation squash, eased toward its target each tick
    pub scale: f32,
    /// Ticks left before the squash target returns to 1.0
    pub squash_ticks: u32,
}

impl Actor {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            pos: Vec2::new(config.actor_x, config.actor_start_y),
            size: Vec2::new(config.actor_width, config.actor_height),
            vel_y: 0.0,
            scale: 1.0,
            squash_ticks: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    /// Integrate one tick of gravity: velocity first, then position
    #[inline]
    pub fn integrate(&mut self, gravity: f32) {
        self.vel_y += gravity;
        self.pos.y += self.vel_y;
    }

    /// Override velocity with the flap impulse and start a squash
    pub fn flap(&mut self, impulse: f32, squash_ticks: u32) {
        self.vel_y = impulse;
        self.squash_ticks = squash_ticks;
    }

    /// Ease the squash scale toward its current target
    pub fn animate(&mut self, squash_scale: f32) {
        let target = if self.squash_ticks > 0 {
            self.squash_ticks -= 1;
            squash_scale
        } else {
            1.0
        };
        self.scale += (target - self.scale) * SQUASH_EASE;
    }

    /// Nose tilt in degrees, proportional to velocity and clamped
    pub fn tilt_deg(&self, per_velocity: f32, max_deg: f32) -> f32 {
        (self.vel_y * per_velocity).clamp(-max_deg, max_deg)
    }
}

/// A top and bottom obstacle sharing x and width, with a gap between them
///
/// The pair is the unit of scoring: one `passed` flag, one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePair {
    pub id: u32,
    /// Left edge of both obstacles
    pub x: f32,
    pub width: f32,
    /// Height of the top obstacle, i.e. where the gap starts
    pub gap_y: f32,
    pub gap_size: f32,
    pub field_height: f32,
    /// Set once when the actor clears the pair
    pub passed: bool,
}

impl ObstaclePair {
    pub fn new(
        id: u32,
        x: f32,
        width: f32,
        gap_y: f32,
        gap_size: f32,
        field_height: f32,
    ) -> Self {
        Self {
            id,
            x,
            width,
            gap_y,
            gap_size,
            field_height,
            passed: false,
        }
    }

    /// Upper obstacle, from the field top down to the gap
    pub fn top(&self) -> Rect {
        Rect::new(self.x, 0.0, self.width, self.gap_y)
    }

    /// Lower obstacle, from the gap bottom down to the field bottom
    pub fn bottom(&self) -> Rect {
        let y = self.gap_y + self.gap_size;
        Rect::new(self.x, y, self.width, self.field_height - y)
    }

    /// Right edge; the pair is behind the actor once this is left of it
    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    /// Fully past the leading boundary of the field
    #[inline]
    pub fn is_offscreen(&self) -> bool {
        self.trailing_edge() < 0.0
    }
}

/// Actor pose as seen by a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorPose {
    pub rect: Rect,
    pub vel_y: f32,
    pub tilt_deg: f32,
    pub scale: f32,
}

/// Everything a rendering collaborator needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub actor: ActorPose,
    /// Obstacle boxes in arrival order, top then bottom for each pair
    pub obstacles: Vec<Rect>,
    pub score: u32,
    pub best: u32,
    pub terminal: bool,
    pub cause: Option<TerminalCause>,
}

/// One simulated game: actor, obstacle queue, score and phase
#[derive(Debug, Clone)]
pub struct Session {
    config: SimConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub actor: Actor,
    /// Obstacle queue in arrival order
    pub pairs: Vec<ObstaclePair>,
    pub score: u32,
    /// Best score across resets of this session
    pub best: u32,
    pub phase: Phase,
    /// Ticks simulated since the last reset
    pub time_ticks: u64,
    /// Next obstacle pair ID
    next_id: u32,
}

impl Session {
    /// Build a session from a validated config
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!("Session created with seed {}", seed);
        Ok(Self {
            actor: Actor::new(&config),
            rng: Pcg32::seed_from_u64(seed),
            config,
            seed,
            pairs: Vec::new(),
            score: 0,
            best: 0,
            phase: Phase::Running,
            time_ticks: 0,
            next_id: 1,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Allocate a new obstacle pair ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Apply the flap impulse; ignored once the round has ended
    pub fn flap(&mut self) -> bool {
        if self.is_terminal() {
            log::debug!("Flap ignored: round is over");
            return false;
        }
        self.actor
            .flap(self.config.flap_impulse, self.config.squash_ticks());
        true
    }

    /// Re-initialize the round: actor, obstacle queue, score and phase
    ///
    /// The RNG stream and the best score carry over.
    pub fn reset(&mut self) {
        log::info!("Restarting session (previous score {})", self.score);
        self.actor = Actor::new(&self.config);
        self.pairs.clear();
        self.score = 0;
        self.time_ticks = 0;
        self.phase = Phase::Running;
    }

    /// Append a pair whose top obstacle is `gap_y` high, at the leading edge
    ///
    /// `gap_y` is clamped so that neither obstacle has a negative height.
    pub fn push_pair(&mut self, x: f32, gap_y: f32) -> u32 {
        let max_gap_y = self.config.field_height - self.config.gap_size;
        let clamped = gap_y.clamp(0.0, max_gap_y);
        if clamped != gap_y {
            log::debug!("Gap offset {} clamped to {}", gap_y, clamped);
        }
        let gap_y = clamped;
        let id = self.next_entity_id();
        self.pairs.push(ObstaclePair::new(
            id,
            x,
            self.config.obstacle_width,
            gap_y,
            self.config.gap_size,
            self.config.field_height,
        ));
        id
    }

    /// Enter the terminal phase, keeping the best score current
    pub(crate) fn end_round(&mut self, cause: TerminalCause) {
        self.phase = Phase::Terminal(cause);
        self.best = self.best.max(self.score);
        log::info!(
            "Game over ({}): score {}, actor at ({}, {})",
            cause,
            self.score,
            self.actor.pos.x,
            self.actor.pos.y
        );
    }

    /// Obstacle boxes in arrival order, top then bottom for each pair
    pub fn obstacles(&self) -> impl Iterator<Item = Rect> + '_ {
        self.pairs.iter().flat_map(|p| [p.top(), p.bottom()])
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.time_ticks,
            actor: ActorPose {
                rect: self.actor.rect(),
                vel_y: self.actor.vel_y,
                tilt_deg: self
                    .actor
                    .tilt_deg(self.config.tilt_per_velocity, self.config.max_tilt_deg),
                scale: self.actor.scale,
            },
            obstacles: self.obstacles().collect(),
            score: self.score,
            best: self.best,
            terminal: self.is_terminal(),
            cause: match self.phase {
                Phase::Terminal(cause) => Some(cause),
                Phase::Running => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SimConfig::default(), 12345).unwrap()
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.actor.pos, Vec2::new(50.0, 300.0));
        assert_eq!(s.actor.vel_y, 0.0);
        assert!(s.pairs.is_empty());
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            gap_size: 700.0,
            ..Default::default()
        };
        assert!(Session::new(config, 1).is_err());
    }

    #[test]
    fn test_pair_geometry() {
        let pair = ObstaclePair::new(1, 400.0, 50.0, 50.0, 150.0, 600.0);
        let top = pair.top();
        let bottom = pair.bottom();
        assert_eq!(top, Rect::new(400.0, 0.0, 50.0, 50.0));
        assert_eq!(bottom.top(), 200.0);
        assert_eq!(bottom.height(), 400.0);
        assert_eq!(top.height() + pair.gap_size + bottom.height(), 600.0);
    }

    #[test]
    fn test_pair_offscreen() {
        let mut pair = ObstaclePair::new(1, -49.0, 50.0, 50.0, 150.0, 600.0);
        assert!(!pair.is_offscreen());
        pair.x = -50.0;
        // Trailing edge exactly at zero is still on the field boundary
        assert!(!pair.is_offscreen());
        pair.x = -50.5;
        assert!(pair.is_offscreen());
    }

    #[test]
    fn test_flap_ignored_when_terminal() {
        let mut s = session();
        assert!(s.flap());
        assert_eq!(s.actor.vel_y, -10.0);

        s.actor.vel_y = 2.0;
        s.end_round(TerminalCause::Collision);
        assert!(!s.flap());
        assert_eq!(s.actor.vel_y, 2.0);
    }

    #[test]
    fn test_reset_reinitializes_round() {
        let mut s = session();
        s.push_pair(100.0, 80.0);
        s.actor.pos.y = 10.0;
        s.actor.vel_y = 7.0;
        s.score = 4;
        s.time_ticks = 99;
        s.end_round(TerminalCause::OutOfBounds);
        assert_eq!(s.best, 4);

        s.reset();
        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.actor, Actor::new(s.config()));
        assert!(s.pairs.is_empty());
        assert_eq!(s.score, 0);
        assert_eq!(s.time_ticks, 0);
        assert_eq!(s.best, 4);
    }

    #[test]
    fn test_tilt_clamped() {
        let mut actor = Actor::new(&SimConfig::default());
        actor.vel_y = 5.0;
        assert_eq!(actor.tilt_deg(3.0, 30.0), 15.0);
        actor.vel_y = -10.0;
        assert_eq!(actor.tilt_deg(3.0, 30.0), -30.0);
        actor.vel_y = 20.0;
        assert_eq!(actor.tilt_deg(3.0, 30.0), 30.0);
    }

    #[test]
    fn test_squash_eases_back() {
        let mut actor = Actor::new(&SimConfig::default());
        actor.flap(-10.0, 2);
        actor.animate(0.8);
        assert!((actor.scale - 0.96).abs() < 1e-6);
        actor.animate(0.8);
        assert!(actor.scale < 0.96);
        assert_eq!(actor.squash_ticks, 0);
        let squeezed = actor.scale;
        actor.animate(0.8);
        assert!(actor.scale > squeezed);
    }

    #[test]
    fn test_snapshot_lists_obstacles_in_order() {
        let mut s = session();
        let first = s.push_pair(300.0, 60.0);
        let second = s.push_pair(400.0, 120.0);
        assert!(first < second);

        let snap = s.snapshot();
        assert_eq!(snap.obstacles.len(), 4);
        assert_eq!(snap.obstacles[0].left(), 300.0);
        assert_eq!(snap.obstacles[0].height(), 60.0);
        assert_eq!(snap.obstacles[1].top(), 210.0);
        assert_eq!(snap.obstacles[2].left(), 400.0);
        assert!(!snap.terminal);
        assert_eq!(snap.cause, None);
    }

    #[test]
    fn test_push_pair_clamps_gap_offset() {
        let mut s = Session::new(SimConfig::default(), 1).unwrap();
        s.push_pair(300.0, 500.0);
        s.push_pair(300.0, -20.0);

        let low = &s.pairs[0];
        assert_eq!(low.gap_y, 450.0);
        assert_eq!(low.bottom().height(), 0.0);
        assert_eq!(low.top().height() + 150.0 + low.bottom().height(), 600.0);

        let high = &s.pairs[1];
        assert_eq!(high.gap_y, 0.0);
        assert_eq!(high.top().height(), 0.0);
        assert_eq!(high.bottom().height(), 450.0);
    }
}
