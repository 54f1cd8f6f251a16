//! Fixed timestep simulation tick
//!
//! Core game loop that advances a session deterministically, one tick at a
//! time. A terminal tick stops early; later ticks are no-ops until reset.

use rand::Rng;

use super::collision::{first_hit, out_of_bounds};
use super::state::{GameEvent, Session, TerminalCause};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Flap (key press, pointer press, touch start)
    pub flap: bool,
    /// Re-initialize the session instead of stepping
    pub reset: bool,
}

/// Advance the session by one fixed timestep
///
/// Returns what happened, in order. Nothing changes while terminal.
pub fn tick(session: &mut Session, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if input.reset {
        session.reset();
        events.push(GameEvent::Reset);
        return events;
    }

    if session.is_terminal() {
        return events;
    }

    if input.flap {
        session.flap();
    }

    session.time_ticks += 1;
    let config = session.config();
    let gravity = config.gravity;
    let squash_scale = config.squash_scale;
    let speed = config.obstacle_speed;
    let field_height = config.field_height;
    let spawn_threshold = config.spawn_threshold;

    // Physics
    session.actor.integrate(gravity);
    session.actor.animate(squash_scale);

    // Scroll obstacles
    for pair in &mut session.pairs {
        pair.x -= speed;
    }

    // Collision
    let actor = session.actor.rect();
    if let Some((pair_id, half)) = first_hit(&actor, &session.pairs) {
        log::debug!("Actor hit {:?} obstacle of pair {}", half, pair_id);
        return finish(session, events, TerminalCause::Collision);
    }
    if out_of_bounds(&actor, field_height) {
        return finish(session, events, TerminalCause::OutOfBounds);
    }

    // Scoring: once per pair, after its trailing edge clears the actor
    for pair in &mut session.pairs {
        if !pair.passed && pair.trailing_edge() < actor.left() {
            pair.passed = true;
            session.score += 1;
            log::debug!("Passed pair {}: score {}", pair.id, session.score);
            events.push(GameEvent::Scored {
                pair_id: pair.id,
                score: session.score,
            });
        }
    }

    // Recycle pairs that left the field
    session.pairs.retain(|p| !p.is_offscreen());

    // Spawn
    let should_spawn = session
        .pairs
        .last()
        .is_none_or(|last| last.x < spawn_threshold);
    if should_spawn {
        events.push(spawn_pair(session));
    }

    events
}

fn finish(
    session: &mut Session,
    mut events: Vec<GameEvent>,
    cause: TerminalCause,
) -> Vec<GameEvent> {
    session.end_round(cause);
    events.push(GameEvent::Terminal {
        cause,
        score: session.score,
    });
    events
}

/// Append a new pair at the leading edge with a random gap offset
///
/// Offsets are whole field units so the two halves and the gap tile the
/// field height exactly.
pub fn spawn_pair(session: &mut Session) -> GameEvent {
    let (lo, hi) = session.config().gap_offset_range();
    let gap_y = session.rng.random_range(lo..=hi).floor().clamp(lo, hi);
    let x = session.config().field_width;
    let pair_id = session.push_pair(x, gap_y);
    log::debug!("Spawned pair {} with gap at {}", pair_id, gap_y);
    GameEvent::Spawned { pair_id, gap_y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::sim::state::Phase;

    fn session() -> Session {
        Session::new(SimConfig::default(), 12345).unwrap()
    }

    #[test]
    fn test_gravity_and_flap_example() {
        let mut s = session();
        let idle = TickInput::default();

        tick(&mut s, &idle);
        assert_eq!(s.actor.vel_y, 0.5);
        assert_eq!(s.actor.pos.y, 300.5);

        assert!(s.flap());
        assert_eq!(s.actor.vel_y, -10.0);

        tick(&mut s, &idle);
        assert_eq!(s.actor.vel_y, -9.5);
        assert_eq!(s.actor.pos.y, 291.0);
    }

    #[test]
    fn test_flap_input_applies_before_physics() {
        let mut s = session();
        tick(&mut s, &TickInput::default());
        tick(
            &mut s,
            &TickInput {
                flap: true,
                ..Default::default()
            },
        );
        assert_eq!(s.actor.vel_y, -9.5);
        assert_eq!(s.actor.pos.y, 291.0);
    }

    #[test]
    fn test_first_tick_spawns_pair() {
        let mut s = session();
        let events = tick(&mut s, &TickInput::default());
        assert_eq!(s.pairs.len(), 1);
        assert_eq!(s.pairs[0].x, 400.0);
        assert!(matches!(events.as_slice(), [GameEvent::Spawned { .. }]));
    }

    #[test]
    fn test_spawn_waits_for_threshold() {
        let mut s = session();
        s.push_pair(200.0, 100.0);
        // Moves to 197, which is past the threshold
        let events = tick(&mut s, &TickInput::default());
        assert_eq!(s.pairs.len(), 2);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Spawned { .. })));

        let mut s = session();
        s.push_pair(204.0, 100.0);
        // Moves to 201: not yet
        tick(&mut s, &TickInput::default());
        assert_eq!(s.pairs.len(), 1);
    }

    #[test]
    fn test_spawn_geometry_within_range() {
        let mut s = session();
        for _ in 0..50 {
            spawn_pair(&mut s);
        }
        for pair in &s.pairs {
            assert!(pair.gap_y >= 50.0 && pair.gap_y <= 400.0);
            assert_eq!(pair.top().height() + 150.0 + pair.bottom().height(), 600.0);
        }
    }

    #[test]
    fn test_collision_is_terminal() {
        let mut s = session();
        // Top obstacle spanning the actor's height, directly ahead
        s.push_pair(80.0, 450.0);
        let events = tick(&mut s, &TickInput::default());
        assert_eq!(s.phase, Phase::Terminal(TerminalCause::Collision));
        assert_eq!(
            events,
            vec![GameEvent::Terminal {
                cause: TerminalCause::Collision,
                score: 0
            }]
        );
    }

    #[test]
    fn test_out_of_bounds_is_terminal() {
        let mut s = session();
        s.actor.pos.y = 569.0;
        s.actor.vel_y = 1.0;
        tick(&mut s, &TickInput::default());
        assert_eq!(s.phase, Phase::Terminal(TerminalCause::OutOfBounds));

        let mut s = session();
        s.actor.pos.y = 5.0;
        s.actor.vel_y = -10.0;
        tick(&mut s, &TickInput::default());
        assert_eq!(s.phase, Phase::Terminal(TerminalCause::OutOfBounds));
    }

    #[test]
    fn test_terminal_is_sticky() {
        let mut s = session();
        s.push_pair(80.0, 450.0);
        tick(&mut s, &TickInput::default());
        assert!(s.is_terminal());

        let before = s.snapshot();
        for _ in 0..10 {
            let events = tick(
                &mut s,
                &TickInput {
                    flap: true,
                    ..Default::default()
                },
            );
            assert!(events.is_empty());
        }
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn test_reset_input_restarts() {
        let mut s = session();
        s.push_pair(80.0, 450.0);
        tick(&mut s, &TickInput::default());
        assert!(s.is_terminal());

        let events = tick(
            &mut s,
            &TickInput {
                reset: true,
                ..Default::default()
            },
        );
        assert_eq!(events, vec![GameEvent::Reset]);
        assert_eq!(s.phase, Phase::Running);
        assert!(s.pairs.is_empty());

        tick(&mut s, &TickInput::default());
        assert_eq!(s.actor.pos.y, 300.5);
    }

    #[test]
    fn test_score_once_per_pair() {
        let mut s = session();
        // Gap around the actor so it passes safely; trailing edge at 51
        s.push_pair(1.0, 250.0);

        let events = tick(&mut s, &TickInput::default());
        // Moves to -2, trailing edge 48 < 50
        assert_eq!(s.score, 1);
        assert!(events.contains(&GameEvent::Scored {
            pair_id: s.pairs[0].id,
            score: 1
        }));

        for _ in 0..5 {
            tick(&mut s, &TickInput::default());
        }
        assert_eq!(s.score, 1);
    }

    #[test]
    fn test_no_score_while_overlapping_edge() {
        let mut s = session();
        s.push_pair(3.0, 250.0);
        // Moves to 0, trailing edge 50 == actor x: not yet passed
        tick(&mut s, &TickInput::default());
        assert_eq!(s.score, 0);
        tick(&mut s, &TickInput::default());
        assert_eq!(s.score, 1);
    }

    #[test]
    fn test_offscreen_pairs_removed() {
        let mut s = session();
        s.push_pair(-48.0, 250.0);
        s.pairs[0].passed = true;
        tick(&mut s, &TickInput::default());
        // -51 + 50 = -1 < 0: gone; a fresh pair was spawned in its place
        assert_eq!(s.pairs.len(), 1);
        assert_eq!(s.pairs[0].x, 400.0);
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed produce identical runs
        let mut s1 = session();
        let mut s2 = session();
        let inputs = [
            TickInput::default(),
            TickInput {
                flap: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for _ in 0..40 {
            for input in &inputs {
                tick(&mut s1, input);
                tick(&mut s2, input);
            }
        }
        assert_eq!(s1.snapshot(), s2.snapshot());
    }
}
