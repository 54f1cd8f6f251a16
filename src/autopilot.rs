//! Idle/demo mode: a controller that plays the game
//!
//! Tracks the nearest obstacle pair the actor has not cleared yet and flaps
//! whenever the next tick would put the actor's bottom edge too close to the
//! bottom of that pair's gap. With no pair ahead it holds the field center.

use crate::sim::Session;

#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Clearance kept above the bottom obstacle
    pub margin: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self { margin: 5.0 }
    }
}

impl Autopilot {
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    /// Lowest y the actor's top edge should reach before flapping
    pub fn floor_line(&self, session: &Session) -> f32 {
        let config = session.config();
        let actor = session.actor.rect();

        let target = session
            .pairs
            .iter()
            .find(|p| p.trailing_edge() >= actor.left());

        let gap_bottom = match target {
            Some(pair) => pair.gap_y + pair.gap_size,
            None => (config.field_height + config.gap_size) / 2.0,
        };
        gap_bottom - actor.height() - self.margin
    }

    /// Should the actor flap before the next tick?
    pub fn decide(&self, session: &Session) -> bool {
        if session.is_terminal() {
            return false;
        }
        let config = session.config();
        let predicted_top = session.actor.pos.y + session.actor.vel_y + config.gravity;
        predicted_top > self.floor_line(session)
    }
}
