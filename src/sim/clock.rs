//! Fixed-step clock
//!
//! Turns variable frame time into a whole number of fixed ticks. Leftover
//! time carries to the next pump; a long stall releases at most
//! `MAX_SUBSTEPS` ticks so the simulation never tries to catch up forever.

use std::time::Duration;

use crate::consts::MAX_SUBSTEPS;

#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
    max_substeps: u32,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_substeps: MAX_SUBSTEPS,
        }
    }

    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps.max(1);
        self
    }

    /// Add elapsed time and return how many ticks are due
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            self.accumulator -= self.step;
            substeps += 1;
        }

        // Drop the backlog we refused to simulate
        if substeps == self.max_substeps && self.accumulator >= self.step {
            log::warn!(
                "Clock fell behind, dropping {:?} of simulation time",
                self.accumulator
            );
            self.accumulator = Duration::ZERO;
        }
        substeps
    }

    /// Time accumulated toward the next tick
    pub fn pending(&self) -> Duration {
        self.accumulator
    }

    pub fn clear(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}
