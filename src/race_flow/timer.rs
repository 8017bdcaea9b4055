//! Timer - Race time limit
//!
//! The controller only starts, stops and queries the timer. Advancing it is
//! the host's job, once per frame, alongside the controller tick.

use serde::{Deserialize, Serialize};

/// Narrow interface the controller needs from the race timer
pub trait RaceTimer {
    fn start(&mut self);
    fn stop(&mut self);
    /// Whether the race has a time limit at all
    fn is_finite(&self) -> bool;
    /// Whether a finite time limit has run out
    fn is_over(&self) -> bool;
}

/// Countdown clock used by the headless server.
///
/// A clock built without a limit counts elapsed time but is never over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceClock {
    time_limit: Option<f32>,
    elapsed: f32,
    running: bool,
    over: bool,
}

impl RaceClock {
    /// Clock with a time limit in seconds
    pub fn limited(seconds: f32) -> Self {
        Self {
            time_limit: Some(seconds.max(0.0)),
            ..Self::unlimited()
        }
    }

    /// Clock without a time limit
    pub fn unlimited() -> Self {
        Self {
            time_limit: None,
            elapsed: 0.0,
            running: false,
            over: false,
        }
    }

    /// Advance by one frame
    pub fn update(&mut self, delta: f32) {
        if !self.running {
            return;
        }
        self.elapsed += delta;
        if let Some(limit) = self.time_limit {
            if self.elapsed >= limit {
                self.over = true;
            }
        }
    }

    /// Seconds counted while running
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds left, `None` without a limit
    pub fn remaining(&self) -> Option<f32> {
        self.time_limit.map(|limit| (limit - self.elapsed).max(0.0))
    }

    /// Check if the clock is counting
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for RaceClock {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl RaceTimer for RaceClock {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_finite(&self) -> bool {
        self.time_limit.is_some()
    }

    fn is_over(&self) -> bool {
        self.over
    }
}
