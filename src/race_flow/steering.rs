//! Steering wheel HUD. Cosmetic only, never feeds back into race logic.

use serde::{Deserialize, Serialize};

/// Input beyond which the wheel swings to full lock
const TURN_THRESHOLD: f32 = 0.5;
/// Wheel angle at full lock, in degrees
const FULL_LOCK_DEGREES: f32 = 90.0;
/// Easing rates (per second) toward full lock and back to centre
const TURN_RATE: f32 = 1.5;
const RECENTER_RATE: f32 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringWheel {
    degrees: f32,
}

impl SteeringWheel {
    /// Create a centred wheel
    pub fn new() -> Self {
        Self::default()
    }

    /// Ease the wheel toward the angle matching `turn_input`.
    /// Right turns rotate clockwise (negative degrees).
    pub fn update(&mut self, turn_input: f32, delta: f32) -> f32 {
        let (target, rate) = if turn_input > TURN_THRESHOLD {
            (-FULL_LOCK_DEGREES, TURN_RATE)
        } else if turn_input < -TURN_THRESHOLD {
            (FULL_LOCK_DEGREES, TURN_RATE)
        } else {
            (0.0, RECENTER_RATE)
        };
        let t = (delta * rate).clamp(0.0, 1.0);
        self.degrees += (target - self.degrees) * t;
        self.degrees
    }

    /// Current rotation in degrees
    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eases_toward_full_lock() {
        let mut wheel = SteeringWheel::new();
        let first = wheel.update(1.0, 0.1);
        assert_relative_eq!(first, -13.5, epsilon = 1e-4);
        for _ in 0..200 {
            wheel.update(1.0, 0.1);
        }
        assert_relative_eq!(wheel.degrees(), -90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_small_input_recenters() {
        let mut wheel = SteeringWheel::new();
        wheel.update(-1.0, 1.0);
        assert!(wheel.degrees() > 0.0);
        wheel.update(0.3, 0.2);
        assert_relative_eq!(wheel.degrees(), 0.0, epsilon = 1e-6);
    }
}
