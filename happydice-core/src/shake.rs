//! Shake-to-roll detection.

use std::time::Duration;
use tokio::time::Instant;

use crate::platform::MotionSample;

/// Acceleration (m/s², gravity included) that counts as a shake, about 2.5 g.
pub const SHAKE_THRESHOLD: f64 = 25.0;

/// Minimum gap between two shake-triggered rolls.
pub const SHAKE_COOLDOWN: Duration = Duration::from_secs(1);

/// Turns a stream of motion samples into roll triggers.
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    threshold: f64,
    cooldown: Duration,
    last_trigger: Option<Instant>,
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ShakeDetector {
    pub fn new() -> Self {
        Self {
            threshold: SHAKE_THRESHOLD,
            cooldown: SHAKE_COOLDOWN,
            last_trigger: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Feed one sample. Returns true when it should start a roll.
    ///
    /// Samples are ignored while `rolling`, within the cooldown of the last
    /// trigger, or when the event carries no acceleration vector.
    pub fn observe(&mut self, sample: &MotionSample, now: Instant, rolling: bool) -> bool {
        let Some(acceleration) = sample.acceleration_including_gravity else {
            return false;
        };
        if acceleration.magnitude() <= self.threshold || rolling {
            return false;
        }
        if let Some(last) = self.last_trigger {
            if now.saturating_duration_since(last) <= self.cooldown {
                return false;
            }
        }
        self.last_trigger = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Acceleration;

    fn shake() -> MotionSample {
        MotionSample::new(Acceleration::new(20.0, 20.0, 9.8))
    }

    fn still() -> MotionSample {
        MotionSample::new(Acceleration::new(0.0, 0.0, 9.8))
    }

    #[test]
    fn test_threshold() {
        let mut detector = ShakeDetector::new();
        let now = Instant::now();
        assert!(!detector.observe(&still(), now, false));
        assert!(detector.observe(&shake(), now, false));
    }

    #[test]
    fn test_missing_vector_ignored() {
        let mut detector = ShakeDetector::new();
        assert!(!detector.observe(&MotionSample::default(), Instant::now(), false));
    }

    #[test]
    fn test_debounce() {
        let mut detector = ShakeDetector::new();
        let start = Instant::now();
        assert!(detector.observe(&shake(), start, false));
        assert!(!detector.observe(&shake(), start + Duration::from_millis(500), false));
        assert!(!detector.observe(&shake(), start + Duration::from_millis(1000), false));
        assert!(detector.observe(&shake(), start + Duration::from_millis(1001), false));
    }

    #[test]
    fn test_suppressed_while_rolling() {
        let mut detector = ShakeDetector::new();
        let start = Instant::now();
        assert!(!detector.observe(&shake(), start, true));
        // A suppressed sample does not start the cooldown.
        assert!(detector.observe(&shake(), start + Duration::from_millis(10), false));
    }

    #[test]
    fn test_custom_threshold() {
        let mut detector = ShakeDetector::new()
            .with_threshold(5.0)
            .with_cooldown(Duration::ZERO);
        assert!(detector.observe(&still(), Instant::now(), false));
    }
}
