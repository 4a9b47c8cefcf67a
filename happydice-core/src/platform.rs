//! Optional device capabilities.
//!
//! Connectivity checks, vibration and motion-sensor permission exist on some
//! platforms and not others. The engine only talks to these traits; hosts
//! without a capability use the no-op implementations here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reports whether the device believes it has network access.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Used when the host cannot tell; the remote call decides instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeOnline;

impl Connectivity for AssumeOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// A vibration pattern: alternating on/off durations, starting with on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticPattern(pub Vec<Duration>);

impl HapticPattern {
    /// Short single buzz when the dice leave the hand.
    pub fn roll_start() -> Self {
        Self(vec![Duration::from_millis(50)])
    }

    /// Double tap when the dice land.
    pub fn landing() -> Self {
        Self(vec![
            Duration::from_millis(20),
            Duration::from_millis(50),
            Duration::from_millis(20),
        ])
    }

    pub fn segments(&self) -> &[Duration] {
        &self.0
    }
}

/// Vibration motor, if the device has one.
pub trait Haptics: Send + Sync {
    fn pulse(&self, pattern: &HapticPattern);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn pulse(&self, _pattern: &HapticPattern) {}
}

/// Answer to a motion-sensor permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    Granted,
    Denied,
    /// The platform delivers motion events without asking.
    NotRequired,
}

impl Permission {
    pub fn allows_motion(self) -> bool {
        matches!(self, Permission::Granted | Permission::NotRequired)
    }
}

/// Gatekeeper for device-motion events.
#[async_trait]
pub trait MotionPermission: Send + Sync {
    async fn request(&self) -> Permission;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissionRequired;

#[async_trait]
impl MotionPermission for NoPermissionRequired {
    async fn request(&self) -> Permission {
        Permission::NotRequired
    }
}

/// Acceleration including gravity, in m/s². Axes the sensor left out are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Acceleration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Length of the vector, treating missing axes as zero.
    pub fn magnitude(&self) -> f64 {
        let x = self.x.unwrap_or(0.0);
        let y = self.y.unwrap_or(0.0);
        let z = self.z.unwrap_or(0.0);
        (x * x + y * y + z * z).sqrt()
    }
}

/// One device-motion event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub acceleration_including_gravity: Option<Acceleration>,
}

impl MotionSample {
    pub fn new(acceleration: Acceleration) -> Self {
        Self {
            acceleration_including_gravity: Some(acceleration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_ignores_missing_axes() {
        assert_eq!(Acceleration::new(3.0, 4.0, 0.0).magnitude(), 5.0);
        let partial = Acceleration {
            x: Some(6.0),
            y: None,
            z: Some(8.0),
        };
        assert_eq!(partial.magnitude(), 10.0);
    }

    #[test]
    fn test_permission_gate() {
        assert!(Permission::Granted.allows_motion());
        assert!(Permission::NotRequired.allows_motion());
        assert!(!Permission::Denied.allows_motion());
    }

    #[test]
    fn test_haptic_patterns() {
        assert_eq!(HapticPattern::roll_start().segments().len(), 1);
        assert_eq!(
            HapticPattern::landing().segments()[1],
            Duration::from_millis(50)
        );
    }

    #[tokio::test]
    async fn test_default_permission() {
        assert_eq!(NoPermissionRequired.request().await, Permission::NotRequired);
    }
}
