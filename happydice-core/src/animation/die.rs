//! Per-die rotation state machine.
//!
//! Each die keeps the total rotation it has been given since it appeared and
//! only ever adds to it on the X and Y axes, so a renderer interpolating
//! between consecutive targets never sees the die spin backwards.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::easing::Easing;
use super::{Transition, LAND_DURATION, STAGGER};
use crate::dice::DieValue;

const FULL_TURN: f64 = 360.0;
const HALF_TURN: f64 = 180.0;

/// Minimum tumble on the horizontal axes; a random 0-360° is added on top.
const SPIN_BASE_XY: f64 = 720.0;
/// Minimum tumble on the tilt axis.
const SPIN_BASE_Z: f64 = 360.0;
const SPIN_JITTER: f64 = 360.0;

/// Cumulative rotation in degrees around each axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Rotation {
    pub const ZERO: Rotation = Rotation {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Interpolate toward `other`. `t` is not clamped so overshoot curves work.
    pub fn lerp(self, other: Rotation, t: f64) -> Rotation {
        Rotation {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// CSS `transform` value for the die body.
    pub fn css_transform(&self) -> String {
        format!(
            "rotateX({}deg) rotateY({}deg) rotateZ({}deg)",
            self.x, self.y, self.z
        )
    }
}

/// Which way the die is currently animating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Spinning,
    Landed,
}

/// The (X, Y) rotation that brings `value`'s face to the front.
///
/// Faces sit on the cube as front 1, back 6, right 3, left 4, top 5 and
/// bottom 2; rotating the body by the returned pair turns that face toward
/// the viewer.
pub fn face_target(value: DieValue) -> (f64, f64) {
    match value.get() {
        1 => (0.0, 0.0),
        6 => (0.0, 180.0),
        3 => (0.0, -90.0),
        4 => (0.0, 90.0),
        5 => (-90.0, 0.0),
        2 => (90.0, 0.0),
        other => unreachable!("DieValue out of range: {other}"),
    }
}

/// Smallest angle strictly ahead of `current` that is congruent to `target`
/// modulo 360, plus `extra_spins` whole turns.
///
/// When `current` already sits on the target a full turn is added, so the
/// result is never equal to `current`.
pub fn next_forward_angle(current: f64, target: f64, extra_spins: u32) -> f64 {
    let current_mod = current.rem_euclid(FULL_TURN);
    let target_mod = target.rem_euclid(FULL_TURN);

    let mut gap = target_mod - current_mod;
    if gap <= 0.0 {
        gap += FULL_TURN;
    }

    current + gap + FULL_TURN * f64::from(extra_spins)
}

/// Nearest whole turn to `current`, rounding up only when the remainder is
/// strictly more than half a turn.
pub fn level_angle(current: f64) -> f64 {
    let remainder = current % FULL_TURN;
    current - remainder + if remainder > HALF_TURN { FULL_TURN } else { 0.0 }
}

/// Animates one die between tumbling and resting on a face.
#[derive(Debug, Clone)]
pub struct DieAnimator {
    index: usize,
    rotation: Rotation,
    phase: Phase,
    value: DieValue,
    last: Option<Transition>,
}

impl DieAnimator {
    /// A die at rest showing 1, which needs no rotation.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            rotation: Rotation::ZERO,
            phase: Phase::Landed,
            value: DieValue::ONE,
            last: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The face this die last landed on.
    pub fn value(&self) -> DieValue {
        self.value
    }

    /// The most recent transition handed to the renderer.
    pub fn last_transition(&self) -> Option<&Transition> {
        self.last.as_ref()
    }

    /// Feed the shared `rolling` signal and the face to show at rest.
    ///
    /// Returns the new transition, or `None` when nothing changed.
    pub fn set_rolling<R: Rng>(
        &mut self,
        rolling: bool,
        value: DieValue,
        spin_duration: Duration,
        rng: &mut R,
    ) -> Option<Transition> {
        let transition = match (rolling, self.phase) {
            (true, Phase::Spinning) => return None,
            (true, Phase::Landed) => self.spin(spin_duration, rng),
            (false, Phase::Landed) if value == self.value && self.last.is_some() => return None,
            (false, _) => self.land(value),
        };
        self.last = Some(transition.clone());
        Some(transition)
    }

    fn spin<R: Rng>(&mut self, duration: Duration, rng: &mut R) -> Transition {
        let from = self.rotation;
        self.rotation.x += SPIN_BASE_XY + rng.gen::<f64>() * SPIN_JITTER;
        self.rotation.y += SPIN_BASE_XY + rng.gen::<f64>() * SPIN_JITTER;
        self.rotation.z += SPIN_BASE_Z + rng.gen::<f64>() * SPIN_JITTER;
        self.phase = Phase::Spinning;

        Transition {
            from,
            to: self.rotation,
            easing: Easing::EaseIn,
            duration,
            delay: STAGGER * self.index as u32,
        }
    }

    fn land(&mut self, value: DieValue) -> Transition {
        let from = self.rotation;
        let (target_x, target_y) = face_target(value);

        self.rotation = Rotation {
            x: next_forward_angle(from.x, target_x, 0),
            y: next_forward_angle(from.y, target_y, 0),
            z: level_angle(from.z),
        };
        self.phase = Phase::Landed;
        self.value = value;

        Transition {
            from,
            to: self.rotation,
            easing: Easing::Overshoot,
            duration: LAND_DURATION,
            delay: Duration::ZERO,
        }
    }
}
