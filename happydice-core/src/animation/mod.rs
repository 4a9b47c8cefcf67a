//! Roll-and-land animation for the dice on the table.
//!
//! The animation layer never decides outcomes. It is told when the table
//! starts and stops rolling and which face each die must land on, and it
//! produces [`Transition`]s a renderer can play back.

mod die;
mod easing;
mod tray;

pub use die::{face_target, level_angle, next_forward_angle, DieAnimator, Phase, Rotation};
pub use easing::Easing;
pub use tray::DiceTray;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time between a roll trigger and the reveal.
pub const DEFAULT_ROLL_DURATION: Duration = Duration::from_millis(800);

/// Landing runs on its own clock, independent of the roll duration.
pub const LAND_DURATION: Duration = Duration::from_millis(800);

/// Extra start delay per die index so the dice don't move in lockstep.
pub const STAGGER: Duration = Duration::from_millis(100);

/// A single animated move of one die body from one rotation to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Rotation,
    pub to: Rotation,
    pub easing: Easing,
    pub duration: Duration,
    pub delay: Duration,
}

impl Transition {
    /// Delay plus duration.
    pub fn total(&self) -> Duration {
        self.delay + self.duration
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.total()
    }

    /// Rotation to draw `elapsed` after the transition was issued.
    pub fn sample(&self, elapsed: Duration) -> Rotation {
        if elapsed <= self.delay {
            return self.from;
        }
        if self.duration.is_zero() || self.is_finished(elapsed) {
            return self.to;
        }
        let progress = (elapsed - self.delay).as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp(self.to, self.easing.sample(progress))
    }

    /// CSS `transition` value, e.g. `transform 800ms ease-in 100ms`.
    pub fn css_transition(&self) -> String {
        let mut css = format!(
            "transform {}ms {}",
            self.duration.as_millis(),
            self.easing.css()
        );
        if !self.delay.is_zero() {
            css.push_str(&format!(" {}ms", self.delay.as_millis()));
        }
        css
    }
}
