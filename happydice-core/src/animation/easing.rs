//! Timing curves for die transitions.
//!
//! Both curves are CSS-compatible cubic Béziers, so a web renderer can hand
//! the curve string straight to a `transition`, while native renderers call
//! [`Easing::sample`] every frame.

use serde::{Deserialize, Serialize};
use std::fmt;

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 40;
const EPSILON: f64 = 1e-7;

/// Timing curve applied to a rotation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Straight interpolation.
    Linear,
    /// Slow start, used while the dice tumble.
    EaseIn,
    /// Overshoots the target and settles back, used when a die lands.
    Overshoot,
}

impl Easing {
    /// Control points `(x1, y1, x2, y2)` of the curve.
    pub fn control_points(self) -> (f64, f64, f64, f64) {
        match self {
            Easing::Linear => (0.0, 0.0, 1.0, 1.0),
            Easing::EaseIn => (0.42, 0.0, 1.0, 1.0),
            Easing::Overshoot => (0.34, 1.56, 0.64, 1.0),
        }
    }

    /// Eased progress for linear progress `t` (clamped to 0..=1).
    ///
    /// The output may leave 0..=1 for curves with overshoot.
    pub fn sample(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 || self == Easing::Linear {
            return t;
        }
        let (x1, y1, x2, y2) = self.control_points();
        let s = solve_parameter(t, x1, x2);
        bezier(s, y1, y2)
    }

    /// CSS timing-function string.
    pub fn css(self) -> String {
        match self {
            Easing::Linear => "linear".to_string(),
            Easing::EaseIn => "ease-in".to_string(),
            Easing::Overshoot => {
                let (x1, y1, x2, y2) = self.control_points();
                format!("cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

/// One coordinate of a cubic Bézier anchored at 0 and 1.
fn bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_slope(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Find the curve parameter whose x coordinate equals `x`.
fn solve_parameter(x: f64, x1: f64, x2: f64) -> f64 {
    let mut s = x;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier(s, x1, x2) - x;
        if err.abs() < EPSILON {
            return s;
        }
        let slope = bezier_slope(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    // x(s) is monotonic for CSS curves (x1, x2 in 0..=1), so bisection converges.
    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..BISECTION_ITERATIONS {
        let value = bezier(s, x1, x2);
        if (value - x).abs() < EPSILON {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_fixed() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::Overshoot] {
            assert_eq!(easing.sample(0.0), 0.0);
            assert_eq!(easing.sample(1.0), 1.0);
            assert_eq!(easing.sample(-3.0), 0.0);
            assert_eq!(easing.sample(4.0), 1.0);
        }
    }

    #[test]
    fn test_linear_is_identity() {
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!((Easing::Linear.sample(t) - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bezier_solver_matches_curve() {
        let (x1, y1, x2, y2) = Easing::EaseIn.control_points();
        for i in 1..10 {
            let s = i as f64 / 10.0;
            let x = bezier(s, x1, x2);
            assert!((Easing::EaseIn.sample(x) - bezier(s, y1, y2)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ease_in_starts_slow() {
        assert!(Easing::EaseIn.sample(0.25) < 0.25);
        assert!(Easing::EaseIn.sample(0.5) < 0.5);
    }

    #[test]
    fn test_ease_in_is_monotonic() {
        let mut last = 0.0;
        for i in 1..=100 {
            let v = Easing::EaseIn.sample(i as f64 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_overshoot_passes_target() {
        let peak = (1..100)
            .map(|i| Easing::Overshoot.sample(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0, "landing curve should bounce past the face");
    }

    #[test]
    fn test_css_strings() {
        assert_eq!(Easing::EaseIn.css(), "ease-in");
        assert_eq!(Easing::Overshoot.css(), "cubic-bezier(0.34, 1.56, 0.64, 1)");
    }
}
