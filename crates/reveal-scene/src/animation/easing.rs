//! Easing functions for timeline and micro-animation timing.
//!
//! Two families:
//! - CSS timing functions: linear, ease, ease-in/out, cubic-bezier, steps
//! - Power curves of degree n (in, out, in-out) and back-out with overshoot,
//!   the curves scroll-reveal sections are usually authored with
//!
//! The default is `PowerOut { power: 2 }`, a cubic deceleration.
//!
//! ```
//! use reveal_scene::animation::easing::EasingFunction;
//!
//! let ease = EasingFunction::default();
//! assert!(ease.evaluate(0.5) > 0.5);
//! ```

use serde::{Deserialize, Serialize};

/// Position for stepped easing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// Jump at the start of each interval.
    Start,
    /// Jump at the end of each interval.
    #[default]
    End,
}

/// Timing curve for tweens.
///
/// Maps linear progress in [0, 1] to eased progress. Back and bezier curves
/// may leave [0, 1] in between but always hit 0 and 1 at the ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    Linear,

    /// CSS `ease`, `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,
    /// CSS `ease-in`, `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// CSS `ease-out`, `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// CSS `ease-in-out`, `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,

    /// Custom cubic bezier curve with control points (x1, y1), (x2, y2).
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },

    /// Discrete jumps.
    Steps { count: u32, position: StepPosition },

    /// `t^(power + 1)`.
    PowerIn { power: u8 },
    /// `1 - (1 - t)^(power + 1)`: `power = 2` is the cubic ease-out.
    PowerOut { power: u8 },
    /// Symmetric in-out of the same degree.
    PowerInOut { power: u8 },

    /// Decelerates past the target then settles back.
    BackOut { overshoot: f32 },
}

impl Default for EasingFunction {
    fn default() -> Self {
        Self::PowerOut { power: 2 }
    }
}

impl EasingFunction {
    /// Evaluate the easing function at progress `t` (clamped to [0, 1]).
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => step_progress(*count, *position, t),
            Self::PowerIn { power } => power_in(*power, t),
            Self::PowerOut { power } => 1.0 - power_in(*power, 1.0 - t),
            Self::PowerInOut { power } => {
                if t < 0.5 {
                    power_in(*power, t * 2.0) / 2.0
                } else {
                    1.0 - power_in(*power, (1.0 - t) * 2.0) / 2.0
                }
            }
            Self::BackOut { overshoot } => back_out(*overshoot, t),
        }
    }

    /// Custom curve through control points (x1, y1) and (x2, y2).
    ///
    /// # Panics
    /// If either x coordinate lies outside [0, 1].
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2),
            "Bezier x values must be in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// `count` discrete jumps.
    ///
    /// # Panics
    /// If `count` is zero.
    pub fn steps(count: u32, position: StepPosition) -> Self {
        assert!(count >= 1, "Steps must be at least 1");
        Self::Steps { count, position }
    }
}

#[inline]
fn power_in(power: u8, t: f32) -> f32 {
    t.powi(power as i32 + 1)
}

/// `1 + (s + 1)(t - 1)^3 + s(t - 1)^2`
#[inline]
fn back_out(overshoot: f32, t: f32) -> f32 {
    if t >= 1.0 {
        return 1.0;
    }
    let u = t - 1.0;
    1.0 + (overshoot + 1.0) * u * u * u + overshoot * u * u
}

/// y of the unit cubic bezier at the point whose x is `progress`.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    match progress {
        p if p <= 0.0 => 0.0,
        p if p >= 1.0 => 1.0,
        p => bezier_component(y1, y2, bezier_param_at(x1, x2, p)),
    }
}

/// Newton-Raphson for the curve parameter whose x coordinate is `x`.
fn bezier_param_at(x1: f32, x2: f32, x: f32) -> f32 {
    const NEWTON_ITERATIONS: usize = 8;
    const TOLERANCE: f32 = 1e-6;

    let mut param = x;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier_component(x1, x2, param) - x;
        let slope = bezier_derivative(x1, x2, param);
        if err.abs() < TOLERANCE || slope.abs() < TOLERANCE {
            break;
        }
        param = (param - err / slope).clamp(0.0, 1.0);
    }
    param
}

/// One coordinate of the curve: 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_component(p1: f32, p2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

/// d/dt = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_derivative(p1: f32, p2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn step_progress(count: u32, position: StepPosition, t: f32) -> f32 {
    // Deserialized curves can still carry zero
    if count == 0 {
        return t;
    }
    let n = count as f32;
    let scaled = t * n;
    let jumps = match position {
        StepPosition::Start => scaled.ceil(),
        StepPosition::End => scaled.floor(),
    };
    jumps / n
}
