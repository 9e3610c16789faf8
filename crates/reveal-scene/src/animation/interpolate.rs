//! Interpolation for animatable values.
//!
//! Eased progress may leave [0, 1] (back-out overshoot), so every
//! implementation extrapolates linearly instead of clamping. Color channels
//! are the exception: they are clamped after mixing so an overshooting curve
//! never produces an out-of-gamut color.

use super::types::AnimatableValue;

/// Blending between two values of the same type.
pub trait Interpolate: Sized {
    /// Returns `self` at `t = 0.0` and `to` at `t = 1.0`.
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

impl Interpolate for f64 {
    #[inline]
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * f64::from(t)
    }
}

impl Interpolate for [f32; 4] {
    /// Per-channel mix of straight-alpha RGBA.
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        let mut out = [0.0; 4];
        for (i, channel) in out.iter_mut().enumerate() {
            *channel = (self[i] + (to[i] - self[i]) * t).clamp(0.0, 1.0);
        }
        out
    }
}

impl Interpolate for AnimatableValue {
    /// Both values must be of the same variant. On a mismatch the target is
    /// returned once `t` reaches 1 and `self` before that, so a badly shaped
    /// spec snaps instead of corrupting the surface.
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        match (self, to) {
            (Self::F64(from), Self::F64(target)) => Self::F64(from.interpolate(target, t)),
            (Self::Color(from), Self::Color(target)) => Self::Color(from.interpolate(target, t)),
            _ if t >= 1.0 => *to,
            _ => *self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-4, "{actual} != {expected}");
    }

    #[test]
    fn test_scalar_lerp() {
        for (t, expected) in [(0.0, 0.0), (0.25, 25.0), (1.0, 100.0)] {
            assert_close(0.0_f64.interpolate(&100.0, t), expected);
        }
    }

    #[test]
    fn test_scalar_follows_overshooting_curves() {
        // back-out easing pushes progress past 1
        assert_close(0.0_f64.interpolate(&100.0, 1.1), 110.0);
        assert_close(0.0_f64.interpolate(&100.0, -0.5), -50.0);
    }

    #[test]
    fn test_color_channels_blend_independently() {
        let blended = [1.0_f32, 0.0, 0.0, 1.0].interpolate(&[0.0, 0.0, 1.0, 1.0], 0.5);
        for (channel, expected) in blended.iter().zip([0.5, 0.0, 0.5, 1.0]) {
            assert_close(*channel as f64, expected);
        }
    }

    #[test]
    fn test_color_channels_stay_in_gamut() {
        let over = [0.0_f32; 4].interpolate(&[1.0; 4], 1.2);
        assert!(over.iter().all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn test_value_dispatches_on_kind() {
        let opacity = AnimatableValue::F64(0.0).interpolate(&AnimatableValue::F64(100.0), 0.5);
        assert_eq!(opacity.as_f64(), Some(50.0));

        let tint = AnimatableValue::Color([1.0, 0.0, 0.0, 1.0])
            .interpolate(&AnimatableValue::Color([0.0, 0.0, 1.0, 1.0]), 0.5);
        let tint = tint.as_color().expect("color stays a color");
        assert_close(tint[0] as f64, 0.5);
        assert_close(tint[2] as f64, 0.5);
    }

    #[test]
    fn test_mismatched_kinds_snap_at_end() {
        let from = AnimatableValue::F64(50.0);
        let to = AnimatableValue::Color([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(from.interpolate(&to, 0.5), from);
        assert_eq!(from.interpolate(&to, 1.0), to);
    }
}
