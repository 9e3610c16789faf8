//! Virtualized smooth scrolling.
//!
//! Native input only moves a target. Each frame the visible position covers a
//! fixed fraction of the remaining distance, scaled to the frame duration so
//! the feel does not depend on frame rate. The step never exceeds the
//! remaining distance, so the position converges without oscillating and
//! snaps once it is within `snap_epsilon`.

use reveal_config::ScrollConfig;

/// Nominal frame duration the `lerp` fraction is defined against.
const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Friction-damped scroll position.
///
/// Feed input with `scroll_to` / `scroll_by`, then call `update()` once per
/// frame to get the position to publish.
#[derive(Debug, Clone)]
pub struct SmoothScroll {
    config: ScrollConfig,
    /// Visible position
    current: f64,
    /// Where native input says the page is
    target: f64,
    /// Wheel deltas received since the last frame, batched
    pending_delta: f64,
}

impl Default for SmoothScroll {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

impl SmoothScroll {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            current: 0.0,
            target: 0.0,
            pending_delta: 0.0,
        }
    }

    pub fn set_config(&mut self, config: ScrollConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether the next `update()` can move the position.
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.current != self.target || self.pending_delta != 0.0
    }

    /// Jump immediately, dropping any motion in flight.
    pub fn set_scroll(&mut self, y: f64) {
        self.current = y;
        self.target = y;
        self.pending_delta = 0.0;
    }

    /// Move the target to an absolute position. Applied on the next frame.
    pub fn scroll_to(&mut self, target: f64, max_scroll: f64) {
        self.target = target.clamp(0.0, max_scroll);
        self.pending_delta = 0.0;
    }

    /// Move the target by a wheel delta (positive = down). Deltas received
    /// within one frame are batched.
    pub fn scroll_by(&mut self, delta: f64) {
        self.pending_delta += delta * self.config.multiplier;
    }

    /// Advance one frame of `dt_ms` and return the visible position.
    pub fn update(&mut self, dt_ms: f64, max_scroll: f64) -> f64 {
        if self.pending_delta != 0.0 {
            self.target = (self.target + self.pending_delta).clamp(0.0, max_scroll);
            self.pending_delta = 0.0;
        }
        self.target = self.target.min(max_scroll);

        if !self.config.smooth {
            self.current = self.target;
            return self.current;
        }

        let factor = damping_factor(self.config.lerp, dt_ms);
        self.current += (self.target - self.current) * factor;
        if (self.target - self.current).abs() < self.config.snap_epsilon {
            self.current = self.target;
        }
        self.current
    }

    /// Stop where the page currently is.
    pub fn cancel(&mut self) {
        self.target = self.current;
        self.pending_delta = 0.0;
    }

    pub fn reset(&mut self) {
        self.set_scroll(0.0);
    }
}

/// Fraction of the remaining distance covered in `dt_ms`, in [0, 1].
fn damping_factor(lerp: f64, dt_ms: f64) -> f64 {
    if dt_ms <= 0.0 {
        return 0.0;
    }
    let lerp = lerp.clamp(0.0, 1.0);
    (1.0 - (1.0 - lerp).powf(dt_ms / REFERENCE_FRAME_MS)).clamp(0.0, 1.0)
}
