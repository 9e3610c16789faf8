//! The single authority for the page's scroll position.
//!
//! Native scroll events can arrive many times per frame. They only move the
//! smoothing target; `frame()` runs once per tick, integrates the damped
//! position, and notifies every subscriber at most once with the coalesced
//! result. When the scroll surface is detached, input is ignored and
//! `current_position()` keeps returning the last published value.

use reveal_config::ScrollConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::smooth::SmoothScroll;
use crate::animation::types::{Direction, IdSource, SubscriptionId};

/// Scroll position published once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    /// Offset of the viewport top from the document top, in pixels.
    pub y: f64,
    /// Pixels per millisecond over the last frame.
    pub velocity: f64,
    /// Direction of the last movement. `Forward` until the page first moves.
    pub direction: Direction,
    /// Provider frame this position was published in.
    pub frame: u64,
}

impl Default for ScrollPosition {
    fn default() -> Self {
        Self {
            y: 0.0,
            velocity: 0.0,
            direction: Direction::Forward,
            frame: 0,
        }
    }
}

/// Visible and scrollable extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub height: f64,
    pub content_height: f64,
}

impl Viewport {
    pub fn new(height: f64, content_height: f64) -> Self {
        Self {
            height,
            content_height,
        }
    }

    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.height).max(0.0)
    }
}

type Subscriber = Box<dyn FnMut(&ScrollPosition)>;

pub struct ScrollCoordinateProvider {
    smooth: SmoothScroll,
    viewport: Viewport,
    attached: bool,
    last: ScrollPosition,
    published: bool,
    frame: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    ids: IdSource,
}

impl fmt::Debug for ScrollCoordinateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollCoordinateProvider")
            .field("smooth", &self.smooth)
            .field("viewport", &self.viewport)
            .field("attached", &self.attached)
            .field("last", &self.last)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ScrollCoordinateProvider {
    /// Create a provider attached to a scroll surface of the given extent.
    pub fn new(config: ScrollConfig, viewport: Viewport) -> Self {
        Self {
            smooth: SmoothScroll::new(config),
            viewport,
            attached: true,
            last: ScrollPosition::default(),
            published: false,
            frame: 0,
            subscribers: Vec::new(),
            ids: IdSource::default(),
        }
    }

    /// Register a callback for every published position.
    pub fn subscribe(&mut self, callback: impl FnMut(&ScrollPosition) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.ids.next());
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the subscription was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Last published position. Never fails, even while detached.
    pub fn current_position(&self) -> ScrollPosition {
        self.last
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether input is waiting to be published.
    pub fn is_settled(&self) -> bool {
        !self.smooth.needs_update()
    }

    /// Native scroll event: the browser-level position moved to `y`.
    pub fn on_native_scroll(&mut self, y: f64) {
        if !self.attached {
            tracing::debug!(y, "scroll surface detached, ignoring native scroll");
            return;
        }
        self.smooth.scroll_to(y, self.viewport.max_scroll());
    }

    /// Wheel input, scaled by the configured multiplier.
    pub fn scroll_by(&mut self, delta: f64) {
        if !self.attached {
            tracing::debug!(delta, "scroll surface detached, ignoring wheel input");
            return;
        }
        self.smooth.scroll_by(delta);
    }

    /// New viewport extent. The target is clamped on the next frame.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Reattach the scroll surface, continuing from the last known position.
    pub fn attach(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.attached {
            self.attached = true;
            self.smooth.set_scroll(self.last.y);
        }
    }

    pub fn detach(&mut self) {
        self.attached = false;
        self.smooth.cancel();
    }

    /// Advance one frame. Publishes to every subscriber, once, when the
    /// position changed since the last publication (or on the first frame).
    pub fn frame(&mut self, dt_ms: f64) -> Option<ScrollPosition> {
        self.frame += 1;
        if !self.attached {
            return None;
        }

        let y = self.smooth.update(dt_ms, self.viewport.max_scroll());
        if self.published && y == self.last.y {
            return None;
        }

        let delta = y - self.last.y;
        let direction = if delta > 0.0 {
            Direction::Forward
        } else if delta < 0.0 {
            Direction::Reverse
        } else {
            self.last.direction
        };
        let velocity = if dt_ms > 0.0 { delta / dt_ms } else { 0.0 };

        self.last = ScrollPosition {
            y,
            velocity,
            direction,
            frame: self.frame,
        };
        self.published = true;

        tracing::trace!(y, velocity, frame = self.frame, "scroll position published");
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&self.last);
        }
        Some(self.last)
    }
}
