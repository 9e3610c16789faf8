//! Stage events for trigger, timeline and interaction lifecycles.
//!
//! Every component pushes into one `EventQueue` owned by the stage. The queue
//! stamps each event with a global sequence number and the frame it was
//! produced in, so hosts and tests can reason about ordering across
//! components after the fact.
//!
//! # Usage
//!
//! ```ignore
//! stage.tick(16.67);
//! for queued in stage.drain_events() {
//!     match queued.event {
//!         StageEvent::Trigger(t) if t.kind == TriggerEventKind::Enter => {
//!             println!("{} entered at frame {}", t.trigger, queued.frame);
//!         }
//!         StageEvent::Timeline(TimelineEvent::Completed { timeline }) => {
//!             println!("{} done", timeline);
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::types::{
    AnimatableProperty, AnimatableValue, Direction, ElementId, InteractionId, TimelineId,
    TriggerId,
};

/// Which boundary of a trigger window was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEventKind {
    Enter,
    Exit,
}

/// A trigger window flipped between inactive and active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub trigger: TriggerId,
    pub kind: TriggerEventKind,
    /// Scroll direction of the update that caused the flip.
    pub direction: Direction,
    /// Scroll position the window was evaluated against.
    pub position: f64,
}

/// Event emitted as a timeline's playhead moves.
///
/// `at_ms` is timeline-local: the nominal time of the boundary that was
/// crossed, independent of frame granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    /// A playback began in the given direction.
    Started {
        timeline: TimelineId,
        direction: Direction,
    },
    /// A tween left its start value.
    TweenStarted {
        timeline: TimelineId,
        step: usize,
        element: ElementId,
        at_ms: f64,
    },
    /// A tween reached its end value moving forward.
    TweenCompleted {
        timeline: TimelineId,
        step: usize,
        element: ElementId,
        at_ms: f64,
    },
    /// A tween returned to its start value moving in reverse.
    TweenReverted {
        timeline: TimelineId,
        step: usize,
        element: ElementId,
        at_ms: f64,
    },
    /// Forward playback finished; the timeline is `Active`.
    Completed { timeline: TimelineId },
    /// Reverse playback finished; the timeline is `Reversed`.
    Reversed { timeline: TimelineId },
    /// A playback was cancelled before finishing.
    Interrupted {
        timeline: TimelineId,
        playhead_ms: f64,
    },
}

impl TimelineEvent {
    pub fn timeline(&self) -> TimelineId {
        match self {
            Self::Started { timeline, .. }
            | Self::TweenStarted { timeline, .. }
            | Self::TweenCompleted { timeline, .. }
            | Self::TweenReverted { timeline, .. }
            | Self::Completed { timeline }
            | Self::Reversed { timeline }
            | Self::Interrupted { timeline, .. } => *timeline,
        }
    }

    /// Element the event concerns, for per-tween events.
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::TweenStarted { element, .. }
            | Self::TweenCompleted { element, .. }
            | Self::TweenReverted { element, .. } => Some(element),
            _ => None,
        }
    }
}

/// Event emitted by the micro-animation overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    /// An overlay tween started or was redirected toward a new target.
    Retargeted {
        interaction: InteractionId,
        element: ElementId,
        property: AnimatableProperty,
        to: AnimatableValue,
    },
    /// An overlay tween reached the timeline's base value and was removed.
    Settled {
        interaction: InteractionId,
        element: ElementId,
        property: AnimatableProperty,
    },
}

impl InteractionEvent {
    pub fn element(&self) -> &ElementId {
        match self {
            Self::Retargeted { element, .. } | Self::Settled { element, .. } => element,
        }
    }
}

/// Any event a stage produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum StageEvent {
    Trigger(TriggerEvent),
    Timeline(TimelineEvent),
    Interaction(InteractionEvent),
}

impl From<TriggerEvent> for StageEvent {
    fn from(event: TriggerEvent) -> Self {
        Self::Trigger(event)
    }
}

impl From<TimelineEvent> for StageEvent {
    fn from(event: TimelineEvent) -> Self {
        Self::Timeline(event)
    }
}

impl From<InteractionEvent> for StageEvent {
    fn from(event: InteractionEvent) -> Self {
        Self::Interaction(event)
    }
}

/// An event stamped with its position in the stage's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedEvent {
    /// Global, strictly increasing.
    pub seq: u64,
    pub frame: u64,
    /// Stage clock in milliseconds when the event was produced.
    pub time_ms: f64,
    pub event: StageEvent,
}

/// Queue for collecting stage events during a tick.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<QueuedEvent>,
    next_seq: u64,
    frame: u64,
    time_ms: f64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame and clock stamped onto subsequent events.
    pub fn begin_frame(&mut self, frame: u64, time_ms: f64) {
        self.frame = frame;
        self.time_ms = time_ms;
    }

    /// Push an event, returning its sequence number.
    pub fn push(&mut self, event: impl Into<StageEvent>) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.events.push_back(QueuedEvent {
            seq,
            frame: self.frame,
            time_ms: self.time_ms,
            event: event.into(),
        });
        seq
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<QueuedEvent> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = QueuedEvent> + '_ {
        self.events.drain(..)
    }

    pub fn peek(&self) -> Option<&QueuedEvent> {
        self.events.front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enter(id: u64) -> TriggerEvent {
        TriggerEvent {
            trigger: TriggerId(id),
            kind: TriggerEventKind::Enter,
            direction: Direction::Forward,
            position: 10.0,
        }
    }

    #[test]
    fn test_timeline_event_accessors() {
        let event = TimelineEvent::TweenCompleted {
            timeline: TimelineId(3),
            step: 1,
            element: ElementId::new("card-0"),
            at_ms: 700.0,
        };
        assert_eq!(event.timeline(), TimelineId(3));
        assert_eq!(event.element(), Some(&ElementId::new("card-0")));

        let done = TimelineEvent::Completed {
            timeline: TimelineId(3),
        };
        assert_eq!(done.element(), None);
    }

    #[test]
    fn test_queue_stamps_sequence_and_frame() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());

        queue.begin_frame(1, 16.0);
        let a = queue.push(enter(1));
        queue.begin_frame(2, 32.0);
        let b = queue.push(TimelineEvent::Completed {
            timeline: TimelineId(1),
        });
        assert!(a < b);
        assert_eq!(queue.len(), 2);

        let first = queue.pop().unwrap();
        assert_eq!(first.frame, 1);
        assert_eq!(first.time_ms, 16.0);
        assert!(matches!(first.event, StageEvent::Trigger(_)));

        let rest: Vec<_> = queue.drain().collect();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].frame, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sequence_survives_drain() {
        let mut queue = EventQueue::new();
        queue.push(enter(1));
        queue.clear();
        let seq = queue.push(enter(2));
        assert_eq!(seq, 2);
        assert_eq!(queue.peek().map(|e| e.seq), Some(2));
    }

    #[test]
    fn test_event_serialization() {
        let event = StageEvent::from(enter(7));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"source\":\"trigger\""));
        assert!(json.contains("\"kind\":\"enter\""));

        let parsed: StageEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);

        let event = StageEvent::from(InteractionEvent::Settled {
            interaction: InteractionId(2),
            element: ElementId::new("cta"),
            property: AnimatableProperty::Scale,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"settled\""));
        assert!(json.contains("\"property\":\"scale\""));
    }
}
