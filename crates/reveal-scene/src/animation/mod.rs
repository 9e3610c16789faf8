//! Scroll-driven timelines and pointer micro-animations.
//!
//! This module provides:
//! - **Timelines**: Ordered, staggered property steps driven by a playhead
//! - **Controller**: At most one playback per timeline, frame-scheduled
//! - **Micro-animations**: Hover/focus tweens on the surface's overlay layer
//! - **Easing Functions**: CSS timing functions plus power and back curves
//! - **Events**: Trigger, timeline and interaction events in one ordered queue
//! - **Schema**: Declarative page and section descriptions
//!
//! # Architecture
//!
//! ```text
//! TimelineController
//!   └── Timeline (tweens laid out on a playhead)  → surface base layer
//!
//! InteractionMicroAnimator
//!   └── OverlayTween per (element, property)      → surface overlay layer
//! ```

pub mod controller;
pub mod easing;
pub mod events;
pub mod interpolate;
pub mod micro;
pub mod schema;
pub mod timeline;
pub mod types;

pub use controller::TimelineController;
pub use easing::{EasingFunction, StepPosition};
pub use events::{
    EventQueue, InteractionEvent, QueuedEvent, StageEvent, TimelineEvent, TriggerEvent,
    TriggerEventKind,
};
pub use interpolate::Interpolate;
pub use micro::{
    InteractionInput, InteractionMicroAnimator, InteractionSpec, InteractionState, MicroTweenSpec,
};
pub use schema::{
    ElementSpec, PageSpec, SectionSpec, SectionTimelineSpec, Threshold, TriggerSpec,
};
pub use timeline::{StepSpec, Timeline, TimelineSpec};
pub use types::{
    AnimatableProperty, AnimatableValue, AnimationState, Direction, ElementId, FrameRequestId,
    InteractionId, PropertySet, ScopeId, SubscriptionId, TimelineId, TriggerId,
};
