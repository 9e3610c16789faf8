//! Timelines: ordered steps of property tweens driven by a playhead.
//!
//! This module provides:
//! - `StepSpec`: One step, the same property targets applied to a group of
//!   elements, optionally staggered
//! - `TimelineSpec`: Ordered steps plus timeline-wide defaults
//! - `Timeline`: Runtime state, laid out tweens and a playhead
//!
//! # Layout
//!
//! Steps are placed one after another. A step starts where the timeline so
//! far ends, shifted by its `offset_ms` (negative values overlap the previous
//! step). Within a step, element `i` starts `i * stagger_ms` later.
//!
//! ```text
//! step 0  fade      |=====|
//! step 1  card 0          |====|
//!         card 1            |====|        stagger 100ms
//!         card 2              |====|
//! ```
//!
//! # Playback
//!
//! Every tween's value is a pure function of the playhead, so reversing
//! mid-flight continues from exactly the values on screen. Forward playback
//! renders tweens in step order, reverse playback in the opposite order.

use serde::{Deserialize, Serialize};

use super::easing::EasingFunction;
use super::events::{EventQueue, TimelineEvent};
use super::interpolate::Interpolate;
use super::types::{
    AnimatableProperty, AnimatableValue, AnimationState, Direction, ElementId, PropertySet,
    TimelineId,
};
use crate::error::{Result, SceneError};
use crate::surface::VisualSurface;

fn default_step_duration() -> f64 {
    600.0
}

/// One step of a timeline.
///
/// # Example TOML
///
/// ```toml
/// targets = ["card-0", "card-1", "card-2"]
/// to = { opacity = 1.0, translate_y = 0.0 }
/// from = { opacity = 0.0, translate_y = 50.0 }
/// duration_ms = 800
/// offset_ms = -300
/// stagger_ms = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    /// Elements animated by this step, in stagger order.
    pub targets: Vec<ElementId>,

    /// Values at the end of the step.
    #[serde(default)]
    pub to: PropertySet,

    /// Values applied when the timeline is created. Properties left out
    /// start from whatever the surface holds when the step first renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PropertySet>,

    #[serde(default = "default_step_duration")]
    pub duration_ms: f64,

    /// Start relative to the end of the timeline so far.
    #[serde(default)]
    pub offset_ms: f64,

    /// Overrides the timeline's stagger for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger_ms: Option<f64>,

    /// Overrides the timeline's easing for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<EasingFunction>,
}

impl StepSpec {
    pub fn new<I, E>(targets: I, to: PropertySet) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            to,
            from: None,
            duration_ms: default_step_duration(),
            offset_ms: 0.0,
            stagger_ms: None,
            easing: None,
        }
    }

    pub fn with_from(mut self, from: PropertySet) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_offset(mut self, offset_ms: f64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    pub fn with_stagger(mut self, stagger_ms: f64) -> Self {
        self.stagger_ms = Some(stagger_ms);
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = Some(easing);
        self
    }
}

/// Ordered steps plus defaults shared by all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpec {
    #[serde(default)]
    pub name: String,

    /// Wait before the first step when playing forward from the start.
    #[serde(default)]
    pub delay_ms: f64,

    /// Default stagger for steps that do not set one.
    #[serde(default)]
    pub stagger_ms: f64,

    #[serde(default)]
    pub easing: EasingFunction,

    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

impl TimelineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_stagger(mut self, stagger_ms: f64) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// Reject timing and value shapes the runtime cannot play.
    pub fn validate(&self) -> Result<()> {
        let non_negative = |value: f64| value.is_finite() && value >= 0.0;
        if !non_negative(self.delay_ms) || !non_negative(self.stagger_ms) {
            return Err(SceneError::Spec(format!(
                "timeline `{}`: delay and stagger must be finite and non-negative",
                self.name
            )));
        }
        for (index, step) in self.steps.iter().enumerate() {
            if !non_negative(step.duration_ms)
                || !step.offset_ms.is_finite()
                || !step.stagger_ms.map_or(true, non_negative)
            {
                return Err(SceneError::Spec(format!(
                    "timeline `{}` step {}: invalid timing",
                    self.name, index
                )));
            }
            let mismatch = step
                .to
                .mismatched()
                .or_else(|| step.from.as_ref().and_then(PropertySet::mismatched));
            if let Some(property) = mismatch {
                return Err(SceneError::Spec(format!(
                    "timeline `{}` step {}: wrong value shape for `{}`",
                    self.name,
                    index,
                    property.name()
                )));
            }
        }
        Ok(())
    }
}

/// One element's share of a step.
#[derive(Debug, Clone)]
struct Tween {
    step: usize,
    element: ElementId,
    start_ms: f64,
    duration_ms: f64,
    to: PropertySet,
    from: Option<PropertySet>,
    easing: EasingFunction,
    /// Fixed the first time the tween leaves its start.
    start_values: Option<PropertySet>,
    /// Linear progress last rendered, in [0, 1].
    progress: f64,
}

impl Tween {
    fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    fn progress_at(&self, playhead_ms: f64, direction: Direction) -> f64 {
        if self.duration_ms <= 0.0 {
            let reached = match direction {
                Direction::Forward => playhead_ms >= self.start_ms,
                Direction::Reverse => playhead_ms > self.start_ms,
            };
            return if reached { 1.0 } else { 0.0 };
        }
        ((playhead_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    fn capture_start(&mut self, surface: &VisualSurface) -> &PropertySet {
        let element = &self.element;
        let from = &self.from;
        let to = &self.to;
        self.start_values.get_or_insert_with(|| {
            PropertySet(
                to.properties()
                    .map(|property| {
                        let value = from
                            .as_ref()
                            .and_then(|from| from.get(property).copied())
                            .unwrap_or_else(|| surface.base_or_default(element, property));
                        (property, value)
                    })
                    .collect(),
            )
        })
    }
}

/// Property values the surface held before a timeline first wrote them.
#[derive(Debug, Default)]
struct Originals(Vec<(ElementId, AnimatableProperty, Option<AnimatableValue>)>);

impl Originals {
    fn write(
        &mut self,
        surface: &mut VisualSurface,
        element: &ElementId,
        property: AnimatableProperty,
        value: AnimatableValue,
    ) -> Result<()> {
        let seen = self
            .0
            .iter()
            .any(|(e, p, _)| e == element && *p == property);
        let original = surface.base(element, property);
        surface.write_base(element, property, value)?;
        if !seen {
            self.0.push((element.clone(), property, original));
        }
        Ok(())
    }

    fn restore(&mut self, surface: &mut VisualSurface) {
        for (element, property, original) in self.0.drain(..).rev() {
            match original {
                Some(value) => {
                    if let Err(err) = surface.write_base(&element, property, value) {
                        tracing::debug!(%err, "nothing left to restore");
                    }
                }
                None => surface.clear_base(&element, property),
            }
        }
    }
}

/// Runtime state of one timeline. Owned and mutated only by the
/// `TimelineController`.
#[derive(Debug)]
pub struct Timeline {
    id: TimelineId,
    name: String,
    tweens: Vec<Tween>,
    duration_ms: f64,
    delay_ms: f64,
    delay_remaining_ms: f64,
    playhead_ms: f64,
    direction: Direction,
    state: AnimationState,
    originals: Originals,
}

impl Timeline {
    /// Lay out `spec` and apply every step's `from` values to the surface.
    pub fn new(id: TimelineId, spec: &TimelineSpec, surface: &mut VisualSurface) -> Result<Self> {
        spec.validate()?;

        let mut tweens = Vec::new();
        let mut end_so_far: f64 = 0.0;
        for (index, step) in spec.steps.iter().enumerate() {
            let step_start = (end_so_far + step.offset_ms).max(0.0);
            let stagger = step.stagger_ms.unwrap_or(spec.stagger_ms);
            let easing = step.easing.unwrap_or(spec.easing);
            for (i, element) in step.targets.iter().enumerate() {
                let tween = Tween {
                    step: index,
                    element: element.clone(),
                    start_ms: step_start + i as f64 * stagger,
                    duration_ms: step.duration_ms,
                    to: step.to.clone(),
                    from: step.from.clone(),
                    easing,
                    start_values: None,
                    progress: 0.0,
                };
                end_so_far = end_so_far.max(tween.end_ms());
                tweens.push(tween);
            }
        }

        let mut timeline = Self {
            id,
            name: spec.name.clone(),
            tweens,
            duration_ms: end_so_far,
            delay_ms: spec.delay_ms,
            delay_remaining_ms: 0.0,
            playhead_ms: 0.0,
            direction: Direction::Forward,
            state: AnimationState::Idle,
            originals: Originals::default(),
        };
        timeline.apply_initial_values(surface);
        Ok(timeline)
    }

    fn apply_initial_values(&mut self, surface: &mut VisualSurface) {
        for tween in &self.tweens {
            let Some(from) = &tween.from else { continue };
            for (property, value) in from.iter() {
                if let Err(err) = self.originals.write(surface, &tween.element, property, value) {
                    tracing::debug!(timeline = %self.id, element = %tween.element, %err, "initial value skipped");
                    break;
                }
            }
        }
    }

    pub fn id(&self) -> TimelineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn playhead_ms(&self) -> f64 {
        self.playhead_ms
    }

    /// Total length, excluding the start delay.
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Elements this timeline writes to, without duplicates.
    pub fn targets(&self) -> Vec<&ElementId> {
        let mut targets: Vec<&ElementId> = Vec::new();
        for tween in &self.tweens {
            if !targets.contains(&&tween.element) {
                targets.push(&tween.element);
            }
        }
        targets
    }

    /// Prepare a playback. Returns false when there is nothing to play:
    /// forward on an `Active` timeline, or reverse on one that never left
    /// its start.
    pub(crate) fn begin(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => {
                if self.state == AnimationState::Active {
                    return false;
                }
                if self.playhead_ms <= 0.0 {
                    self.delay_remaining_ms = self.delay_ms;
                }
                self.state = AnimationState::Entering;
            }
            Direction::Reverse => {
                if matches!(self.state, AnimationState::Idle | AnimationState::Reversed) {
                    return false;
                }
                self.delay_remaining_ms = 0.0;
                self.state = AnimationState::Exiting;
            }
        }
        self.direction = direction;
        true
    }

    /// Advance the playhead by `dt_ms` in the current direction and render.
    /// Returns true once the playhead reaches the end of that direction.
    pub(crate) fn advance(
        &mut self,
        dt_ms: f64,
        surface: &mut VisualSurface,
        events: &mut EventQueue,
    ) -> bool {
        let mut dt = dt_ms.max(0.0);
        match self.direction {
            Direction::Forward => {
                let waited = dt.min(self.delay_remaining_ms);
                self.delay_remaining_ms -= waited;
                dt -= waited;
                if self.delay_remaining_ms > 0.0 {
                    return false;
                }
                self.playhead_ms = (self.playhead_ms + dt).min(self.duration_ms);
            }
            Direction::Reverse => {
                self.playhead_ms = (self.playhead_ms - dt).max(0.0);
            }
        }
        self.render(surface, events);
        match self.direction {
            Direction::Forward => self.playhead_ms >= self.duration_ms,
            Direction::Reverse => self.playhead_ms <= 0.0,
        }
    }

    /// Move to the resting state of the direction just finished.
    pub(crate) fn finish(&mut self) {
        self.state = match self.direction {
            Direction::Forward => AnimationState::Active,
            Direction::Reverse => AnimationState::Reversed,
        };
    }

    /// Jump to `playhead_ms` and render, rendering as if moving in
    /// `direction`. Leaves the state alone.
    pub(crate) fn seek(
        &mut self,
        playhead_ms: f64,
        direction: Direction,
        surface: &mut VisualSurface,
        events: &mut EventQueue,
    ) {
        self.direction = direction;
        self.delay_remaining_ms = 0.0;
        self.playhead_ms = playhead_ms.clamp(0.0, self.duration_ms);
        self.render(surface, events);
    }

    pub(crate) fn set_state(&mut self, state: AnimationState) {
        self.state = state;
    }

    /// Restore every value this timeline changed and return to `Idle`.
    pub(crate) fn revert(&mut self, surface: &mut VisualSurface) {
        self.originals.restore(surface);
        for tween in &mut self.tweens {
            tween.start_values = None;
            tween.progress = 0.0;
        }
        self.playhead_ms = 0.0;
        self.delay_remaining_ms = 0.0;
        self.direction = Direction::Forward;
        self.state = AnimationState::Idle;
    }

    fn render(&mut self, surface: &mut VisualSurface, events: &mut EventQueue) {
        let order: Vec<usize> = match self.direction {
            Direction::Forward => (0..self.tweens.len()).collect(),
            Direction::Reverse => (0..self.tweens.len()).rev().collect(),
        };

        for index in order {
            let tween = &mut self.tweens[index];
            let progress = tween.progress_at(self.playhead_ms, self.direction);
            if progress == tween.progress {
                continue;
            }
            let previous = tween.progress;
            tween.progress = progress;

            if !surface.is_attached(&tween.element) {
                tracing::debug!(
                    timeline = %self.id,
                    step = tween.step,
                    element = %tween.element,
                    "step target missing, skipped"
                );
                continue;
            }

            let start = tween.capture_start(surface).clone();
            let eased = tween.easing.evaluate(progress as f32);
            for (property, target) in tween.to.iter() {
                let from = start
                    .get(property)
                    .copied()
                    .unwrap_or_else(|| property.default_value());
                let value = if progress >= 1.0 {
                    target
                } else if progress <= 0.0 {
                    from
                } else {
                    from.interpolate(&target, eased)
                };
                if let Err(err) = self.originals.write(surface, &tween.element, property, value) {
                    tracing::debug!(timeline = %self.id, %err, "step write skipped");
                }
            }

            if previous == 0.0 && progress > 0.0 {
                events.push(TimelineEvent::TweenStarted {
                    timeline: self.id,
                    step: tween.step,
                    element: tween.element.clone(),
                    at_ms: tween.start_ms,
                });
            }
            if previous < 1.0 && progress >= 1.0 {
                events.push(TimelineEvent::TweenCompleted {
                    timeline: self.id,
                    step: tween.step,
                    element: tween.element.clone(),
                    at_ms: tween.end_ms(),
                });
            }
            if previous > 0.0 && progress <= 0.0 {
                events.push(TimelineEvent::TweenReverted {
                    timeline: self.id,
                    step: tween.step,
                    element: tween.element.clone(),
                    at_ms: tween.start_ms,
                });
            }
        }
    }
}
