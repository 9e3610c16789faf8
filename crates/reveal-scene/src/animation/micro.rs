//! Pointer and focus micro-animations on the surface's overlay layer.
//!
//! The `InteractionMicroAnimator` tracks hover and focus per binding and keeps
//! at most one overlay tween per (element, property). A state change
//! retargets that tween from the value currently on screen, so rapid
//! enter/leave never jumps.
//!
//! Target priority per property:
//!
//! ```text
//! hovered and hover sets it  → hover value
//! focused and focus sets it  → focus value
//! otherwise                  → the timeline's base value, re-read every frame
//! ```
//!
//! Once a tween toward the base value finishes, the overlay entry is cleared
//! and the timeline owns the property again. Timeline state is never read
//! beyond the surface's base layer and never written.

use serde::{Deserialize, Serialize};

use super::easing::EasingFunction;
use super::events::{EventQueue, InteractionEvent};
use super::interpolate::Interpolate;
use super::types::{AnimatableProperty, AnimatableValue, ElementId, IdSource, InteractionId, PropertySet};
use crate::surface::VisualSurface;

fn default_micro_duration() -> f64 {
    300.0
}

/// A short property animation toward fixed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroTweenSpec {
    pub to: PropertySet,
    #[serde(default = "default_micro_duration")]
    pub duration_ms: f64,
    #[serde(default)]
    pub easing: EasingFunction,
}

impl MicroTweenSpec {
    pub fn new(to: PropertySet) -> Self {
        Self {
            to,
            duration_ms: default_micro_duration(),
            easing: EasingFunction::default(),
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }
}

/// Hover and focus behaviour of one element.
///
/// # Example TOML
///
/// ```toml
/// element = "cta"
/// hover = { to = { scale = 1.05, box_shadow_blur = 24.0 }, duration_ms = 300 }
/// focus = { to = { box_shadow_blur = 12.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSpec {
    pub element: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<MicroTweenSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<MicroTweenSpec>,
}

impl InteractionSpec {
    pub fn new(element: impl Into<ElementId>) -> Self {
        Self {
            element: element.into(),
            hover: None,
            focus: None,
        }
    }

    pub fn on_hover(mut self, spec: MicroTweenSpec) -> Self {
        self.hover = Some(spec);
        self
    }

    pub fn on_focus(mut self, spec: MicroTweenSpec) -> Self {
        self.focus = Some(spec);
        self
    }

    /// Every property either state animates, without duplicates.
    fn properties(&self) -> Vec<AnimatableProperty> {
        let mut properties: Vec<AnimatableProperty> = Vec::new();
        for spec in self.hover.iter().chain(self.focus.iter()) {
            for property in spec.to.properties() {
                if !properties.contains(&property) {
                    properties.push(property);
                }
            }
        }
        properties
    }
}

/// Pointer and focus input for one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "element", rename_all = "snake_case")]
pub enum InteractionInput {
    PointerEnter(ElementId),
    PointerLeave(ElementId),
    Focus(ElementId),
    Blur(ElementId),
}

impl InteractionInput {
    pub fn element(&self) -> &ElementId {
        match self {
            Self::PointerEnter(e) | Self::PointerLeave(e) | Self::Focus(e) | Self::Blur(e) => e,
        }
    }
}

/// Hover/focus flags of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub hovered: bool,
    pub focused: bool,
}

#[derive(Debug)]
struct Binding {
    id: InteractionId,
    spec: InteractionSpec,
    state: InteractionState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MicroTarget {
    Value(AnimatableValue),
    /// Whatever the timeline holds on the base layer.
    Base,
}

#[derive(Debug, Clone)]
struct OverlayTween {
    binding: InteractionId,
    element: ElementId,
    property: AnimatableProperty,
    from: AnimatableValue,
    target: MicroTarget,
    elapsed_ms: f64,
    duration_ms: f64,
    easing: EasingFunction,
}

impl OverlayTween {
    fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Default)]
pub struct InteractionMicroAnimator {
    bindings: Vec<Binding>,
    tweens: Vec<OverlayTween>,
    ids: IdSource,
}

impl InteractionMicroAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, spec: InteractionSpec) -> InteractionId {
        let id = InteractionId(self.ids.next());
        tracing::debug!(interaction = %id, element = %spec.element, "interaction bound");
        self.bindings.push(Binding {
            id,
            spec,
            state: InteractionState::default(),
        });
        id
    }

    /// Remove a binding. Overlay values only it animates are cleared; a
    /// property another binding on the same element also animates is
    /// retargeted for that binding's current state instead. Returns false if
    /// it was already unbound.
    pub fn unbind(
        &mut self,
        id: InteractionId,
        surface: &mut VisualSurface,
        events: &mut EventQueue,
    ) -> bool {
        let Some(index) = self.bindings.iter().position(|b| b.id == id) else {
            return false;
        };
        let binding = self.bindings.remove(index);
        let element = &binding.spec.element;
        self.tweens.retain(|tween| tween.binding != id);

        let mut shared = false;
        for property in binding.spec.properties() {
            if animates(&self.bindings, element, property) {
                shared = true;
            } else {
                self.tweens
                    .retain(|t| !(t.element == *element && t.property == property));
                surface.clear_overlay(element, property);
            }
        }

        if shared {
            retarget(element, &self.bindings, &mut self.tweens, surface, events);
        }
        tracing::debug!(interaction = %id, %element, shared, "interaction unbound");
        true
    }

    pub fn state(&self, id: InteractionId) -> Option<InteractionState> {
        self.bindings.iter().find(|b| b.id == id).map(|b| b.state)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_animating(&self) -> bool {
        !self.tweens.is_empty()
    }

    /// Apply pointer or focus input to every binding on its element.
    /// Input that does not change a binding's state is ignored.
    pub fn dispatch(
        &mut self,
        input: &InteractionInput,
        surface: &VisualSurface,
        events: &mut EventQueue,
    ) {
        let Self {
            bindings, tweens, ..
        } = self;

        let element = input.element();
        let mut changed = false;
        for binding in bindings.iter_mut().filter(|b| b.spec.element == *element) {
            let mut state = binding.state;
            match input {
                InteractionInput::PointerEnter(_) => state.hovered = true,
                InteractionInput::PointerLeave(_) => state.hovered = false,
                InteractionInput::Focus(_) => state.focused = true,
                InteractionInput::Blur(_) => state.focused = false,
            }
            changed |= state != binding.state;
            binding.state = state;
        }
        if changed {
            retarget(element, bindings, tweens, surface, events);
        }
    }

    /// Advance every overlay tween by `dt_ms`.
    pub fn update(&mut self, dt_ms: f64, surface: &mut VisualSurface, events: &mut EventQueue) {
        let mut finished = Vec::new();

        for (index, tween) in self.tweens.iter_mut().enumerate() {
            if !surface.is_attached(&tween.element) {
                tracing::debug!(element = %tween.element, "interaction target missing, dropped");
                finished.push(index);
                continue;
            }
            tween.elapsed_ms += dt_ms.max(0.0);
            let progress = tween.progress();
            let to = match tween.target {
                MicroTarget::Value(value) => value,
                MicroTarget::Base => surface.base_or_default(&tween.element, tween.property),
            };

            if progress >= 1.0 {
                finished.push(index);
                match tween.target {
                    MicroTarget::Value(value) => {
                        if let Err(err) = surface.write_overlay(&tween.element, tween.property, value) {
                            tracing::debug!(interaction = %tween.binding, %err, "overlay write skipped");
                        }
                    }
                    MicroTarget::Base => {
                        surface.clear_overlay(&tween.element, tween.property);
                        events.push(InteractionEvent::Settled {
                            interaction: tween.binding,
                            element: tween.element.clone(),
                            property: tween.property,
                        });
                    }
                }
            } else {
                let eased = tween.easing.evaluate(progress as f32);
                let value = tween.from.interpolate(&to, eased);
                if let Err(err) = surface.write_overlay(&tween.element, tween.property, value) {
                    tracing::debug!(interaction = %tween.binding, %err, "overlay write skipped");
                }
            }
        }

        for index in finished.into_iter().rev() {
            self.tweens.remove(index);
        }
    }
}

fn animates(bindings: &[Binding], element: &ElementId, property: AnimatableProperty) -> bool {
    bindings
        .iter()
        .any(|b| b.spec.element == *element && b.spec.properties().contains(&property))
}

/// Point every overlay property of `element` at its target across all of the
/// element's bindings, starting from what is on screen now. Any hovered
/// binding that sets a property beats any focused one.
fn retarget(
    element: &ElementId,
    bindings: &[Binding],
    tweens: &mut Vec<OverlayTween>,
    surface: &VisualSurface,
    events: &mut EventQueue,
) {
    let on_element: Vec<&Binding> = bindings.iter().filter(|b| b.spec.element == *element).collect();
    let mut properties: Vec<AnimatableProperty> = Vec::new();
    for binding in &on_element {
        for property in binding.spec.properties() {
            if !properties.contains(&property) {
                properties.push(property);
            }
        }
    }

    for property in properties {
        let hovered = on_element.iter().find_map(|b| {
            let micro = b.spec.hover.as_ref().filter(|_| b.state.hovered)?;
            micro.to.get(property).map(|value| (*b, micro, *value))
        });
        let active = hovered.or_else(|| {
            on_element.iter().find_map(|b| {
                let micro = b.spec.focus.as_ref().filter(|_| b.state.focused)?;
                micro.to.get(property).map(|value| (*b, micro, *value))
            })
        });

        let (owner, target, timing) = match active {
            Some((owner, micro, value)) => (owner, MicroTarget::Value(value), micro),
            None => {
                // Leaving: reuse the timing of whichever state set the value.
                let Some((owner, timing)) = on_element.iter().find_map(|b| {
                    b.spec.properties().contains(&property).then_some(())?;
                    b.spec.hover.as_ref().or(b.spec.focus.as_ref()).map(|t| (*b, t))
                }) else {
                    continue;
                };
                (owner, MicroTarget::Base, timing)
            }
        };

        let existing = tweens
            .iter()
            .position(|t| t.element == *element && t.property == property);
        if let Some(index) = existing {
            if tweens[index].target == target {
                continue;
            }
        } else {
            let overlay = surface.overlay(element, property);
            let settled = match target {
                MicroTarget::Base => overlay.is_none(),
                MicroTarget::Value(value) => overlay == Some(value),
            };
            if settled {
                continue;
            }
        }

        let Some(from) = surface.resolve(element, property) else {
            tracing::debug!(element = %element, "interaction target missing, ignored");
            return;
        };
        let tween = OverlayTween {
            binding: owner.id,
            element: element.clone(),
            property,
            from,
            target,
            elapsed_ms: 0.0,
            duration_ms: timing.duration_ms,
            easing: timing.easing,
        };
        match existing {
            Some(index) => tweens[index] = tween,
            None => tweens.push(tween),
        }

        let to = match target {
            MicroTarget::Value(value) => value,
            MicroTarget::Base => surface.base_or_default(element, property),
        };
        events.push(InteractionEvent::Retargeted {
            interaction: owner.id,
            element: element.clone(),
            property,
            to,
        });
    }
}
