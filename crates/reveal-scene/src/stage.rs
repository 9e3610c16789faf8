//! The stage: one owner for every engine component, driven by `tick`.
//!
//! A tick runs, in order:
//!
//! ```text
//! 1. scroll provider frame        (smoothing, one publication at most)
//! 2. trigger evaluation           (enter/exit in registration order)
//! 3. toggle actions → controller  (play/reverse/... per crossed window)
//! 4. due timeline continuations   (advance playheads, write base values)
//! 5. interaction overlay tweens
//! ```
//!
//! Everything happens synchronously inside the tick, so a scroll change and
//! the timeline movement it causes are observable in the same frame.

use std::collections::BTreeMap;

use reveal_config::{RevealConfig, TeardownMode};

use crate::animation::controller::TimelineController;
use crate::animation::events::{EventQueue, QueuedEvent};
use crate::animation::micro::{InteractionInput, InteractionMicroAnimator, InteractionSpec};
use crate::animation::schema::SectionSpec;
use crate::animation::timeline::TimelineSpec;
use crate::animation::types::{
    AnimationState, Direction, ElementId, InteractionId, ScopeId, SubscriptionId, TimelineId,
    TriggerId,
};
use crate::error::{Result, SceneError};
use crate::frame::FrameScheduler;
use crate::lifecycle::{Disposable, ScopeSet};
use crate::scroll::{ScrollCoordinateProvider, ScrollPosition, Viewport};
use crate::surface::{ElementBounds, VisualSurface};
use crate::trigger::{TriggerRegistry, TriggerWindow};

/// A mounted section, returned by `Stage::mount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHandle {
    scope: ScopeId,
    name: String,
}

impl SectionHandle {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct MountedSection {
    scope: ScopeId,
    /// Elements the mount attached, detached again on unmount.
    attached: Vec<ElementId>,
}

#[derive(Debug)]
pub struct Stage {
    provider: ScrollCoordinateProvider,
    registry: TriggerRegistry,
    controller: TimelineController,
    micro: InteractionMicroAnimator,
    scheduler: FrameScheduler,
    surface: VisualSurface,
    events: EventQueue,
    scopes: ScopeSet,
    /// Timeline driven by each trigger.
    bindings: BTreeMap<TriggerId, TimelineId>,
    sections: Vec<MountedSection>,
    teardown: TeardownMode,
    frame_ms: f64,
    now_ms: f64,
    frame: u64,
}

impl Stage {
    pub fn new(config: &RevealConfig) -> Self {
        let viewport = Viewport::new(config.stage.viewport_height, config.stage.content_height);
        Self {
            provider: ScrollCoordinateProvider::new(config.scroll.clone(), viewport),
            registry: TriggerRegistry::new(),
            controller: TimelineController::new(),
            micro: InteractionMicroAnimator::new(),
            scheduler: FrameScheduler::new(),
            surface: VisualSurface::new(),
            events: EventQueue::new(),
            scopes: ScopeSet::new(),
            bindings: BTreeMap::new(),
            sections: Vec::new(),
            teardown: config.stage.teardown,
            frame_ms: config.stage.frame_ms,
            now_ms: 0.0,
            frame: 0,
        }
    }

    // ---- frame loop ----

    /// Run one frame, `dt_ms` after the previous one.
    pub fn tick(&mut self, dt_ms: f64) {
        let dt = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        self.frame += 1;
        self.now_ms += dt;
        self.events.begin_frame(self.frame, self.now_ms);

        self.provider.frame(dt);
        let y = self.provider.current_position().y;

        for crossed in self.registry.evaluate(y) {
            let action = self
                .registry
                .window(crossed.trigger)
                .map(|window| window.toggle_actions.action_for(crossed.kind, crossed.direction));
            let timeline = self.bindings.get(&crossed.trigger).copied();
            self.events.push(crossed);

            if let (Some(action), Some(timeline)) = (action, timeline) {
                self.controller.apply_action(
                    timeline,
                    action,
                    &mut self.scheduler,
                    &mut self.surface,
                    &mut self.events,
                );
            }
        }

        self.controller.run_frame(
            self.now_ms,
            &mut self.scheduler,
            &mut self.surface,
            &mut self.events,
        );
        self.micro.update(dt, &mut self.surface, &mut self.events);
    }

    /// One frame at the configured frame interval.
    pub fn step(&mut self) {
        self.tick(self.frame_ms);
    }

    /// Run frames at the configured interval for at least `duration_ms`.
    pub fn run_for(&mut self, duration_ms: f64) {
        let frames = frame_count(duration_ms, self.frame_ms);
        for _ in 0..frames {
            self.step();
        }
    }

    /// Run frames until nothing is moving, at most `max_ms`. Returns the time
    /// spent.
    pub fn settle(&mut self, max_ms: f64) -> f64 {
        let start = self.now_ms;
        let frames = frame_count(max_ms, self.frame_ms);
        for _ in 0..frames {
            self.step();
            if self.is_idle() {
                break;
            }
        }
        self.now_ms - start
    }

    /// No pending scroll, playback or interaction work.
    pub fn is_idle(&self) -> bool {
        self.provider.is_settled()
            && self.scheduler.pending_len() == 0
            && !self.micro.is_animating()
    }

    // ---- host input ----

    /// Native scroll moved to `y`.
    pub fn scroll_to(&mut self, y: f64) {
        self.provider.on_native_scroll(y);
    }

    /// Wheel delta.
    pub fn scroll_by(&mut self, delta: f64) {
        self.provider.scroll_by(delta);
    }

    /// Viewport or content size changed. Windows re-resolve now and are
    /// re-evaluated on the next tick.
    pub fn resize(&mut self, viewport: Viewport) {
        self.provider.resize(viewport);
        self.registry.refresh(viewport.height);
    }

    pub fn attach_surface(&mut self, viewport: Viewport) {
        self.provider.attach(viewport);
        self.registry.refresh(viewport.height);
    }

    /// While detached, scroll input is ignored and the last position stays
    /// current.
    pub fn detach_surface(&mut self) {
        self.provider.detach();
    }

    /// An element moved or changed size. Returns false if it is not attached.
    pub fn set_bounds(&mut self, element: &ElementId, bounds: ElementBounds) -> bool {
        if !self.surface.set_bounds(element, bounds) {
            return false;
        }
        let viewport_height = self.provider.viewport().height;
        self.registry.relayout(element, bounds, viewport_height);
        true
    }

    /// Attach an element the host lays out itself.
    pub fn attach_element(&mut self, element: impl Into<ElementId>, bounds: ElementBounds) {
        self.surface.attach(element.into(), bounds);
    }

    /// Remove an element from the surface. Steps and interactions targeting
    /// it are skipped from then on.
    pub fn detach_element(&mut self, element: &ElementId) -> bool {
        self.surface.detach(element)
    }

    pub fn dispatch(&mut self, input: InteractionInput) {
        self.micro.dispatch(&input, &self.surface, &mut self.events);
    }

    // ---- scopes and registrations ----

    pub fn open_scope(&mut self, name: impl Into<String>) -> ScopeId {
        self.scopes.open(name)
    }

    /// Tear down everything the scope tracked. Closing a mounted section's
    /// scope unmounts the section: the elements its mount attached are
    /// detached too. Returns false if it was already closed or never opened.
    pub fn close_scope(&mut self, scope: ScopeId) -> bool {
        let Some(tracked) = self.scopes.close(scope) else {
            return false;
        };

        let timelines: Vec<TimelineId> = tracked
            .iter()
            .filter_map(|d| match d {
                Disposable::Timeline(id) => Some(*id),
                _ => None,
            })
            .collect();

        for id in &timelines {
            self.controller
                .cancel(*id, &mut self.scheduler, &mut self.events);
        }
        // Newest first, so the oldest recorded original wins on shared
        // properties.
        for id in timelines.iter().rev() {
            if self.teardown == TeardownMode::Revert {
                self.controller.revert(
                    *id,
                    &mut self.scheduler,
                    &mut self.surface,
                    &mut self.events,
                );
            }
            self.controller.remove(*id, &mut self.scheduler);
        }

        for disposable in &tracked {
            if let Disposable::Trigger(id) = disposable {
                self.registry.unregister(*id);
                self.bindings.remove(id);
            }
        }
        for disposable in &tracked {
            if let Disposable::Interaction(id) = disposable {
                self.micro.unbind(*id, &mut self.surface, &mut self.events);
            }
        }
        for disposable in &tracked {
            if let Disposable::Subscription(id) = disposable {
                self.provider.unsubscribe(*id);
            }
        }

        if let Some(index) = self.sections.iter().position(|s| s.scope == scope) {
            let section = self.sections.remove(index);
            for element in &section.attached {
                self.surface.detach(element);
            }
        }
        true
    }

    /// Create a timeline owned by `scope`. Steps' `from` values are applied
    /// immediately.
    pub fn create_timeline(&mut self, scope: ScopeId, spec: &TimelineSpec) -> Result<TimelineId> {
        self.scopes.ensure_open(scope)?;
        let id = self.controller.create(spec, &mut self.surface)?;
        self.scopes.track(scope, Disposable::Timeline(id))?;
        Ok(id)
    }

    /// Register a window that drives `timeline` through its toggle actions.
    pub fn register_trigger(
        &mut self,
        scope: ScopeId,
        window: TriggerWindow,
        timeline: TimelineId,
    ) -> Result<TriggerId> {
        self.scopes.ensure_open(scope)?;
        if self.controller.get(timeline).is_none() {
            return Err(SceneError::Spec(format!("{timeline} does not exist")));
        }
        let id = self
            .registry
            .register(window, self.provider.viewport().height)?;
        self.scopes.track(scope, Disposable::Trigger(id))?;
        self.bindings.insert(id, timeline);
        Ok(id)
    }

    pub fn subscribe(
        &mut self,
        scope: ScopeId,
        callback: impl FnMut(&ScrollPosition) + 'static,
    ) -> Result<SubscriptionId> {
        self.scopes.ensure_open(scope)?;
        let id = self.provider.subscribe(callback);
        self.scopes.track(scope, Disposable::Subscription(id))?;
        Ok(id)
    }

    pub fn bind_interaction(&mut self, scope: ScopeId, spec: InteractionSpec) -> Result<InteractionId> {
        self.scopes.ensure_open(scope)?;
        let id = self.micro.bind(spec);
        self.scopes.track(scope, Disposable::Interaction(id))?;
        Ok(id)
    }

    /// Play a timeline directly, outside any trigger.
    pub fn play(&mut self, timeline: TimelineId, direction: Direction) -> bool {
        self.controller
            .play(timeline, direction, &mut self.scheduler, &mut self.events)
    }

    // ---- sections ----

    /// Attach a section's elements, create its timelines and triggers, start
    /// its autoplay timelines and bind its interactions, all in a fresh
    /// scope. On error everything already registered is torn down again.
    pub fn mount(&mut self, section: &SectionSpec) -> Result<SectionHandle> {
        section.validate()?;
        let scope = self.open_scope(section.name.as_str());

        let mut attached = Vec::new();
        for element in &section.elements {
            if !self.surface.is_attached(&element.id) {
                self.surface.attach(element.id.clone(), element.bounds());
                attached.push(element.id.clone());
            }
        }

        if let Err(err) = self.mount_into(scope, section) {
            self.close_scope(scope);
            for element in &attached {
                self.surface.detach(element);
            }
            return Err(err);
        }

        tracing::debug!(section = %section.name, %scope, "section mounted");
        self.sections.push(MountedSection { scope, attached });
        Ok(SectionHandle {
            scope,
            name: section.name.clone(),
        })
    }

    fn mount_into(&mut self, scope: ScopeId, section: &SectionSpec) -> Result<()> {
        for entry in &section.timelines {
            let timeline = self.create_timeline(scope, &entry.timeline)?;
            match &entry.trigger {
                Some(trigger) => {
                    let bounds = trigger
                        .element
                        .as_ref()
                        .and_then(|element| self.surface.bounds(element));
                    let window = trigger.to_window(bounds)?;
                    self.register_trigger(scope, window, timeline)?;
                }
                None => {
                    tracing::debug!(%timeline, name = %entry.timeline.name, "autoplay");
                    self.play(timeline, Direction::Forward);
                }
            }
        }
        for interaction in &section.interactions {
            self.bind_interaction(scope, interaction.clone())?;
        }
        Ok(())
    }

    /// Close the section's scope, which also detaches the elements its mount
    /// attached. Returns false if it was already unmounted, either here or
    /// through `close_scope`.
    pub fn unmount(&mut self, handle: &SectionHandle) -> bool {
        if !self.close_scope(handle.scope) {
            return false;
        }
        tracing::debug!(section = handle.name(), scope = %handle.scope, "section unmounted");
        true
    }

    /// Every event produced since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<QueuedEvent> {
        self.events.drain().collect()
    }

    // ---- inspection ----

    pub fn surface(&self) -> &VisualSurface {
        &self.surface
    }

    pub fn provider(&self) -> &ScrollCoordinateProvider {
        &self.provider
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &TimelineController {
        &self.controller
    }

    pub fn micro(&self) -> &InteractionMicroAnimator {
        &self.micro
    }

    pub fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    pub fn current_position(&self) -> ScrollPosition {
        self.provider.current_position()
    }

    pub fn timeline_state(&self, timeline: TimelineId) -> Option<AnimationState> {
        self.controller.state(timeline)
    }

    /// Timeline driven by `trigger`.
    pub fn trigger_timeline(&self, trigger: TriggerId) -> Option<TimelineId> {
        self.bindings.get(&trigger).copied()
    }

    pub fn mounted_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }
}

fn frame_count(duration_ms: f64, frame_ms: f64) -> u64 {
    if !(duration_ms > 0.0) || !(frame_ms > 0.0) {
        return 0;
    }
    (duration_ms / frame_ms).ceil() as u64
}
