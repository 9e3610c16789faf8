//! Timeline controller: the only owner and mutator of timelines.
//!
//! The `TimelineController` is responsible for:
//! - Creating timelines from specs and applying their initial values
//! - Starting, reversing and interrupting playbacks
//! - Advancing playbacks from frame-scheduled continuations
//! - Reverting or aborting timelines on teardown
//!
//! # Playback model
//!
//! A playback is a chain of `FrameTask::Timeline` continuations. Each run
//! advances the timeline by the time since its previous run and, unless the
//! timeline finished, requests the next frame. `play` cancels any pending
//! continuation before recording its own, so at most one playback per
//! timeline is ever live. A continuation whose request id no longer matches
//! the live playback is stale and dropped.

use std::collections::HashMap;

use super::events::{EventQueue, TimelineEvent};
use super::timeline::{Timeline, TimelineSpec};
use super::types::{AnimationState, Direction, FrameRequestId, IdSource, TimelineId};
use crate::error::Result;
use crate::frame::{FrameScheduler, FrameTask};
use crate::surface::VisualSurface;
use crate::trigger::window::ToggleAction;

#[derive(Debug, Clone, Copy)]
struct Playback {
    request: FrameRequestId,
    direction: Direction,
    /// Clock of the previous run, `None` before the first.
    last_ms: Option<f64>,
}

/// Owns every timeline and its live playback.
#[derive(Debug, Default)]
pub struct TimelineController {
    timelines: HashMap<TimelineId, Timeline>,
    playbacks: HashMap<TimelineId, Playback>,
    ids: IdSource,
}

impl TimelineController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timeline in the `Idle` state, applying its `from` values.
    pub fn create(&mut self, spec: &TimelineSpec, surface: &mut VisualSurface) -> Result<TimelineId> {
        let id = TimelineId(self.ids.next());
        let timeline = Timeline::new(id, spec, surface)?;
        tracing::debug!(timeline = %id, name = %spec.name, duration_ms = timeline.duration_ms(), "timeline created");
        self.timelines.insert(id, timeline);
        Ok(id)
    }

    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id)
    }

    /// Oldest live timeline called `name`.
    pub fn find(&self, name: &str) -> Option<TimelineId> {
        self.timelines
            .values()
            .filter(|timeline| timeline.name() == name)
            .map(Timeline::id)
            .min()
    }

    pub fn state(&self, id: TimelineId) -> Option<AnimationState> {
        self.timelines.get(&id).map(Timeline::state)
    }

    pub fn playhead(&self, id: TimelineId) -> Option<f64> {
        self.timelines.get(&id).map(Timeline::playhead_ms)
    }

    pub fn is_playing(&self, id: TimelineId) -> bool {
        self.playbacks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn active_playbacks(&self) -> usize {
        self.playbacks.len()
    }

    /// Start a playback in `direction`, cancelling the previous one first.
    ///
    /// Returns false if the timeline does not exist or has nothing to play
    /// in that direction.
    pub fn play(
        &mut self,
        id: TimelineId,
        direction: Direction,
        scheduler: &mut FrameScheduler,
        events: &mut EventQueue,
    ) -> bool {
        if !self.timelines.contains_key(&id) {
            return false;
        }
        self.cancel(id, scheduler, events);

        let Some(timeline) = self.timelines.get_mut(&id) else {
            return false;
        };
        if !timeline.begin(direction) {
            return false;
        }

        let request = scheduler.request(FrameTask::Timeline(id));
        self.playbacks.insert(
            id,
            Playback {
                request,
                direction,
                last_ms: None,
            },
        );
        tracing::debug!(timeline = %id, ?direction, playhead_ms = timeline.playhead_ms(), "playback started");
        events.push(TimelineEvent::Started {
            timeline: id,
            direction,
        });
        true
    }

    /// Map a toggle action onto the timeline.
    pub fn apply_action(
        &mut self,
        id: TimelineId,
        action: ToggleAction,
        scheduler: &mut FrameScheduler,
        surface: &mut VisualSurface,
        events: &mut EventQueue,
    ) {
        match action {
            ToggleAction::Play => {
                self.play(id, Direction::Forward, scheduler, events);
            }
            ToggleAction::Reverse => {
                self.play(id, Direction::Reverse, scheduler, events);
            }
            ToggleAction::Restart => {
                self.rewind(id, scheduler, surface, events);
                self.play(id, Direction::Forward, scheduler, events);
            }
            ToggleAction::Reset => {
                self.rewind(id, scheduler, surface, events);
            }
            ToggleAction::Complete => {
                self.cancel(id, scheduler, events);
                if let Some(timeline) = self.timelines.get_mut(&id) {
                    let end = timeline.duration_ms();
                    timeline.seek(end, Direction::Forward, surface, events);
                    timeline.set_state(AnimationState::Active);
                    events.push(TimelineEvent::Completed { timeline: id });
                }
            }
            ToggleAction::None => {}
        }
    }

    /// Cancel the pending continuation, leaving values where they are.
    /// Returns false if nothing was playing.
    pub fn cancel(
        &mut self,
        id: TimelineId,
        scheduler: &mut FrameScheduler,
        events: &mut EventQueue,
    ) -> bool {
        let Some(playback) = self.playbacks.remove(&id) else {
            return false;
        };
        scheduler.cancel(playback.request);
        let playhead_ms = self.playhead(id).unwrap_or_default();
        tracing::trace!(timeline = %id, request = %playback.request, playhead_ms, "pending continuation cancelled");
        events.push(TimelineEvent::Interrupted {
            timeline: id,
            playhead_ms,
        });
        true
    }

    /// Jump back to the start and rest there as `Idle`.
    fn rewind(
        &mut self,
        id: TimelineId,
        scheduler: &mut FrameScheduler,
        surface: &mut VisualSurface,
        events: &mut EventQueue,
    ) {
        self.cancel(id, scheduler, events);
        if let Some(timeline) = self.timelines.get_mut(&id) {
            timeline.seek(0.0, Direction::Reverse, surface, events);
            timeline.set_state(AnimationState::Idle);
        }
    }

    /// Cancel any playback and restore every value the timeline changed.
    pub fn revert(
        &mut self,
        id: TimelineId,
        scheduler: &mut FrameScheduler,
        surface: &mut VisualSurface,
        events: &mut EventQueue,
    ) {
        self.cancel(id, scheduler, events);
        if let Some(timeline) = self.timelines.get_mut(&id) {
            timeline.revert(surface);
            tracing::debug!(timeline = %id, "timeline reverted");
        }
    }

    /// Drop a timeline. Any playback must already be cancelled; a leftover
    /// continuation is dropped as stale.
    pub fn remove(&mut self, id: TimelineId, scheduler: &mut FrameScheduler) -> Option<Timeline> {
        if let Some(playback) = self.playbacks.remove(&id) {
            scheduler.cancel(playback.request);
        }
        self.timelines.remove(&id)
    }

    /// Run every continuation due this frame. `now_ms` is the frame clock;
    /// a playback's first run advances by zero.
    pub fn run_frame(
        &mut self,
        now_ms: f64,
        scheduler: &mut FrameScheduler,
        surface: &mut VisualSurface,
        events: &mut EventQueue,
    ) {
        for (request, task) in scheduler.take_due() {
            let FrameTask::Timeline(id) = task;
            let Some(playback) = self.playbacks.get_mut(&id) else {
                tracing::trace!(timeline = %id, %request, "stale continuation skipped");
                continue;
            };
            if playback.request != request {
                tracing::trace!(timeline = %id, %request, "stale continuation skipped");
                continue;
            }
            let Some(timeline) = self.timelines.get_mut(&id) else {
                self.playbacks.remove(&id);
                continue;
            };

            let dt = playback.last_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
            playback.last_ms = Some(now_ms);

            if timeline.advance(dt, surface, events) {
                let direction = playback.direction;
                self.playbacks.remove(&id);
                timeline.finish();
                tracing::debug!(timeline = %id, state = ?timeline.state(), "playback finished");
                events.push(match direction {
                    Direction::Forward => TimelineEvent::Completed { timeline: id },
                    Direction::Reverse => TimelineEvent::Reversed { timeline: id },
                });
            } else {
                playback.request = scheduler.request(FrameTask::Timeline(id));
            }
        }
    }
}
