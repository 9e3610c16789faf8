//! Registered trigger windows and their evaluation against the scroll
//! position.
//!
//! Every window remembers whether it was active and the position it was last
//! evaluated at. `evaluate` compares both against the new position and emits
//! one event per flip. Windows are evaluated in registration order, so events
//! produced in the same frame come out in that order too.

use super::window::{TriggerWindow, WindowGeometry};
use crate::animation::events::{TriggerEvent, TriggerEventKind};
use crate::animation::types::{Direction, ElementId, IdSource, TriggerId};
use crate::error::Result;
use crate::surface::ElementBounds;

#[derive(Debug)]
struct Entry {
    id: TriggerId,
    window: TriggerWindow,
    start: f64,
    end: f64,
    active: bool,
    /// `None` until first evaluated, treated as above the page.
    last_position: Option<f64>,
    last_direction: Direction,
}

impl Entry {
    fn contains(&self, y: f64) -> bool {
        self.start <= y && y < self.end
    }
}

#[derive(Debug, Default)]
pub struct TriggerRegistry {
    entries: Vec<Entry>,
    ids: IdSource,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window, resolving it against the current viewport.
    /// The window is first evaluated on the next `evaluate` call.
    pub fn register(&mut self, window: TriggerWindow, viewport_height: f64) -> Result<TriggerId> {
        let (start, end) = window.geometry.resolve(viewport_height)?;
        let id = TriggerId(self.ids.next());
        tracing::debug!(trigger = %id, start, end, "trigger registered");
        self.entries.push(Entry {
            id,
            window,
            start,
            end,
            active: false,
            last_position: None,
            last_direction: Direction::Forward,
        });
        Ok(id)
    }

    /// Returns false if the handle was already unregistered.
    pub fn unregister(&mut self, id: TriggerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = self.entries.len() != before;
        if removed {
            tracing::debug!(trigger = %id, "trigger unregistered");
        }
        removed
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_active(&self, id: TriggerId) -> Option<bool> {
        self.entry(id).map(|entry| entry.active)
    }

    /// Resolved `[start, end)` scroll range.
    pub fn range(&self, id: TriggerId) -> Option<(f64, f64)> {
        self.entry(id).map(|entry| (entry.start, entry.end))
    }

    pub fn window(&self, id: TriggerId) -> Option<&TriggerWindow> {
        self.entry(id).map(|entry| &entry.window)
    }

    fn entry(&self, id: TriggerId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Evaluate every window against `y`.
    ///
    /// Emits `Enter` on inactive → active and `Exit` on active → inactive.
    /// A window whose whole range lies between the previous and the new
    /// position gets `Enter` then `Exit`. Re-evaluating an unchanged window
    /// emits nothing.
    pub fn evaluate(&mut self, y: f64) -> Vec<TriggerEvent> {
        let mut events = Vec::new();

        for entry in &mut self.entries {
            let previous = entry.last_position.unwrap_or(f64::NEG_INFINITY);
            let direction = if y > previous {
                Direction::Forward
            } else if y < previous {
                Direction::Reverse
            } else {
                entry.last_direction
            };
            entry.last_position = Some(y);
            entry.last_direction = direction;

            let now_active = entry.contains(y);
            let kinds: &[TriggerEventKind] = match (entry.active, now_active) {
                (false, true) => &[TriggerEventKind::Enter],
                (true, false) => &[TriggerEventKind::Exit],
                (false, false) => {
                    let jumped_forward = previous < entry.start && y >= entry.end;
                    let jumped_back = previous >= entry.end && y < entry.start;
                    if jumped_forward || jumped_back {
                        &[TriggerEventKind::Enter, TriggerEventKind::Exit]
                    } else {
                        &[]
                    }
                }
                (true, true) => &[],
            };
            entry.active = now_active;

            for kind in kinds {
                tracing::debug!(trigger = %entry.id, ?kind, ?direction, y, "trigger crossed");
                events.push(TriggerEvent {
                    trigger: entry.id,
                    kind: *kind,
                    direction,
                    position: y,
                });
            }
        }

        events
    }

    /// Re-resolve every window for a new viewport height.
    pub fn refresh(&mut self, viewport_height: f64) {
        for entry in &mut self.entries {
            Self::re_resolve(entry, viewport_height);
        }
    }

    /// Update the bounds of every window over `element`.
    pub fn relayout(&mut self, element: &ElementId, bounds: ElementBounds, viewport_height: f64) {
        for entry in &mut self.entries {
            if let WindowGeometry::Element {
                element: target,
                bounds: current,
                ..
            } = &mut entry.window.geometry
            {
                if *target != *element {
                    continue;
                }
                let previous = *current;
                *current = bounds;
                if !Self::re_resolve(entry, viewport_height) {
                    if let WindowGeometry::Element { bounds: current, .. } =
                        &mut entry.window.geometry
                    {
                        *current = previous;
                    }
                }
            }
        }
    }

    /// Keeps the previous range when the new geometry is invalid.
    fn re_resolve(entry: &mut Entry, viewport_height: f64) -> bool {
        match entry.window.geometry.resolve(viewport_height) {
            Ok((start, end)) => {
                entry.start = start;
                entry.end = end;
                true
            }
            Err(err) => {
                tracing::warn!(trigger = %entry.id, %err, "layout change would invalidate trigger, keeping previous range");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::trigger::window::Marker;

    fn about_window() -> TriggerWindow {
        TriggerWindow::new(WindowGeometry::Element {
            element: ElementId::new("about"),
            bounds: ElementBounds::new(1200.0, 400.0),
            start: "top 70%".parse().unwrap(),
            end: "bottom 30%".parse().unwrap(),
        })
    }

    fn kinds(events: &[TriggerEvent]) -> Vec<(TriggerEventKind, Direction)> {
        events.iter().map(|e| (e.kind, e.direction)).collect()
    }

    #[test]
    fn test_enter_exactly_once_across_frames() {
        let mut registry = TriggerRegistry::new();
        registry.register(about_window(), 1000.0).unwrap();

        let mut enters = 0;
        for step in 0..=80 {
            let events = registry.evaluate(step as f64 * 10.0);
            enters += events
                .iter()
                .filter(|e| e.kind == TriggerEventKind::Enter)
                .count();
        }
        assert_eq!(enters, 1);
    }

    #[test]
    fn test_idempotent_reevaluation() {
        let mut registry = TriggerRegistry::new();
        let id = registry.register(about_window(), 1000.0).unwrap();

        assert_eq!(registry.evaluate(800.0).len(), 1);
        assert!(registry.evaluate(800.0).is_empty());
        assert!(registry.evaluate(900.0).is_empty());
        assert_eq!(registry.is_active(id), Some(true));
    }

    #[test]
    fn test_exit_backward() {
        let mut registry = TriggerRegistry::new();
        registry.register(about_window(), 1000.0).unwrap();

        registry.evaluate(0.0);
        assert_eq!(
            kinds(&registry.evaluate(800.0)),
            vec![(TriggerEventKind::Enter, Direction::Forward)]
        );
        assert_eq!(
            kinds(&registry.evaluate(200.0)),
            vec![(TriggerEventKind::Exit, Direction::Reverse)]
        );
    }

    #[test]
    fn test_jump_over_window_enters_then_exits() {
        let mut registry = TriggerRegistry::new();
        registry.register(about_window(), 1000.0).unwrap();

        registry.evaluate(0.0);
        assert_eq!(
            kinds(&registry.evaluate(3000.0)),
            vec![
                (TriggerEventKind::Enter, Direction::Forward),
                (TriggerEventKind::Exit, Direction::Forward),
            ]
        );
        assert_eq!(
            kinds(&registry.evaluate(0.0)),
            vec![
                (TriggerEventKind::Enter, Direction::Reverse),
                (TriggerEventKind::Exit, Direction::Reverse),
            ]
        );
    }

    #[test]
    fn test_registration_order_is_event_order() {
        let mut registry = TriggerRegistry::new();
        let late = registry
            .register(TriggerWindow::new(WindowGeometry::scroll_from(300.0)), 1000.0)
            .unwrap();
        let early = registry
            .register(TriggerWindow::new(WindowGeometry::scroll_from(100.0)), 1000.0)
            .unwrap();

        let order: Vec<_> = registry.evaluate(500.0).iter().map(|e| e.trigger).collect();
        assert_eq!(order, vec![late, early]);
    }

    #[test]
    fn test_invalid_window_rejected() {
        let mut registry = TriggerRegistry::new();
        let err = registry
            .register(
                TriggerWindow::new(WindowGeometry::Scroll {
                    start: 500.0,
                    end: 100.0,
                }),
                1000.0,
            )
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidWindow { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister() {
        let mut registry = TriggerRegistry::new();
        let id = registry.register(about_window(), 1000.0).unwrap();
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.evaluate(800.0).is_empty());
    }

    #[test]
    fn test_relayout_reevaluates_at_same_position() {
        let mut registry = TriggerRegistry::new();
        let id = registry.register(about_window(), 1000.0).unwrap();
        registry.evaluate(400.0);
        assert_eq!(registry.is_active(id), Some(false));

        // Element moves up 200px, so 400 is now inside the window
        registry.relayout(&ElementId::new("about"), ElementBounds::new(1000.0, 400.0), 1000.0);
        assert_eq!(registry.range(id), Some((300.0, 1100.0)));

        let events = registry.evaluate(400.0);
        assert_eq!(kinds(&events), vec![(TriggerEventKind::Enter, Direction::Forward)]);
    }

    #[test]
    fn test_invalid_relayout_keeps_previous_range() {
        let mut registry = TriggerRegistry::new();
        let window = TriggerWindow::new(WindowGeometry::Element {
            element: ElementId::new("card"),
            bounds: ElementBounds::new(1000.0, 100.0),
            start: Marker::new(0.0, 0.5),
            end: Marker::new(1.0, 0.0),
        });
        let id = registry.register(window, 1000.0).unwrap();
        let before = registry.range(id);

        // Negative height would put the end before the start
        registry.relayout(&ElementId::new("card"), ElementBounds::new(1000.0, -2000.0), 1000.0);
        assert_eq!(registry.range(id), before);
        assert_eq!(
            registry.window(id).and_then(|w| match &w.geometry {
                WindowGeometry::Element { bounds, .. } => Some(bounds.height),
                _ => None,
            }),
            Some(100.0)
        );
    }

    #[test]
    fn test_refresh_on_resize() {
        let mut registry = TriggerRegistry::new();
        let id = registry.register(about_window(), 1000.0).unwrap();
        registry.refresh(500.0);
        // 1200 - 0.7 * 500, 1600 - 0.3 * 500
        assert_eq!(registry.range(id), Some((850.0, 1450.0)));
    }
}
