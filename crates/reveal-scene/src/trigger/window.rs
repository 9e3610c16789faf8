//! Trigger window geometry and toggle actions.
//!
//! An element window is bounded by two markers. A marker pairs a point on the
//! element with a point on the viewport, written `"<element> <viewport>"`:
//!
//! ```text
//! "top 70%"   the element's top edge reaches 70% of the viewport height
//! "bottom top" the element's bottom edge reaches the top of the viewport
//! ```
//!
//! Each marker resolves to the scroll offset at which the two points meet:
//! `element_point - viewport_fraction * viewport_height`. A window is active
//! while `start <= scroll < end`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::animation::events::TriggerEventKind;
use crate::animation::types::{Direction, ElementId};
use crate::error::{Result, SceneError};
use crate::surface::ElementBounds;

/// Threshold written as an element point and a viewport point, each a
/// fraction from top (0.0) to bottom (1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Marker {
    pub element: f64,
    pub viewport: f64,
}

impl Marker {
    pub const fn new(element: f64, viewport: f64) -> Self {
        Self { element, viewport }
    }

    /// `"top bottom"`: the element starts entering the viewport.
    pub const DEFAULT_START: Marker = Marker::new(0.0, 1.0);
    /// `"bottom top"`: the element has fully left the viewport.
    pub const DEFAULT_END: Marker = Marker::new(1.0, 0.0);

    /// Scroll offset at which this marker is reached.
    pub fn resolve(&self, bounds: &ElementBounds, viewport_height: f64) -> f64 {
        bounds.top + self.element * bounds.height - self.viewport * viewport_height
    }
}

fn parse_point(token: &str) -> Option<f64> {
    match token {
        "top" => Some(0.0),
        "center" => Some(0.5),
        "bottom" => Some(1.0),
        _ => {
            let pct = token.strip_suffix('%')?;
            let value: f64 = pct.trim().parse().ok()?;
            value.is_finite().then_some(value / 100.0)
        }
    }
}

fn format_point(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value == 0.0 {
        f.write_str("top")
    } else if value == 0.5 {
        f.write_str("center")
    } else if value == 1.0 {
        f.write_str("bottom")
    } else {
        write!(f, "{}%", (value * 100.0 * 1e6).round() / 1e6)
    }
}

impl FromStr for Marker {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(SceneError::InvalidMarker(s.to_string()));
        };
        match (parse_point(element), parse_point(viewport)) {
            (Some(element), Some(viewport)) => Ok(Self { element, viewport }),
            _ => Err(SceneError::InvalidMarker(s.to_string())),
        }
    }
}

impl TryFrom<String> for Marker {
    type Error = SceneError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Marker> for String {
    fn from(marker: Marker) -> Self {
        marker.to_string()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_point(f, self.element)?;
        f.write_str(" ")?;
        format_point(f, self.viewport)
    }
}

/// Where a window lies on the scroll axis.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowGeometry {
    /// Bounded by markers on an element.
    Element {
        element: ElementId,
        bounds: ElementBounds,
        start: Marker,
        end: Marker,
    },
    /// Raw scroll offsets, for page-level effects.
    Scroll { start: f64, end: f64 },
}

impl WindowGeometry {
    /// Window over an element with the default markers.
    pub fn element(element: impl Into<ElementId>, bounds: ElementBounds) -> Self {
        Self::Element {
            element: element.into(),
            bounds,
            start: Marker::DEFAULT_START,
            end: Marker::DEFAULT_END,
        }
    }

    /// Window from `start` to the end of the page.
    pub fn scroll_from(start: f64) -> Self {
        Self::Scroll {
            start,
            end: f64::INFINITY,
        }
    }

    pub fn element_id(&self) -> Option<&ElementId> {
        match self {
            Self::Element { element, .. } => Some(element),
            Self::Scroll { .. } => None,
        }
    }

    /// Resolve to a `[start, end)` scroll range, rejecting empty or inverted
    /// ranges.
    pub fn resolve(&self, viewport_height: f64) -> Result<(f64, f64)> {
        let (start, end) = match self {
            Self::Element {
                bounds, start, end, ..
            } => (
                start.resolve(bounds, viewport_height),
                end.resolve(bounds, viewport_height),
            ),
            Self::Scroll { start, end } => (*start, *end),
        };
        // `!(a < b)` also rejects NaN.
        if !(start < end) {
            return Err(SceneError::InvalidWindow { start, end });
        }
        Ok((start, end))
    }
}

/// What a timeline does when its window is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    /// Play forward from the current playhead.
    Play,
    /// Play backward from the current playhead.
    Reverse,
    /// Jump to the start and play forward.
    Restart,
    /// Jump to the start and stop.
    Reset,
    /// Jump to the end and stop.
    Complete,
    None,
}

impl FromStr for ToggleAction {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "play" => Ok(Self::Play),
            "reverse" => Ok(Self::Reverse),
            "restart" => Ok(Self::Restart),
            "reset" => Ok(Self::Reset),
            "complete" => Ok(Self::Complete),
            "none" => Ok(Self::None),
            _ => Err(SceneError::InvalidToggleActions(s.to_string())),
        }
    }
}

impl fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Play => "play",
            Self::Reverse => "reverse",
            Self::Restart => "restart",
            Self::Reset => "reset",
            Self::Complete => "complete",
            Self::None => "none",
        })
    }
}

/// Actions for the four window transitions, written in the order
/// `"<enter> <leave> <enter back> <leave back>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToggleActions {
    /// Entering while scrolling down.
    pub on_enter: ToggleAction,
    /// Leaving past the end while scrolling down.
    pub on_leave: ToggleAction,
    /// Entering again while scrolling up.
    pub on_enter_back: ToggleAction,
    /// Leaving past the start while scrolling up.
    pub on_leave_back: ToggleAction,
}

impl Default for ToggleActions {
    /// `"play reverse play reverse"`: forward while inside, reverse outside.
    fn default() -> Self {
        Self {
            on_enter: ToggleAction::Play,
            on_leave: ToggleAction::Reverse,
            on_enter_back: ToggleAction::Play,
            on_leave_back: ToggleAction::Reverse,
        }
    }
}

impl ToggleActions {
    pub fn action_for(&self, kind: TriggerEventKind, direction: Direction) -> ToggleAction {
        match (kind, direction) {
            (TriggerEventKind::Enter, Direction::Forward) => self.on_enter,
            (TriggerEventKind::Exit, Direction::Forward) => self.on_leave,
            (TriggerEventKind::Enter, Direction::Reverse) => self.on_enter_back,
            (TriggerEventKind::Exit, Direction::Reverse) => self.on_leave_back,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self> {
        let actions: Vec<&str> = s.split_whitespace().collect();
        let [enter, leave, enter_back, leave_back] = actions.as_slice() else {
            return Err(SceneError::InvalidToggleActions(s.to_string()));
        };
        let parse = |token: &str| {
            token
                .parse::<ToggleAction>()
                .map_err(|_| SceneError::InvalidToggleActions(s.to_string()))
        };
        Ok(Self {
            on_enter: parse(*enter)?,
            on_leave: parse(*leave)?,
            on_enter_back: parse(*enter_back)?,
            on_leave_back: parse(*leave_back)?,
        })
    }
}

impl TryFrom<String> for ToggleActions {
    type Error = SceneError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ToggleActions> for String {
    fn from(actions: ToggleActions) -> Self {
        actions.to_string()
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on_enter, self.on_leave, self.on_enter_back, self.on_leave_back
        )
    }
}

/// A window plus what to do when it is crossed.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerWindow {
    pub geometry: WindowGeometry,
    pub toggle_actions: ToggleActions,
}

impl TriggerWindow {
    pub fn new(geometry: WindowGeometry) -> Self {
        Self {
            geometry,
            toggle_actions: ToggleActions::default(),
        }
    }

    pub fn with_toggle_actions(mut self, toggle_actions: ToggleActions) -> Self {
        self.toggle_actions = toggle_actions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markers() {
        assert_eq!("top 70%".parse::<Marker>().unwrap(), Marker::new(0.0, 0.7));
        assert_eq!("bottom 30%".parse::<Marker>().unwrap(), Marker::new(1.0, 0.3));
        assert_eq!("center center".parse::<Marker>().unwrap(), Marker::new(0.5, 0.5));
        assert_eq!("top bottom".parse::<Marker>().unwrap(), Marker::DEFAULT_START);
        assert_eq!("25% top".parse::<Marker>().unwrap(), Marker::new(0.25, 0.0));
    }

    #[test]
    fn test_reject_bad_markers() {
        for bad in ["", "top", "top 70% extra", "middle 50%", "top seventy%", "top NaN%"] {
            assert!(
                matches!(bad.parse::<Marker>(), Err(SceneError::InvalidMarker(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_marker_display_round_trips() {
        for text in ["top 70%", "bottom top", "center center", "25% bottom"] {
            let marker: Marker = text.parse().unwrap();
            assert_eq!(marker.to_string().parse::<Marker>().unwrap(), marker);
        }
    }

    #[test]
    fn test_element_window_resolution() {
        // 1000px viewport, element spanning 1200..1600
        let geometry = WindowGeometry::Element {
            element: ElementId::new("about"),
            bounds: ElementBounds::new(1200.0, 400.0),
            start: "top 70%".parse().unwrap(),
            end: "bottom 30%".parse().unwrap(),
        };
        let (start, end) = geometry.resolve(1000.0).unwrap();
        assert!((start - 500.0).abs() < 1e-9);
        assert!((end - 1300.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_window_rejected() {
        // Start marker reached after the end marker
        let geometry = WindowGeometry::Element {
            element: ElementId::new("x"),
            bounds: ElementBounds::new(1000.0, 10.0),
            start: "bottom top".parse().unwrap(),
            end: "top bottom".parse().unwrap(),
        };
        assert!(matches!(
            geometry.resolve(800.0),
            Err(SceneError::InvalidWindow { .. })
        ));

        let empty = WindowGeometry::Scroll {
            start: 100.0,
            end: 100.0,
        };
        assert!(empty.resolve(800.0).is_err());

        let nan = WindowGeometry::Scroll {
            start: f64::NAN,
            end: 100.0,
        };
        assert!(nan.resolve(800.0).is_err());
    }

    #[test]
    fn test_scroll_window_open_ended() {
        let (start, end) = WindowGeometry::scroll_from(100.0).resolve(900.0).unwrap();
        assert_eq!(start, 100.0);
        assert!(end.is_infinite());
    }

    #[test]
    fn test_default_element_window() {
        let geometry = WindowGeometry::element("hero", ElementBounds::new(0.0, 900.0));
        assert_eq!(geometry.resolve(900.0).unwrap(), (-900.0, 900.0));
    }

    #[test]
    fn test_toggle_actions_parse() {
        let actions: ToggleActions = "play none none reverse".parse().unwrap();
        assert_eq!(actions.on_enter, ToggleAction::Play);
        assert_eq!(actions.on_leave, ToggleAction::None);
        assert_eq!(actions.on_enter_back, ToggleAction::None);
        assert_eq!(actions.on_leave_back, ToggleAction::Reverse);
        assert_eq!(actions.to_string(), "play none none reverse");

        assert!("play reverse".parse::<ToggleActions>().is_err());
        assert!("play jump none none".parse::<ToggleActions>().is_err());
    }

    #[test]
    fn test_toggle_action_lookup() {
        let actions = ToggleActions::default();
        assert_eq!(
            actions.action_for(TriggerEventKind::Enter, Direction::Forward),
            ToggleAction::Play
        );
        assert_eq!(
            actions.action_for(TriggerEventKind::Exit, Direction::Forward),
            ToggleAction::Reverse
        );
        assert_eq!(
            actions.action_for(TriggerEventKind::Exit, Direction::Reverse),
            ToggleAction::Reverse
        );
    }

    #[test]
    fn test_toggle_actions_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            toggle_actions: ToggleActions,
            start: Marker,
        }
        let h: Holder =
            toml::from_str("toggle_actions = \"restart none none reset\"\nstart = \"top 80%\"")
                .unwrap();
        assert_eq!(h.toggle_actions.on_enter, ToggleAction::Restart);
        assert_eq!(h.toggle_actions.on_leave_back, ToggleAction::Reset);
        assert_eq!(h.start, Marker::new(0.0, 0.8));
    }
}
