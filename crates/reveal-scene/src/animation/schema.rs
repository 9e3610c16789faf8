//! Declarative page description.
//!
//! A page is a list of sections. Each section names the elements it lays out,
//! the timelines it animates (each optionally bound to a trigger window) and
//! the hover/focus interactions it binds. `Stage::mount` turns one
//! `SectionSpec` into live registrations.
//!
//! # Example TOML
//!
//! ```toml
//! [[sections]]
//! name = "about"
//! elements = [
//!   { id = "about", top = 1200, height = 400 },
//!   { id = "about-title", top = 1220, height = 60 },
//! ]
//!
//! [[sections.timelines]]
//! name = "about-reveal"
//! trigger = { element = "about", start = "top 70%", end = "bottom 30%" }
//! steps = [
//!   { targets = ["about-title"], from = { opacity = 0.0 }, to = { opacity = 1.0 } },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use super::micro::InteractionSpec;
use super::timeline::TimelineSpec;
use super::types::ElementId;
use crate::error::{Result, SceneError};
use crate::surface::ElementBounds;
use crate::trigger::{Marker, ToggleActions, TriggerWindow, WindowGeometry};

/// An element laid out by a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub id: ElementId,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub height: f64,
}

impl ElementSpec {
    pub fn new(id: impl Into<ElementId>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    pub fn bounds(&self) -> ElementBounds {
        ElementBounds::new(self.top, self.height)
    }
}

/// A window threshold: a marker on an element, or a raw scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Offset(f64),
    Marker(Marker),
}

impl From<Marker> for Threshold {
    fn from(marker: Marker) -> Self {
        Self::Marker(marker)
    }
}

impl From<f64> for Threshold {
    fn from(offset: f64) -> Self {
        Self::Offset(offset)
    }
}

/// Where a timeline's window lies and what crossing it does.
///
/// With `element`, both thresholds must be markers and default to
/// `"top bottom"` / `"bottom top"`. Without it, both must be offsets; start
/// defaults to 0 and end to the end of the page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Threshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Threshold>,
    #[serde(default)]
    pub toggle_actions: ToggleActions,
}

impl TriggerSpec {
    pub fn element(element: impl Into<ElementId>) -> Self {
        Self {
            element: Some(element.into()),
            ..Default::default()
        }
    }

    pub fn scroll(start: f64) -> Self {
        Self {
            start: Some(Threshold::Offset(start)),
            ..Default::default()
        }
    }

    pub fn with_start(mut self, start: impl Into<Threshold>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn with_end(mut self, end: impl Into<Threshold>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn with_toggle_actions(mut self, toggle_actions: ToggleActions) -> Self {
        self.toggle_actions = toggle_actions;
        self
    }

    /// Build the window. `bounds` is the layout of `element`, required when
    /// the trigger names one.
    pub fn to_window(&self, bounds: Option<ElementBounds>) -> Result<TriggerWindow> {
        let geometry = match &self.element {
            Some(element) => {
                let bounds = bounds.ok_or_else(|| {
                    SceneError::Spec(format!("trigger element `{element}` has no layout"))
                })?;
                let start = marker(self.start, Marker::DEFAULT_START)?;
                let end = marker(self.end, Marker::DEFAULT_END)?;
                WindowGeometry::Element {
                    element: element.clone(),
                    bounds,
                    start,
                    end,
                }
            }
            None => WindowGeometry::Scroll {
                start: offset(self.start, 0.0)?,
                end: offset(self.end, f64::INFINITY)?,
            },
        };
        Ok(TriggerWindow::new(geometry).with_toggle_actions(self.toggle_actions))
    }
}

fn marker(threshold: Option<Threshold>, default: Marker) -> Result<Marker> {
    match threshold {
        None => Ok(default),
        Some(Threshold::Marker(marker)) => Ok(marker),
        Some(Threshold::Offset(offset)) => Err(SceneError::Spec(format!(
            "element trigger threshold must be a marker, got offset {offset}"
        ))),
    }
}

fn offset(threshold: Option<Threshold>, default: f64) -> Result<f64> {
    match threshold {
        None => Ok(default),
        Some(Threshold::Offset(offset)) => Ok(offset),
        Some(Threshold::Marker(marker)) => Err(SceneError::Spec(format!(
            "scroll trigger threshold must be an offset, got marker `{marker}`"
        ))),
    }
}

/// A section timeline. Without a trigger it plays forward on mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTimelineSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerSpec>,
    #[serde(flatten)]
    pub timeline: TimelineSpec,
}

impl SectionTimelineSpec {
    pub fn triggered(timeline: TimelineSpec, trigger: TriggerSpec) -> Self {
        Self {
            trigger: Some(trigger),
            timeline,
        }
    }

    pub fn autoplay(timeline: TimelineSpec) -> Self {
        Self {
            trigger: None,
            timeline,
        }
    }
}

/// The unit of mount and unmount.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionSpec {
    pub name: String,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
    #[serde(default)]
    pub timelines: Vec<SectionTimelineSpec>,
    #[serde(default)]
    pub interactions: Vec<InteractionSpec>,
}

impl SectionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_element(mut self, element: ElementSpec) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_timeline(mut self, timeline: SectionTimelineSpec) -> Self {
        self.timelines.push(timeline);
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionSpec) -> Self {
        self.interactions.push(interaction);
        self
    }

    pub fn element(&self, id: &ElementId) -> Option<&ElementSpec> {
        self.elements.iter().find(|element| element.id == *id)
    }

    /// Structural checks that do not need a stage: unique element ids and
    /// playable timelines.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for element in &self.elements {
            if !seen.insert(&element.id) {
                return Err(SceneError::Spec(format!(
                    "section `{}`: element `{}` declared twice",
                    self.name, element.id
                )));
            }
        }
        for timeline in &self.timelines {
            timeline.timeline.validate()?;
        }
        Ok(())
    }
}

/// A whole page: sections in document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

impl PageSpec {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let page: PageSpec =
            toml::from_str(content).map_err(|err| SceneError::Spec(err.to_string()))?;
        page.validate()?;
        Ok(page)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = BTreeSet::new();
        for section in &self.sections {
            if !names.insert(section.name.as_str()) {
                return Err(SceneError::Spec(format!(
                    "section `{}` declared twice",
                    section.name
                )));
            }
            section.validate()?;
        }
        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|section| section.name == name)
    }
}
