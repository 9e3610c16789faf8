//! Core animation types and data structures.
//!
//! This module defines the fundamental types for the animation system:
//! - `ElementId`: Identity of an element on the visual surface
//! - `AnimatableValue`: Enum for all animatable property values
//! - `AnimatableProperty`: Enum of the visual properties the engine animates
//! - `PropertySet`: An ordered property → value map, the unit a step animates
//! - `AnimationState`: Resting/transient state of a scroll-driven timeline
//! - Handle types for timelines, triggers, subscriptions, bindings and scopes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of an element on the visual surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle_type!(
    /// Handle to a timeline owned by the `TimelineController`.
    TimelineId
);
handle_type!(
    /// Handle to a registered trigger window.
    TriggerId
);
handle_type!(
    /// Handle to a scroll position subscription.
    SubscriptionId
);
handle_type!(
    /// Handle to an interaction binding.
    InteractionId
);
handle_type!(
    /// Handle to a lifecycle scope.
    ScopeId
);
handle_type!(
    /// Handle to a pending frame continuation.
    FrameRequestId
);

/// Monotonic handle allocator. Each owner keeps its own so ids are
/// deterministic per stage.
#[derive(Debug, Default)]
pub(crate) struct IdSource(u64);

impl IdSource {
    pub(crate) fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// State of a scroll-driven timeline.
///
/// `Idle` is initial. `Entering` and `Exiting` are transient while a playback
/// is running; `Active` and `Reversed` are only reached when one completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Entering,
    Active,
    Exiting,
    Reversed,
}

impl AnimationState {
    /// Whether a playback is in flight.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Entering | Self::Exiting)
    }
}

/// Playback direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

/// Animatable value.
///
/// Untagged so page specs can write `opacity = 0.0` or
/// `background_color = [0.08, 0.08, 0.09, 0.9]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimatableValue {
    /// Numeric value (opacity, translation, scale, blur radius, ...)
    F64(f64),
    /// RGBA color, straight alpha.
    Color([f32; 4]),
}

impl AnimatableValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<f64> for AnimatableValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<[f32; 4]> for AnimatableValue {
    fn from(c: [f32; 4]) -> Self {
        Self::Color(c)
    }
}

/// Visual properties the engine animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimatableProperty {
    Opacity,

    // Transform
    TranslateX,
    TranslateY,
    Scale,
    /// Degrees.
    Rotate,
    /// Degrees, perspective tilt around the X axis.
    RotateX,
    /// Degrees, perspective tilt around the Y axis.
    RotateY,

    // Filters
    Blur,

    // Decoration
    BoxShadowBlur,
    BoxShadowColor,
    BackgroundColor,
    BackdropBlur,
}

impl AnimatableProperty {
    /// Value a property has when nothing on the surface has set it.
    pub fn default_value(&self) -> AnimatableValue {
        match self {
            Self::Opacity | Self::Scale => AnimatableValue::F64(1.0),
            Self::TranslateX
            | Self::TranslateY
            | Self::Rotate
            | Self::RotateX
            | Self::RotateY
            | Self::Blur
            | Self::BoxShadowBlur
            | Self::BackdropBlur => AnimatableValue::F64(0.0),
            Self::BoxShadowColor | Self::BackgroundColor => {
                AnimatableValue::Color([0.0, 0.0, 0.0, 0.0])
            }
        }
    }

    /// Returns true if the property takes a color value.
    pub fn is_color(&self) -> bool {
        matches!(self, Self::BoxShadowColor | Self::BackgroundColor)
    }

    /// Whether `value` has the shape this property expects.
    pub fn accepts(&self, value: &AnimatableValue) -> bool {
        match value {
            AnimatableValue::F64(_) => !self.is_color(),
            AnimatableValue::Color(_) => self.is_color(),
        }
    }
}

impl AnimatableProperty {
    pub const ALL: [AnimatableProperty; 12] = [
        Self::Opacity,
        Self::TranslateX,
        Self::TranslateY,
        Self::Scale,
        Self::Rotate,
        Self::RotateX,
        Self::RotateY,
        Self::Blur,
        Self::BoxShadowBlur,
        Self::BoxShadowColor,
        Self::BackgroundColor,
        Self::BackdropBlur,
    ];

    /// Snake-case name used in page specs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opacity => "opacity",
            Self::TranslateX => "translate_x",
            Self::TranslateY => "translate_y",
            Self::Scale => "scale",
            Self::Rotate => "rotate",
            Self::RotateX => "rotate_x",
            Self::RotateY => "rotate_y",
            Self::Blur => "blur",
            Self::BoxShadowBlur => "box_shadow_blur",
            Self::BoxShadowColor => "box_shadow_color",
            Self::BackgroundColor => "background_color",
            Self::BackdropBlur => "backdrop_blur",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Ordered map of property targets. Iteration order is the property order,
/// so rendering is deterministic.
///
/// Serialized as a map keyed by property name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, AnimatableValue>",
    into = "BTreeMap<String, AnimatableValue>"
)]
pub struct PropertySet(pub BTreeMap<AnimatableProperty, AnimatableValue>);

impl TryFrom<BTreeMap<String, AnimatableValue>> for PropertySet {
    type Error = String;

    fn try_from(raw: BTreeMap<String, AnimatableValue>) -> Result<Self, Self::Error> {
        let mut set = BTreeMap::new();
        for (name, value) in raw {
            let property = AnimatableProperty::from_name(&name)
                .ok_or_else(|| format!("unknown animatable property `{}`", name))?;
            set.insert(property, value);
        }
        Ok(Self(set))
    }
}

impl From<PropertySet> for BTreeMap<String, AnimatableValue> {
    fn from(set: PropertySet) -> Self {
        set.0
            .into_iter()
            .map(|(p, v)| (p.name().to_string(), v))
            .collect()
    }
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, property: AnimatableProperty, value: impl Into<AnimatableValue>) -> Self {
        self.0.insert(property, value.into());
        self
    }

    pub fn get(&self, property: AnimatableProperty) -> Option<&AnimatableValue> {
        self.0.get(&property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimatableProperty, AnimatableValue)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn properties(&self) -> impl Iterator<Item = AnimatableProperty> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First property whose value has the wrong shape, if any.
    pub fn mismatched(&self) -> Option<AnimatableProperty> {
        self.0
            .iter()
            .find(|(p, v)| !p.accepts(v))
            .map(|(p, _)| *p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_state_default() {
        assert_eq!(AnimationState::default(), AnimationState::Idle);
        assert!(AnimationState::Entering.is_transient());
        assert!(AnimationState::Exiting.is_transient());
        assert!(!AnimationState::Active.is_transient());
        assert!(!AnimationState::Reversed.is_transient());
    }

    #[test]
    fn test_id_source_is_monotonic() {
        let mut ids = IdSource::default();
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
        assert_eq!(TimelineId(2).to_string(), "TimelineId#2");
    }

    #[test]
    fn test_animatable_value_conversions() {
        let v: AnimatableValue = 42.0.into();
        assert_eq!(v.as_f64(), Some(42.0));
        assert_eq!(v.as_color(), None);

        let v: AnimatableValue = [1.0, 0.5, 0.0, 1.0].into();
        assert_eq!(v.as_color(), Some([1.0, 0.5, 0.0, 1.0]));
        assert_eq!(v.as_f64(), None);
    }

    #[test]
    fn test_property_defaults_match_shape() {
        for prop in [
            AnimatableProperty::Opacity,
            AnimatableProperty::Scale,
            AnimatableProperty::TranslateY,
            AnimatableProperty::BackgroundColor,
        ] {
            assert!(prop.accepts(&prop.default_value()), "{:?}", prop);
        }
        assert_eq!(
            AnimatableProperty::Opacity.default_value(),
            AnimatableValue::F64(1.0)
        );
    }

    #[test]
    fn test_property_set_from_toml() {
        let set: PropertySet = toml::from_str(
            r#"
            opacity = 0
            translate_y = 50.0
            background_color = [0.1, 0.1, 0.1, 0.9]
            "#,
        )
        .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.get(AnimatableProperty::Opacity), Some(&AnimatableValue::F64(0.0)));
        assert!(set.mismatched().is_none());

        let order: Vec<_> = set.properties().collect();
        assert_eq!(order[0], AnimatableProperty::Opacity);
    }

    #[test]
    fn test_property_set_rejects_unknown_name() {
        let parsed: Result<PropertySet, _> = toml::from_str("wobble = 1.0");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_property_names_round_trip() {
        for prop in AnimatableProperty::ALL {
            assert_eq!(AnimatableProperty::from_name(prop.name()), Some(prop));
        }
    }

    #[test]
    fn test_property_set_mismatch() {
        let set = PropertySet::new().with(AnimatableProperty::Opacity, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(set.mismatched(), Some(AnimatableProperty::Opacity));
    }
}
