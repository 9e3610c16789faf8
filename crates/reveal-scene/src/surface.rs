//! The visual-state surface consumed by an external renderer.
//!
//! Each attached element carries two property layers:
//!
//! ```text
//! resolve(element, property)
//!   ├── overlay   written by the interaction micro-animator
//!   └── base      written by scroll timelines
//!         └── property default
//! ```
//!
//! Timelines never read or write the overlay, and the micro-animator never
//! writes the base, so the two animation systems cannot clobber each other.
//! A renderer only ever calls `resolve` (or `snapshot`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::animation::types::{AnimatableProperty, AnimatableValue, ElementId};
use crate::error::{Result, SceneError};

/// Document-space vertical placement of an element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementBounds {
    pub top: f64,
    pub height: f64,
}

impl ElementBounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Clone, Default)]
struct ElementLayers {
    bounds: ElementBounds,
    base: BTreeMap<AnimatableProperty, AnimatableValue>,
    overlay: BTreeMap<AnimatableProperty, AnimatableValue>,
}

/// Element identity → layered visual properties.
#[derive(Debug, Default)]
pub struct VisualSurface {
    elements: BTreeMap<ElementId, ElementLayers>,
}

impl VisualSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an element, or update the bounds of one already attached.
    /// Existing property values are kept.
    pub fn attach(&mut self, element: ElementId, bounds: ElementBounds) {
        self.elements.entry(element).or_default().bounds = bounds;
    }

    /// Remove an element and every value written to it. Returns false if it
    /// was not attached.
    pub fn detach(&mut self, element: &ElementId) -> bool {
        self.elements.remove(element).is_some()
    }

    pub fn is_attached(&self, element: &ElementId) -> bool {
        self.elements.contains_key(element)
    }

    pub fn bounds(&self, element: &ElementId) -> Option<ElementBounds> {
        self.elements.get(element).map(|layers| layers.bounds)
    }

    /// Update bounds of an attached element. Returns false if it is missing.
    pub fn set_bounds(&mut self, element: &ElementId, bounds: ElementBounds) -> bool {
        match self.elements.get_mut(element) {
            Some(layers) => {
                layers.bounds = bounds;
                true
            }
            None => false,
        }
    }

    /// Value written by a timeline, if any.
    pub fn base(&self, element: &ElementId, property: AnimatableProperty) -> Option<AnimatableValue> {
        self.elements
            .get(element)
            .and_then(|layers| layers.base.get(&property).copied())
    }

    /// Timeline value, falling back to the property default.
    pub fn base_or_default(&self, element: &ElementId, property: AnimatableProperty) -> AnimatableValue {
        self.base(element, property)
            .unwrap_or_else(|| property.default_value())
    }

    pub fn write_base(
        &mut self,
        element: &ElementId,
        property: AnimatableProperty,
        value: AnimatableValue,
    ) -> Result<()> {
        let layers = self
            .elements
            .get_mut(element)
            .ok_or_else(|| SceneError::MissingTarget(element.clone()))?;
        layers.base.insert(property, value);
        Ok(())
    }

    pub fn clear_base(&mut self, element: &ElementId, property: AnimatableProperty) {
        if let Some(layers) = self.elements.get_mut(element) {
            layers.base.remove(&property);
        }
    }

    pub fn overlay(&self, element: &ElementId, property: AnimatableProperty) -> Option<AnimatableValue> {
        self.elements
            .get(element)
            .and_then(|layers| layers.overlay.get(&property).copied())
    }

    pub fn write_overlay(
        &mut self,
        element: &ElementId,
        property: AnimatableProperty,
        value: AnimatableValue,
    ) -> Result<()> {
        let layers = self
            .elements
            .get_mut(element)
            .ok_or_else(|| SceneError::MissingTarget(element.clone()))?;
        layers.overlay.insert(property, value);
        Ok(())
    }

    pub fn clear_overlay(&mut self, element: &ElementId, property: AnimatableProperty) {
        if let Some(layers) = self.elements.get_mut(element) {
            layers.overlay.remove(&property);
        }
    }

    /// Value a renderer should draw: overlay, then base, then the default.
    /// `None` only when the element is not attached.
    pub fn resolve(&self, element: &ElementId, property: AnimatableProperty) -> Option<AnimatableValue> {
        let layers = self.elements.get(element)?;
        Some(
            layers
                .overlay
                .get(&property)
                .or_else(|| layers.base.get(&property))
                .copied()
                .unwrap_or_else(|| property.default_value()),
        )
    }

    /// Resolve a numeric property with a fallback for detached elements.
    pub fn resolve_f64(&self, element: &ElementId, property: AnimatableProperty, fallback: f64) -> f64 {
        self.resolve(element, property)
            .and_then(|v| v.as_f64())
            .unwrap_or(fallback)
    }

    /// Every property written on either layer, resolved.
    pub fn snapshot(&self, element: &ElementId) -> Option<BTreeMap<AnimatableProperty, AnimatableValue>> {
        let layers = self.elements.get(element)?;
        let mut resolved = layers.base.clone();
        resolved.extend(layers.overlay.iter().map(|(p, v)| (*p, *v)));
        Some(resolved)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementId> {
        self.elements.keys()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(id: &str) -> ElementId {
        ElementId::new(id)
    }

    #[test]
    fn test_resolve_layers() {
        let mut surface = VisualSurface::new();
        surface.attach(el("card"), ElementBounds::new(100.0, 50.0));

        assert_eq!(
            surface.resolve(&el("card"), AnimatableProperty::Opacity),
            Some(AnimatableValue::F64(1.0))
        );

        surface
            .write_base(&el("card"), AnimatableProperty::Opacity, 0.4.into())
            .unwrap();
        assert_eq!(surface.resolve_f64(&el("card"), AnimatableProperty::Opacity, -1.0), 0.4);

        surface
            .write_overlay(&el("card"), AnimatableProperty::Opacity, 0.9.into())
            .unwrap();
        assert_eq!(surface.resolve_f64(&el("card"), AnimatableProperty::Opacity, -1.0), 0.9);
        assert_eq!(surface.base(&el("card"), AnimatableProperty::Opacity), Some(0.4.into()));

        surface.clear_overlay(&el("card"), AnimatableProperty::Opacity);
        assert_eq!(surface.resolve_f64(&el("card"), AnimatableProperty::Opacity, -1.0), 0.4);
    }

    #[test]
    fn test_write_to_detached_element_is_missing_target() {
        let mut surface = VisualSurface::new();
        let err = surface
            .write_base(&el("ghost"), AnimatableProperty::Scale, 1.2.into())
            .unwrap_err();
        assert!(matches!(err, SceneError::MissingTarget(id) if id == el("ghost")));
        assert!(surface.resolve(&el("ghost"), AnimatableProperty::Scale).is_none());
        assert_eq!(surface.resolve_f64(&el("ghost"), AnimatableProperty::Scale, 7.0), 7.0);
    }

    #[test]
    fn test_reattach_keeps_values_detach_drops_them() {
        let mut surface = VisualSurface::new();
        surface.attach(el("hero"), ElementBounds::new(0.0, 900.0));
        surface
            .write_base(&el("hero"), AnimatableProperty::TranslateY, 40.0.into())
            .unwrap();

        surface.attach(el("hero"), ElementBounds::new(10.0, 900.0));
        assert_eq!(surface.bounds(&el("hero")).map(|b| b.top), Some(10.0));
        assert_eq!(surface.base(&el("hero"), AnimatableProperty::TranslateY), Some(40.0.into()));

        assert!(surface.detach(&el("hero")));
        assert!(!surface.detach(&el("hero")));
        assert!(surface.is_empty());
    }

    #[test]
    fn test_snapshot_merges_overlay() {
        let mut surface = VisualSurface::new();
        surface.attach(el("btn"), ElementBounds::default());
        surface.write_base(&el("btn"), AnimatableProperty::Opacity, 1.0.into()).unwrap();
        surface.write_base(&el("btn"), AnimatableProperty::Scale, 1.0.into()).unwrap();
        surface.write_overlay(&el("btn"), AnimatableProperty::Scale, 1.05.into()).unwrap();

        let snap = surface.snapshot(&el("btn")).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[&AnimatableProperty::Scale], AnimatableValue::F64(1.05));
    }

    #[test]
    fn test_bounds_edges() {
        let b = ElementBounds::new(1200.0, 400.0);
        assert_eq!(b.bottom(), 1600.0);
        assert_eq!(b.center(), 1400.0);
    }
}
