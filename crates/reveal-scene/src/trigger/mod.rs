//! Trigger windows: when a section's animation should be active.

pub mod registry;
pub mod window;

pub use registry::TriggerRegistry;
pub use window::{Marker, ToggleAction, ToggleActions, TriggerWindow, WindowGeometry};
