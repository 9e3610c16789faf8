//! Scroll-synchronized animation engine.
//!
//! A [`Stage`] tracks a (optionally smoothed) scroll position, evaluates
//! trigger windows against it every frame, plays timelines forward or in
//! reverse as windows are entered and left, layers hover/focus
//! micro-animations on top, and tears everything a section registered down
//! again when it unmounts. The result is a [`VisualSurface`] of per-element
//! property values for an external renderer.
//!
//! ```no_run
//! use reveal_config::RevealConfig;
//! use reveal_scene::{PageSpec, Stage};
//!
//! # fn main() -> reveal_scene::Result<()> {
//! let page = PageSpec::load("demos/portfolio.toml")?;
//! let mut stage = Stage::new(&RevealConfig::default());
//! for section in &page.sections {
//!     stage.mount(section)?;
//! }
//! stage.scroll_to(800.0);
//! stage.run_for(1000.0);
//! for event in stage.drain_events() {
//!     println!("{:?}", event.event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod error;
pub mod frame;
pub mod lifecycle;
pub mod scroll;
pub mod stage;
pub mod surface;
pub mod trigger;

pub use animation::{
    AnimatableProperty, AnimatableValue, AnimationState, Direction, EasingFunction, ElementId,
    ElementSpec, InteractionInput, InteractionSpec, MicroTweenSpec, PageSpec, PropertySet,
    QueuedEvent, SectionSpec, SectionTimelineSpec, StageEvent, StepSpec, TimelineEvent,
    TimelineSpec, TriggerEvent, TriggerEventKind, TriggerSpec,
};
pub use error::{Result, SceneError};
pub use lifecycle::Disposable;
pub use scroll::{ScrollPosition, Viewport};
pub use stage::{SectionHandle, Stage};
pub use surface::{ElementBounds, VisualSurface};
pub use trigger::{Marker, ToggleAction, ToggleActions, TriggerWindow, WindowGeometry};
