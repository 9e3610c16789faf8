//! Error types for the scene engine.

use thiserror::Error;

use crate::animation::types::{ElementId, ScopeId};

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors that can occur while configuring or driving a stage.
#[derive(Error, Debug)]
pub enum SceneError {
    /// A trigger window whose resolved start is not strictly before its end.
    #[error("invalid trigger window: start {start} must be before end {end}")]
    InvalidWindow { start: f64, end: f64 },

    /// A threshold marker that does not parse.
    #[error("invalid marker `{0}`")]
    InvalidMarker(String),

    /// A toggle action string that does not parse.
    #[error("invalid toggle actions `{0}`")]
    InvalidToggleActions(String),

    /// A step target that is not attached to the surface. Only produced by the
    /// surface and swallowed by the timeline that wrote to it.
    #[error("element `{0}` is not attached")]
    MissingTarget(ElementId),

    /// Registration through a scope that has already been closed.
    #[error("{0} is closed")]
    ScopeClosed(ScopeId),

    /// Registration through a scope this stage never opened.
    #[error("{0} does not exist")]
    UnknownScope(ScopeId),

    /// A page spec that is well-formed TOML but not a valid page.
    #[error("invalid page spec: {0}")]
    Spec(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
