//! Reveal configuration system
//!
//! This crate provides centralized configuration management for the reveal
//! engine, loading settings from `reveal.toml` with environment variable
//! overrides on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure for reveal
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RevealConfig {
    /// Scroll coordinate settings
    pub scroll: ScrollConfig,
    /// Frame loop and teardown settings
    pub stage: StageConfig,
    /// Page spec location
    pub page: PageConfig,
    /// Logging settings
    pub log: LogConfig,
}

/// Scroll coordinate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Virtualized smooth scrolling. When disabled the position snaps to the
    /// native target on the next frame.
    pub smooth: bool,
    /// Fraction of the remaining distance covered per 60 Hz frame, in (0, 1].
    pub lerp: f64,
    /// Distance in pixels under which the smoothed position snaps to the target.
    pub snap_epsilon: f64,
    /// Multiplier applied to wheel deltas.
    pub multiplier: f64,
}

/// What happens to owned animations when a scope is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownMode {
    /// Restore every property the scope touched to its value before mount.
    #[default]
    Revert,
    /// Stop animations where they are.
    Abort,
}

/// Stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Nominal frame duration in milliseconds used by drivers
    pub frame_ms: f64,
    /// Initial viewport height in pixels
    pub viewport_height: f64,
    /// Initial scrollable content height in pixels
    pub content_height: f64,
    /// Teardown behaviour for closed scopes
    pub teardown: TeardownMode,
}

/// Page spec configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PageConfig {
    /// Path to a page spec TOML file
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            smooth: true,
            lerp: 0.1,
            snap_epsilon: 0.5,
            multiplier: 1.0,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            frame_ms: 1000.0 / 60.0,
            viewport_height: 900.0,
            content_height: 5400.0,
            teardown: TeardownMode::Revert,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl StageConfig {
    /// Largest scroll offset the content allows.
    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }
}

impl RevealConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the reveal.toml configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location (reveal.toml in the current directory)
    /// or return default configuration if file doesn't exist
    pub fn load_or_default() -> Self {
        Self::load_from_file("reveal.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Unparseable values are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("REVEAL_SMOOTH") {
            self.scroll.smooth = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = std::env::var("REVEAL_LERP") {
            if let Ok(lerp) = val.parse::<f64>() {
                self.scroll.lerp = lerp;
            }
        }
        if let Ok(val) = std::env::var("REVEAL_TEARDOWN") {
            match val.to_ascii_lowercase().as_str() {
                "revert" => self.stage.teardown = TeardownMode::Revert,
                "abort" => self.stage.teardown = TeardownMode::Abort,
                _ => {}
            }
        }
        if let Ok(path) = std::env::var("REVEAL_PAGE") {
            self.page.path = Some(PathBuf::from(path));
        }
        if let Ok(filter) = std::env::var("REVEAL_LOG") {
            self.log.filter = filter;
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from reveal.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scroll.lerp > 0.0 && self.scroll.lerp <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scroll.lerp must be in (0, 1], got {}",
                self.scroll.lerp
            )));
        }
        if !(self.scroll.snap_epsilon >= 0.0) {
            return Err(ConfigError::Invalid(
                "scroll.snap_epsilon must be non-negative".to_string(),
            ));
        }
        if !(self.stage.frame_ms > 0.0) {
            return Err(ConfigError::Invalid(
                "stage.frame_ms must be positive".to_string(),
            ));
        }
        if !(self.stage.viewport_height > 0.0) {
            return Err(ConfigError::Invalid(
                "stage.viewport_height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
