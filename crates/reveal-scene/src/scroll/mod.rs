//! Scroll coordinate tracking.
//!
//! ```text
//! native scroll / wheel ──► SmoothScroll (target, damped current)
//!                                 │ once per frame
//!                                 ▼
//!                   ScrollCoordinateProvider ──► subscribers
//! ```

pub mod provider;
pub mod smooth;

pub use provider::{ScrollCoordinateProvider, ScrollPosition, Viewport};
pub use smooth::SmoothScroll;
