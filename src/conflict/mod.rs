//! Conflict detection and repair.
//!
//! - [`ConflictDetector`]: classifies rule violations on a grid
//! - [`ConflictResolver`]: bounded repair loop with aggressive escalation

mod detector;
mod resolver;

pub use detector::ConflictDetector;
pub use resolver::{ConflictResolver, ResolutionReport};
