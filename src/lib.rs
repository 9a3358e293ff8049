//! Weekly academic timetable engine.
//!
//! Assigns teaching sessions (subjects taught by faculty) to a weekly
//! day × slot grid for one section, detects rule violations, repairs what
//! it can, assigns rooms, scores the result and improves it by local search.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Subject`, `Faculty`, `Room`, `BreakTime`,
//!   `Grid`, `SessionAssignment`, `Conflict`
//! - **`validation`**: Input integrity checks and normalization
//! - **`context`**: Per-run placement rules and faculty eligibility
//! - **`scheduler`**: Priority ordering and greedy initial placement
//! - **`conflict`**: Conflict detection and bounded repair
//! - **`rooms`**: Capacity- and equipment-aware room assignment
//! - **`optimizer`**: Quality scoring and swap-based local search
//!   (greedy, population, simulated annealing)
//! - **`stats`**: Summary statistics of a generated timetable
//! - **`engine`**: The generation pipeline
//!
//! # Pipeline
//!
//! Normalize → Schedule → Detect → Resolve → Assign rooms → Optimize → Report.
//! A run is single-threaded and owns its grid; engines are `Send + Sync`
//! and may serve concurrent requests.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent Research Directions in Automated Timetabling"
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"

pub mod config;
pub mod conflict;
pub mod context;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod optimizer;
pub mod rooms;
pub mod scheduler;
pub mod stats;
pub mod validation;

pub use config::{EngineConfig, GridLayout, OptimizerAlgorithm, OptimizerTuning, QualityWeights};
pub use engine::{GenerationResult, TimetableEngine};
pub use error::{ConfigError, EngineError};
pub use models::TimetableInput;
