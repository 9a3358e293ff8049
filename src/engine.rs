//! Generation pipeline.
//!
//! Normalize → Schedule → Detect → Resolve → Assign rooms → Optimize →
//! Report. Each stage receives the grid explicitly; nothing outlives a
//! run. All randomness flows through one RNG, so a seeded run is
//! reproducible.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::conflict::{ConflictDetector, ConflictResolver};
use crate::context::RunContext;
use crate::error::EngineError;
use crate::models::{Conflict, ConflictType, Grid, Severity, TimetableInput};
use crate::optimizer::{ConflictTally, OptimizationStats, Optimizer, QualityScore, QualityScorer};
use crate::rooms::{RoomAssigner, RoomAssignment};
use crate::scheduler::GreedyScheduler;
use crate::stats::ScheduleStatistics;
use crate::validation::{validate_input, NormalizedInput, ValidationError};

/// Everything one generation run produces.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    /// Final timetable.
    pub grid: Grid,
    /// Conflicts left on the final grid.
    pub conflicts: Vec<Conflict>,
    /// Room bookings of the final grid.
    pub room_assignments: Vec<RoomAssignment>,
    pub quality: QualityScore,
    /// `None` when optimization is disabled.
    pub optimization: Option<OptimizationStats>,
    pub statistics: ScheduleStatistics,
    /// Input problems repaired during normalization.
    pub warnings: Vec<ValidationError>,
}

impl GenerationResult {
    /// Whether the run ended without conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Timetable generation engine.
///
/// # Example
///
/// ```
/// use u_timetable::{EngineConfig, TimetableEngine};
/// use u_timetable::models::{Faculty, Subject, TimetableInput};
///
/// let engine = TimetableEngine::new(EngineConfig::default().with_seed(7)).unwrap();
/// let input = TimetableInput::new(
///     vec![Subject::new("MATH").with_name("Calculus").with_weekly_hours(3)],
///     vec![Faculty::new("F1").with_specialization("calculus")],
/// );
///
/// let result = engine.generate(&input);
/// assert_eq!(result.grid.subject_hours("MATH"), 3);
/// assert!(result.is_clean());
/// ```
#[derive(Debug, Clone)]
pub struct TimetableEngine {
    config: EngineConfig,
}

impl TimetableEngine {
    /// Creates an engine.
    ///
    /// # Errors
    /// [`EngineError::InvalidConfig`] if the configuration is inconsistent.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates a timetable, seeding the RNG from the configuration or
    /// from OS entropy.
    pub fn generate(&self, input: &TimetableInput) -> GenerationResult {
        let mut rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        self.generate_with_rng(input, &mut rng)
    }

    /// Generates a timetable with a caller-supplied RNG.
    pub fn generate_with_rng<R: Rng>(&self, input: &TimetableInput, rng: &mut R) -> GenerationResult {
        let config = &self.config;
        let normalized = match NormalizedInput::new(input, config.grid.total_slots()) {
            Ok(normalized) => normalized,
            Err(err) => return self.degenerate(input, &err),
        };
        let ctx = RunContext::new(&normalized, config);
        let rooms_in_scope = config.assign_rooms;
        info!(
            subjects = normalized.subjects.len(),
            faculty = normalized.faculty.len(),
            rooms = normalized.rooms.len(),
            "Generating timetable"
        );

        let outcome = GreedyScheduler::new().schedule(&ctx, rng);
        let mut grid = outcome.grid;
        let unplaced = outcome.unplaced;

        let tally = match (config.detect_conflicts, config.auto_resolve) {
            (false, _) => ConflictTally::default(),
            (true, true) => {
                let report = ConflictResolver::new(ctx, rooms_in_scope)
                    .with_preferred_faculty(outcome.faculty_by_subject)
                    .resolve(&mut grid);
                ConflictTally::new(report.initially_detected, report.resolved)
            }
            (true, false) => {
                let detected = ConflictDetector::new(ctx, rooms_in_scope).detect(&grid).len();
                ConflictTally::new(detected, 0)
            }
        };

        let assigner = RoomAssigner::new(ctx);
        if config.assign_rooms {
            assigner.assign(&mut grid);
        }

        let optimization = if config.optimize {
            let (optimized, stats) = Optimizer::new(ctx, tally, rooms_in_scope).optimize(grid, rng);
            grid = optimized;
            Some(stats)
        } else {
            None
        };

        // Swaps carry rooms along, so records are taken from the final grid.
        let room_assignments = if config.assign_rooms {
            assigner.records(&grid)
        } else {
            Vec::new()
        };
        // Without detection, shortfalls still surface from the scheduler's
        // report; later stages never change per-subject hours.
        let conflicts = if config.detect_conflicts {
            ConflictDetector::new(ctx, rooms_in_scope).detect(&grid)
        } else {
            unplaced
                .iter()
                .filter_map(|u| normalized.subject(&u.subject_id).map(|s| u.to_conflict(s)))
                .collect()
        };
        let quality = QualityScorer::new(ctx, tally).score(&grid);
        let statistics = ScheduleStatistics::calculate(&ctx, &grid, &conflicts, tally);

        info!(
            filled = grid.filled_count(),
            conflicts = conflicts.len(),
            composite = quality.composite,
            "Timetable generated"
        );

        GenerationResult {
            grid,
            conflicts,
            room_assignments,
            quality,
            optimization,
            statistics,
            warnings: normalized.warnings.clone(),
        }
    }

    /// Result for input with nothing to schedule: an empty grid and one
    /// conflict explaining why.
    fn degenerate(&self, input: &TimetableInput, err: &EngineError) -> GenerationResult {
        warn!(error = %err, "Input cannot be scheduled");
        let slots = self.config.grid.total_slots();
        let grid = Grid::new(slots);

        let mut conflict = Conflict::new(
            ConflictType::Coverage,
            Severity::Critical,
            format!("Critical: {err}"),
            "Provide at least one subject with weekly hours and one faculty member",
        );
        for subject in &input.subjects {
            conflict = conflict.with_subject(&subject.id);
        }
        let conflicts = vec![conflict];

        let statistics = ScheduleStatistics {
            total_cells: grid.total_cells(),
            conflict_resolution_rate: 0.0,
            remaining_conflicts: [(ConflictType::Coverage.to_string(), 1)].into_iter().collect(),
            ..ScheduleStatistics::default()
        };
        let quality = QualityScore {
            composite: 0.0,
            workload_balance: 0.0,
            room_utilization: 0.0,
            slot_efficiency: 0.0,
            conflict_resolution: 0.0,
        };

        GenerationResult {
            grid,
            conflicts,
            room_assignments: Vec::new(),
            quality,
            optimization: None,
            statistics,
            warnings: validate_input(input, slots).err().unwrap_or_default(),
        }
    }
}
