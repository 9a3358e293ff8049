//! Timetable statistics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Efficiency | Filled / non-break cells × 100 |
//! | Faculty utilization | Weekly hours / effective weekly cap × 100 |
//! | Subject coverage | Scheduled / weekly hours × 100 |
//! | Room utilization | Room occupancy / non-break cells × 100 |
//! | Resolution rate | Resolved / detected conflicts × 100 |
//!
//! Maps are ordered by id so serialized output is stable.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::context::RunContext;
use crate::models::{Conflict, Grid};
use crate::optimizer::score::slot_efficiency;
use crate::optimizer::ConflictTally;
use crate::rooms::room_utilization;

/// Summary figures for a generated timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleStatistics {
    pub total_cells: usize,
    pub filled_cells: usize,
    pub break_cells: usize,
    /// Filled share of non-break cells (%).
    pub efficiency: f64,
    /// Faculty id → utilization (%).
    pub faculty_utilization: BTreeMap<String, f64>,
    /// Subject id → coverage (%).
    pub subject_coverage: BTreeMap<String, f64>,
    /// Room id → utilization (%).
    pub room_utilization: BTreeMap<String, f64>,
    /// Resolved share of detected conflicts (%).
    pub conflict_resolution_rate: f64,
    /// Sessions without a room.
    pub unassigned_rooms: usize,
    /// Conflict type → count of remaining conflicts.
    pub remaining_conflicts: BTreeMap<String, usize>,
}

impl ScheduleStatistics {
    /// Computes statistics for a final grid and its remaining conflicts.
    pub fn calculate(ctx: &RunContext<'_>, grid: &Grid, conflicts: &[Conflict], tally: ConflictTally) -> Self {
        let faculty_utilization = ctx
            .input
            .faculty
            .iter()
            .map(|f| (f.id.clone(), ctx.utilization(grid, f) * 100.0))
            .collect();

        let subject_coverage = ctx
            .input
            .subjects
            .iter()
            .map(|s| {
                let coverage = if s.weekly_hours == 0 {
                    100.0
                } else {
                    grid.subject_hours(&s.id) as f64 / s.weekly_hours as f64 * 100.0
                };
                (s.id.clone(), coverage)
            })
            .collect();

        let room_utilization = ctx
            .input
            .rooms
            .iter()
            .map(|r| (r.id.clone(), room_utilization(grid, &r.id)))
            .collect();

        let mut remaining_conflicts = BTreeMap::new();
        for c in conflicts {
            *remaining_conflicts.entry(c.conflict_type.to_string()).or_insert(0) += 1;
        }

        Self {
            total_cells: grid.total_cells(),
            filled_cells: grid.filled_count(),
            break_cells: grid.break_count(),
            efficiency: slot_efficiency(grid),
            faculty_utilization,
            subject_coverage,
            room_utilization,
            conflict_resolution_rate: tally.rate(),
            unassigned_rooms: grid.occupied().filter(|(_, s)| s.room_id.is_none()).count(),
            remaining_conflicts,
        }
    }

    /// Mean subject coverage (%), 0 when there are no subjects.
    pub fn mean_coverage(&self) -> f64 {
        if self.subject_coverage.is_empty() {
            return 0.0;
        }
        self.subject_coverage.values().sum::<f64>() / self.subject_coverage.len() as f64
    }
}
