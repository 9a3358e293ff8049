//! Timetable quality metrics.
//!
//! # Sub-scores (0–100)
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Workload balance | 100 − population stdev of faculty weekly hours |
//! | Room utilization | Mean room occupancy over non-break cells |
//! | Slot efficiency | Filled / non-break cells |
//! | Conflict resolution | Resolved / detected (100 when none detected) |
//!
//! The composite is the weighted mean of the four sub-scores. Every sum
//! runs in input order, so scoring the same grid twice gives the same
//! value bit for bit.
//!
//! # Soft penalty
//!
//! Swaps never change the sub-scores above, so the optimizer ranks grids
//! by `composite − soft_penalty`, where the penalty sums:
//! - lab/practical hours in the afternoon
//! - adjacent theory periods (double for the same subject)
//! - per-member variance of daily hours
//! - idle cells between the first and last session of a day

use serde::Serialize;

use crate::context::RunContext;
use crate::models::{Cell, Day, Grid, SubjectType};
use crate::rooms::room_utilization;

const AFTERNOON_BLOCK_PENALTY: f64 = 2.0;
const ADJACENT_THEORY_PENALTY: f64 = 1.0;
const ADJACENT_SAME_SUBJECT_PENALTY: f64 = 2.0;
const DAILY_SPREAD_PENALTY: f64 = 0.5;
const IDLE_GAP_PENALTY: f64 = 0.5;

/// Quality of a timetable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityScore {
    /// Weighted composite, 0–100.
    pub composite: f64,
    pub workload_balance: f64,
    pub room_utilization: f64,
    pub slot_efficiency: f64,
    pub conflict_resolution: f64,
}

/// Conflict counts from the resolver stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConflictTally {
    pub detected: usize,
    pub resolved: usize,
}

impl ConflictTally {
    pub fn new(detected: usize, resolved: usize) -> Self {
        Self { detected, resolved }
    }

    /// Percentage resolved; 100 when nothing was detected.
    pub fn rate(&self) -> f64 {
        if self.detected == 0 {
            return 100.0;
        }
        (self.resolved as f64 / self.detected as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Scores grids of one run.
#[derive(Debug, Clone, Copy)]
pub struct QualityScorer<'a> {
    ctx: RunContext<'a>,
    tally: ConflictTally,
}

impl<'a> QualityScorer<'a> {
    pub fn new(ctx: RunContext<'a>, tally: ConflictTally) -> Self {
        Self { ctx, tally }
    }

    /// Computes all sub-scores and the composite.
    pub fn score(&self, grid: &Grid) -> QualityScore {
        let workload_balance = self.workload_balance(grid);
        let room_utilization = self.room_utilization(grid);
        let slot_efficiency = slot_efficiency(grid);
        let conflict_resolution = self.tally.rate();

        let w = &self.ctx.config.weights;
        let total = w.total();
        let composite = if total > 0.0 {
            (w.workload_balance * workload_balance
                + w.room_utilization * room_utilization
                + w.slot_efficiency * slot_efficiency
                + w.conflict_resolution * conflict_resolution)
                / total
        } else {
            0.0
        };

        QualityScore {
            composite,
            workload_balance,
            room_utilization,
            slot_efficiency,
            conflict_resolution,
        }
    }

    /// Optimizer objective: composite minus soft penalty.
    pub fn fitness(&self, grid: &Grid) -> f64 {
        self.score(grid).composite - self.soft_penalty(grid)
    }

    fn workload_balance(&self, grid: &Grid) -> f64 {
        let hours: Vec<f64> = self
            .ctx
            .input
            .faculty
            .iter()
            .map(|f| grid.faculty_hours(&f.id) as f64)
            .collect();
        (100.0 - std_dev(&hours)).clamp(0.0, 100.0)
    }

    fn room_utilization(&self, grid: &Grid) -> f64 {
        let rooms = &self.ctx.input.rooms;
        if rooms.is_empty() {
            return 0.0;
        }
        let sum: f64 = rooms.iter().map(|r| room_utilization(grid, &r.id)).sum();
        sum / rooms.len() as f64
    }

    /// Weighted count of soft-preference violations.
    pub fn soft_penalty(&self, grid: &Grid) -> f64 {
        let layout = self.ctx.layout();
        let mut penalty = 0.0;

        for (cell, session) in grid.occupied() {
            if session.session_type.is_block() && layout.is_afternoon(cell.slot) {
                penalty += AFTERNOON_BLOCK_PENALTY;
            }
            if session.session_type != SubjectType::Theory {
                continue;
            }
            if let Some(next) = grid.get(Cell::new(cell.day, cell.slot + 1)) {
                if next.subject_id == session.subject_id {
                    penalty += ADJACENT_SAME_SUBJECT_PENALTY;
                } else if next.session_type == SubjectType::Theory {
                    penalty += ADJACENT_THEORY_PENALTY;
                }
            }
        }

        for faculty in &self.ctx.input.faculty {
            let daily: Vec<f64> = Day::ALL
                .iter()
                .map(|&d| grid.faculty_day_hours(&faculty.id, d) as f64)
                .collect();
            penalty += DAILY_SPREAD_PENALTY * variance(&daily);
        }

        for &day in &Day::ALL {
            penalty += IDLE_GAP_PENALTY * idle_cells(grid, day) as f64;
        }
        penalty
    }
}

/// Filled cells as a percentage of non-break cells.
pub fn slot_efficiency(grid: &Grid) -> f64 {
    let usable = grid.total_cells().saturating_sub(grid.break_count());
    if usable == 0 {
        return 0.0;
    }
    grid.filled_count() as f64 / usable as f64 * 100.0
}

/// Empty non-break cells between a day's first and last session.
fn idle_cells(grid: &Grid, day: Day) -> usize {
    let slots: Vec<usize> = grid.day_sessions(day).map(|(c, _)| c.slot).collect();
    let (Some(&first), Some(&last)) = (slots.first(), slots.last()) else {
        return 0;
    };
    (first..=last)
        .map(|s| Cell::new(day, s))
        .filter(|&c| grid.is_free(c))
        .count()
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}
