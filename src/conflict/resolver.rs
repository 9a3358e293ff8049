//! Bounded conflict repair.
//!
//! # Algorithm
//!
//! Each iteration re-detects, sorts by severity (critical first) and tries
//! one repair per conflict. When a whole iteration repairs nothing, the same
//! conflicts get an aggressive pass that ignores specialization, opens the
//! extended end-of-day slots, allows transfers above the soft utilization
//! threshold and may clear an unplaceable room. If that also repairs
//! nothing, the resolver gives up.
//!
//! Hard caps and the placement windows are never relaxed. A repair that
//! introduces a new violation is caught by the next re-detection.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::ConflictDetector;
use crate::context::{PlacementMode, RunContext};
use crate::models::{is_contiguous, Cell, Conflict, ConflictType, Faculty, Grid, Severity, Subject};
use crate::scheduler::{candidate_score, place_block};

/// Utilization above which a colleague is not offered transfers in normal mode.
const SOFT_UTILIZATION: f64 = 0.8;

/// Minimum capacity of an alternate room, relative to the original.
const ROOM_CAPACITY_RATIO: f64 = 0.8;

/// Outcome of a resolver run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    /// Conflicts left after the last iteration.
    pub remaining: Vec<Conflict>,
    /// Conflicts found before the first repair.
    pub initially_detected: usize,
    /// Initial conflicts no longer present at the end.
    pub resolved: usize,
    /// Iterations run.
    pub iterations: usize,
    /// Whether the aggressive pass was used.
    pub escalated: bool,
}

/// Repairs conflicts in place on a grid.
#[derive(Debug, Clone)]
pub struct ConflictResolver<'a> {
    ctx: RunContext<'a>,
    detector: ConflictDetector<'a>,
    rooms_in_scope: bool,
    preferred: HashMap<String, String>,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(ctx: RunContext<'a>, rooms_in_scope: bool) -> Self {
        Self {
            ctx,
            detector: ConflictDetector::new(ctx, rooms_in_scope),
            rooms_in_scope,
            preferred: HashMap::new(),
        }
    }

    /// Faculty chosen per subject by the scheduler; coverage repairs try
    /// them first.
    pub fn with_preferred_faculty(mut self, faculty_by_subject: HashMap<String, String>) -> Self {
        self.preferred = faculty_by_subject;
        self
    }

    /// Runs the repair loop.
    pub fn resolve(&self, grid: &mut Grid) -> ResolutionReport {
        let initial = self.detector.detect(grid);
        let max_iterations = self.ctx.config.max_resolution_attempts;
        let mut remaining = initial.clone();
        let mut iterations = 0usize;
        let mut escalated = false;

        while !remaining.is_empty() && iterations < max_iterations {
            iterations += 1;
            remaining.sort_by(|a, b| b.severity.cmp(&a.severity));

            let mut repaired = self.repair_pass(grid, &remaining, PlacementMode::Normal);
            if repaired == 0 {
                escalated = true;
                repaired = self.repair_pass(grid, &remaining, PlacementMode::Aggressive);
            }

            remaining = self.detector.detect(grid);
            debug!(iteration = iterations, repaired, remaining = remaining.len(), "Resolver iteration");
            if repaired == 0 {
                break;
            }
        }

        let left: HashSet<_> = remaining.iter().map(Conflict::key).collect();
        let resolved = initial.iter().filter(|c| !left.contains(&c.key())).count();
        info!(
            detected = initial.len(),
            resolved,
            remaining = remaining.len(),
            iterations,
            escalated,
            "Conflict resolution finished"
        );

        ResolutionReport {
            remaining,
            initially_detected: initial.len(),
            resolved,
            iterations,
            escalated,
        }
    }

    fn repair_pass(&self, grid: &mut Grid, conflicts: &[Conflict], mode: PlacementMode) -> usize {
        let mut repaired = 0;
        for conflict in conflicts {
            if self.repair(grid, conflict, mode) {
                debug!(kind = %conflict.conflict_type, ?mode, "Repaired: {}", conflict.description);
                repaired += 1;
            }
        }
        repaired
    }

    fn repair(&self, grid: &mut Grid, conflict: &Conflict, mode: PlacementMode) -> bool {
        match conflict.conflict_type {
            ConflictType::Faculty => conflict
                .location
                .is_some_and(|cell| self.repair_faculty(grid, cell, mode)),
            ConflictType::Room => conflict
                .location
                .is_some_and(|cell| self.repair_room(grid, cell, mode)),
            ConflictType::Workload => self.repair_workload(grid, conflict, mode),
            ConflictType::Break => conflict
                .location
                .is_some_and(|cell| self.repair_break(grid, cell, mode)),
            ConflictType::Time => conflict
                .location
                .is_some_and(|cell| self.repair_time(grid, cell, mode)),
            ConflictType::Coverage => conflict
                .affected_subjects
                .first()
                .is_some_and(|id| self.repair_coverage(grid, id, mode)),
        }
    }

    /// Another member takes the session, else the session moves.
    fn repair_faculty(&self, grid: &mut Grid, cell: Cell, mode: PlacementMode) -> bool {
        let Some((subject, current)) = self.resolve_session(grid, cell) else {
            return false;
        };
        if current.is_available_at(cell) {
            return false;
        }

        let alternate = self
            .ctx
            .eligible_faculty(grid, subject, mode)
            .into_iter()
            .filter(|f| f.id != current.id)
            .filter(|f| {
                mode == PlacementMode::Aggressive
                    || current.department.is_empty()
                    || f.department == current.department
            })
            .filter(|f| self.ctx.faculty_can_take(grid, f, cell, 1))
            .min_by_key(|f| grid.faculty_hours(&f.id));

        if let Some(alternate) = alternate {
            if let Some(session) = grid.get_mut(cell) {
                session.faculty_id = alternate.id.clone();
                return true;
            }
        }
        self.relocate(grid, cell, mode, false).is_some()
    }

    fn repair_room(&self, grid: &mut Grid, cell: Cell, mode: PlacementMode) -> bool {
        if !self.rooms_in_scope {
            return false;
        }
        let Some(room_id) = grid.get(cell).and_then(|s| s.room_id.clone()) else {
            return false;
        };
        let original = self.ctx.input.room(&room_id);
        if original.is_some_and(|r| r.is_available_at(cell)) {
            return false;
        }
        let min_capacity = match (mode, original) {
            (PlacementMode::Normal, Some(room)) => room.capacity as f64 * ROOM_CAPACITY_RATIO,
            _ => 0.0,
        };

        let alternate = self
            .ctx
            .input
            .rooms
            .iter()
            .filter(|r| r.id != room_id && r.capacity as f64 >= min_capacity)
            .filter(|r| r.is_available_at(cell) && !grid.room_in_use(&r.id, cell))
            .min_by_key(|r| grid.room_hours(&r.id));

        let Some(session) = grid.get_mut(cell) else {
            return false;
        };
        match alternate {
            Some(room) => {
                session.room_id = Some(room.id.clone());
                true
            }
            None if mode == PlacementMode::Aggressive => {
                session.room_id = None;
                true
            }
            None => false,
        }
    }

    /// Transfers excess hours to colleagues; daily overruns may also move
    /// to another day.
    fn repair_workload(&self, grid: &mut Grid, conflict: &Conflict, mode: PlacementMode) -> bool {
        let Some(faculty) = conflict
            .affected_faculty
            .first()
            .and_then(|id| self.ctx.input.faculty_member(id))
        else {
            return false;
        };

        let weekly = conflict.severity >= Severity::High;
        let (cells, excess) = if weekly {
            let hours = grid.faculty_hours(&faculty.id);
            (
                grid.cells_for_faculty(&faculty.id),
                hours.saturating_sub(self.ctx.weekly_cap(faculty)),
            )
        } else {
            let Some(day) = conflict.location.map(|c| c.day) else {
                return false;
            };
            let hours = grid.faculty_day_hours(&faculty.id, day);
            let cells: Vec<Cell> = grid
                .cells_for_faculty(&faculty.id)
                .into_iter()
                .filter(|c| c.day == day)
                .collect();
            (cells, hours.saturating_sub(self.ctx.daily_cap(faculty)))
        };
        if excess == 0 {
            return false;
        }

        let mut moved = 0u32;
        for cell in cells.into_iter().rev() {
            if moved >= excess {
                break;
            }
            if self.transfer(grid, cell, faculty, mode) {
                moved += 1;
            } else if !weekly && self.relocate(grid, cell, mode, false).is_some() {
                moved += 1;
            }
        }
        moved > 0
    }

    fn transfer(&self, grid: &mut Grid, cell: Cell, from: &Faculty, mode: PlacementMode) -> bool {
        let Some(subject) = grid
            .get(cell)
            .and_then(|s| self.ctx.input.subject(&s.subject_id))
        else {
            return false;
        };

        let colleague = self
            .ctx
            .input
            .faculty
            .iter()
            .filter(|f| f.id != from.id)
            .filter(|f| {
                mode == PlacementMode::Aggressive
                    || (self.qualified_colleague(f, subject)
                        && self.ctx.utilization(grid, f) < SOFT_UTILIZATION)
            })
            .filter(|f| self.ctx.faculty_can_take(grid, f, cell, 1))
            .min_by(|a, b| {
                self.ctx
                    .utilization(grid, a)
                    .total_cmp(&self.ctx.utilization(grid, b))
            });

        match (colleague, grid.get_mut(cell)) {
            (Some(colleague), Some(session)) => {
                session.faculty_id = colleague.id.clone();
                true
            }
            _ => false,
        }
    }

    fn qualified_colleague(&self, faculty: &Faculty, subject: &Subject) -> bool {
        faculty.is_qualified_for(subject)
            || (!subject.department.is_empty() && faculty.department == subject.department)
    }

    /// Marks the midday break when it falls inside the run, else splits the
    /// run at the overrun cell.
    fn repair_break(&self, grid: &mut Grid, cell: Cell, mode: PlacementMode) -> bool {
        let limit = self.ctx.config.max_consecutive_slots;
        if self.run_ending_at(grid, cell) <= limit {
            return false;
        }

        let midday = Cell::new(cell.day, self.ctx.layout().midday_break_slot);
        let run_start = cell.slot.saturating_sub(limit);
        let target = if (run_start..=cell.slot).contains(&midday.slot) && !grid.is_break(midday) {
            midday
        } else {
            cell
        };

        if grid.is_free(target) {
            return grid.mark_break(target);
        }
        self.relocate(grid, target, mode, true).is_some() && grid.mark_break(target)
    }

    fn run_ending_at(&self, grid: &Grid, cell: Cell) -> usize {
        (0..=cell.slot)
            .rev()
            .take_while(|&s| grid.get(Cell::new(cell.day, s)).is_some())
            .count()
    }

    fn repair_time(&self, grid: &mut Grid, cell: Cell, mode: PlacementMode) -> bool {
        let Some((subject, _)) = self.resolve_session(grid, cell) else {
            return false;
        };
        if !self.breaks_time_rule(grid, subject, cell) {
            return false;
        }
        self.relocate(grid, cell, mode, true).is_some()
    }

    fn breaks_time_rule(&self, grid: &Grid, subject: &Subject, cell: Cell) -> bool {
        if !self.ctx.cell_allowed(subject, cell, PlacementMode::Aggressive) {
            return true;
        }
        subject.subject_type.is_block() && !is_contiguous(&grid.subject_day_slots(&subject.id, cell.day))
    }

    /// Schedules missing hours: blocks first for labs, then single hours.
    fn repair_coverage(&self, grid: &mut Grid, subject_id: &str, mode: PlacementMode) -> bool {
        let Some(subject) = self.ctx.input.subject(subject_id) else {
            return false;
        };
        let missing = subject.weekly_hours.saturating_sub(grid.subject_hours(&subject.id));
        if missing == 0 {
            return false;
        }
        let candidates = self.faculty_candidates(grid, subject, mode);
        let mut placed = 0u32;

        if subject.subject_type.is_block() && mode == PlacementMode::Normal {
            let block = self.ctx.layout().lab_block_length as u32;
            for faculty in &candidates {
                while placed < missing {
                    let len = block.min(missing - placed);
                    if place_block(&self.ctx, grid, subject, faculty, len as usize).is_none() {
                        break;
                    }
                    placed += len;
                }
            }
        }

        while placed < missing {
            let found = candidates.iter().find_map(|f| {
                self.best_cell(grid, subject, f, mode, |_| true)
                    .map(|cell| (cell, *f))
            });
            let Some((cell, faculty)) = found else {
                break;
            };
            grid.place(cell, self.ctx.session(subject, faculty));
            placed += 1;
        }
        placed > 0
    }

    /// Scheduler's choice first, then eligible members by load.
    fn faculty_candidates(&self, grid: &Grid, subject: &Subject, mode: PlacementMode) -> Vec<&'a Faculty> {
        let mut candidates: Vec<&'a Faculty> = self
            .preferred
            .get(&subject.id)
            .and_then(|id| self.ctx.input.faculty_member(id))
            .into_iter()
            .collect();
        let mut eligible = self.ctx.eligible_faculty(grid, subject, mode);
        eligible.sort_by_key(|f| grid.faculty_hours(&f.id));
        for f in eligible {
            if !candidates.iter().any(|c| c.id == f.id) {
                candidates.push(f);
            }
        }
        candidates
    }

    /// Moves the session at `cell` to the best legal cell elsewhere.
    ///
    /// The current member is tried first; with `other_faculty` eligible
    /// members follow. The session is put back when nothing fits.
    fn relocate(&self, grid: &mut Grid, cell: Cell, mode: PlacementMode, other_faculty: bool) -> Option<Cell> {
        let (subject, current) = self.resolve_session(grid, cell)?;
        if !self.detachable(grid, subject, cell) {
            return None;
        }
        let mut taken = grid.take(cell)?;

        let mut members = vec![current];
        if other_faculty {
            for f in self.faculty_candidates(grid, subject, mode) {
                if f.id != current.id {
                    members.push(f);
                }
            }
        }

        let target = members.into_iter().find_map(|f| {
            self.best_cell(grid, subject, f, mode, |c| c != cell)
                .map(|c| (c, f))
        });
        match target {
            Some((target, faculty)) => {
                taken.faculty_id = faculty.id.clone();
                let room_ok = taken
                    .room_id
                    .as_deref()
                    .map_or(true, |room_id| self.room_usable(grid, room_id, target));
                if !room_ok {
                    taken.room_id = None;
                }
                grid.place(target, taken);
                Some(target)
            }
            None => {
                grid.place(cell, taken);
                None
            }
        }
    }

    fn best_cell(
        &self,
        grid: &Grid,
        subject: &Subject,
        faculty: &Faculty,
        mode: PlacementMode,
        accept: impl Fn(Cell) -> bool,
    ) -> Option<Cell> {
        let mut best: Option<(f64, Cell)> = None;
        for cell in self.ctx.candidate_cells(mode) {
            if !accept(cell) || !self.ctx.can_place(grid, subject, faculty, cell, mode) {
                continue;
            }
            let score = candidate_score(&self.ctx, grid, subject, cell);
            match best {
                Some((b, _)) if score <= b => {}
                _ => best = Some((score, cell)),
            }
        }
        best.map(|(_, cell)| cell)
    }

    /// Removing a block hour must leave the rest of that day contiguous.
    fn detachable(&self, grid: &Grid, subject: &Subject, cell: Cell) -> bool {
        if !subject.subject_type.is_block() {
            return true;
        }
        let rest: Vec<usize> = grid
            .subject_day_slots(&subject.id, cell.day)
            .into_iter()
            .filter(|&s| s != cell.slot)
            .collect();
        is_contiguous(&rest)
    }

    fn room_usable(&self, grid: &Grid, room_id: &str, cell: Cell) -> bool {
        self.ctx
            .input
            .room(room_id)
            .is_some_and(|r| r.is_available_at(cell))
            && !grid.room_in_use(room_id, cell)
    }

    fn resolve_session(&self, grid: &Grid, cell: Cell) -> Option<(&'a Subject, &'a Faculty)> {
        let session = grid.get(cell)?;
        let subject = self.ctx.input.subject(&session.subject_id)?;
        let faculty = self.ctx.input.faculty_member(&session.faculty_id)?;
        Some((subject, faculty))
    }
}
