//! Per-run context shared by the pipeline stages.
//!
//! A [`RunContext`] borrows the frozen input and the configuration. It owns
//! no mutable state: every stage receives the grid explicitly and returns
//! it, so separate runs never share anything.
//!
//! The placement rules live here so the scheduler, resolver and optimizer
//! all agree on what a legal cell is.

use crate::config::{EngineConfig, GridLayout};
use crate::models::{BreakTime, Cell, Day, Faculty, Grid, SessionAssignment, Subject};
use crate::validation::NormalizedInput;

/// How strictly soft rules are applied when placing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// Regular slots, tag-matched faculty.
    #[default]
    Normal,
    /// Extended end-of-day slots allowed, specialization ignored.
    Aggressive,
}

/// Immutable view of one generation run.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub input: &'a NormalizedInput,
    pub config: &'a EngineConfig,
}

impl<'a> RunContext<'a> {
    pub fn new(input: &'a NormalizedInput, config: &'a EngineConfig) -> Self {
        Self { input, config }
    }

    #[inline]
    pub fn layout(&self) -> &'a GridLayout {
        &self.config.grid
    }

    /// Creates an empty grid with every break cell marked.
    pub fn new_grid(&self) -> Grid {
        let mut grid = Grid::new(self.layout().total_slots());
        for cell in self.input.breaks.iter().flat_map(BreakTime::cells) {
            grid.mark_break(cell);
        }
        grid
    }

    /// Usable slots per day for a mode.
    pub fn usable_slots(&self, mode: PlacementMode) -> usize {
        match mode {
            PlacementMode::Normal => self.layout().slots_per_day,
            PlacementMode::Aggressive => self.layout().total_slots(),
        }
    }

    /// Effective weekly cap of a member.
    pub fn weekly_cap(&self, faculty: &Faculty) -> u32 {
        faculty.max_weekly_hours.min(self.config.max_weekly_hours)
    }

    /// Effective daily cap of a member.
    pub fn daily_cap(&self, faculty: &Faculty) -> u32 {
        faculty.max_daily_hours.min(self.config.max_daily_hours)
    }

    /// Weekly hours the member can still take.
    pub fn spare_weekly(&self, grid: &Grid, faculty: &Faculty) -> u32 {
        self.weekly_cap(faculty)
            .saturating_sub(grid.faculty_hours(&faculty.id))
    }

    /// Fraction of the weekly cap in use (1.0 when the cap is zero).
    pub fn utilization(&self, grid: &Grid, faculty: &Faculty) -> f64 {
        let cap = self.weekly_cap(faculty);
        if cap == 0 {
            return 1.0;
        }
        grid.faculty_hours(&faculty.id) as f64 / cap as f64
    }

    /// Whether the subject may sit in the cell under the window and
    /// Saturday rules.
    pub fn cell_allowed(&self, subject: &Subject, cell: Cell, mode: PlacementMode) -> bool {
        if cell.slot >= self.usable_slots(mode) {
            return false;
        }
        let layout = self.layout();
        if subject.mandatory {
            layout.in_mandatory_window(cell)
        } else {
            !layout.in_mandatory_window(cell) && layout.open_to_regular(cell)
        }
    }

    /// Whether the member can take `hours` more at the cell's day without
    /// breaking availability or caps.
    pub fn faculty_can_take(&self, grid: &Grid, faculty: &Faculty, cell: Cell, hours: u32) -> bool {
        faculty.is_available_at(cell)
            && grid.faculty_hours(&faculty.id) + hours <= self.weekly_cap(faculty)
            && grid.faculty_day_hours(&faculty.id, cell.day) + hours <= self.daily_cap(faculty)
    }

    /// Whether a single lab/practical hour at the cell keeps the subject's
    /// day a single contiguous run.
    pub fn extends_block(&self, grid: &Grid, subject: &Subject, cell: Cell) -> bool {
        let slots = grid.subject_day_slots(&subject.id, cell.day);
        match (slots.first(), slots.last()) {
            (Some(&first), Some(&last)) => cell.slot + 1 == first || cell.slot == last + 1,
            _ => true,
        }
    }

    /// Full check for placing one hour of `subject` taught by `faculty`.
    pub fn can_place(
        &self,
        grid: &Grid,
        subject: &Subject,
        faculty: &Faculty,
        cell: Cell,
        mode: PlacementMode,
    ) -> bool {
        grid.is_free(cell)
            && self.cell_allowed(subject, cell, mode)
            && self.faculty_can_take(grid, faculty, cell, 1)
            && (!subject.subject_type.is_block() || self.extends_block(grid, subject, cell))
    }

    /// Members eligible for a subject.
    ///
    /// Normal mode: tag-qualified members, else same-department members with
    /// spare weekly capacity. Aggressive mode: anyone with spare capacity.
    pub fn eligible_faculty(&self, grid: &Grid, subject: &Subject, mode: PlacementMode) -> Vec<&'a Faculty> {
        let all = &self.input.faculty;
        if mode == PlacementMode::Aggressive {
            return all.iter().filter(|f| self.spare_weekly(grid, f) > 0).collect();
        }
        let qualified: Vec<&Faculty> = all.iter().filter(|f| f.is_qualified_for(subject)).collect();
        if !qualified.is_empty() {
            return qualified;
        }
        if subject.department.is_empty() {
            return Vec::new();
        }
        all.iter()
            .filter(|f| f.department == subject.department && self.spare_weekly(grid, f) > 0)
            .collect()
    }

    /// Eligible member with the fewest assigned hours. Ties go to input order.
    pub fn select_faculty(&self, grid: &Grid, subject: &Subject, mode: PlacementMode) -> Option<&'a Faculty> {
        self.eligible_faculty(grid, subject, mode)
            .into_iter()
            .min_by_key(|f| grid.faculty_hours(&f.id))
    }

    /// Builds a session for subject and member.
    pub fn session(&self, subject: &Subject, faculty: &Faculty) -> SessionAssignment {
        SessionAssignment::new(&subject.id, &faculty.id, subject.subject_type, subject.mandatory)
    }

    /// All cells a mode may use, day-major.
    pub fn candidate_cells(&self, mode: PlacementMode) -> Vec<Cell> {
        let slots = self.usable_slots(mode);
        Day::ALL
            .iter()
            .flat_map(|&d| (0..slots).map(move |s| Cell::new(d, s)))
            .collect()
    }
}
