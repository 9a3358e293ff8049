//! Weekly grid (solution) model.
//!
//! The grid is a flat `days × slots` matrix of cells. Each cell is either
//! empty, a break, or holds exactly one session. Because it is a plain
//! value, optimizer snapshots are ordinary clones.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::SubjectType;

/// Teaching day. Saturday hosts the mandatory window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    /// All teaching days in week order.
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// Number of teaching days.
    pub const COUNT: usize = 6;

    /// Zero-based ordinal.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Day for an ordinal, if in range.
    pub fn from_index(index: usize) -> Option<Day> {
        Day::ALL.get(index).copied()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A (day, slot) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub day: Day,
    pub slot: usize,
}

impl Cell {
    pub fn new(day: Day, slot: usize) -> Self {
        Self { day, slot }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} slot {}", self.day, self.slot + 1)
    }
}

/// One scheduled teaching hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAssignment {
    /// Scheduled subject.
    pub subject_id: String,
    /// Teaching faculty member.
    pub faculty_id: String,
    /// Assigned room, filled by the room assigner.
    pub room_id: Option<String>,
    /// Copied from the subject for quick checks.
    pub session_type: SubjectType,
    /// Copied from the subject for quick checks.
    pub is_mandatory: bool,
}

impl SessionAssignment {
    /// Creates an assignment without a room.
    pub fn new(
        subject_id: impl Into<String>,
        faculty_id: impl Into<String>,
        session_type: SubjectType,
        is_mandatory: bool,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            faculty_id: faculty_id.into(),
            room_id: None,
            session_type,
            is_mandatory,
        }
    }

    /// Sets the room.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }
}

/// The weekly timetable grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    slots_per_day: usize,
    cells: Vec<Option<SessionAssignment>>,
    breaks: Vec<bool>,
}

impl Grid {
    /// Creates an empty grid with `slots_per_day` slots on every day.
    pub fn new(slots_per_day: usize) -> Self {
        let len = Day::COUNT * slots_per_day;
        Self {
            slots_per_day,
            cells: vec![None; len],
            breaks: vec![false; len],
        }
    }

    /// Slots per day (including extended slots).
    #[inline]
    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    /// Total number of cells.
    #[inline]
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        (cell.slot < self.slots_per_day).then(|| cell.day.index() * self.slots_per_day + cell.slot)
    }

    fn cell_at(&self, index: usize) -> Cell {
        let day = Day::ALL[index / self.slots_per_day];
        Cell::new(day, index % self.slots_per_day)
    }

    /// Whether the coordinate lies inside the grid.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.slot < self.slots_per_day
    }

    /// All coordinates in day-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cells.len()).map(move |i| self.cell_at(i))
    }

    /// Session at a cell.
    pub fn get(&self, cell: Cell) -> Option<&SessionAssignment> {
        self.index(cell).and_then(|i| self.cells[i].as_ref())
    }

    /// Mutable session at a cell.
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut SessionAssignment> {
        match self.index(cell) {
            Some(i) => self.cells[i].as_mut(),
            None => None,
        }
    }

    /// Whether the cell is a break.
    pub fn is_break(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.breaks[i])
    }

    /// Whether the cell can take a new session: inside the grid, not a
    /// break, and empty.
    pub fn is_free(&self, cell: Cell) -> bool {
        match self.index(cell) {
            Some(i) => !self.breaks[i] && self.cells[i].is_none(),
            None => false,
        }
    }

    /// Places a session into a free cell. Returns `false` and leaves the grid
    /// untouched if the cell is not free.
    pub fn place(&mut self, cell: Cell, session: SessionAssignment) -> bool {
        if !self.is_free(cell) {
            return false;
        }
        if let Some(i) = self.index(cell) {
            self.cells[i] = Some(session);
            return true;
        }
        false
    }

    /// Removes and returns the session at a cell.
    pub fn take(&mut self, cell: Cell) -> Option<SessionAssignment> {
        self.index(cell).and_then(|i| self.cells[i].take())
    }

    /// Exchanges the contents of two cells. Break cells are never swapped.
    pub fn swap(&mut self, a: Cell, b: Cell) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(i), Some(j)) if !self.breaks[i] && !self.breaks[j] => {
                self.cells.swap(i, j);
                true
            }
            _ => false,
        }
    }

    /// Marks a cell as a break. Fails if the cell holds a session.
    pub fn mark_break(&mut self, cell: Cell) -> bool {
        match self.index(cell) {
            Some(i) if self.cells[i].is_none() => {
                self.breaks[i] = true;
                true
            }
            _ => false,
        }
    }

    /// Replaces one day's sessions with those of another grid of the same
    /// shape. Break markers are left alone. Returns `false` on a shape
    /// mismatch.
    pub fn copy_day(&mut self, other: &Grid, day: Day) -> bool {
        if other.slots_per_day != self.slots_per_day {
            return false;
        }
        let start = day.index() * self.slots_per_day;
        let end = start + self.slots_per_day;
        self.cells[start..end].clone_from_slice(&other.cells[start..end]);
        true
    }

    /// Number of break cells.
    pub fn break_count(&self) -> usize {
        self.breaks.iter().filter(|b| **b).count()
    }

    /// Number of cells holding a session.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Occupied cells with their sessions, in day-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Cell, &SessionAssignment)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.as_ref().map(|s| (self.cell_at(i), s)))
    }

    /// Cells holding sessions of a subject.
    pub fn cells_for_subject(&self, subject_id: &str) -> Vec<Cell> {
        self.occupied()
            .filter(|(_, s)| s.subject_id == subject_id)
            .map(|(c, _)| c)
            .collect()
    }

    /// Cells taught by a faculty member.
    pub fn cells_for_faculty(&self, faculty_id: &str) -> Vec<Cell> {
        self.occupied()
            .filter(|(_, s)| s.faculty_id == faculty_id)
            .map(|(c, _)| c)
            .collect()
    }

    /// Hours scheduled for a subject.
    pub fn subject_hours(&self, subject_id: &str) -> u32 {
        self.occupied()
            .filter(|(_, s)| s.subject_id == subject_id)
            .count() as u32
    }

    /// Weekly hours of a faculty member.
    pub fn faculty_hours(&self, faculty_id: &str) -> u32 {
        self.occupied()
            .filter(|(_, s)| s.faculty_id == faculty_id)
            .count() as u32
    }

    /// Hours of a faculty member on one day.
    pub fn faculty_day_hours(&self, faculty_id: &str, day: Day) -> u32 {
        self.day_sessions(day)
            .filter(|(_, s)| s.faculty_id == faculty_id)
            .count() as u32
    }

    /// Sessions on one day, in slot order.
    pub fn day_sessions(&self, day: Day) -> impl Iterator<Item = (Cell, &SessionAssignment)> + '_ {
        (0..self.slots_per_day).filter_map(move |slot| {
            let cell = Cell::new(day, slot);
            self.get(cell).map(|s| (cell, s))
        })
    }

    /// Number of sessions on one day.
    pub fn day_load(&self, day: Day) -> u32 {
        self.day_sessions(day).count() as u32
    }

    /// Slots of a subject on one day, ascending.
    pub fn subject_day_slots(&self, subject_id: &str, day: Day) -> Vec<usize> {
        self.day_sessions(day)
            .filter(|(_, s)| s.subject_id == subject_id)
            .map(|(c, _)| c.slot)
            .collect()
    }

    /// Whether a room is used by any session at a cell.
    pub fn room_in_use(&self, room_id: &str, cell: Cell) -> bool {
        self.get(cell)
            .and_then(|s| s.room_id.as_deref())
            .is_some_and(|r| r == room_id)
    }

    /// Number of sessions held in a room.
    pub fn room_hours(&self, room_id: &str) -> u32 {
        self.occupied()
            .filter(|(_, s)| s.room_id.as_deref() == Some(room_id))
            .count() as u32
    }
}

/// Whether ascending slots form one contiguous run.
pub fn is_contiguous(slots: &[usize]) -> bool {
    slots.windows(2).all(|w| w[1] == w[0] + 1)
}
