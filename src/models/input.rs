//! Input snapshot for one generation run.

use serde::{Deserialize, Serialize};

use super::{BreakTime, Faculty, Room, Subject};

/// Everything a run reads. Frozen for the duration of the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimetableInput {
    pub subjects: Vec<Subject>,
    pub faculty: Vec<Faculty>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub breaks: Vec<BreakTime>,
}

impl TimetableInput {
    /// Creates an input from subjects and faculty, with no rooms or breaks.
    pub fn new(subjects: Vec<Subject>, faculty: Vec<Faculty>) -> Self {
        Self {
            subjects,
            faculty,
            rooms: Vec::new(),
            breaks: Vec::new(),
        }
    }

    pub fn with_rooms(mut self, rooms: Vec<Room>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_breaks(mut self, breaks: Vec<BreakTime>) -> Self {
        self.breaks = breaks;
        self
    }

    /// Total weekly hours requested across subjects.
    pub fn requested_hours(&self) -> u32 {
        self.subjects.iter().map(|s| s.weekly_hours).sum()
    }
}
