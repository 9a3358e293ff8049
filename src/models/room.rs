//! Room model.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Cell, SubjectType};

/// A teaching room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Seats.
    pub capacity: u32,
    /// Equipment tags (e.g., "projector", "computers").
    #[serde(default)]
    pub equipment: HashSet<String>,
    /// Cells booked outside this section's grid.
    #[serde(default)]
    pub unavailable: HashSet<Cell>,
}

impl Room {
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity,
            equipment: HashSet::new(),
            unavailable: HashSet::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_equipment(mut self, tag: impl Into<String>) -> Self {
        self.equipment.insert(tag.into().to_lowercase());
        self
    }

    pub fn with_unavailable(mut self, cell: Cell) -> Self {
        self.unavailable.insert(cell);
        self
    }

    /// Whether the room has every required equipment tag.
    pub fn has_equipment(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|tag| self.equipment.iter().any(|e| e.eq_ignore_ascii_case(tag)))
    }

    #[inline]
    pub fn is_available_at(&self, cell: Cell) -> bool {
        !self.unavailable.contains(&cell)
    }
}

/// Seats needed for a session type.
pub fn required_capacity(session_type: SubjectType) -> u32 {
    match session_type {
        SubjectType::Lab | SubjectType::Practical => 30,
        SubjectType::Theory => 60,
        SubjectType::Tutorial => 40,
    }
}

/// Equipment needed for a session type.
pub fn required_equipment(session_type: SubjectType) -> &'static [&'static str] {
    match session_type {
        SubjectType::Lab => &["computers", "projector"],
        SubjectType::Practical => &["equipment"],
        SubjectType::Theory | SubjectType::Tutorial => &["projector"],
    }
}
