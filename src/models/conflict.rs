//! Conflict model.
//!
//! A conflict is a detected rule violation or coverage shortfall. Conflicts
//! are data: every imperfection of a run ends up here instead of in an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Cell;

/// Classification of conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    /// Faculty member booked twice at the same cell.
    Faculty,
    /// Room booked twice at the same cell.
    Room,
    /// Weekly or daily hour cap exceeded.
    Workload,
    /// Too many consecutive occupied slots without a break.
    Break,
    /// Placement rule broken (mandatory window, Saturday, lab contiguity).
    Time,
    /// Subject scheduled below its weekly hour target.
    Coverage,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictType::Faculty => "faculty",
            ConflictType::Room => "room",
            ConflictType::Workload => "workload",
            ConflictType::Break => "break",
            ConflictType::Time => "time",
            ConflictType::Coverage => "coverage",
        };
        f.write_str(s)
    }
}

/// Conflict severity. Ordered: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A detected conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    /// Type of conflict.
    pub conflict_type: ConflictType,
    /// Severity.
    pub severity: Severity,
    /// Subject ids involved.
    pub affected_subjects: Vec<String>,
    /// Faculty ids involved.
    pub affected_faculty: Vec<String>,
    /// Cell where the conflict sits, if it is local to one cell.
    pub location: Option<Cell>,
    /// Human-readable description.
    pub description: String,
    /// Suggested fix.
    pub suggested_resolution: String,
    /// Detection time.
    pub timestamp: DateTime<Utc>,
}

impl Conflict {
    /// Creates a conflict stamped with the current time.
    pub fn new(
        conflict_type: ConflictType,
        severity: Severity,
        description: impl Into<String>,
        suggested_resolution: impl Into<String>,
    ) -> Self {
        Self {
            conflict_type,
            severity,
            affected_subjects: Vec::new(),
            affected_faculty: Vec::new(),
            location: None,
            description: description.into(),
            suggested_resolution: suggested_resolution.into(),
            timestamp: Utc::now(),
        }
    }

    /// Adds an affected subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.affected_subjects.push(subject_id.into());
        self
    }

    /// Adds an affected faculty member.
    pub fn with_faculty(mut self, faculty_id: impl Into<String>) -> Self {
        self.affected_faculty.push(faculty_id.into());
        self
    }

    /// Sets the cell.
    pub fn at(mut self, cell: Cell) -> Self {
        self.location = Some(cell);
        self
    }

    /// Whether the conflict names a subject.
    pub fn involves_subject(&self, subject_id: &str) -> bool {
        self.affected_subjects.iter().any(|s| s == subject_id)
    }

    /// Identity ignoring the timestamp; used to tell whether a conflict
    /// survived a repair iteration.
    pub fn key(&self) -> (ConflictType, Option<Cell>, Vec<String>, Vec<String>) {
        (
            self.conflict_type,
            self.location,
            self.affected_subjects.clone(),
            self.affected_faculty.clone(),
        )
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{:?}] {}",
            self.conflict_type, self.severity, self.description
        )
    }
}
