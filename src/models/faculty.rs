//! Faculty model.
//!
//! A faculty member teaches sessions. Eligibility comes from specialization
//! tags, workload from weekly and daily caps, and availability from
//! commitments outside this section's grid.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Cell, Subject};

/// Tag that makes a member eligible for any mandatory subject.
pub const GENERAL_TAG: &str = "general";

/// A teaching faculty member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faculty {
    /// Unique faculty identifier. Used everywhere a member is referenced.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Specialization tags (e.g., "algebra", "lab", "general").
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Maximum teaching hours per week.
    pub max_weekly_hours: u32,
    /// Maximum teaching hours per day.
    pub max_daily_hours: u32,
    /// Home department.
    #[serde(default)]
    pub department: String,
    /// Cells already committed elsewhere (other sections, meetings).
    #[serde(default)]
    pub unavailable: HashSet<Cell>,
}

impl Faculty {
    /// Creates an untagged member with a 20 h/week, 6 h/day cap.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            specializations: Vec::new(),
            max_weekly_hours: 20,
            max_daily_hours: 6,
            department: String::new(),
            unavailable: HashSet::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a specialization tag.
    pub fn with_specialization(mut self, tag: impl Into<String>) -> Self {
        self.specializations.push(tag.into());
        self
    }

    /// Sets both workload caps.
    pub fn with_caps(mut self, weekly: u32, daily: u32) -> Self {
        self.max_weekly_hours = weekly;
        self.max_daily_hours = daily;
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Adds an external commitment.
    pub fn with_unavailable(mut self, cell: Cell) -> Self {
        self.unavailable.insert(cell);
        self
    }

    /// Whether the member has no specialization tags.
    pub fn is_untagged(&self) -> bool {
        self.specializations.iter().all(|t| t.trim().is_empty())
    }

    /// Whether the member carries the general tag.
    pub fn is_general(&self) -> bool {
        self.specializations
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(GENERAL_TAG))
    }

    /// Whether any specialization tag overlaps the subject's name, code or type.
    pub fn specializes_in(&self, subject: &Subject) -> bool {
        self.specializations.iter().any(|t| subject.matches_tag(t))
    }

    /// Tag-based eligibility: specialization match, or general/untagged for
    /// mandatory subjects.
    pub fn is_qualified_for(&self, subject: &Subject) -> bool {
        self.specializes_in(subject) || (subject.mandatory && (self.is_general() || self.is_untagged()))
    }

    /// Whether the member is free of outside commitments at a cell.
    #[inline]
    pub fn is_available_at(&self, cell: Cell) -> bool {
        !self.unavailable.contains(&cell)
    }

    /// Display label used in conflict messages.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, SubjectType};

    #[test]
    fn test_faculty_builder() {
        let f = Faculty::new("F1")
            .with_name("Dr. Rao")
            .with_specialization("algebra")
            .with_caps(16, 4)
            .with_department("MATH")
            .with_unavailable(Cell::new(Day::Monday, 0));

        assert_eq!(f.id, "F1");
        assert_eq!(f.label(), "Dr. Rao");
        assert_eq!(f.max_weekly_hours, 16);
        assert_eq!(f.max_daily_hours, 4);
        assert!(!f.is_available_at(Cell::new(Day::Monday, 0)));
        assert!(f.is_available_at(Cell::new(Day::Monday, 1)));
    }

    #[test]
    fn test_qualification() {
        let algebra = Subject::new("S1").with_name("Linear Algebra");
        let library = Subject::new("M1").with_name("Library").mandatory();
        let lab = Subject::new("S2").with_name("Circuits").with_type(SubjectType::Lab);

        let specialist = Faculty::new("F1").with_specialization("Algebra");
        let general = Faculty::new("F2").with_specialization("general");
        let untagged = Faculty::new("F3");
        let lab_tech = Faculty::new("F4").with_specialization("lab");

        assert!(specialist.is_qualified_for(&algebra));
        assert!(!specialist.is_qualified_for(&library));
        assert!(general.is_qualified_for(&library));
        assert!(!general.is_qualified_for(&algebra));
        assert!(untagged.is_qualified_for(&library));
        assert!(!untagged.is_qualified_for(&algebra));
        assert!(lab_tech.is_qualified_for(&lab));
    }

    #[test]
    fn test_label_falls_back_to_id() {
        assert_eq!(Faculty::new("F9").label(), "F9");
    }
}
