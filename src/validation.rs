//! Input validation and normalization.
//!
//! Checks structural integrity of subjects, faculty, rooms and breaks
//! before scheduling and builds the indexed snapshot a run works from.
//! Detects:
//! - Duplicate IDs
//! - Subjects with no weekly hours
//! - Breaks outside the grid
//! - Faculty who can never teach (zero weekly cap)
//!
//! Only an empty subject or faculty list is fatal. Everything else is
//! repaired (offending records dropped) and reported as a warning.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::error::EngineError;
use crate::models::{BreakTime, Faculty, Room, Subject, TimetableInput};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Finding category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationErrorKind {
    /// Two records share the same ID.
    DuplicateId,
    /// A subject asks for zero weekly hours.
    EmptySubject,
    /// A break slot lies outside the grid.
    InvalidBreak,
    /// A faculty member has a zero weekly cap.
    NoCapacity,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data for a timetabling run.
///
/// Checks:
/// 1. No duplicate subject, faculty or room IDs
/// 2. Every subject requests at least one weekly hour
/// 3. Every break slot lies inside a `slots`-slot day
/// 4. Every faculty member has a non-zero weekly cap
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(input: &TimetableInput, slots: usize) -> ValidationResult {
    let mut errors = Vec::new();

    check_duplicates(input.subjects.iter().map(|s| s.id.as_str()), "subject", &mut errors);
    check_duplicates(input.faculty.iter().map(|f| f.id.as_str()), "faculty", &mut errors);
    check_duplicates(input.rooms.iter().map(|r| r.id.as_str()), "room", &mut errors);

    for s in &input.subjects {
        if s.weekly_hours == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptySubject,
                format!("Subject '{}' requests no weekly hours", s.id),
            ));
        }
    }

    for b in &input.breaks {
        if b.slot >= slots {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBreak,
                format!("Break '{}' at slot {} lies outside the {slots}-slot day", b.label, b.slot),
            ));
        }
    }

    for f in &input.faculty {
        if f.max_weekly_hours == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoCapacity,
                format!("Faculty '{}' has a zero weekly cap", f.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_duplicates<'a>(
    ids: impl Iterator<Item = &'a str>,
    what: &str,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {what} ID: {id}"),
            ));
        }
    }
}

/// Indexed, de-duplicated snapshot of one run's input.
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    pub subjects: Vec<Subject>,
    pub faculty: Vec<Faculty>,
    pub rooms: Vec<Room>,
    pub breaks: Vec<BreakTime>,
    subject_index: HashMap<String, usize>,
    faculty_index: HashMap<String, usize>,
    room_index: HashMap<String, usize>,
    /// Problems found and repaired while normalizing.
    pub warnings: Vec<ValidationError>,
}

impl NormalizedInput {
    /// Normalizes raw input for a grid with `slots` slots per day.
    ///
    /// Later duplicates, zero-hour subjects and out-of-grid breaks are
    /// dropped; the findings are kept in `warnings`.
    ///
    /// # Errors
    /// [`EngineError::EmptyInput`] if no subjects or no faculty remain.
    pub fn new(input: &TimetableInput, slots: usize) -> Result<Self, EngineError> {
        let warnings = validate_input(input, slots).err().unwrap_or_default();
        for w in &warnings {
            warn!(kind = ?w.kind, "{}", w.message);
        }

        let subjects: Vec<Subject> = dedup_by_id(&input.subjects, |s| &s.id)
            .into_iter()
            .filter(|s| s.weekly_hours > 0)
            .collect();
        let faculty = dedup_by_id(&input.faculty, |f| &f.id);
        let rooms = dedup_by_id(&input.rooms, |r| &r.id);
        let breaks: Vec<BreakTime> = input
            .breaks
            .iter()
            .filter(|b| b.slot < slots)
            .cloned()
            .collect();

        if subjects.is_empty() {
            return Err(EngineError::EmptyInput("no subjects to schedule".into()));
        }
        if faculty.is_empty() {
            return Err(EngineError::EmptyInput("no faculty available".into()));
        }

        let subject_index = index_by_id(&subjects, |s| &s.id);
        let faculty_index = index_by_id(&faculty, |f| &f.id);
        let room_index = index_by_id(&rooms, |r| &r.id);

        Ok(Self {
            subjects,
            faculty,
            rooms,
            breaks,
            subject_index,
            faculty_index,
            room_index,
            warnings,
        })
    }

    /// Looks up a subject by id.
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subject_index.get(id).map(|&i| &self.subjects[i])
    }

    /// Looks up a faculty member by id.
    pub fn faculty_member(&self, id: &str) -> Option<&Faculty> {
        self.faculty_index.get(id).map(|&i| &self.faculty[i])
    }

    /// Looks up a room by id.
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.room_index.get(id).map(|&i| &self.rooms[i])
    }
}

fn dedup_by_id<T: Clone>(items: &[T], id: impl Fn(&T) -> &String) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(id(*item).clone()))
        .cloned()
        .collect()
}

fn index_by_id<T>(items: &[T], id: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (id(item).clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, SubjectType};

    fn sample_input() -> TimetableInput {
        TimetableInput::new(
            vec![
                Subject::new("S1").with_name("Algebra").with_weekly_hours(3),
                Subject::new("S2")
                    .with_name("Circuits Lab")
                    .with_type(SubjectType::Lab)
                    .with_weekly_hours(2),
            ],
            vec![Faculty::new("F1").with_specialization("algebra")],
        )
        .with_rooms(vec![Room::new("R1", 60)])
        .with_breaks(vec![BreakTime::daily(3)])
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_input(), 8).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let mut input = sample_input();
        input.subjects.push(Subject::new("S1").with_name("Other"));
        input.rooms.push(Room::new("R1", 10));

        let errors = validate_input(&input, 8).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::DuplicateId)
                .count(),
            2
        );
        assert!(errors.iter().any(|e| e.message.contains("room")));
    }

    #[test]
    fn test_empty_subject_and_bad_break() {
        let mut input = sample_input();
        input.subjects.push(Subject::new("S3").with_weekly_hours(0));
        input.breaks.push(BreakTime::on(Day::Monday, 12));
        input.faculty.push(Faculty::new("F2").with_caps(0, 0));

        let errors = validate_input(&input, 8).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptySubject));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidBreak));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoCapacity));
    }

    #[test]
    fn test_normalize_drops_and_indexes() {
        let mut input = sample_input();
        input.subjects.push(Subject::new("S1").with_name("Shadow"));
        input.subjects.push(Subject::new("S3").with_weekly_hours(0));
        input.breaks.push(BreakTime::on(Day::Monday, 12));

        let n = NormalizedInput::new(&input, 8).unwrap();
        assert_eq!(n.subjects.len(), 2);
        assert_eq!(n.subject("S1").unwrap().name, "Algebra");
        assert!(n.subject("S3").is_none());
        assert_eq!(n.breaks.len(), 1);
        assert!(n.faculty_member("F1").is_some());
        assert!(n.room("R1").is_some());
        assert_eq!(n.warnings.len(), 3);
    }

    #[test]
    fn test_normalize_empty_is_fatal() {
        let no_subjects = TimetableInput::new(vec![], vec![Faculty::new("F1")]);
        assert!(matches!(
            NormalizedInput::new(&no_subjects, 8),
            Err(EngineError::EmptyInput(_))
        ));

        let no_faculty = TimetableInput::new(vec![Subject::new("S1")], vec![]);
        assert!(matches!(
            NormalizedInput::new(&no_faculty, 8),
            Err(EngineError::EmptyInput(_))
        ));

        let only_zero_hours =
            TimetableInput::new(vec![Subject::new("S1").with_weekly_hours(0)], vec![Faculty::new("F1")]);
        assert!(NormalizedInput::new(&only_zero_hours, 8).is_err());
    }
}
