//! Subject model.
//!
//! A subject is a unit of teaching that must receive a number of weekly
//! hours on the grid. Its type decides how the hours are placed: labs and
//! practicals go in contiguous blocks, everything else in single periods.

use serde::{Deserialize, Serialize};

/// Teaching form of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    /// Lecture-style session.
    #[default]
    Theory,
    /// Computer or science lab. Placed as contiguous blocks.
    Lab,
    /// Workshop practical. Placed as contiguous blocks.
    Practical,
    /// Small-group tutorial.
    Tutorial,
}

impl SubjectType {
    /// Whether hours of this type are placed as contiguous blocks.
    #[inline]
    pub fn is_block(self) -> bool {
        matches!(self, SubjectType::Lab | SubjectType::Practical)
    }

    /// Placement priority (lower = placed earlier).
    pub fn priority_rank(self) -> u8 {
        match self {
            SubjectType::Lab => 0,
            SubjectType::Practical => 1,
            SubjectType::Tutorial => 2,
            SubjectType::Theory => 3,
        }
    }

    /// Lowercase name, as used in specialization tags.
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectType::Theory => "theory",
            SubjectType::Lab => "lab",
            SubjectType::Practical => "practical",
            SubjectType::Tutorial => "tutorial",
        }
    }
}

/// A subject to be timetabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Short course code (e.g., "CS201").
    #[serde(default)]
    pub code: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Teaching form.
    #[serde(default)]
    pub subject_type: SubjectType,
    /// Hours required per week.
    #[serde(default = "default_weekly_hours")]
    pub weekly_hours: u32,
    /// Institution-required subject restricted to the mandatory window.
    #[serde(default)]
    pub mandatory: bool,
    /// Owning department.
    #[serde(default)]
    pub department: String,
    /// Academic year tag.
    #[serde(default)]
    pub year: String,
}

fn default_weekly_hours() -> u32 {
    1
}

impl Subject {
    /// Creates a theory subject with one weekly hour.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: String::new(),
            name: String::new(),
            subject_type: SubjectType::Theory,
            weekly_hours: default_weekly_hours(),
            mandatory: false,
            department: String::new(),
            year: String::new(),
        }
    }

    /// Sets the course code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the subject name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the teaching form.
    pub fn with_type(mut self, subject_type: SubjectType) -> Self {
        self.subject_type = subject_type;
        self
    }

    /// Sets the weekly hour target.
    pub fn with_weekly_hours(mut self, hours: u32) -> Self {
        self.weekly_hours = hours;
        self
    }

    /// Marks the subject as mandatory.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Sets the academic year tag.
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    /// Rank among mandatory subjects: library, counseling, seminar, sports,
    /// then everything else.
    pub fn mandatory_rank(&self) -> u8 {
        let name = self.name.to_lowercase();
        let code = self.code.to_lowercase();
        let has = |needle: &str| name.contains(needle) || code.contains(needle);
        if has("library") || code == "lib" {
            0
        } else if has("counsel") {
            1
        } else if has("seminar") {
            2
        } else if has("sport") {
            3
        } else {
            4
        }
    }

    /// Whether a specialization tag matches this subject's name, code or type.
    pub fn matches_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&tag)
            || self.code.to_lowercase().contains(&tag)
            || self.subject_type.as_str() == tag
    }

    /// Display label used in conflict messages.
    pub fn label(&self) -> String {
        if self.code.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_builder() {
        let s = Subject::new("S1")
            .with_code("CS201")
            .with_name("Data Structures")
            .with_type(SubjectType::Lab)
            .with_weekly_hours(4)
            .with_department("CSE")
            .with_year("2");

        assert_eq!(s.id, "S1");
        assert_eq!(s.code, "CS201");
        assert_eq!(s.subject_type, SubjectType::Lab);
        assert_eq!(s.weekly_hours, 4);
        assert!(!s.mandatory);
        assert_eq!(s.department, "CSE");
        assert_eq!(s.label(), "Data Structures (CS201)");
    }

    #[test]
    fn test_block_types() {
        assert!(SubjectType::Lab.is_block());
        assert!(SubjectType::Practical.is_block());
        assert!(!SubjectType::Theory.is_block());
        assert!(!SubjectType::Tutorial.is_block());
    }

    #[test]
    fn test_mandatory_rank() {
        let lib = Subject::new("M1").with_name("Library Hour").mandatory();
        let counsel = Subject::new("M2").with_name("Counseling").mandatory();
        let seminar = Subject::new("M3").with_name("Seminar").mandatory();
        let sports = Subject::new("M4").with_name("Sports").mandatory();
        let other = Subject::new("M5").with_name("Yoga").mandatory();

        assert_eq!(lib.mandatory_rank(), 0);
        assert_eq!(counsel.mandatory_rank(), 1);
        assert_eq!(seminar.mandatory_rank(), 2);
        assert_eq!(sports.mandatory_rank(), 3);
        assert_eq!(other.mandatory_rank(), 4);

        let liberal = Subject::new("M6").with_name("Liberal Studies").mandatory();
        let coded = Subject::new("M7").with_code("LIB").with_name("Reading Hour").mandatory();
        assert_eq!(liberal.mandatory_rank(), 4);
        assert_eq!(coded.mandatory_rank(), 0);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let subject: Subject = serde_json::from_str(r#"{"id": "S1", "name": "Algebra"}"#).unwrap();
        let built = Subject::new("S1").with_name("Algebra");

        assert_eq!(subject.code, built.code);
        assert_eq!(subject.subject_type, SubjectType::Theory);
        assert_eq!(subject.weekly_hours, built.weekly_hours);
        assert!(!subject.mandatory);
        assert_eq!(subject.label(), "Algebra");
    }

    #[test]
    fn test_tag_matching() {
        let s = Subject::new("S1")
            .with_code("MA101")
            .with_name("Linear Algebra")
            .with_type(SubjectType::Tutorial);

        assert!(s.matches_tag("algebra"));
        assert!(s.matches_tag("MA"));
        assert!(s.matches_tag("tutorial"));
        assert!(!s.matches_tag("physics"));
        assert!(!s.matches_tag("  "));
    }

    #[test]
    fn test_subject_type_serde() {
        let json = serde_json::to_string(&SubjectType::Practical).unwrap();
        assert_eq!(json, "\"practical\"");
        let back: SubjectType = serde_json::from_str("\"lab\"").unwrap();
        assert_eq!(back, SubjectType::Lab);
    }
}
