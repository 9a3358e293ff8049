//! Subject placement order.
//!
//! Subjects are ranked by a chain of rules evaluated sequentially: a later
//! rule only decides when every earlier rule ties. Remaining ties keep a
//! shuffled order so no subject is starved by its position in the input.
//!
//! # Score Convention
//! **Lower score = placed earlier.**

use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::fmt::Debug;

use crate::models::Subject;

/// A rule scoring how early a subject should be placed.
pub trait OrderingRule: Debug {
    /// Rule name.
    fn name(&self) -> &'static str;

    /// Score where lower = placed earlier.
    fn evaluate(&self, subject: &Subject) -> f64;
}

/// Mandatory subjects first.
#[derive(Debug, Clone, Copy)]
pub struct MandatoryFirst;

impl OrderingRule for MandatoryFirst {
    fn name(&self) -> &'static str {
        "MANDATORY"
    }

    fn evaluate(&self, subject: &Subject) -> f64 {
        if subject.mandatory {
            0.0
        } else {
            1.0
        }
    }
}

/// Among mandatory subjects: library, counseling, seminar, sports.
#[derive(Debug, Clone, Copy)]
pub struct MandatoryKind;

impl OrderingRule for MandatoryKind {
    fn name(&self) -> &'static str {
        "MANDATORY_KIND"
    }

    fn evaluate(&self, subject: &Subject) -> f64 {
        if subject.mandatory {
            subject.mandatory_rank() as f64
        } else {
            0.0
        }
    }
}

/// Lab > practical > tutorial > theory.
#[derive(Debug, Clone, Copy)]
pub struct TypePriority;

impl OrderingRule for TypePriority {
    fn name(&self) -> &'static str {
        "TYPE"
    }

    fn evaluate(&self, subject: &Subject) -> f64 {
        subject.subject_type.priority_rank() as f64
    }
}

/// Most weekly hours first.
#[derive(Debug, Clone, Copy)]
pub struct MostHours;

impl OrderingRule for MostHours {
    fn name(&self) -> &'static str {
        "MOST_HOURS"
    }

    fn evaluate(&self, subject: &Subject) -> f64 {
        -(subject.weekly_hours as f64)
    }
}

/// The standard rule chain.
pub fn default_rules() -> Vec<Box<dyn OrderingRule>> {
    vec![
        Box::new(MandatoryFirst),
        Box::new(MandatoryKind),
        Box::new(TypePriority),
        Box::new(MostHours),
    ]
}

fn compare_sequential(rules: &[Box<dyn OrderingRule>], a: &Subject, b: &Subject) -> Ordering {
    for rule in rules {
        let score_a = rule.evaluate(a);
        let score_b = rule.evaluate(b);
        if (score_a - score_b).abs() > 1e-9 {
            return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
        }
    }
    Ordering::Equal
}

/// Returns subject indices in placement order.
///
/// Indices are shuffled first, then stably sorted, so full ties end up in
/// random order.
pub fn priority_order<R: Rng>(subjects: &[Subject], rng: &mut R) -> Vec<usize> {
    let rules = default_rules();
    let mut indices: Vec<usize> = (0..subjects.len()).collect();
    indices.shuffle(rng);
    indices.sort_by(|&a, &b| compare_sequential(&rules, &subjects[a], &subjects[b]));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectType;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn ids(subjects: &[Subject], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| subjects[i].id.clone()).collect()
    }

    #[test]
    fn test_full_ordering() {
        let subjects = vec![
            Subject::new("theory").with_weekly_hours(3),
            Subject::new("sports").with_name("Sports").mandatory(),
            Subject::new("lab").with_type(SubjectType::Lab).with_weekly_hours(2),
            Subject::new("library").with_name("Library").mandatory(),
            Subject::new("tutorial").with_type(SubjectType::Tutorial),
            Subject::new("practical").with_type(SubjectType::Practical),
            Subject::new("big_theory").with_weekly_hours(5),
        ];
        let mut rng = SmallRng::seed_from_u64(42);
        let order = priority_order(&subjects, &mut rng);

        assert_eq!(
            ids(&subjects, &order),
            vec![
                "library",
                "sports",
                "lab",
                "practical",
                "tutorial",
                "big_theory",
                "theory"
            ]
        );
    }

    #[test]
    fn test_ties_are_shuffled() {
        let subjects: Vec<Subject> = (0..8).map(|i| Subject::new(format!("S{i}"))).collect();
        let mut seen = std::collections::HashSet::new();
        for seed in 0..10 {
            let mut rng = SmallRng::seed_from_u64(seed);
            seen.insert(priority_order(&subjects, &mut rng));
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_seeded_order_is_reproducible() {
        let subjects: Vec<Subject> = (0..6).map(|i| Subject::new(format!("S{i}"))).collect();
        let a = priority_order(&subjects, &mut SmallRng::seed_from_u64(3));
        let b = priority_order(&subjects, &mut SmallRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rule_names() {
        let names: Vec<_> = default_rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["MANDATORY", "MANDATORY_KIND", "TYPE", "MOST_HOURS"]);
    }
}
