//! Greedy assignment scheduler.
//!
//! # Algorithm
//!
//! 1. Order subjects by priority (see [`priority_order`]).
//! 2. For each subject, pick the least-loaded eligible faculty member once
//!    and keep that choice for the rest of the run.
//! 3. Labs and practicals: commit the first feasible contiguous block.
//! 4. Other subjects: up to three single periods per pass, each at the
//!    highest-scoring candidate cell.
//! 5. Repeat passes until a pass places nothing or the attempt budget is
//!    spent. Leftover hours are reported as [`Unplaced`].
//!
//! # Complexity
//! O(p · n · c) where p = passes, n = subjects, c = grid cells.

use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::priority_order;
use crate::context::{PlacementMode, RunContext};
use crate::models::{Cell, Conflict, ConflictType, Day, Faculty, Grid, Severity, Subject, SubjectType};

/// Single-period attempts per subject per pass.
const ATTEMPTS_PER_PASS: u32 = 3;

/// Why hours of a subject were left off the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnplacedReason {
    /// No faculty member is eligible to teach the subject.
    NoEligibleFaculty,
    /// Faculty exists but no legal cell was left.
    NoFeasibleCell,
}

/// Hours the scheduler could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unplaced {
    pub subject_id: String,
    pub missing_hours: u32,
    pub reason: UnplacedReason,
}

impl Unplaced {
    /// Coverage conflict describing the shortfall, worded like the
    /// detector's coverage check.
    pub fn to_conflict(&self, subject: &Subject) -> Conflict {
        let scheduled = subject.weekly_hours.saturating_sub(self.missing_hours);
        let description = if subject.mandatory {
            format!(
                "Critical: mandatory subject {} has {scheduled}/{} hours scheduled",
                subject.label(),
                subject.weekly_hours
            )
        } else {
            format!("{} has {scheduled}/{} hours scheduled", subject.label(), subject.weekly_hours)
        };
        let resolution = match self.reason {
            UnplacedReason::NoEligibleFaculty => {
                "No eligible faculty: add a qualified faculty member or relax specialization"
            }
            UnplacedReason::NoFeasibleCell => "Schedule the missing hours in free, compatible slots",
        };
        Conflict::new(ConflictType::Coverage, Severity::Medium, description, resolution)
            .with_subject(&self.subject_id)
    }
}

/// Result of the greedy stage.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// The initial grid.
    pub grid: Grid,
    /// Faculty chosen per subject (subject id → faculty id).
    pub faculty_by_subject: HashMap<String, String>,
    /// Subjects left short.
    pub unplaced: Vec<Unplaced>,
    /// Outer passes run.
    pub passes: usize,
    /// Placement attempts spent.
    pub attempts: usize,
}

/// Greedy, priority-driven timetable builder.
///
/// # Example
///
/// ```
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
/// use u_timetable::config::EngineConfig;
/// use u_timetable::context::RunContext;
/// use u_timetable::models::{Faculty, Subject, TimetableInput};
/// use u_timetable::scheduler::GreedyScheduler;
/// use u_timetable::validation::NormalizedInput;
///
/// let input = TimetableInput::new(
///     vec![Subject::new("S1").with_name("Algebra").with_weekly_hours(3)],
///     vec![Faculty::new("F1").with_specialization("algebra")],
/// );
/// let config = EngineConfig::default();
/// let normalized = NormalizedInput::new(&input, config.grid.total_slots()).unwrap();
/// let ctx = RunContext::new(&normalized, &config);
///
/// let outcome = GreedyScheduler::new().schedule(&ctx, &mut SmallRng::seed_from_u64(1));
/// assert_eq!(outcome.grid.subject_hours("S1"), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyScheduler;

impl GreedyScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Builds the initial grid.
    pub fn schedule<R: Rng>(&self, ctx: &RunContext<'_>, rng: &mut R) -> ScheduleOutcome {
        let subjects = &ctx.input.subjects;
        let budget = ctx.config.max_schedule_attempts;
        let mut grid = ctx.new_grid();
        let mut faculty_by_subject: HashMap<String, String> = HashMap::new();
        let order = priority_order(subjects, rng);

        let mut attempts = 0usize;
        let mut passes = 0usize;

        'passes: loop {
            passes += 1;
            let mut placed_this_pass = 0u32;

            for &idx in &order {
                let subject = &subjects[idx];
                let remaining = remaining_hours(&grid, subject);
                if remaining == 0 {
                    continue;
                }
                if attempts >= budget {
                    break 'passes;
                }

                let Some(faculty) = assigned_faculty(ctx, &grid, subject, &mut faculty_by_subject) else {
                    continue;
                };

                if subject.subject_type.is_block() && !subject.mandatory {
                    attempts += 1;
                    let len = remaining.min(ctx.layout().lab_block_length as u32) as usize;
                    if let Some(start) = place_block(ctx, &mut grid, subject, faculty, len) {
                        debug!(subject = %subject.id, faculty = %faculty.id, %start, len, "lab block placed");
                        placed_this_pass += len as u32;
                    }
                } else {
                    for _ in 0..remaining.min(ATTEMPTS_PER_PASS) {
                        attempts += 1;
                        match place_single(ctx, &mut grid, subject, faculty) {
                            Some(cell) => {
                                debug!(subject = %subject.id, faculty = %faculty.id, %cell, "period placed");
                                placed_this_pass += 1;
                            }
                            None => break,
                        }
                        if attempts >= budget {
                            break;
                        }
                    }
                }
            }

            if placed_this_pass == 0 || attempts >= budget {
                break;
            }
        }

        let unplaced = collect_unplaced(&grid, subjects, &faculty_by_subject);
        for u in &unplaced {
            warn!(subject = %u.subject_id, missing = u.missing_hours, reason = ?u.reason, "hours left unplaced");
        }
        info!(
            passes,
            attempts,
            filled = grid.filled_count(),
            unplaced = unplaced.len(),
            "greedy scheduling finished"
        );

        ScheduleOutcome {
            grid,
            faculty_by_subject,
            unplaced,
            passes,
            attempts,
        }
    }
}

fn remaining_hours(grid: &Grid, subject: &Subject) -> u32 {
    subject.weekly_hours.saturating_sub(grid.subject_hours(&subject.id))
}

/// Faculty chosen for a subject, selecting one on first use.
fn assigned_faculty<'a>(
    ctx: &RunContext<'a>,
    grid: &Grid,
    subject: &Subject,
    chosen: &mut HashMap<String, String>,
) -> Option<&'a Faculty> {
    if let Some(id) = chosen.get(&subject.id) {
        return ctx.input.faculty_member(id);
    }
    let faculty = ctx.select_faculty(grid, subject, PlacementMode::Normal)?;
    chosen.insert(subject.id.clone(), faculty.id.clone());
    Some(faculty)
}

/// Commits the first feasible contiguous block of `len` slots.
///
/// Days are searched in week order, skipping days that already hold a block
/// of this subject or would push the member over the daily cap. Returns the
/// block's first cell.
pub fn place_block(
    ctx: &RunContext<'_>,
    grid: &mut Grid,
    subject: &Subject,
    faculty: &Faculty,
    len: usize,
) -> Option<Cell> {
    if len == 0 {
        return None;
    }
    let slots = ctx.usable_slots(PlacementMode::Normal);
    if len > slots {
        return None;
    }
    let hours = len as u32;
    if grid.faculty_hours(&faculty.id) + hours > ctx.weekly_cap(faculty) {
        return None;
    }

    for &day in &Day::ALL {
        if !grid.subject_day_slots(&subject.id, day).is_empty() {
            continue;
        }
        if grid.faculty_day_hours(&faculty.id, day) + hours > ctx.daily_cap(faculty) {
            continue;
        }
        for start in 0..=(slots - len) {
            let block: Vec<Cell> = (start..start + len).map(|s| Cell::new(day, s)).collect();
            let feasible = block.iter().all(|&c| {
                grid.is_free(c)
                    && ctx.cell_allowed(subject, c, PlacementMode::Normal)
                    && faculty.is_available_at(c)
            });
            if feasible {
                for &c in &block {
                    grid.place(c, ctx.session(subject, faculty));
                }
                return Some(block[0]);
            }
        }
    }
    None
}

/// Places one period at the best-scoring legal cell.
pub fn place_single(
    ctx: &RunContext<'_>,
    grid: &mut Grid,
    subject: &Subject,
    faculty: &Faculty,
) -> Option<Cell> {
    let mut best: Option<(f64, Cell)> = None;
    for cell in ctx.candidate_cells(PlacementMode::Normal) {
        if !ctx.can_place(grid, subject, faculty, cell, PlacementMode::Normal) {
            continue;
        }
        let score = candidate_score(ctx, grid, subject, cell);
        match best {
            Some((b, _)) if score <= b => {}
            _ => best = Some((score, cell)),
        }
    }
    let (_, cell) = best?;
    grid.place(cell, ctx.session(subject, faculty));
    Some(cell)
}

/// Desirability of a candidate cell for one period of `subject`.
pub fn candidate_score(ctx: &RunContext<'_>, grid: &Grid, subject: &Subject, cell: Cell) -> f64 {
    let layout = ctx.layout();
    let mut score = 50.0;

    if subject.mandatory && layout.in_mandatory_window(cell) {
        score += 10_000.0;
    }
    if subject.subject_type.is_block() && layout.is_afternoon(cell.slot) {
        score -= 20.0;
    }
    if subject.subject_type == SubjectType::Theory {
        for neighbour in neighbours(cell) {
            match grid.get(neighbour) {
                Some(s) if s.subject_id == subject.id => score -= 30.0,
                Some(s) if s.session_type == SubjectType::Theory => score -= 15.0,
                _ => {}
            }
        }
    }
    score -= 5.0 * grid.day_load(cell.day) as f64;

    if subject.weekly_hours >= 4 || subject.mandatory {
        let slots = layout.slots_per_day;
        score += 2.0 * slots.saturating_sub(cell.slot) as f64;
    }
    score
}

fn neighbours(cell: Cell) -> impl Iterator<Item = Cell> {
    let before = cell.slot.checked_sub(1).map(|s| Cell::new(cell.day, s));
    let after = Some(Cell::new(cell.day, cell.slot + 1));
    before.into_iter().chain(after)
}

fn collect_unplaced(
    grid: &Grid,
    subjects: &[Subject],
    faculty_by_subject: &HashMap<String, String>,
) -> Vec<Unplaced> {
    subjects
        .iter()
        .filter_map(|s| {
            let missing = remaining_hours(grid, s);
            (missing > 0).then(|| Unplaced {
                subject_id: s.id.clone(),
                missing_hours: missing,
                reason: if faculty_by_subject.contains_key(&s.id) {
                    UnplacedReason::NoFeasibleCell
                } else {
                    UnplacedReason::NoEligibleFaculty
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::{is_contiguous, BreakTime, TimetableInput};
    use crate::validation::NormalizedInput;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn run(input: TimetableInput, config: &EngineConfig) -> (NormalizedInput, ScheduleOutcome) {
        let normalized = NormalizedInput::new(&input, config.grid.total_slots()).unwrap();
        let outcome = {
            let ctx = RunContext::new(&normalized, config);
            GreedyScheduler::new().schedule(&ctx, &mut SmallRng::seed_from_u64(42))
        };
        (normalized, outcome)
    }

    #[test]
    fn test_single_theory_subject() {
        let input = TimetableInput::new(
            vec![Subject::new("S1").with_name("Algebra").with_weekly_hours(3)],
            vec![Faculty::new("F1").with_specialization("algebra").with_caps(20, 6)],
        );
        let (_, outcome) = run(input, &EngineConfig::default());

        let cells = outcome.grid.cells_for_subject("S1");
        assert_eq!(cells.len(), 3);
        assert!(outcome.unplaced.is_empty());
        assert_eq!(outcome.faculty_by_subject["S1"], "F1");
    }

    #[test]
    fn test_theory_spread_across_days() {
        let input = TimetableInput::new(
            vec![Subject::new("S1").with_name("Algebra").with_weekly_hours(3)],
            vec![Faculty::new("F1").with_specialization("algebra")],
        );
        let (_, outcome) = run(input, &EngineConfig::default());
        let mut days: Vec<Day> = outcome.grid.cells_for_subject("S1").iter().map(|c| c.day).collect();
        days.dedup();
        // Load penalty pushes periods onto different days.
        assert_eq!(days.len(), 3);
    }

    #[test]
    fn test_lab_blocks_are_contiguous() {
        let input = TimetableInput::new(
            vec![Subject::new("L1")
                .with_name("Physics Lab")
                .with_type(SubjectType::Lab)
                .with_weekly_hours(4)],
            vec![Faculty::new("F1").with_specialization("lab")],
        );
        let (_, outcome) = run(input, &EngineConfig::default());
        let grid = &outcome.grid;

        assert_eq!(grid.subject_hours("L1"), 4);
        let mut block_days = 0;
        for &day in &Day::ALL {
            let slots = grid.subject_day_slots("L1", day);
            if !slots.is_empty() {
                block_days += 1;
                assert!(is_contiguous(&slots));
                assert_eq!(slots.len(), 2);
            }
        }
        assert_eq!(block_days, 2);
    }

    #[test]
    fn test_lab_block_skips_breaks() {
        let input = TimetableInput::new(
            vec![Subject::new("L1").with_name("Lab").with_type(SubjectType::Lab).with_weekly_hours(2)],
            vec![Faculty::new("F1").with_specialization("lab")],
        )
        .with_breaks(vec![BreakTime::on(crate::models::Day::Monday, 1)]);
        let (_, outcome) = run(input, &EngineConfig::default());

        let slots = outcome.grid.subject_day_slots("L1", Day::Monday);
        assert_eq!(slots, vec![2, 3]);
    }

    #[test]
    fn test_mandatory_goes_to_window() {
        let input = TimetableInput::new(
            vec![
                Subject::new("M1").with_name("Library").mandatory(),
                Subject::new("S1").with_name("Algebra").with_weekly_hours(5),
            ],
            vec![
                Faculty::new("F1").with_specialization("general"),
                Faculty::new("F2").with_specialization("algebra"),
            ],
        );
        let config = EngineConfig::default();
        let (_, outcome) = run(input, &config);

        for cell in outcome.grid.cells_for_subject("M1") {
            assert!(config.grid.in_mandatory_window(cell));
        }
        for cell in outcome.grid.cells_for_subject("S1") {
            assert!(!config.grid.in_mandatory_window(cell));
            assert!(config.grid.open_to_regular(cell));
        }
        assert_eq!(outcome.grid.subject_hours("M1"), 1);
    }

    #[test]
    fn test_no_eligible_faculty_reported() {
        let input = TimetableInput::new(
            vec![Subject::new("S1").with_name("Chemistry").with_weekly_hours(2)],
            vec![Faculty::new("F1").with_specialization("history")],
        );
        let (_, outcome) = run(input, &EngineConfig::default());
        assert_eq!(outcome.grid.filled_count(), 0);
        assert_eq!(
            outcome.unplaced,
            vec![Unplaced {
                subject_id: "S1".into(),
                missing_hours: 2,
                reason: UnplacedReason::NoEligibleFaculty,
            }]
        );
    }

    #[test]
    fn test_unplaced_to_conflict() {
        let subject = Subject::new("S1").with_name("Chemistry").with_weekly_hours(3);
        let unplaced = Unplaced {
            subject_id: "S1".into(),
            missing_hours: 2,
            reason: UnplacedReason::NoFeasibleCell,
        };
        let conflict = unplaced.to_conflict(&subject);
        assert_eq!(conflict.conflict_type, ConflictType::Coverage);
        assert_eq!(conflict.description, "Chemistry has 1/3 hours scheduled");
        assert!(conflict.involves_subject("S1"));

        let library = Subject::new("M1").with_name("Library").mandatory();
        let unplaced = Unplaced {
            subject_id: "M1".into(),
            missing_hours: 1,
            reason: UnplacedReason::NoEligibleFaculty,
        };
        let conflict = unplaced.to_conflict(&library);
        assert!(conflict.description.starts_with("Critical: mandatory subject Library"));
        assert!(conflict.suggested_resolution.starts_with("No eligible faculty"));
    }

    #[test]
    fn test_weekly_cap_respected() {
        let input = TimetableInput::new(
            vec![
                Subject::new("S1").with_name("Algebra").with_weekly_hours(3),
                Subject::new("S2").with_name("Algebra II").with_weekly_hours(3),
            ],
            vec![Faculty::new("F1").with_specialization("algebra").with_caps(2, 6)],
        );
        let (_, outcome) = run(input, &EngineConfig::default());
        assert_eq!(outcome.grid.faculty_hours("F1"), 2);
        let missing: u32 = outcome.unplaced.iter().map(|u| u.missing_hours).sum();
        assert_eq!(missing, 4);
        assert!(outcome
            .unplaced
            .iter()
            .all(|u| u.reason == UnplacedReason::NoFeasibleCell));
    }

    #[test]
    fn test_attempt_budget_bounds_work() {
        let mut config = EngineConfig::default();
        config.max_schedule_attempts = 1;
        let input = TimetableInput::new(
            vec![Subject::new("S1").with_name("Algebra").with_weekly_hours(5)],
            vec![Faculty::new("F1").with_specialization("algebra")],
        );
        let (_, outcome) = run(input, &config);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.grid.subject_hours("S1"), 1);
    }

    #[test]
    fn test_candidate_score_prefers_window_for_mandatory() {
        let input = TimetableInput::new(
            vec![Subject::new("M1").with_name("Library").mandatory()],
            vec![Faculty::new("F1")],
        );
        let config = EngineConfig::default();
        let normalized = NormalizedInput::new(&input, config.grid.total_slots()).unwrap();
        let ctx = RunContext::new(&normalized, &config);
        let grid = ctx.new_grid();
        let lib = normalized.subject("M1").unwrap();

        let window = candidate_score(&ctx, &grid, lib, Cell::new(Day::Saturday, 2));
        let outside = candidate_score(&ctx, &grid, lib, Cell::new(Day::Monday, 0));
        assert!(window > outside + 9_000.0);
    }
}
