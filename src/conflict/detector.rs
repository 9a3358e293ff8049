//! Conflict detection.
//!
//! Scans a grid against the run's rules and classifies every violation.
//! Detection is pure: it never touches the grid. Output order is stable
//! (grid order, then input order) so repeated scans compare cleanly.
//!
//! | Check | Type | Severity |
//! |-------|------|----------|
//! | Faculty committed elsewhere at the cell | faculty | critical |
//! | Room booked elsewhere at the cell | room | high |
//! | Weekly cap exceeded | workload | high |
//! | Daily cap exceeded | workload | medium |
//! | Too many consecutive occupied slots | break | medium |
//! | Window, Saturday or lab-contiguity rule broken | time | high |
//! | Hours below weekly target | coverage | medium |

use crate::context::{PlacementMode, RunContext};
use crate::models::{Cell, Conflict, ConflictType, Day, Grid, Severity, Subject};

/// Scans grids for rule violations.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    ctx: RunContext<'a>,
    rooms_in_scope: bool,
}

impl<'a> ConflictDetector<'a> {
    /// Creates a detector. Room checks run only when `rooms_in_scope`.
    pub fn new(ctx: RunContext<'a>, rooms_in_scope: bool) -> Self {
        Self {
            ctx,
            rooms_in_scope,
        }
    }

    /// Runs every check.
    pub fn detect(&self, grid: &Grid) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        self.faculty_conflicts(grid, &mut conflicts);
        if self.rooms_in_scope {
            self.room_conflicts(grid, &mut conflicts);
        }
        self.workload_conflicts(grid, &mut conflicts);
        self.break_conflicts(grid, &mut conflicts);
        self.time_conflicts(grid, &mut conflicts);
        self.coverage_conflicts(grid, &mut conflicts);
        conflicts
    }

    fn faculty_conflicts(&self, grid: &Grid, out: &mut Vec<Conflict>) {
        for (cell, session) in grid.occupied() {
            let Some(faculty) = self.ctx.input.faculty_member(&session.faculty_id) else {
                continue;
            };
            if !faculty.is_available_at(cell) {
                out.push(
                    Conflict::new(
                        ConflictType::Faculty,
                        Severity::Critical,
                        format!(
                            "{} is double-booked at {cell}: already committed elsewhere while teaching {}",
                            faculty.label(),
                            self.subject_label(&session.subject_id)
                        ),
                        "Reassign the session to another qualified faculty member or move it to a free slot",
                    )
                    .with_subject(&session.subject_id)
                    .with_faculty(&faculty.id)
                    .at(cell),
                );
            }
        }
    }

    fn room_conflicts(&self, grid: &Grid, out: &mut Vec<Conflict>) {
        for (cell, session) in grid.occupied() {
            let Some(room_id) = session.room_id.as_deref() else {
                continue;
            };
            let booked = match self.ctx.input.room(room_id) {
                Some(room) => !room.is_available_at(cell),
                None => true,
            };
            if booked {
                out.push(
                    Conflict::new(
                        ConflictType::Room,
                        Severity::High,
                        format!("Room {room_id} is double-booked at {cell}"),
                        "Move the session to an alternate room of similar capacity",
                    )
                    .with_subject(&session.subject_id)
                    .with_faculty(&session.faculty_id)
                    .at(cell),
                );
            }
        }
    }

    fn workload_conflicts(&self, grid: &Grid, out: &mut Vec<Conflict>) {
        for faculty in &self.ctx.input.faculty {
            let weekly = grid.faculty_hours(&faculty.id);
            let weekly_cap = self.ctx.weekly_cap(faculty);
            if weekly > weekly_cap {
                out.push(
                    Conflict::new(
                        ConflictType::Workload,
                        Severity::High,
                        format!(
                            "{} teaches {weekly} hours per week, above the cap of {weekly_cap}",
                            faculty.label()
                        ),
                        format!(
                            "Transfer {} hour(s) to an under-utilized colleague",
                            weekly - weekly_cap
                        ),
                    )
                    .with_faculty(&faculty.id),
                );
            }

            let daily_cap = self.ctx.daily_cap(faculty);
            for &day in &Day::ALL {
                let hours = grid.faculty_day_hours(&faculty.id, day);
                if hours > daily_cap {
                    let first = grid
                        .day_sessions(day)
                        .find(|(_, s)| s.faculty_id == faculty.id)
                        .map(|(c, _)| c);
                    let mut conflict = Conflict::new(
                        ConflictType::Workload,
                        Severity::Medium,
                        format!(
                            "{} teaches {hours} hours on {day}, above the daily cap of {daily_cap}",
                            faculty.label()
                        ),
                        "Move sessions to another day or transfer them to a colleague",
                    )
                    .with_faculty(&faculty.id);
                    conflict.location = first;
                    out.push(conflict);
                }
            }
        }
    }

    fn break_conflicts(&self, grid: &Grid, out: &mut Vec<Conflict>) {
        let limit = self.ctx.config.max_consecutive_slots;
        let min_gap = self.ctx.config.min_break_slots.max(1);

        for &day in &Day::ALL {
            let mut run = 0usize;
            let mut gap = 0usize;
            let mut reported = false;
            for slot in 0..grid.slots_per_day() {
                let cell = Cell::new(day, slot);
                if grid.is_break(cell) {
                    run = 0;
                    gap = 0;
                    reported = false;
                    continue;
                }
                let Some(session) = grid.get(cell) else {
                    gap += 1;
                    if gap >= min_gap {
                        run = 0;
                        reported = false;
                    }
                    continue;
                };
                gap = 0;
                run += 1;
                if run > limit && !reported {
                    reported = true;
                    out.push(
                        Conflict::new(
                            ConflictType::Break,
                            Severity::Medium,
                            format!("{run} consecutive sessions without a break on {day} up to {cell}"),
                            "Insert the midday break for this day",
                        )
                        .with_subject(&session.subject_id)
                        .with_faculty(&session.faculty_id)
                        .at(cell),
                    );
                }
            }
        }
    }

    fn time_conflicts(&self, grid: &Grid, out: &mut Vec<Conflict>) {
        let layout = self.ctx.layout();
        for (cell, session) in grid.occupied() {
            let problem = if session.is_mandatory && !layout.in_mandatory_window(cell) {
                Some("is mandatory but sits outside the mandatory window")
            } else if !session.is_mandatory && layout.in_mandatory_window(cell) {
                Some("occupies the mandatory window")
            } else if !session.is_mandatory && !layout.open_to_regular(cell) {
                Some("occupies a closed Saturday slot")
            } else {
                None
            };
            if let Some(problem) = problem {
                out.push(
                    Conflict::new(
                        ConflictType::Time,
                        Severity::High,
                        format!("{} {problem} at {cell}", self.subject_label(&session.subject_id)),
                        "Move the session to a slot its placement window allows",
                    )
                    .with_subject(&session.subject_id)
                    .with_faculty(&session.faculty_id)
                    .at(cell),
                );
            }
        }

        for subject in self.ctx.input.subjects.iter().filter(|s| s.subject_type.is_block()) {
            for &day in &Day::ALL {
                let slots = grid.subject_day_slots(&subject.id, day);
                let Some(gap_at) = slots.windows(2).find(|w| w[1] != w[0] + 1).map(|w| w[1]) else {
                    continue;
                };
                let cell = Cell::new(day, gap_at);
                let faculty = grid.get(cell).map(|s| s.faculty_id.clone()).unwrap_or_default();
                out.push(
                    Conflict::new(
                        ConflictType::Time,
                        Severity::High,
                        format!("{} is split into several blocks on {day}", subject.label()),
                        "Merge the lab hours into one contiguous block",
                    )
                    .with_subject(&subject.id)
                    .with_faculty(faculty)
                    .at(cell),
                );
            }
        }
    }

    fn coverage_conflicts(&self, grid: &Grid, out: &mut Vec<Conflict>) {
        for subject in &self.ctx.input.subjects {
            let scheduled = grid.subject_hours(&subject.id);
            if scheduled >= subject.weekly_hours {
                continue;
            }
            let description = if subject.mandatory {
                format!(
                    "Critical: mandatory subject {} has {scheduled}/{} hours scheduled",
                    subject.label(),
                    subject.weekly_hours
                )
            } else {
                format!(
                    "{} has {scheduled}/{} hours scheduled",
                    subject.label(),
                    subject.weekly_hours
                )
            };
            let resolution = if self.has_eligible_faculty(grid, subject) {
                "Schedule the missing hours in free, compatible slots"
            } else {
                "No eligible faculty: add a qualified faculty member or relax specialization"
            };
            out.push(
                Conflict::new(ConflictType::Coverage, Severity::Medium, description, resolution)
                    .with_subject(&subject.id),
            );
        }
    }

    fn has_eligible_faculty(&self, grid: &Grid, subject: &Subject) -> bool {
        !self
            .ctx
            .eligible_faculty(grid, subject, PlacementMode::Normal)
            .is_empty()
    }

    fn subject_label(&self, subject_id: &str) -> String {
        self.ctx
            .input
            .subject(subject_id)
            .map(Subject::label)
            .unwrap_or_else(|| subject_id.to_string())
    }
}
