//! Timetabling domain models.
//!
//! Provides the input records (subjects, faculty, rooms, breaks) and the
//! solution types (grid, sessions, conflicts) shared by every stage.
//!
//! # Domain Mappings
//!
//! | u-timetable | Meaning |
//! |-------------|---------|
//! | Subject | Course needing weekly hours |
//! | Faculty | Teacher with caps and specializations |
//! | Room | Space with capacity and equipment |
//! | Grid | Weekly day × slot timetable of one section |
//! | Conflict | Detected violation or shortfall |

mod break_time;
mod conflict;
mod faculty;
mod grid;
mod input;
mod room;
mod subject;

pub use break_time::BreakTime;
pub use conflict::{Conflict, ConflictType, Severity};
pub use faculty::{Faculty, GENERAL_TAG};
pub use grid::{is_contiguous, Cell, Day, Grid, SessionAssignment};
pub use input::TimetableInput;
pub use room::{required_capacity, required_equipment, Room};
pub use subject::{Subject, SubjectType};
