//! Greedy initial placement.
//!
//! Provides the subject priority order and the greedy scheduler that
//! builds the first, mostly feasible grid of a run.
//!
//! # Algorithm
//!
//! `GreedyScheduler` places subjects in priority order, labs as contiguous
//! blocks and everything else as single periods at the best-scoring cell.
//! It is not optimal; conflicts it leaves behind are handled by the
//! resolver and the optimizer.

mod greedy;
mod ordering;

pub use greedy::{
    candidate_score, place_block, place_single, GreedyScheduler, ScheduleOutcome, Unplaced,
    UnplacedReason,
};
pub use ordering::{default_rules, priority_order, OrderingRule};
