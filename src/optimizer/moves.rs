//! Move generation and validation.
//!
//! A move exchanges the contents of two cells (one of them may be empty).
//! The validator applies it to a copy and accepts the copy only if no hard
//! rule category got worse: faculty commitments, room bookings, caps,
//! consecutive-slot limit, placement windows and lab contiguity. Sessions
//! may not drift into the extended end-of-day slots either, and no moved
//! session may land on a cell its faculty member is committed elsewhere.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::conflict::ConflictDetector;
use crate::context::RunContext;
use crate::models::{Cell, ConflictType, Grid};

/// Hard-rule violation counts of a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardTally {
    pub faculty: usize,
    pub room: usize,
    pub workload: usize,
    pub breaks: usize,
    pub time: usize,
    /// Sessions sitting in extended slots.
    pub extended: usize,
}

impl HardTally {
    /// Whether no category exceeds `limit`'s.
    pub fn within(&self, limit: &HardTally) -> bool {
        self.faculty <= limit.faculty
            && self.room <= limit.room
            && self.workload <= limit.workload
            && self.breaks <= limit.breaks
            && self.time <= limit.time
            && self.extended <= limit.extended
    }
}

/// Checks candidate grids against the hard rules.
#[derive(Debug, Clone, Copy)]
pub struct MoveValidator<'a> {
    ctx: RunContext<'a>,
    detector: ConflictDetector<'a>,
}

impl<'a> MoveValidator<'a> {
    pub fn new(ctx: RunContext<'a>, rooms_in_scope: bool) -> Self {
        Self {
            ctx,
            detector: ConflictDetector::new(ctx, rooms_in_scope),
        }
    }

    /// Counts hard violations per category.
    pub fn tally(&self, grid: &Grid) -> HardTally {
        let mut tally = HardTally::default();
        for conflict in self.detector.detect(grid) {
            match conflict.conflict_type {
                ConflictType::Faculty => tally.faculty += 1,
                ConflictType::Room => tally.room += 1,
                ConflictType::Workload => tally.workload += 1,
                ConflictType::Break => tally.breaks += 1,
                ConflictType::Time => tally.time += 1,
                ConflictType::Coverage => {}
            }
        }
        let layout = self.ctx.layout();
        tally.extended = grid
            .occupied()
            .filter(|(c, _)| layout.is_extended(c.slot))
            .count();
        tally
    }

    /// Whether `candidate` keeps every subject's hours of `reference`, puts
    /// no session on a new committed cell and is no worse than `limit` in
    /// any hard category.
    pub fn accepts(&self, candidate: &Grid, reference: &Grid, limit: &HardTally) -> bool {
        let hours_kept = self
            .ctx
            .input
            .subjects
            .iter()
            .all(|s| candidate.subject_hours(&s.id) == reference.subject_hours(&s.id));
        let commitments_kept = candidate.occupied().all(|(cell, session)| {
            self.faculty_free_at(candidate, cell) || reference.get(cell) == Some(session)
        });
        hours_kept && commitments_kept && self.tally(candidate).within(limit)
    }

    /// Applies the swap to a copy of `grid` and returns it if valid.
    ///
    /// `limit` is the tally of `grid` itself.
    pub fn try_swap(&self, grid: &Grid, limit: &HardTally, a: Cell, b: Cell) -> Option<Grid> {
        if a == b || (grid.get(a).is_none() && grid.get(b).is_none()) {
            return None;
        }
        if grid.get(a) == grid.get(b) {
            return None;
        }
        let mut candidate = grid.clone();
        if !candidate.swap(a, b) {
            return None;
        }
        if !self.faculty_free_at(&candidate, a) || !self.faculty_free_at(&candidate, b) {
            return None;
        }
        self.tally(&candidate).within(limit).then_some(candidate)
    }

    /// Whether the session at `cell`, if any, is taught by a member who is
    /// available there.
    fn faculty_free_at(&self, grid: &Grid, cell: Cell) -> bool {
        grid.get(cell).map_or(true, |session| {
            self.ctx
                .input
                .faculty_member(&session.faculty_id)
                .is_some_and(|f| f.is_available_at(cell))
        })
    }
}

/// Picks a random occupied cell and a random non-break partner cell.
pub fn random_pair<R: Rng>(grid: &Grid, rng: &mut R) -> Option<(Cell, Cell)> {
    let occupied: Vec<Cell> = grid.occupied().map(|(c, _)| c).collect();
    let a = *occupied.choose(rng)?;
    let partners: Vec<Cell> = grid
        .cells()
        .filter(|&c| c != a && !grid.is_break(c))
        .collect();
    let b = *partners.choose(rng)?;
    Some((a, b))
}

/// Every pair worth trying: each occupied cell against every later
/// non-break cell, plus every earlier empty one.
pub fn all_pairs(grid: &Grid) -> Vec<(Cell, Cell)> {
    let cells: Vec<Cell> = grid.cells().filter(|&c| !grid.is_break(c)).collect();
    let mut pairs = Vec::new();
    for (i, &a) in cells.iter().enumerate() {
        if grid.get(a).is_none() {
            continue;
        }
        for (j, &b) in cells.iter().enumerate() {
            if j > i || (j < i && grid.get(b).is_none()) {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::{Day, Faculty, Subject, SubjectType, TimetableInput};
    use crate::validation::NormalizedInput;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn setup() -> (NormalizedInput, EngineConfig) {
        let input = TimetableInput::new(
            vec![
                Subject::new("S1").with_name("Algebra").with_weekly_hours(2),
                Subject::new("M1").with_name("Library").mandatory(),
                Subject::new("L1")
                    .with_name("Physics Lab")
                    .with_type(SubjectType::Lab)
                    .with_weekly_hours(2),
            ],
            vec![
                Faculty::new("F1")
                    .with_specialization("algebra")
                    .with_unavailable(Cell::new(Day::Friday, 0)),
                Faculty::new("F2")
                    .with_specialization("general")
                    .with_specialization("lab")
                    .with_unavailable(Cell::new(Day::Friday, 0)),
            ],
        );
        let cfg = EngineConfig::default();
        (NormalizedInput::new(&input, cfg.grid.total_slots()).unwrap(), cfg)
    }

    fn put(ctx: &RunContext<'_>, grid: &mut Grid, subject: &str, faculty: &str, cell: Cell) {
        let s = ctx.input.subject(subject).unwrap();
        let f = ctx.input.faculty_member(faculty).unwrap();
        assert!(grid.place(cell, ctx.session(s, f)));
    }

    fn sample(ctx: &RunContext<'_>) -> Grid {
        let mut grid = ctx.new_grid();
        put(ctx, &mut grid, "S1", "F1", Cell::new(Day::Monday, 0));
        put(ctx, &mut grid, "S1", "F1", Cell::new(Day::Tuesday, 0));
        put(ctx, &mut grid, "M1", "F2", Cell::new(Day::Saturday, 2));
        put(ctx, &mut grid, "L1", "F2", Cell::new(Day::Wednesday, 0));
        put(ctx, &mut grid, "L1", "F2", Cell::new(Day::Wednesday, 1));
        grid
    }

    #[test]
    fn test_valid_move_accepted() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let v = MoveValidator::new(ctx, false);
        let grid = sample(&ctx);
        let limit = v.tally(&grid);

        let moved = v
            .try_swap(&grid, &limit, Cell::new(Day::Monday, 0), Cell::new(Day::Thursday, 2))
            .unwrap();
        assert!(moved.is_free(Cell::new(Day::Monday, 0)));
        assert_eq!(moved.get(Cell::new(Day::Thursday, 2)).unwrap().subject_id, "S1");
    }

    #[test]
    fn test_faculty_commitment_rejected() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let v = MoveValidator::new(ctx, false);
        let grid = sample(&ctx);
        let limit = v.tally(&grid);
        assert!(v
            .try_swap(&grid, &limit, Cell::new(Day::Monday, 0), Cell::new(Day::Friday, 0))
            .is_none());
    }

    #[test]
    fn test_swap_never_moves_into_commitment() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let v = MoveValidator::new(ctx, false);
        let s1 = input.subject("S1").unwrap();
        let f2 = input.faculty_member("F2").unwrap();

        // F1 already sits on a committed cell.
        let mut grid = ctx.new_grid();
        put(&ctx, &mut grid, "S1", "F1", Cell::new(Day::Friday, 0));
        assert!(grid.place(Cell::new(Day::Thursday, 2), ctx.session(s1, f2)));
        let limit = v.tally(&grid);
        assert_eq!(limit.faculty, 1);

        // Trading one commitment clash for another is refused.
        assert!(v
            .try_swap(&grid, &limit, Cell::new(Day::Friday, 0), Cell::new(Day::Thursday, 2))
            .is_none());
        let mut traded = grid.clone();
        assert!(traded.swap(Cell::new(Day::Friday, 0), Cell::new(Day::Thursday, 2)));
        assert!(!v.accepts(&traded, &grid, &limit));

        // Moving F1 to a free cell clears the clash.
        let moved = v
            .try_swap(&grid, &limit, Cell::new(Day::Friday, 0), Cell::new(Day::Thursday, 3))
            .unwrap();
        assert_eq!(v.tally(&moved).faculty, 0);
    }

    #[test]
    fn test_window_and_contiguity_rejected() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let v = MoveValidator::new(ctx, false);
        let grid = sample(&ctx);
        let limit = v.tally(&grid);

        // Mandatory out of the window.
        assert!(v
            .try_swap(&grid, &limit, Cell::new(Day::Saturday, 2), Cell::new(Day::Monday, 4))
            .is_none());
        // Regular into the window.
        assert!(v
            .try_swap(&grid, &limit, Cell::new(Day::Monday, 0), Cell::new(Day::Saturday, 4))
            .is_none());
        // Split lab.
        assert!(v
            .try_swap(&grid, &limit, Cell::new(Day::Wednesday, 1), Cell::new(Day::Wednesday, 5))
            .is_none());
        // Into an extended slot.
        assert!(v
            .try_swap(&grid, &limit, Cell::new(Day::Monday, 0), Cell::new(Day::Monday, 7))
            .is_none());
        // Mandatory within the window is fine.
        assert!(v
            .try_swap(&grid, &limit, Cell::new(Day::Saturday, 2), Cell::new(Day::Saturday, 5))
            .is_some());
    }

    #[test]
    fn test_accepts_checks_hours() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let v = MoveValidator::new(ctx, false);
        let grid = sample(&ctx);
        let limit = v.tally(&grid);

        assert!(v.accepts(&grid, &grid, &limit));
        let mut short = grid.clone();
        short.take(Cell::new(Day::Monday, 0));
        assert!(!v.accepts(&short, &grid, &limit));
    }

    #[test]
    fn test_pairs() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let grid = sample(&ctx);

        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            let (a, b) = random_pair(&grid, &mut rng).unwrap();
            assert!(grid.get(a).is_some());
            assert_ne!(a, b);
        }
        assert!(random_pair(&ctx.new_grid(), &mut rng).is_none());

        let pairs = all_pairs(&grid);
        assert!(pairs.iter().all(|(a, _)| grid.get(*a).is_some()));
        let unique: std::collections::HashSet<_> = pairs
            .iter()
            .map(|&(a, b)| if a.day.index() * 10 + a.slot < b.day.index() * 10 + b.slot { (a, b) } else { (b, a) })
            .collect();
        assert_eq!(unique.len(), pairs.len());
    }
}
