//! Best-improvement swap search.
//!
//! # Algorithm
//!
//! Each round evaluates every valid swap of the current grid and applies
//! the one with the highest fitness, provided its gain exceeds the
//! threshold. Stops at the first round without such a swap, after
//! `greedy_max_changes` changes, or when the iteration budget runs out.
//!
//! # Complexity
//! O(r · p · c) where r = rounds, p = candidate pairs, c = cost of a
//! detection pass.

use tracing::debug;

use super::moves::all_pairs;
use super::{SearchOutcome, SearchSpace};
use crate::models::Grid;

/// Runs the best-improvement search from `grid`.
pub fn steepest_swaps(space: &SearchSpace<'_>, grid: Grid) -> SearchOutcome {
    let tuning = space.tuning;
    let rounds = tuning.greedy_max_changes.min(space.budget);
    let mut current = grid;
    let mut fitness = space.scorer.fitness(&current);
    let mut iterations = 0;
    let mut improvements = 0;

    while iterations < rounds {
        iterations += 1;
        let limit = space.validator.tally(&current);
        let mut best: Option<(f64, Grid)> = None;

        for (a, b) in all_pairs(&current) {
            let Some(candidate) = space.validator.try_swap(&current, &limit, a, b) else {
                continue;
            };
            let candidate_fitness = space.scorer.fitness(&candidate);
            let better = best.as_ref().map_or(true, |(f, _)| candidate_fitness > *f);
            if better {
                best = Some((candidate_fitness, candidate));
            }
        }

        match best {
            Some((f, candidate)) if f - fitness > tuning.greedy_threshold => {
                debug!(round = iterations, gain = f - fitness, "Greedy swap applied");
                current = candidate;
                fitness = f;
                improvements += 1;
            }
            _ => break,
        }
    }

    SearchOutcome {
        grid: current,
        iterations,
        improvements,
    }
}
