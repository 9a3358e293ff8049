//! Simulated annealing over random swaps.
//!
//! # Algorithm
//!
//! Each inner step proposes a random valid swap. Improving or equal moves
//! are always accepted; worse ones with probability `exp(Δ / T)`. After
//! `inner_steps` proposals the temperature is multiplied by
//! `cooling_rate`. The best grid seen is returned.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

use rand::Rng;
use tracing::debug;

use super::moves::random_pair;
use super::{SearchOutcome, SearchSpace};
use crate::models::Grid;

/// Runs simulated annealing from `grid`.
pub fn anneal<R: Rng>(space: &SearchSpace<'_>, grid: Grid, rng: &mut R) -> SearchOutcome {
    let tuning = space.tuning;
    let inner_steps = tuning.inner_steps.max(1);
    let mut current_fitness = space.scorer.fitness(&grid);
    let mut best = grid.clone();
    let mut best_fitness = current_fitness;
    let mut current = grid;
    let mut temperature = tuning.initial_temperature;
    let mut iterations = 0;
    let mut improvements = 0;

    'rounds: while iterations < space.budget {
        for _ in 0..inner_steps {
            if iterations >= space.budget {
                break 'rounds;
            }
            let Some((a, b)) = random_pair(&current, rng) else {
                break 'rounds;
            };
            iterations += 1;

            let limit = space.validator.tally(&current);
            let Some(candidate) = space.validator.try_swap(&current, &limit, a, b) else {
                continue;
            };
            let candidate_fitness = space.scorer.fitness(&candidate);
            let delta = candidate_fitness - current_fitness;
            let accept = delta >= 0.0 || rng.random_bool((delta / temperature).exp().clamp(0.0, 1.0));
            if !accept {
                continue;
            }

            current = candidate;
            current_fitness = candidate_fitness;
            if current_fitness > best_fitness {
                best = current.clone();
                best_fitness = current_fitness;
                improvements += 1;
            }
        }
        temperature *= tuning.cooling_rate;
        debug!(iterations, temperature, best_fitness, "Annealing round finished");
    }

    SearchOutcome {
        grid: best,
        iterations,
        improvements,
    }
}
