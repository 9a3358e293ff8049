//! Elitist population search over grid variants.
//!
//! # Algorithm
//!
//! 1. Seed the population with the input grid plus variants made by
//!    random valid swaps.
//! 2. Each generation: keep the elite fraction unchanged, fill the rest
//!    with children of tournament-selected parents.
//! 3. A child takes each day from one parent or the other (per-day
//!    crossover). Children that lose hours or break a hard rule fall back
//!    to the first parent. Every child is then mutated by random swaps.
//!
//! The input grid is an elite of generation zero, so the best individual
//! is never worse than the input.
//!
//! # Reference
//! Burke & Petrovic (2002), "Recent research directions in automated
//! timetabling"

use rand::Rng;
use tracing::debug;

use super::moves::{random_pair, HardTally};
use super::{SearchOutcome, SearchSpace};
use crate::models::{Day, Grid};

#[derive(Debug, Clone)]
struct Individual {
    grid: Grid,
    fitness: f64,
}

impl Individual {
    fn new(grid: Grid, space: &SearchSpace<'_>) -> Self {
        let fitness = space.scorer.fitness(&grid);
        Self { grid, fitness }
    }
}

/// Runs the population search from `grid`.
pub fn evolve<R: Rng>(space: &SearchSpace<'_>, grid: Grid, rng: &mut R) -> SearchOutcome {
    let tuning = space.tuning;
    let size = tuning.population_size.max(2);
    let elite = ((size as f64 * tuning.elite_fraction).round() as usize).clamp(1, size);
    let generations = tuning.generations.min(space.budget);
    let limit = space.validator.tally(&grid);
    let reference = grid.clone();

    let mut population = vec![Individual::new(grid, space)];
    while population.len() < size {
        let variant = mutate(space, &reference, &limit, tuning.mutation_swaps.max(1), rng);
        population.push(Individual::new(variant, space));
    }
    rank(&mut population);
    let mut best_fitness = population[0].fitness;
    let mut improvements = 0;

    for generation in 0..generations {
        let mut next: Vec<Individual> = population[..elite].to_vec();
        while next.len() < size {
            let p1 = &population[tournament(population.len(), tuning.tournament_size, rng)];
            let p2 = &population[tournament(population.len(), tuning.tournament_size, rng)];

            let mut child = crossover(&p1.grid, &p2.grid, rng);
            if !space.validator.accepts(&child, &reference, &limit) {
                child = p1.grid.clone();
            }
            let child = mutate(space, &child, &limit, tuning.mutation_swaps, rng);
            next.push(Individual::new(child, space));
        }
        rank(&mut next);
        population = next;

        if population[0].fitness > best_fitness {
            debug!(generation, fitness = population[0].fitness, "Population improved");
            best_fitness = population[0].fitness;
            improvements += 1;
        }
    }

    SearchOutcome {
        grid: population.swap_remove(0).grid,
        iterations: generations,
        improvements,
    }
}

/// Sorts best first; equal fitness keeps insertion order.
fn rank(population: &mut [Individual]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

/// Index of the best of `k` random picks from a ranked population.
fn tournament<R: Rng>(len: usize, k: usize, rng: &mut R) -> usize {
    (0..k.max(1))
        .map(|_| rng.random_range(0..len))
        .min()
        .unwrap_or(0)
}

/// Each day comes from one parent, chosen by a fair coin.
fn crossover<R: Rng>(p1: &Grid, p2: &Grid, rng: &mut R) -> Grid {
    let mut child = p1.clone();
    for &day in &Day::ALL {
        if rng.random_bool(0.5) {
            child.copy_day(p2, day);
        }
    }
    child
}

fn mutate<R: Rng>(
    space: &SearchSpace<'_>,
    grid: &Grid,
    limit: &HardTally,
    swaps: usize,
    rng: &mut R,
) -> Grid {
    let mut current = grid.clone();
    for _ in 0..swaps {
        let Some((a, b)) = random_pair(&current, rng) else {
            break;
        };
        if let Some(next) = space.validator.try_swap(&current, limit, a, b) {
            current = next;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::context::RunContext;
    use crate::models::{Cell, Faculty, Subject, SubjectType, TimetableInput};
    use crate::optimizer::{ConflictTally, MoveValidator, QualityScorer};
    use crate::validation::NormalizedInput;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn setup() -> (NormalizedInput, EngineConfig) {
        let input = TimetableInput::new(
            vec![
                Subject::new("S1").with_name("Algebra").with_weekly_hours(3),
                Subject::new("L1")
                    .with_name("Physics Lab")
                    .with_type(SubjectType::Lab)
                    .with_weekly_hours(2),
            ],
            vec![
                Faculty::new("F1").with_specialization("algebra"),
                Faculty::new("F2").with_specialization("lab"),
            ],
        );
        let mut cfg = EngineConfig::default();
        cfg.tuning.population_size = 6;
        cfg.tuning.generations = 5;
        (NormalizedInput::new(&input, cfg.grid.total_slots()).unwrap(), cfg)
    }

    fn packed(ctx: &RunContext<'_>) -> Grid {
        let s = ctx.input.subject("S1").unwrap();
        let l = ctx.input.subject("L1").unwrap();
        let f1 = ctx.input.faculty_member("F1").unwrap();
        let f2 = ctx.input.faculty_member("F2").unwrap();
        let mut grid = ctx.new_grid();
        for slot in 0..3 {
            grid.place(Cell::new(Day::Monday, slot), ctx.session(s, f1));
        }
        grid.place(Cell::new(Day::Monday, 4), ctx.session(l, f2));
        grid.place(Cell::new(Day::Monday, 5), ctx.session(l, f2));
        grid
    }

    #[test]
    fn test_never_worse_than_input() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let space = SearchSpace::new(
            &cfg,
            QualityScorer::new(ctx, ConflictTally::default()),
            MoveValidator::new(ctx, false),
        );
        let grid = packed(&ctx);
        let before = space.scorer.fitness(&grid);

        let outcome = evolve(&space, grid, &mut SmallRng::seed_from_u64(42));
        assert!(space.scorer.fitness(&outcome.grid) >= before);
        assert_eq!(outcome.grid.subject_hours("S1"), 3);
        assert_eq!(outcome.grid.subject_hours("L1"), 2);
        assert_eq!(outcome.iterations, 5);
        assert_eq!(space.validator.tally(&outcome.grid), HardTally::default());
    }

    #[test]
    fn test_seeded_runs_match() {
        let (input, cfg) = setup();
        let ctx = RunContext::new(&input, &cfg);
        let space = SearchSpace::new(
            &cfg,
            QualityScorer::new(ctx, ConflictTally::default()),
            MoveValidator::new(ctx, false),
        );
        let a = evolve(&space, packed(&ctx), &mut SmallRng::seed_from_u64(9));
        let b = evolve(&space, packed(&ctx), &mut SmallRng::seed_from_u64(9));
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.improvements, b.improvements);
    }

    #[test]
    fn test_crossover_takes_whole_days() {
        let mut p1 = Grid::new(8);
        let mut p2 = Grid::new(8);
        let session = |s: &str| crate::models::SessionAssignment::new(s, "F1", SubjectType::Theory, false);
        for day in Day::ALL {
            p1.place(Cell::new(day, 0), session("A"));
            p2.place(Cell::new(day, 0), session("B"));
        }
        let child = crossover(&p1, &p2, &mut SmallRng::seed_from_u64(1));
        assert_eq!(child.filled_count(), 6);
        assert_eq!(child.subject_hours("A") + child.subject_hours("B"), 6);
    }

    #[test]
    fn test_tournament_prefers_ranked_front() {
        let mut rng = SmallRng::seed_from_u64(3);
        let picks: Vec<usize> = (0..200).map(|_| tournament(10, 3, &mut rng)).collect();
        let mean = picks.iter().sum::<usize>() as f64 / picks.len() as f64;
        assert!(picks.iter().all(|&i| i < 10));
        assert!(mean < 4.5);
    }
}
