//! Quality scoring and local-search optimization.
//!
//! # Modules
//!
//! - [`score`]: quality sub-scores, composite and soft penalty
//! - [`moves`]: swap generation and hard-rule validation
//! - [`greedy`]: best-improvement swaps
//! - [`population`]: elitist population search
//! - [`annealing`]: simulated annealing
//!
//! Every strategy works on private grid copies, is bounded by
//! `optimizer_iterations`, and returns a grid at least as fit as its input.

pub mod annealing;
pub mod greedy;
pub mod moves;
pub mod population;
pub mod score;

pub use moves::{HardTally, MoveValidator};
pub use score::{ConflictTally, QualityScore, QualityScorer};

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::config::{EngineConfig, OptimizerAlgorithm, OptimizerTuning};
use crate::context::RunContext;
use crate::models::Grid;

/// Summary of an optimizer run. Scores are fitness values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationStats {
    pub algorithm: OptimizerAlgorithm,
    pub iterations: usize,
    pub improvements: usize,
    pub initial_score: f64,
    pub final_score: f64,
}

/// What a strategy needs to evaluate and validate grids.
#[derive(Debug, Clone, Copy)]
pub struct SearchSpace<'a> {
    pub scorer: QualityScorer<'a>,
    pub validator: MoveValidator<'a>,
    pub tuning: &'a OptimizerTuning,
    /// Iteration budget.
    pub budget: usize,
}

impl<'a> SearchSpace<'a> {
    pub fn new(config: &'a EngineConfig, scorer: QualityScorer<'a>, validator: MoveValidator<'a>) -> Self {
        Self {
            scorer,
            validator,
            tuning: &config.tuning,
            budget: config.optimizer_iterations,
        }
    }
}

/// Result of one strategy.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub grid: Grid,
    pub iterations: usize,
    pub improvements: usize,
}

/// Runs the configured strategy.
#[derive(Debug, Clone, Copy)]
pub struct Optimizer<'a> {
    algorithm: OptimizerAlgorithm,
    space: SearchSpace<'a>,
}

impl<'a> Optimizer<'a> {
    pub fn new(ctx: RunContext<'a>, tally: ConflictTally, rooms_in_scope: bool) -> Self {
        Self {
            algorithm: ctx.config.algorithm,
            space: SearchSpace::new(
                ctx.config,
                QualityScorer::new(ctx, tally),
                MoveValidator::new(ctx, rooms_in_scope),
            ),
        }
    }

    /// Overrides the configured strategy.
    pub fn with_algorithm(mut self, algorithm: OptimizerAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Improves `grid` and returns the best grid found.
    pub fn optimize<R: Rng>(&self, grid: Grid, rng: &mut R) -> (Grid, OptimizationStats) {
        let space = &self.space;
        let initial_score = space.scorer.fitness(&grid);

        let outcome = match self.algorithm {
            OptimizerAlgorithm::Greedy => greedy::steepest_swaps(space, grid.clone()),
            OptimizerAlgorithm::Population => population::evolve(space, grid.clone(), rng),
            OptimizerAlgorithm::Temperature => annealing::anneal(space, grid.clone(), rng),
        };

        let outcome_score = space.scorer.fitness(&outcome.grid);
        let (best, final_score) = if outcome_score >= initial_score {
            (outcome.grid, outcome_score)
        } else {
            (grid, initial_score)
        };

        info!(
            algorithm = self.algorithm.name(),
            iterations = outcome.iterations,
            improvements = outcome.improvements,
            initial_score,
            final_score,
            "Optimization finished"
        );

        let stats = OptimizationStats {
            algorithm: self.algorithm,
            iterations: outcome.iterations,
            improvements: outcome.improvements,
            initial_score,
            final_score,
        };
        (best, stats)
    }
}
