//! Engine configuration.
//!
//! All options have defaults; a partial JSON document only overrides what it
//! names. [`EngineConfig::validate`] is called by
//! [`TimetableEngine::new`](crate::TimetableEngine::new) before any run.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{Cell, Day};

/// Local-search strategy used after room assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerAlgorithm {
    /// Best-improvement swaps.
    #[default]
    Greedy,
    /// Elitist population search with per-day crossover.
    Population,
    /// Simulated annealing.
    Temperature,
}

impl OptimizerAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            OptimizerAlgorithm::Greedy => "greedy",
            OptimizerAlgorithm::Population => "population",
            OptimizerAlgorithm::Temperature => "temperature",
        }
    }
}

/// Weights of the four quality sub-scores. Normalized by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub workload_balance: f64,
    pub room_utilization: f64,
    pub slot_efficiency: f64,
    pub conflict_resolution: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            workload_balance: 0.25,
            room_utilization: 0.20,
            slot_efficiency: 0.25,
            conflict_resolution: 0.30,
        }
    }
}

impl QualityWeights {
    fn as_array(&self) -> [f64; 4] {
        [
            self.workload_balance,
            self.room_utilization,
            self.slot_efficiency,
            self.conflict_resolution,
        ]
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }

    fn is_valid(&self) -> bool {
        let w = self.as_array();
        w.iter().all(|x| x.is_finite() && *x >= 0.0) && self.total() > 0.0
    }
}

/// Shape of the weekly grid and the placement windows inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Regular teaching slots per day.
    pub slots_per_day: usize,
    /// Extra end-of-day slots, used only by aggressive repairs.
    pub extended_slots: usize,
    /// Saturday slots reserved for mandatory subjects.
    pub mandatory_window: Vec<usize>,
    /// Saturday slots open to regular subjects.
    pub saturday_open_slots: Vec<usize>,
    /// First afternoon slot (morning-lab preference).
    pub afternoon_start: usize,
    /// Slot of the standard midday break.
    pub midday_break_slot: usize,
    /// Lab/practical block length in slots.
    pub lab_block_length: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            slots_per_day: 7,
            extended_slots: 1,
            mandatory_window: vec![2, 3, 4, 5],
            saturday_open_slots: vec![0, 1],
            afternoon_start: 4,
            midday_break_slot: 3,
            lab_block_length: 2,
        }
    }
}

impl GridLayout {
    /// Slots per day including extended slots.
    #[inline]
    pub fn total_slots(&self) -> usize {
        self.slots_per_day + self.extended_slots
    }

    /// Whether the slot is an extended end-of-day slot.
    #[inline]
    pub fn is_extended(&self, slot: usize) -> bool {
        slot >= self.slots_per_day
    }

    /// Whether the cell lies in the mandatory window.
    pub fn in_mandatory_window(&self, cell: Cell) -> bool {
        cell.day == Day::Saturday && self.mandatory_window.contains(&cell.slot)
    }

    /// Whether a regular subject may use the cell with respect to the
    /// Saturday rule.
    pub fn open_to_regular(&self, cell: Cell) -> bool {
        cell.day != Day::Saturday || self.saturday_open_slots.contains(&cell.slot)
    }

    /// Whether the slot is in the afternoon.
    #[inline]
    pub fn is_afternoon(&self, slot: usize) -> bool {
        slot >= self.afternoon_start
    }
}

/// Tuning knobs for the optimizer strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerTuning {
    /// Minimum fitness gain for a greedy change.
    pub greedy_threshold: f64,
    /// Maximum greedy changes per run.
    pub greedy_max_changes: usize,
    /// Individuals per generation.
    pub population_size: usize,
    /// Fraction of the population copied unchanged.
    pub elite_fraction: f64,
    /// Tournament size for parent selection.
    pub tournament_size: usize,
    /// Generation count (capped by the iteration budget).
    pub generations: usize,
    /// Random swaps applied to each offspring.
    pub mutation_swaps: usize,
    /// Starting temperature.
    pub initial_temperature: f64,
    /// Geometric cooling factor per outer round.
    pub cooling_rate: f64,
    /// Proposals per temperature level.
    pub inner_steps: usize,
}

impl Default for OptimizerTuning {
    fn default() -> Self {
        Self {
            greedy_threshold: 0.01,
            greedy_max_changes: 10,
            population_size: 20,
            elite_fraction: 0.2,
            tournament_size: 3,
            generations: 30,
            mutation_swaps: 2,
            initial_temperature: 10.0,
            cooling_rate: 0.95,
            inner_steps: 20,
        }
    }
}

/// Configuration for one [`TimetableEngine`](crate::TimetableEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub detect_conflicts: bool,
    pub auto_resolve: bool,
    pub assign_rooms: bool,
    pub optimize: bool,
    /// Require room equipment to cover the session type's needs.
    pub match_equipment: bool,

    /// Institution-wide daily cap; a member's effective cap is the lower of
    /// this and their own.
    pub max_daily_hours: u32,
    /// Institution-wide weekly cap.
    pub max_weekly_hours: u32,
    /// Longest run of occupied slots allowed before a break.
    pub max_consecutive_slots: usize,
    /// Free slots that count as a break.
    pub min_break_slots: usize,

    pub max_resolution_attempts: usize,
    pub max_schedule_attempts: usize,
    pub optimizer_iterations: usize,

    pub algorithm: OptimizerAlgorithm,
    pub weights: QualityWeights,
    pub grid: GridLayout,
    pub tuning: OptimizerTuning,

    /// Seed for tie-breaking and optimizer randomness. `None` = OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detect_conflicts: true,
            auto_resolve: true,
            assign_rooms: true,
            optimize: true,
            match_equipment: true,
            max_daily_hours: 6,
            max_weekly_hours: 24,
            max_consecutive_slots: 4,
            min_break_slots: 1,
            max_resolution_attempts: 50,
            max_schedule_attempts: 2000,
            optimizer_iterations: 200,
            algorithm: OptimizerAlgorithm::Greedy,
            weights: QualityWeights::default(),
            grid: GridLayout::default(),
            tuning: OptimizerTuning::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_algorithm(mut self, algorithm: OptimizerAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_caps(mut self, weekly: u32, daily: u32) -> Self {
        self.max_weekly_hours = weekly;
        self.max_daily_hours = daily;
        self
    }

    pub fn with_optimizer(mut self, enabled: bool) -> Self {
        self.optimize = enabled;
        self
    }

    pub fn with_auto_resolve(mut self, enabled: bool) -> Self {
        self.auto_resolve = enabled;
        self
    }

    pub fn with_room_assignment(mut self, enabled: bool) -> Self {
        self.assign_rooms = enabled;
        self
    }

    pub fn with_weights(mut self, weights: QualityWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_grid(mut self, grid: GridLayout) -> Self {
        self.grid = grid;
        self
    }

    /// Checks the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.grid;
        if g.slots_per_day == 0 {
            return Err(ConfigError::NoSlots);
        }
        let total = g.total_slots();
        for &slot in &g.mandatory_window {
            if slot >= g.slots_per_day {
                return Err(ConfigError::SlotOutOfRange {
                    field: "mandatory_window",
                    slot,
                    slots: g.slots_per_day,
                });
            }
            if g.saturday_open_slots.contains(&slot) {
                return Err(ConfigError::WindowOverlap(slot));
            }
        }
        for &slot in &g.saturday_open_slots {
            if slot >= g.slots_per_day {
                return Err(ConfigError::SlotOutOfRange {
                    field: "saturday_open_slots",
                    slot,
                    slots: g.slots_per_day,
                });
            }
        }
        if g.midday_break_slot >= total {
            return Err(ConfigError::SlotOutOfRange {
                field: "midday_break_slot",
                slot: g.midday_break_slot,
                slots: total,
            });
        }
        if g.lab_block_length == 0 {
            return Err(ConfigError::ZeroLabBlock);
        }
        if !self.weights.is_valid() {
            return Err(ConfigError::InvalidWeights);
        }
        let t = &self.tuning;
        if t.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if !(0.0..=1.0).contains(&t.elite_fraction) {
            return Err(ConfigError::InvalidEliteFraction(t.elite_fraction));
        }
        if !(t.cooling_rate > 0.0 && t.cooling_rate < 1.0) {
            return Err(ConfigError::InvalidCoolingRate(t.cooling_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.grid.total_slots(), 8);
        assert!((cfg.weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json() {
        let cfg = EngineConfig::from_json(
            r#"{"algorithm": "temperature", "seed": 7, "grid": {"slots_per_day": 8}}"#,
        )
        .unwrap();
        assert_eq!(cfg.algorithm, OptimizerAlgorithm::Temperature);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.grid.slots_per_day, 8);
        assert_eq!(cfg.grid.extended_slots, 1);
        assert!(cfg.auto_resolve);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_window_out_of_range() {
        let mut cfg = EngineConfig::default();
        cfg.grid.mandatory_window = vec![7];
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::SlotOutOfRange {
                field: "mandatory_window",
                slot: 7,
                slots: 7
            })
        );
    }

    #[test]
    fn test_window_overlap() {
        let mut cfg = EngineConfig::default();
        cfg.grid.saturday_open_slots = vec![0, 2];
        assert_eq!(cfg.validate(), Err(ConfigError::WindowOverlap(2)));
    }

    #[test]
    fn test_invalid_weights() {
        let cfg = EngineConfig::default().with_weights(QualityWeights {
            workload_balance: 0.0,
            room_utilization: 0.0,
            slot_efficiency: 0.0,
            conflict_resolution: 0.0,
        });
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidWeights));

        let negative = EngineConfig::default().with_weights(QualityWeights {
            workload_balance: -1.0,
            ..QualityWeights::default()
        });
        assert_eq!(negative.validate(), Err(ConfigError::InvalidWeights));
    }

    #[test]
    fn test_tuning_bounds() {
        let mut cfg = EngineConfig::default();
        cfg.tuning.cooling_rate = 1.0;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidCoolingRate(1.0)));

        let mut cfg = EngineConfig::default();
        cfg.tuning.elite_fraction = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidEliteFraction(1.5)));

        let mut cfg = EngineConfig::default();
        cfg.tuning.population_size = 1;
        assert_eq!(cfg.validate(), Err(ConfigError::PopulationTooSmall));
    }

    #[test]
    fn test_layout_rules() {
        let g = GridLayout::default();
        assert!(g.in_mandatory_window(Cell::new(Day::Saturday, 3)));
        assert!(!g.in_mandatory_window(Cell::new(Day::Friday, 3)));
        assert!(g.open_to_regular(Cell::new(Day::Saturday, 0)));
        assert!(!g.open_to_regular(Cell::new(Day::Saturday, 6)));
        assert!(g.open_to_regular(Cell::new(Day::Monday, 6)));
        assert!(g.is_extended(7));
        assert!(!g.is_extended(6));
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(OptimizerAlgorithm::Greedy.name(), "greedy");
        assert_eq!(OptimizerAlgorithm::Population.name(), "population");
        assert_eq!(OptimizerAlgorithm::Temperature.name(), "temperature");
    }
}
