//! Evolution configuration and result types for paper-plane optimization.
//!
//! This module provides the types that configure the genetic optimizer and
//! the immutable records it produces.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{
    Archetype, ConfigError, FlightResult, Genome, GenomeConstraints, SimulatorConfig,
    WindCondition,
};

/// Optimization target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Mean downrange distance.
    Distance,
    /// Mean attitude stability.
    Stability,
    /// Weighted mix of normalized distance and stability.
    #[default]
    Balanced,
}

impl Objective {
    /// All objectives.
    pub const ALL: [Objective; 3] = [
        Objective::Distance,
        Objective::Stability,
        Objective::Balanced,
    ];

    /// Snake-case name.
    pub fn name(self) -> &'static str {
        match self {
            Objective::Distance => "distance",
            Objective::Stability => "stability",
            Objective::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown objective name.
#[derive(Debug, thiserror::Error)]
#[error("Unknown objective: {0} (expected distance, stability or balanced)")]
pub struct ParseObjectiveError(pub String);

impl FromStr for Objective {
    type Err = ParseObjectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Objective::ALL
            .into_iter()
            .find(|o| o.name() == normalized)
            .ok_or_else(|| ParseObjectiveError(s.to_string()))
    }
}

/// Top-level configuration for the genetic optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Number of individuals per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Mutation probability per gene (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Crossover probability per offspring (0.0-1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Best individuals carried over unchanged each generation.
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,
    /// Gaussian mutation standard deviation as a fraction of each gene's range.
    #[serde(default = "default_mutation_strength")]
    pub mutation_strength: f64,
    /// Parent selection method.
    #[serde(default)]
    pub selection: SelectionMethod,
    /// Crossover operator.
    #[serde(default)]
    pub crossover: CrossoverMethod,
    /// Seed the initial population with jittered archetypes.
    #[serde(default = "default_seed_archetypes")]
    pub seed_archetypes: bool,
    /// Gene bounds.
    #[serde(default)]
    pub constraints: GenomeConstraints,
    /// Fitness evaluation settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Random seed for reproducibility; `None` draws one from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Worker threads for evaluation (0 = rayon global pool).
    #[serde(default)]
    pub parallel_workers: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            elite_count: default_elite_count(),
            mutation_strength: default_mutation_strength(),
            selection: SelectionMethod::default(),
            crossover: CrossoverMethod::default(),
            seed_archetypes: default_seed_archetypes(),
            constraints: GenomeConstraints::default(),
            evaluation: EvaluationConfig::default(),
            random_seed: None,
            parallel_workers: 0,
        }
    }
}

fn default_population_size() -> usize {
    30
}
fn default_mutation_rate() -> f64 {
    0.1
}
fn default_crossover_rate() -> f64 {
    0.8
}
fn default_elite_count() -> usize {
    5
}
fn default_mutation_strength() -> f64 {
    0.1
}
fn default_seed_archetypes() -> bool {
    true
}

/// Selection method for the genetic algorithm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method")]
pub enum SelectionMethod {
    /// Tournament selection with configurable size.
    Tournament {
        #[serde(default = "default_tournament_size")]
        size: usize,
    },
    /// Rank-based selection.
    RankBased,
    /// Roulette wheel (fitness-proportionate) selection.
    RouletteWheel,
}

impl Default for SelectionMethod {
    fn default() -> Self {
        Self::Tournament {
            size: default_tournament_size(),
        }
    }
}

fn default_tournament_size() -> usize {
    3
}

/// Crossover operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    /// Linear blend of both parents with one random weight per child.
    #[default]
    Blend,
    /// Each gene taken from either parent with equal probability.
    Uniform,
}

/// Weights of the `balanced` objective.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BalancedWeights {
    /// Weight of the normalized distance term.
    pub distance: f64,
    /// Weight of the stability term.
    pub stability: f64,
}

impl Default for BalancedWeights {
    fn default() -> Self {
        Self {
            distance: 0.5,
            stability: 0.5,
        }
    }
}

/// Evaluation settings for fitness computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Flight simulator settings.
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Battery of wind conditions every genome is flown in.
    #[serde(default = "WindCondition::standard_battery")]
    pub conditions: Vec<WindCondition>,
    /// Weights of the `balanced` objective.
    #[serde(default)]
    pub balanced_weights: BalancedWeights,
    /// Distance (m) that maps to 0.5 when normalizing for `balanced`.
    #[serde(default = "default_reference_distance")]
    pub reference_distance: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            conditions: WindCondition::standard_battery(),
            balanced_weights: BalancedWeights::default(),
            reference_distance: default_reference_distance(),
        }
    }
}

fn default_reference_distance() -> f64 {
    10.0
}

impl EvaluationConfig {
    /// Validate evaluation settings.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        self.simulator.validate()?;
        if self.conditions.is_empty() {
            return Err(OptimizerError::NoConditions);
        }
        for condition in &self.conditions {
            condition.validate()?;
        }
        let w = self.balanced_weights;
        if !(w.distance >= 0.0 && w.stability >= 0.0 && w.distance + w.stability > 0.0)
            || !(w.distance + w.stability).is_finite()
        {
            return Err(OptimizerError::InvalidWeights {
                distance: w.distance,
                stability: w.stability,
            });
        }
        if !(self.reference_distance.is_finite() && self.reference_distance > 0.0) {
            return Err(OptimizerError::InvalidReferenceDistance(
                self.reference_distance,
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Fitness and Population Records
// ============================================================================

/// Fitness of one genome and the trials that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessRecord {
    /// Scalar fitness (higher is better, minimum 0).
    pub fitness: f64,
    /// Objective the fitness was computed for.
    pub objective: Objective,
    /// Mean credited distance across trials (m).
    pub mean_distance: f64,
    /// Mean credited stability across trials.
    pub mean_stability: f64,
    /// Fraction of successful trials.
    pub success_rate: f64,
    /// One result per evaluation condition, in battery order.
    pub trials: Vec<FlightResult>,
}

/// How an individual entered the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "archetype")]
pub enum Origin {
    /// Uniform random sample.
    Random,
    /// Jittered copy of an archetype.
    Archetype(Archetype),
    /// Produced by selection and variation.
    Offspring,
}

/// A scored member of a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Unique identifier within a run.
    pub id: u64,
    /// The genome.
    pub genome: Genome,
    /// Fitness and trial results.
    pub record: FitnessRecord,
    /// Generation this individual was created in.
    pub generation: usize,
    /// Parent IDs (for genealogy).
    pub parents: Vec<u64>,
    /// How it was created.
    pub origin: Origin,
}

impl Individual {
    /// Shortcut for the scalar fitness.
    #[inline]
    pub fn fitness(&self) -> f64 {
        self.record.fitness
    }
}

/// Summary statistics of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number (0-based).
    pub generation: usize,
    /// Best fitness this generation.
    pub best_fitness: f64,
    /// Mean fitness this generation.
    pub mean_fitness: f64,
    /// Worst fitness this generation.
    pub worst_fitness: f64,
    /// Standard deviation of fitness.
    pub fitness_std: f64,
    /// Mean pairwise normalized genome distance.
    pub diversity: f64,
    /// Fraction of successful trials across the population.
    pub success_rate: f64,
    /// ID of the generation's best individual.
    pub best_id: u64,
    /// Genome of the generation's best individual.
    pub best_genome: Genome,
    /// Mean credited distance of the generation's best individual across
    /// the condition battery (m).
    pub best_mean_distance: f64,
}

/// Performance of the best genome in one condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionPerformance {
    /// The wind condition.
    pub condition: WindCondition,
    /// The trial flown in it.
    pub result: FlightResult,
}

/// Statistics from an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Generations produced.
    pub generations: usize,
    /// Individuals per generation.
    pub population_size: usize,
    /// Genome evaluations performed (elites are not re-evaluated).
    pub total_evaluations: u64,
    /// Wall-clock time (s).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Seed the run actually used.
    pub random_seed: u64,
}

/// Final, read-only record of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Objective that was optimized.
    pub objective: Objective,
    /// Best individual seen in any generation.
    pub best: Individual,
    /// Generation in which `best` was first observed.
    pub best_generation: usize,
    /// Per-condition performance of `best`.
    pub performance_by_condition: Vec<ConditionPerformance>,
    /// Per-generation statistics.
    pub history: Vec<GenerationStats>,
    /// Final population, sorted by fitness (descending).
    pub final_population: Vec<Individual>,
    /// Run statistics.
    pub stats: RunStats,
}

impl OptimizationResult {
    /// Best genome of each generation, in order.
    pub fn best_genomes(&self) -> Vec<Genome> {
        self.history.iter().map(|s| s.best_genome).collect()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Optimizer configuration and start-up errors.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("Population size {population} must be at least elite count {elites} + 2")]
    PopulationTooSmall { population: usize, elites: usize },
    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("Mutation strength must be finite and non-negative, got {0}")]
    InvalidMutationStrength(f64),
    #[error("Tournament size must be at least 1")]
    InvalidTournamentSize,
    #[error("No evaluation conditions specified")]
    NoConditions,
    #[error("Invalid balanced weights: distance {distance}, stability {stability}")]
    InvalidWeights { distance: f64, stability: f64 },
    #[error("Reference distance must be positive, got {0}")]
    InvalidReferenceDistance(f64),
    #[error("Generation count must be at least 1")]
    NoGenerations,
    #[error("Failed to build evaluation thread pool: {0}")]
    ThreadPool(String),
    #[error("Configuration validation failed: {0}")]
    Config(#[from] ConfigError),
}

impl OptimizerConfig {
    /// Validate optimizer configuration.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.population_size < self.elite_count + 2 {
            return Err(OptimizerError::PopulationTooSmall {
                population: self.population_size,
                elites: self.elite_count,
            });
        }

        let check_rate = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(OptimizerError::RateOutOfRange { name, value })
            }
        };
        check_rate(self.mutation_rate, "mutation_rate")?;
        check_rate(self.crossover_rate, "crossover_rate")?;

        if !(self.mutation_strength.is_finite() && self.mutation_strength >= 0.0) {
            return Err(OptimizerError::InvalidMutationStrength(
                self.mutation_strength,
            ));
        }

        if let SelectionMethod::Tournament { size } = self.selection {
            if size == 0 {
                return Err(OptimizerError::InvalidTournamentSize);
            }
        }

        self.constraints.validate()?;
        self.evaluation.validate()?;

        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigFileError> {
        let text = fs::read_to_string(path)?;
        let config: OptimizerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Error reading config file: {0}")]
    Io(#[from] io::Error),
    #[error("Error parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] OptimizerError),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = OptimizerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_elites_must_leave_room() {
        let config = OptimizerConfig {
            population_size: 6,
            elite_count: 5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OptimizerError::PopulationTooSmall {
                population: 6,
                elites: 5
            })
        ));
    }

    #[test]
    fn test_rates_checked() {
        let config = OptimizerConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OptimizerError::RateOutOfRange {
                name: "mutation_rate",
                ..
            })
        ));

        let config = OptimizerConfig {
            crossover_rate: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OptimizerError::RateOutOfRange {
                name: "crossover_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_nested_errors_surface() {
        let mut config = OptimizerConfig::default();
        config.evaluation.conditions.clear();
        assert!(matches!(
            config.validate(),
            Err(OptimizerError::NoConditions)
        ));

        let mut config = OptimizerConfig::default();
        config.evaluation.simulator.dt = -1.0;
        assert!(matches!(
            config.validate(),
            Err(OptimizerError::Config(ConfigError::InvalidTimeStep(_)))
        ));
    }

    #[test]
    fn test_objective_parse() {
        assert_eq!("Distance".parse::<Objective>().unwrap(), Objective::Distance);
        assert_eq!(
            "balanced".parse::<Objective>().unwrap(),
            Objective::Balanced
        );
        assert!("speed".parse::<Objective>().is_err());
    }

    #[test]
    fn test_serialization() {
        let config = OptimizerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: OptimizerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.population_size, config.population_size);
        assert_eq!(parsed.selection, config.selection);
        assert_eq!(parsed.evaluation.conditions, config.evaluation.conditions);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "population_size": 12, "elite_count": 2, "random_seed": 7,
                 "selection": {{ "method": "RankBased" }} }}"#
        )
        .unwrap();

        let config = OptimizerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.population_size, 12);
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.selection, SelectionMethod::RankBased);
        assert_eq!(config.evaluation.conditions.len(), 3);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "population_size": 3, "elite_count": 2 }}"#).unwrap();
        assert!(matches!(
            OptimizerConfig::from_json_file(file.path()),
            Err(ConfigFileError::Invalid(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            OptimizerConfig::from_json_file(file.path()),
            Err(ConfigFileError::Parse(_))
        ));
    }
}
