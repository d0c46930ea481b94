//! Evolutionary search module for discovering well-flying paper planes.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Genome Operations** (`genome`): Random generation, archetype seeding,
//!   crossover, and mutation
//! - **Fitness** (`fitness`): Flies a genome across the wind battery and
//!   reduces the trials under an objective
//! - **Search** (`search`): Genetic algorithm with elitism
//! - **Summary** (`summary`): Nearest-archetype classification and a
//!   report-friendly digest
//!
//! # Example
//!
//! ```rust,no_run
//! use sigma_paperplane::schema::{Objective, OptimizerConfig};
//! use sigma_paperplane::compute::evolution::GeneticOptimizer;
//!
//! let config = OptimizerConfig {
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let optimizer = GeneticOptimizer::new(config)?;
//! let result = optimizer.optimize_with_callback(20, Objective::Balanced, |stats| {
//!     println!("Generation {}: best fitness = {:.3}",
//!         stats.generation, stats.best_fitness);
//! })?;
//!
//! let summary = optimizer.summary(&result);
//! println!("Best plane looks like a {}", summary.best_plane_type);
//! # Ok::<(), sigma_paperplane::schema::OptimizerError>(())
//! ```
//!
//! # Objectives
//!
//! - `Distance`: Mean flight distance, failed trials credited zero
//! - `Stability`: Mean overall stability, failed trials credited zero
//! - `Balanced`: Weighted mean of normalized distance and stability
//!
//! # Selection
//!
//! - `Tournament`: Best of `size` uniform draws
//! - `RankBased`: Probability proportional to rank
//! - `RouletteWheel`: Probability proportional to fitness

mod fitness;
mod genome;
mod search;
mod summary;

pub use fitness::{FitnessEvaluator, MIN_FITNESS, score};
pub use genome::{ARCHETYPE_JITTER, GenomeRng, genome_distance};
pub use search::GeneticOptimizer;
pub use summary::{
    ConditionSummary, KeyParameters, OptimizationSummary, classify_genome,
    get_optimization_summary,
};
