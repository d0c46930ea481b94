//! Sigma PaperPlane - Evolutionary design of folded paper airplanes.
//!
//! A paper plane is described by ten design genes. Each genome is turned
//! into a physical geometry, flown through a reduced-order six-degree-of-
//! freedom simulator under a battery of wind conditions, and scored for
//! distance, stability, or a balance of both. A genetic algorithm searches
//! the gene space for the best design.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Genomes, archetypes, configuration and result types
//! - `compute`: Geometry, aerodynamics, flight simulation and evolutionary search
//!
//! # Example
//!
//! ```rust,no_run
//! use sigma_paperplane::{
//!     schema::{Archetype, GenomeConstraints, InitialConditions, WindCondition},
//!     compute::{FlightSimulator, generate_geometry},
//! };
//!
//! let genome = Archetype::Glider.genome(&GenomeConstraints::default());
//! let geometry = generate_geometry(&genome);
//!
//! let simulator = FlightSimulator::default();
//! let result = simulator.simulate_flight(
//!     &geometry,
//!     &InitialConditions::default(),
//!     &WindCondition::tailwind(3.0),
//!     42,
//! );
//!
//! println!("Flew {:.2} m in {:.2} s", result.flight_distance, result.flight_time);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{GeneticOptimizer, OptimizationSummary};
pub use compute::{FlightSimulator, Geometry, generate_geometry};
pub use schema::{
    Archetype, FlightResult, Genome, GenomeConstraints, Objective, OptimizationResult,
    OptimizerConfig, WindCondition,
};
