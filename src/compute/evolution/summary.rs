//! Digest of an optimization run for reporting.

use serde::{Deserialize, Serialize};

use crate::schema::{Archetype, Genome, GenomeConstraints, Objective, OptimizationResult};

use super::genome::genome_distance;

/// The genes people usually ask about first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyParameters {
    /// cm
    pub wing_span: f64,
    /// cm
    pub body_length: f64,
    /// degrees
    pub nose_angle: f64,
    /// percent toward the nose
    pub weight_distribution: f64,
}

impl From<&Genome> for KeyParameters {
    fn from(genome: &Genome) -> Self {
        Self {
            wing_span: genome.wing_span,
            body_length: genome.body_length,
            nose_angle: genome.nose_angle,
            weight_distribution: genome.weight_distribution,
        }
    }
}

/// Outcome of the best genome in one wind condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub condition: String,
    pub flight_distance: f64,
    pub flight_time: f64,
    pub stability: f64,
    pub success: bool,
}

/// Summary of an [`OptimizationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    /// Archetype nearest to the best genome.
    pub best_plane_type: Archetype,
    /// Normalized distance from the best genome to that archetype.
    pub archetype_distance: f64,
    pub best_fitness: f64,
    pub objective: Objective,
    pub key_parameters: KeyParameters,
    pub performance_by_condition: Vec<ConditionSummary>,
    pub generations: usize,
    /// Best fitness of the last generation minus that of the first.
    pub fitness_improvement: f64,
}

/// Nearest archetype to `genome` by range-normalized Euclidean distance.
///
/// Ties go to the archetype listed first in [`Archetype::ALL`].
pub fn classify_genome(genome: &Genome, constraints: &GenomeConstraints) -> (Archetype, f64) {
    let mut best = (Archetype::ALL[0], f64::INFINITY);
    for archetype in Archetype::ALL {
        let distance = genome_distance(genome, &archetype.genome(constraints), constraints);
        if distance < best.1 {
            best = (archetype, distance);
        }
    }
    best
}

/// Build the summary of a finished run.
pub fn get_optimization_summary(
    result: &OptimizationResult,
    constraints: &GenomeConstraints,
) -> OptimizationSummary {
    let (best_plane_type, archetype_distance) = classify_genome(&result.best.genome, constraints);

    let fitness_improvement = match (result.history.first(), result.history.last()) {
        (Some(first), Some(last)) => last.best_fitness - first.best_fitness,
        _ => 0.0,
    };

    OptimizationSummary {
        best_plane_type,
        archetype_distance,
        best_fitness: result.best.fitness(),
        objective: result.objective,
        key_parameters: KeyParameters::from(&result.best.genome),
        performance_by_condition: result
            .performance_by_condition
            .iter()
            .map(|p| ConditionSummary {
                condition: p.condition.name.clone(),
                flight_distance: p.result.flight_distance,
                flight_time: p.result.flight_time,
                stability: p.result.stability_metrics.overall_stability,
                success: p.result.success,
            })
            .collect(),
        generations: result.history.len(),
        fitness_improvement,
    }
}
