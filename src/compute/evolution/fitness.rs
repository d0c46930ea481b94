//! Fitness evaluation for evolutionary plane search.
//!
//! A genome is turned into a geometry, flown across the configured wind
//! battery and the trials are reduced to a scalar under an [`Objective`].

use log::debug;

use crate::compute::{FlightSimulator, generate_geometry};
use crate::schema::{
    BalancedWeights, ConfigError, EvaluationConfig, FitnessRecord, FlightResult, Genome,
    Objective,
};

/// Lowest fitness a genome can score.
pub const MIN_FITNESS: f64 = 0.0;

/// Flies genomes and scores them.
///
/// The turbulence seed is fixed at construction so every genome in a run
/// sees the same gusts in a given condition.
pub struct FitnessEvaluator {
    simulator: FlightSimulator,
    eval_config: EvaluationConfig,
    turbulence_seed: u64,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    ///
    /// Fails if the simulator configuration is invalid.
    pub fn new(
        eval_config: &EvaluationConfig,
        turbulence_seed: u64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            simulator: FlightSimulator::new(eval_config.simulator.clone())?,
            eval_config: eval_config.clone(),
            turbulence_seed,
        })
    }

    /// Fly one genome through the condition battery.
    pub fn trials(&self, genome: &Genome) -> Vec<FlightResult> {
        let geometry = generate_geometry(genome);
        self.simulator.test_multiple_conditions(
            &geometry,
            &self.eval_config.conditions,
            self.turbulence_seed,
        )
    }

    /// Evaluate a genome under `objective`.
    pub fn evaluate(&self, genome: &Genome, objective: Objective) -> FitnessRecord {
        let trials = self.trials(genome);
        let fitness = score(
            objective,
            &trials,
            self.eval_config.balanced_weights,
            self.eval_config.reference_distance,
        );

        let n = trials.len().max(1) as f64;
        let mean_distance = trials.iter().map(FlightResult::credited_distance).sum::<f64>() / n;
        let mean_stability = trials.iter().map(FlightResult::credited_stability).sum::<f64>() / n;
        let success_rate = trials.iter().filter(|t| t.success).count() as f64 / n;

        debug!(
            "Evaluated genome: fitness {fitness:.4}, distance {mean_distance:.2} m, \
             stability {mean_stability:.3}, success {success_rate:.2}"
        );

        FitnessRecord {
            fitness,
            objective,
            mean_distance,
            mean_stability,
            success_rate,
            trials,
        }
    }
}

/// Reduce trial results to a scalar fitness.
///
/// Failed trials are credited zero distance and zero stability. The
/// `balanced` objective normalizes distance as `d / (d + reference_distance)`
/// so both terms lie in [0, 1]. Non-finite results score [`MIN_FITNESS`].
pub fn score(
    objective: Objective,
    trials: &[FlightResult],
    weights: BalancedWeights,
    reference_distance: f64,
) -> f64 {
    if trials.is_empty() {
        return MIN_FITNESS;
    }
    let n = trials.len() as f64;
    let mean = |f: &dyn Fn(&FlightResult) -> f64| trials.iter().map(f).sum::<f64>() / n;

    let value = match objective {
        Objective::Distance => mean(&|t| t.credited_distance()),
        Objective::Stability => mean(&|t| t.credited_stability()),
        Objective::Balanced => {
            let distance = mean(&|t| {
                let d = t.credited_distance();
                d / (d + reference_distance)
            });
            let stability = mean(&|t| t.credited_stability());
            (weights.distance * distance + weights.stability * stability)
                / (weights.distance + weights.stability)
        }
    };

    if value.is_finite() {
        value.max(MIN_FITNESS)
    } else {
        MIN_FITNESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        Archetype, Gene, GenomeConstraints, SimulatorConfig, StabilityMetrics, TerminationReason,
        WindCondition,
    };
    use nalgebra::Vector3;
    use proptest::prelude::*;

    fn trial(distance: f64, stability: f64, success: bool) -> FlightResult {
        FlightResult {
            flight_distance: distance,
            flight_time: 2.0,
            max_altitude: 2.0,
            final_position: Vector3::new(distance, 0.0, 0.0),
            stability_metrics: StabilityMetrics {
                overall_stability: stability,
                ..Default::default()
            },
            success,
            termination: TerminationReason::GroundContact,
            trajectory: Vec::new(),
        }
    }

    #[test]
    fn test_distance_objective_credits_failures_zero() {
        let trials = [trial(6.0, 0.5, true), trial(100.0, 0.9, false)];
        let fitness = score(Objective::Distance, &trials, BalancedWeights::default(), 10.0);
        assert!((fitness - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_objective() {
        let trials = [trial(10.0, 0.8, true)];
        let fitness = score(Objective::Balanced, &trials, BalancedWeights::default(), 10.0);
        // 0.5 * (10 / 20) + 0.5 * 0.8
        assert!((fitness - 0.65).abs() < 1e-12);

        let distance_only = BalancedWeights {
            distance: 1.0,
            stability: 0.0,
        };
        let fitness = score(Objective::Balanced, &trials, distance_only, 10.0);
        assert!((fitness - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_failed_scores_minimum() {
        let trials = [trial(5.0, 0.7, false), trial(3.0, 0.2, false)];
        for objective in Objective::ALL {
            let fitness = score(objective, &trials, BalancedWeights::default(), 10.0);
            assert_eq!(fitness, MIN_FITNESS);
        }
        assert_eq!(
            score(Objective::Distance, &[], BalancedWeights::default(), 10.0),
            MIN_FITNESS
        );
    }

    #[test]
    fn test_non_finite_scores_minimum() {
        let trials = [trial(f64::NAN, 0.5, true)];
        let fitness = score(Objective::Distance, &trials, BalancedWeights::default(), 10.0);
        assert_eq!(fitness, MIN_FITNESS);
    }

    #[test]
    fn test_evaluate_archetypes() {
        let config = EvaluationConfig::default();
        let evaluator = FitnessEvaluator::new(&config, 1).unwrap();
        let constraints = GenomeConstraints::default();

        for archetype in Archetype::ALL {
            let genome = archetype.genome(&constraints);
            let record = evaluator.evaluate(&genome, Objective::Balanced);
            assert_eq!(record.trials.len(), config.conditions.len());
            assert!(record.fitness.is_finite());
            assert!((0.0..=1.0).contains(&record.fitness));
            assert!((0.0..=1.0).contains(&record.success_rate));
        }
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let mut config = EvaluationConfig::default();
        config.conditions.push(WindCondition::crosswind(1.5).with_turbulence(0.4));
        let genome = Archetype::Delta.genome(&GenomeConstraints::default());

        let a = FitnessEvaluator::new(&config, 3)
            .unwrap()
            .evaluate(&genome, Objective::Distance);
        let b = FitnessEvaluator::new(&config, 3)
            .unwrap()
            .evaluate(&genome, Objective::Distance);
        assert_eq!(a, b);
    }

    #[test]
    fn test_evaluate_min_span_nose_heavy() {
        let config = EvaluationConfig::default();
        let evaluator = FitnessEvaluator::new(&config, 1).unwrap();
        let constraints = GenomeConstraints::default();
        let genome = constraints
            .min_genome()
            .with_gene(Gene::WeightDistribution, 100.0, &constraints);

        for objective in Objective::ALL {
            let record = evaluator.evaluate(&genome, objective);
            assert_eq!(record.trials.len(), config.conditions.len());
            assert!(record.fitness.is_finite());
            assert!(record.fitness >= MIN_FITNESS);
            assert!(record.mean_distance.is_finite());
        }
    }

    #[test]
    fn test_invalid_simulator_config_rejected() {
        let config = EvaluationConfig {
            simulator: SimulatorConfig {
                dt: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            FitnessEvaluator::new(&config, 1),
            Err(ConfigError::InvalidTimeStep(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_distance_fitness_monotone(
            base in 1.0f64..50.0,
            extra in 0.0f64..50.0,
            stability in 0.0f64..1.0,
        ) {
            let near = [trial(base, stability, true)];
            let far = [trial(base + extra, stability, true)];
            for objective in [Objective::Distance, Objective::Balanced] {
                let a = score(objective, &near, BalancedWeights::default(), 10.0);
                let b = score(objective, &far, BalancedWeights::default(), 10.0);
                prop_assert!(b >= a);
            }
        }
    }
}
