//! Flight simulator - fixed-step RK4 integration of one plane in one wind.

use log::{debug, warn};
use nalgebra::Vector3;

use super::aero::{AeroModel, Derivative, FlightState};
use super::stability::{AttitudeSample, compute_stability};
use super::{Geometry, WindField};
use crate::schema::{
    ConfigError, FlightResult, InitialConditions, SimulatorConfig, StabilityMetrics,
    TerminationReason, TrajectoryPoint, WindCondition,
};

/// Upper bound on attitude samples reserved up front; longer flights grow
/// the buffer as they go.
const MAX_RESERVED_SAMPLES: usize = 4096;

/// Integrates flights under a fixed [`SimulatorConfig`].
///
/// The simulator holds no mutable state; every call is independent and
/// deterministic in its inputs and seed.
#[derive(Debug, Clone, Default)]
pub struct FlightSimulator {
    config: SimulatorConfig,
}

impl FlightSimulator {
    /// Create a simulator, rejecting an invalid configuration.
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Simulate one flight.
    ///
    /// Degenerate geometry and non-finite launch conditions return a failed
    /// result without integrating.
    pub fn simulate_flight(
        &self,
        geometry: &Geometry,
        initial: &InitialConditions,
        wind: &WindCondition,
        seed: u64,
    ) -> FlightResult {
        if !initial.is_finite() {
            warn!("Non-finite launch conditions, skipping flight");
            return FlightResult::failed(TerminationReason::InvalidLaunch, Vector3::zeros());
        }
        if !geometry.is_flyable() {
            warn!(
                "Degenerate geometry (wing area {:.3e} m², mass {:.3e} kg)",
                geometry.wing_area, geometry.mass
            );
            return FlightResult::failed(TerminationReason::DegenerateGeometry, initial.position);
        }

        let config = &self.config;
        let model = AeroModel::new(geometry, config);
        let mut field = WindField::new(wind, seed);
        let mut state = FlightState::from_initial(initial);

        let dt = config.dt;
        let max_steps = config.max_steps();
        let sample_every = config.sample_interval.max(1);

        let mut samples =
            Vec::with_capacity((max_steps / sample_every).min(MAX_RESERVED_SAMPLES) + 2);
        let mut trajectory = Vec::new();
        let mut max_altitude = state.position.z;
        let mut time = 0.0;
        let mut termination = TerminationReason::TimeLimit;

        let mut record = |state: &FlightState, time: f64| {
            samples.push(AttitudeSample {
                orientation: state.orientation,
                angular_velocity: state.angular_velocity,
            });
            if config.record_trajectory {
                trajectory.push(TrajectoryPoint {
                    time,
                    position: state.position,
                    velocity: state.velocity,
                    orientation: state.orientation,
                });
            }
        };

        if state.position.z <= 0.0 {
            termination = TerminationReason::GroundContact;
        } else {
            record(&state, time);
            for step in 1..=max_steps {
                let gust_wind = |s: &FlightState| field.at(s.position.z);
                let next = rk4_step(&model, &state, dt, gust_wind);
                field.advance(dt);

                if diverged(&next, config) {
                    debug!("Trajectory diverged at t = {:.3} s", time + dt);
                    termination = TerminationReason::Divergence;
                    break;
                }

                if next.position.z <= 0.0 {
                    let frac = state.position.z / (state.position.z - next.position.z);
                    state = FlightState {
                        position: state.position + (next.position - state.position) * frac,
                        ..next
                    };
                    state.position.z = 0.0;
                    time += frac * dt;
                    termination = TerminationReason::GroundContact;
                    record(&state, time);
                    break;
                }

                state = next;
                time = (step as f64 * dt).min(config.max_time);
                max_altitude = max_altitude.max(state.position.z);
                if step % sample_every == 0 || step == max_steps {
                    record(&state, time);
                }
            }
        }

        let heading = Vector3::new(initial.orientation.z.cos(), initial.orientation.z.sin(), 0.0);
        let displacement = state.position - initial.position;
        let flight_distance = displacement.dot(&heading).max(0.0);

        let stability_metrics = if termination == TerminationReason::Divergence {
            StabilityMetrics::default()
        } else {
            compute_stability(&samples, config.stability_tail_fraction)
        };

        let success = termination.is_physical()
            && time >= config.min_flight_time
            && flight_distance >= config.min_distance;

        FlightResult {
            flight_distance,
            flight_time: time,
            max_altitude,
            final_position: state.position,
            stability_metrics,
            success,
            termination,
            trajectory,
        }
    }

    /// Fly `geometry` once per condition from the configured launch.
    ///
    /// Each trial's turbulence seed depends on `seed` and the condition
    /// itself, not on its index in `conditions`.
    pub fn test_multiple_conditions(
        &self,
        geometry: &Geometry,
        conditions: &[WindCondition],
        seed: u64,
    ) -> Vec<FlightResult> {
        conditions
            .iter()
            .map(|wind| {
                self.simulate_flight(geometry, &self.config.launch, wind, condition_seed(seed, wind))
            })
            .collect()
    }
}

/// One classical RK4 step with the wind sampled at each stage's altitude.
fn rk4_step(
    model: &AeroModel<'_>,
    state: &FlightState,
    dt: f64,
    wind: impl Fn(&FlightState) -> Vector3<f64>,
) -> FlightState {
    let eval = |s: &FlightState| model.derivative(s, &wind(s));

    let k1 = eval(state);
    let k2 = eval(&state.apply(&k1, dt / 2.0));
    let k3 = eval(&state.apply(&k2, dt / 2.0));
    let k4 = eval(&state.apply(&k3, dt));

    state.apply(&Derivative::rk4_average(&k1, &k2, &k3, &k4), dt)
}

fn diverged(state: &FlightState, config: &SimulatorConfig) -> bool {
    !state.is_finite()
        || state.velocity.norm() > config.max_speed
        || state.angular_velocity.norm() > config.max_angular_rate
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Turbulence seed for `wind` under base seed `seed`.
pub fn condition_seed(seed: u64, wind: &WindCondition) -> u64 {
    let mut h = splitmix64(seed);
    for byte in wind.name.bytes() {
        h = splitmix64(h ^ u64::from(byte));
    }
    let values = wind
        .velocity
        .iter()
        .copied()
        .chain([wind.gradient, wind.turbulence]);
    for value in values {
        h = splitmix64(h ^ value.to_bits());
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::generate_geometry;
    use crate::schema::{Archetype, Gene, GenomeConstraints};

    fn geometry(archetype: Archetype) -> Geometry {
        generate_geometry(&archetype.genome(&GenomeConstraints::default()))
    }

    fn simulator() -> FlightSimulator {
        FlightSimulator::new(SimulatorConfig::default()).unwrap()
    }

    #[test]
    fn test_classic_flies_in_calm_air() {
        let sim = simulator();
        let result = sim.simulate_flight(
            &geometry(Archetype::Classic),
            &InitialConditions::default(),
            &WindCondition::calm(),
            0,
        );
        assert!(result.flight_distance.is_finite());
        assert!(result.flight_time > 0.0);
        assert!(result.flight_time <= sim.config().max_time);
        assert!(result.max_altitude >= InitialConditions::default().position.z);
        if result.termination == TerminationReason::GroundContact {
            assert_eq!(result.final_position.z, 0.0);
        }
    }

    #[test]
    fn test_flight_is_deterministic() {
        let sim = simulator();
        let wind = WindCondition::tailwind(3.0).with_turbulence(0.5);
        let g = geometry(Archetype::Glider);
        let a = sim.simulate_flight(&g, &InitialConditions::default(), &wind, 9);
        let b = sim.simulate_flight(&g, &InitialConditions::default(), &wind, 9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_geometry_fails() {
        let mut g = geometry(Archetype::Classic);
        g.wing_area = 0.0;
        let result = simulator().simulate_flight(
            &g,
            &InitialConditions::default(),
            &WindCondition::calm(),
            0,
        );
        assert!(!result.success);
        assert_eq!(result.termination, TerminationReason::DegenerateGeometry);
        assert_eq!(result.flight_distance, 0.0);
    }

    #[test]
    fn test_non_finite_launch_fails() {
        let initial = InitialConditions {
            velocity: Vector3::new(f64::NAN, 0.0, 0.0),
            ..Default::default()
        };
        let result = simulator().simulate_flight(
            &geometry(Archetype::Classic),
            &initial,
            &WindCondition::calm(),
            0,
        );
        assert_eq!(result.termination, TerminationReason::InvalidLaunch);
        assert!(!result.success);
    }

    #[test]
    fn test_launch_on_ground_terminates_immediately() {
        let initial = InitialConditions {
            position: Vector3::zeros(),
            ..Default::default()
        };
        let result = simulator().simulate_flight(
            &geometry(Archetype::Classic),
            &initial,
            &WindCondition::calm(),
            0,
        );
        assert_eq!(result.termination, TerminationReason::GroundContact);
        assert_eq!(result.flight_time, 0.0);
        assert!(!result.success);
    }

    #[test]
    fn test_huge_launch_speed_diverges() {
        let initial = InitialConditions {
            velocity: Vector3::new(1.0e4, 0.0, 0.0),
            ..Default::default()
        };
        let result = simulator().simulate_flight(
            &geometry(Archetype::Stunt),
            &initial,
            &WindCondition::calm(),
            0,
        );
        assert_eq!(result.termination, TerminationReason::Divergence);
        assert!(!result.success);
        assert_eq!(result.stability_metrics.overall_stability, 0.0);
    }

    #[test]
    fn test_short_time_limit() {
        let sim = FlightSimulator::new(SimulatorConfig {
            max_time: 0.1,
            record_trajectory: true,
            ..Default::default()
        })
        .unwrap();
        let initial = InitialConditions {
            position: Vector3::new(0.0, 0.0, 50.0),
            ..Default::default()
        };
        let result = sim.simulate_flight(
            &geometry(Archetype::Classic),
            &initial,
            &WindCondition::calm(),
            0,
        );
        assert_eq!(result.termination, TerminationReason::TimeLimit);
        assert!((result.flight_time - 0.1).abs() < 1e-9);
        // Shorter than the minimum flight time.
        assert!(!result.success);
        assert!(!result.trajectory.is_empty());
        assert_eq!(result.trajectory[0].time, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let zero_step = FlightSimulator::new(SimulatorConfig {
            dt: 0.0,
            ..Default::default()
        });
        assert!(matches!(zero_step, Err(ConfigError::InvalidTimeStep(_))));

        let no_sampling = FlightSimulator::new(SimulatorConfig {
            sample_interval: 0,
            ..Default::default()
        });
        assert!(matches!(no_sampling, Err(ConfigError::InvalidSampleInterval)));
    }

    #[test]
    fn test_fine_time_step_with_every_sample() {
        let sim = FlightSimulator::new(SimulatorConfig {
            dt: 1.0e-4,
            max_time: 0.05,
            sample_interval: 1,
            ..Default::default()
        })
        .unwrap();
        let result = sim.simulate_flight(
            &geometry(Archetype::Classic),
            &InitialConditions::default(),
            &WindCondition::calm(),
            0,
        );
        assert_eq!(result.termination, TerminationReason::TimeLimit);
        assert!(result.flight_distance.is_finite());
    }

    #[test]
    fn test_min_span_nose_heavy_still_flies() {
        let constraints = GenomeConstraints::default();
        let genome = constraints
            .min_genome()
            .with_gene(Gene::WeightDistribution, 100.0, &constraints);
        assert_eq!(genome.wing_span, constraints.wing_span.0);
        assert_eq!(genome.weight_distribution, constraints.weight_distribution.1);

        let result = simulator().simulate_flight(
            &generate_geometry(&genome),
            &InitialConditions::default(),
            &WindCondition::calm(),
            0,
        );
        assert!(result.flight_distance.is_finite());
        assert!(result.flight_distance >= 0.0);
        assert!(result.flight_time.is_finite());
        assert!(result.final_position.iter().all(|v| v.is_finite()));
        assert!((0.0..=1.0).contains(&result.stability_metrics.overall_stability));
    }

    #[test]
    fn test_condition_order_only_permutes_results() {
        let sim = simulator();
        let g = geometry(Archetype::Delta);
        let conditions = vec![
            WindCondition::calm().with_turbulence(0.3),
            WindCondition::tailwind(3.0).with_turbulence(0.3),
            WindCondition::headwind(2.0),
        ];
        let mut reversed = conditions.clone();
        reversed.reverse();

        let forward = sim.test_multiple_conditions(&g, &conditions, 5);
        let backward = sim.test_multiple_conditions(&g, &reversed, 5);
        assert_eq!(forward.len(), 3);
        for (i, result) in forward.iter().enumerate() {
            assert_eq!(result, &backward[2 - i]);
        }
    }

    #[test]
    fn test_condition_seed_depends_on_contents() {
        let calm = WindCondition::calm();
        assert_eq!(condition_seed(1, &calm), condition_seed(1, &calm));
        assert_ne!(condition_seed(1, &calm), condition_seed(2, &calm));
        assert_ne!(
            condition_seed(1, &calm),
            condition_seed(1, &WindCondition::tailwind(3.0))
        );
    }
}
