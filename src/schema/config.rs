//! Configuration types for flight simulation and environmental conditions.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Flight simulator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Integration time step in seconds.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Upper bound on simulated time per trial in seconds.
    #[serde(default = "default_max_time")]
    pub max_time: f64,
    /// Gravitational acceleration (m/s²).
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Air density (kg/m³).
    #[serde(default = "default_air_density")]
    pub air_density: f64,
    /// Speed above which a trajectory is treated as diverged (m/s).
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Angular rate above which a trajectory is treated as diverged (rad/s).
    #[serde(default = "default_max_angular_rate")]
    pub max_angular_rate: f64,
    /// Shortest flight that still counts as a success (s).
    #[serde(default = "default_min_flight_time")]
    pub min_flight_time: f64,
    /// Shortest distance that still counts as a success (m).
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
    /// Attitude is sampled every `sample_interval` steps.
    #[serde(default = "default_sample_interval")]
    pub sample_interval: usize,
    /// Fraction of the attitude samples (from the end) used for stability.
    #[serde(default = "default_stability_tail_fraction")]
    pub stability_tail_fraction: f64,
    /// Keep the sampled trajectory in each [`crate::schema::FlightResult`].
    #[serde(default)]
    pub record_trajectory: bool,
    /// Launch conditions used for multi-condition testing.
    #[serde(default)]
    pub launch: InitialConditions,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            max_time: default_max_time(),
            gravity: default_gravity(),
            air_density: default_air_density(),
            max_speed: default_max_speed(),
            max_angular_rate: default_max_angular_rate(),
            min_flight_time: default_min_flight_time(),
            min_distance: default_min_distance(),
            sample_interval: default_sample_interval(),
            stability_tail_fraction: default_stability_tail_fraction(),
            record_trajectory: false,
            launch: InitialConditions::default(),
        }
    }
}

fn default_dt() -> f64 {
    0.002
}
fn default_max_time() -> f64 {
    20.0
}
fn default_gravity() -> f64 {
    9.81
}
fn default_air_density() -> f64 {
    1.225
}
fn default_max_speed() -> f64 {
    150.0
}
fn default_max_angular_rate() -> f64 {
    100.0
}
fn default_min_flight_time() -> f64 {
    0.5
}
fn default_min_distance() -> f64 {
    1.0
}
fn default_sample_interval() -> usize {
    5
}
fn default_stability_tail_fraction() -> f64 {
    0.5
}

impl SimulatorConfig {
    /// Upper bound on integration steps per trial.
    #[inline]
    pub fn max_steps(&self) -> usize {
        (self.max_time / self.dt).ceil() as usize
    }

    /// Validate simulator parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.dt));
        }
        if !(self.max_time.is_finite() && self.max_time >= self.dt) {
            return Err(ConfigError::InvalidMaxTime(self.max_time));
        }
        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            return Err(ConfigError::InvalidConstant("gravity", self.gravity));
        }
        if !(self.air_density.is_finite() && self.air_density > 0.0) {
            return Err(ConfigError::InvalidConstant("air_density", self.air_density));
        }
        if !(self.max_speed > 0.0) {
            return Err(ConfigError::InvalidConstant("max_speed", self.max_speed));
        }
        if !(self.max_angular_rate > 0.0) {
            return Err(ConfigError::InvalidConstant(
                "max_angular_rate",
                self.max_angular_rate,
            ));
        }
        if self.sample_interval == 0 {
            return Err(ConfigError::InvalidSampleInterval);
        }
        if !(self.stability_tail_fraction > 0.0 && self.stability_tail_fraction <= 1.0) {
            return Err(ConfigError::InvalidTailFraction(
                self.stability_tail_fraction,
            ));
        }
        if !self.launch.is_finite() {
            return Err(ConfigError::NonFiniteLaunch);
        }
        Ok(())
    }
}

/// Launch state of a trial.
///
/// Frame: x forward (downrange), y left, z up. Orientation is
/// (roll, pitch, yaw) in radians; positive roll puts the right wing down,
/// positive pitch raises the nose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Launch position (m).
    pub position: Vector3<f64>,
    /// Launch velocity (m/s).
    pub velocity: Vector3<f64>,
    /// Launch attitude (roll, pitch, yaw) in radians.
    pub orientation: Vector3<f64>,
    /// Launch body rates (rad/s).
    #[serde(default = "zero_vector")]
    pub angular_velocity: Vector3<f64>,
}

fn zero_vector() -> Vector3<f64> {
    Vector3::zeros()
}

impl Default for InitialConditions {
    /// Hand launch from 2 m at 6 m/s with the nose 10° up.
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 2.0),
            velocity: Vector3::new(6.0, 0.0, 0.0),
            orientation: Vector3::new(0.0, 10.0f64.to_radians(), 0.0),
            angular_velocity: Vector3::zeros(),
        }
    }
}

impl InitialConditions {
    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.orientation.iter().all(|v| v.is_finite())
            && self.angular_velocity.iter().all(|v| v.is_finite())
    }
}

/// Environmental condition for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindCondition {
    /// Label used in reports.
    pub name: String,
    /// Wind velocity at ground level (m/s).
    pub velocity: Vector3<f64>,
    /// Vertical gradient: wind scales by `1 + gradient * altitude`.
    #[serde(default)]
    pub gradient: f64,
    /// Gust standard deviation (m/s).
    #[serde(default)]
    pub turbulence: f64,
}

impl WindCondition {
    /// Still air.
    pub fn calm() -> Self {
        Self {
            name: "no_wind".to_string(),
            velocity: Vector3::zeros(),
            gradient: 0.0,
            turbulence: 0.0,
        }
    }

    /// Wind along +x (with the launch direction).
    pub fn tailwind(speed: f64) -> Self {
        Self {
            name: "tailwind".to_string(),
            velocity: Vector3::new(speed.abs(), 0.0, 0.0),
            gradient: 0.0,
            turbulence: 0.0,
        }
    }

    /// Wind along -x (against the launch direction).
    pub fn headwind(speed: f64) -> Self {
        Self {
            name: "headwind".to_string(),
            velocity: Vector3::new(-speed.abs(), 0.0, 0.0),
            gradient: 0.0,
            turbulence: 0.0,
        }
    }

    /// Wind along +y (from the right, blowing left).
    pub fn crosswind(speed: f64) -> Self {
        Self {
            name: "crosswind".to_string(),
            velocity: Vector3::new(0.0, speed, 0.0),
            gradient: 0.0,
            turbulence: 0.0,
        }
    }

    /// Set the vertical gradient.
    pub fn with_gradient(mut self, gradient: f64) -> Self {
        self.gradient = gradient;
        self
    }

    /// Set the turbulence intensity.
    pub fn with_turbulence(mut self, turbulence: f64) -> Self {
        self.turbulence = turbulence;
        self
    }

    /// Standard evaluation battery: no wind, +3 m/s tailwind, 2 m/s headwind.
    pub fn standard_battery() -> Vec<WindCondition> {
        vec![
            WindCondition::calm(),
            WindCondition::tailwind(3.0),
            WindCondition::headwind(2.0),
        ]
    }

    /// Validate the condition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.velocity.iter().all(|v| v.is_finite()) || !self.gradient.is_finite() {
            return Err(ConfigError::NonFiniteWind(self.name.clone()));
        }
        if !(self.turbulence.is_finite() && self.turbulence >= 0.0) {
            return Err(ConfigError::InvalidTurbulence {
                name: self.name.clone(),
                value: self.turbulence,
            });
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("Maximum simulated time must be finite and at least one time step, got {0}")]
    InvalidMaxTime(f64),
    #[error("Physical constant {0} has invalid value {1}")]
    InvalidConstant(&'static str, f64),
    #[error("Sample interval must be non-zero")]
    InvalidSampleInterval,
    #[error("Stability tail fraction must be in (0, 1], got {0}")]
    InvalidTailFraction(f64),
    #[error("Launch conditions must be finite")]
    NonFiniteLaunch,
    #[error("Wind condition {0} has non-finite velocity or gradient")]
    NonFiniteWind(String),
    #[error("Wind condition {name} has invalid turbulence {value} (must be >= 0)")]
    InvalidTurbulence { name: String, value: f64 },
    #[error("Gene {gene} has invalid bounds [{min}, {max}]")]
    InvalidBounds {
        gene: &'static str,
        min: f64,
        max: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SimulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_steps(), 10_000);
    }

    #[test]
    fn test_invalid_time_step() {
        let config = SimulatorConfig {
            dt: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeStep(_))
        ));
    }

    #[test]
    fn test_negative_turbulence_rejected() {
        let wind = WindCondition::calm().with_turbulence(-0.1);
        assert!(matches!(
            wind.validate(),
            Err(ConfigError::InvalidTurbulence { .. })
        ));
    }

    #[test]
    fn test_standard_battery() {
        let battery = WindCondition::standard_battery();
        let names: Vec<&str> = battery.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["no_wind", "tailwind", "headwind"]);
        assert_eq!(battery[1].velocity.x, 3.0);
        assert_eq!(battery[2].velocity.x, -2.0);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{ "dt": 0.001, "launch": { "position": [0, 0, 1.5], "velocity": [5, 0, 0], "orientation": [0, 0.1, 0] } }"#;
        let config: SimulatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dt, 0.001);
        assert_eq!(config.max_time, 20.0);
        assert_eq!(config.launch.position.z, 1.5);
        assert_eq!(config.launch.angular_velocity, Vector3::zeros());
    }
}
