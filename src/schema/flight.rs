//! Flight simulation output types.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Why a trial stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Altitude reached zero.
    GroundContact,
    /// Maximum simulated time reached while still airborne.
    TimeLimit,
    /// State became non-finite or exceeded the speed/rate limits.
    Divergence,
    /// Geometry unusable for flight (no wing area, bad mass properties).
    DegenerateGeometry,
    /// Launch conditions were not finite.
    InvalidLaunch,
}

impl TerminationReason {
    /// Whether the trajectory ended physically (as opposed to being aborted).
    #[inline]
    pub fn is_physical(self) -> bool {
        matches!(
            self,
            TerminationReason::GroundContact | TerminationReason::TimeLimit
        )
    }
}

/// Attitude stability scores in [0, 1]; higher is steadier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilityMetrics {
    /// From the variance of pitch angle.
    pub pitch_stability: f64,
    /// From the variance of roll angle.
    pub roll_stability: f64,
    /// From the variance of heading.
    pub yaw_stability: f64,
    /// From the mean squared body rate.
    pub angular_rate_stability: f64,
    /// Mean of the sub-scores.
    pub overall_stability: f64,
}

/// One sampled point of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub orientation: Vector3<f64>,
}

/// Outcome of one simulated flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightResult {
    /// Downrange distance along the launch heading, floored at zero (m).
    pub flight_distance: f64,
    /// Simulated time until termination (s).
    pub flight_time: f64,
    /// Highest altitude reached (m).
    pub max_altitude: f64,
    /// Position at termination (m).
    pub final_position: Vector3<f64>,
    /// Attitude stability over the trajectory tail.
    pub stability_metrics: StabilityMetrics,
    /// Plausible flight: no divergence, long enough in time and distance.
    pub success: bool,
    /// Why the trial stopped.
    pub termination: TerminationReason,
    /// Sampled trajectory, only kept when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trajectory: Vec<TrajectoryPoint>,
}

impl FlightResult {
    /// A trial that never flew.
    pub fn failed(reason: TerminationReason, position: Vector3<f64>) -> Self {
        Self {
            flight_distance: 0.0,
            flight_time: 0.0,
            max_altitude: if position.z.is_finite() { position.z } else { 0.0 },
            final_position: position,
            stability_metrics: StabilityMetrics::default(),
            success: false,
            termination: reason,
            trajectory: Vec::new(),
        }
    }

    /// Distance that counts toward fitness (zero for failed trials).
    #[inline]
    pub fn credited_distance(&self) -> f64 {
        if self.success {
            self.flight_distance
        } else {
            0.0
        }
    }

    /// Stability that counts toward fitness (zero for failed trials).
    #[inline]
    pub fn credited_stability(&self) -> f64 {
        if self.success {
            self.stability_metrics.overall_stability
        } else {
            0.0
        }
    }
}
