//! Attitude stability scoring over the tail of a trajectory.

use nalgebra::Vector3;

use crate::schema::StabilityMetrics;

const PITCH_SCALE: f64 = 100.0;
const ROLL_SCALE: f64 = 50.0;
const YAW_SCALE: f64 = 25.0;
const RATE_SCALE: f64 = 1.0;

/// Attitude sample taken during integration.
#[derive(Debug, Clone, Copy)]
pub struct AttitudeSample {
    pub orientation: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
}

#[inline]
fn score(scale: f64, value: f64) -> f64 {
    if value.is_finite() {
        1.0 / (1.0 + scale * value.max(0.0))
    } else {
        0.0
    }
}

fn variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    values.map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Score the last `tail_fraction` of `samples`.
///
/// Fewer than two tail samples yields all-zero metrics.
pub fn compute_stability(samples: &[AttitudeSample], tail_fraction: f64) -> StabilityMetrics {
    let tail_len = ((samples.len() as f64) * tail_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let tail = &samples[samples.len() - tail_len.min(samples.len())..];
    if tail.len() < 2 {
        return StabilityMetrics::default();
    }

    let pitch = variance(tail.iter().map(|s| s.orientation.y));
    let roll = variance(tail.iter().map(|s| s.orientation.x));
    let yaw = variance(tail.iter().map(|s| s.orientation.z));
    let rate = tail
        .iter()
        .map(|s| s.angular_velocity.norm_squared())
        .sum::<f64>()
        / tail.len() as f64;

    let pitch_stability = score(PITCH_SCALE, pitch);
    let roll_stability = score(ROLL_SCALE, roll);
    let yaw_stability = score(YAW_SCALE, yaw);
    let angular_rate_stability = score(RATE_SCALE, rate);

    StabilityMetrics {
        pitch_stability,
        roll_stability,
        yaw_stability,
        angular_rate_stability,
        overall_stability: (pitch_stability
            + roll_stability
            + yaw_stability
            + angular_rate_stability)
            / 4.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady(n: usize) -> Vec<AttitudeSample> {
        (0..n)
            .map(|_| AttitudeSample {
                orientation: Vector3::new(0.0, 0.1, 0.0),
                angular_velocity: Vector3::zeros(),
            })
            .collect()
    }

    #[test]
    fn test_steady_flight_is_fully_stable() {
        let metrics = compute_stability(&steady(20), 0.5);
        assert_eq!(metrics.overall_stability, 1.0);
    }

    #[test]
    fn test_oscillation_lowers_pitch_score() {
        let samples: Vec<_> = (0..40)
            .map(|i| AttitudeSample {
                orientation: Vector3::new(0.0, if i % 2 == 0 { 0.3 } else { -0.3 }, 0.0),
                angular_velocity: Vector3::new(0.0, 2.0, 0.0),
            })
            .collect();
        let metrics = compute_stability(&samples, 0.5);
        assert!(metrics.pitch_stability < 0.2);
        assert_eq!(metrics.roll_stability, 1.0);
        assert!(metrics.overall_stability > 0.0 && metrics.overall_stability < 1.0);
    }

    #[test]
    fn test_only_tail_counts() {
        let mut samples = steady(20);
        for sample in samples.iter_mut().take(10) {
            sample.orientation.x = 1.0;
            sample.angular_velocity.x = 5.0;
        }
        // Settled during the second half.
        assert_eq!(compute_stability(&samples, 0.5).overall_stability, 1.0);
    }

    #[test]
    fn test_too_few_samples() {
        assert_eq!(compute_stability(&steady(1), 1.0), StabilityMetrics::default());
        assert_eq!(compute_stability(&[], 0.5), StabilityMetrics::default());
    }
}
