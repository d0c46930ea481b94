//! Wind field with altitude gradient and seeded turbulence.

use nalgebra::Vector3;
use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::schema::WindCondition;

/// Gust correlation time (s).
const GUST_CORRELATION_TIME: f64 = 0.5;
/// Gust components are bounded to this many standard deviations.
const GUST_BOUND_SIGMA: f64 = 3.0;

/// Wind experienced during one trial.
///
/// The gust is a first-order Gauss-Markov process so consecutive steps are
/// correlated; it is advanced once per integration step.
pub struct WindField {
    base: Vector3<f64>,
    gradient: f64,
    intensity: f64,
    gust: Vector3<f64>,
    rng: StdRng,
}

impl WindField {
    /// Create a wind field for `condition` with an explicit turbulence seed.
    pub fn new(condition: &WindCondition, seed: u64) -> Self {
        let mut field = Self {
            base: condition.velocity,
            gradient: condition.gradient,
            intensity: condition.turbulence.max(0.0),
            gust: Vector3::zeros(),
            rng: StdRng::seed_from_u64(seed),
        };
        // Start from the stationary distribution rather than still air.
        if field.intensity > 0.0 {
            field.gust = field.sample_noise() * field.intensity;
            field.bound_gust();
        }
        field
    }

    /// Wind velocity at `altitude` for the current gust.
    #[inline]
    pub fn at(&self, altitude: f64) -> Vector3<f64> {
        self.base * (1.0 + self.gradient * altitude.max(0.0)) + self.gust
    }

    /// Advance the gust by `dt`.
    pub fn advance(&mut self, dt: f64) {
        if self.intensity <= 0.0 {
            return;
        }
        let decay = (-dt / GUST_CORRELATION_TIME).exp();
        let drive = (1.0 - decay * decay).sqrt() * self.intensity;
        let noise = self.sample_noise();
        self.gust = self.gust * decay + noise * drive;
        self.bound_gust();
    }

    /// Current gust component.
    #[inline]
    pub fn gust(&self) -> Vector3<f64> {
        self.gust
    }

    fn sample_noise(&mut self) -> Vector3<f64> {
        Vector3::new(
            self.rng.sample(StandardNormal),
            self.rng.sample(StandardNormal),
            self.rng.sample(StandardNormal),
        )
    }

    fn bound_gust(&mut self) {
        let limit = GUST_BOUND_SIGMA * self.intensity;
        self.gust = self.gust.map(|g| g.clamp(-limit, limit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calm_air_has_no_gust() {
        let mut field = WindField::new(&WindCondition::calm(), 1);
        field.advance(0.01);
        assert_eq!(field.at(5.0), Vector3::zeros());
    }

    #[test]
    fn test_gradient_scales_with_altitude() {
        let wind = WindCondition::tailwind(2.0).with_gradient(0.5);
        let field = WindField::new(&wind, 1);
        assert!((field.at(0.0).x - 2.0).abs() < 1e-12);
        assert!((field.at(2.0).x - 4.0).abs() < 1e-12);
        // Below ground behaves like ground level.
        assert!((field.at(-1.0).x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_turbulence_is_bounded_and_seeded() {
        let wind = WindCondition::calm().with_turbulence(0.5);
        let mut a = WindField::new(&wind, 42);
        let mut b = WindField::new(&wind, 42);
        let mut c = WindField::new(&wind, 43);
        let mut differs = false;
        for _ in 0..1000 {
            a.advance(0.002);
            b.advance(0.002);
            c.advance(0.002);
            assert_eq!(a.gust(), b.gust());
            assert!(a.gust().iter().all(|g| g.abs() <= 1.5 + 1e-12));
            differs |= a.gust() != c.gust();
        }
        assert!(differs);
    }
}
