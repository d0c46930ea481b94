//! Reduced-order aerodynamic model and rigid-body equations of motion.
//!
//! Forces: lift, drag, side force and gravity. Moments: pitch (trim, static
//! margin, damping), roll (dihedral effect, damping) and yaw (weathercock,
//! damping). Euler-angle rates are taken equal to the body rates.

use nalgebra::Vector3;

use super::Geometry;
use crate::schema::{InitialConditions, SimulatorConfig};

/// Drag coefficient of a flat plate broadside to the flow.
const FLAT_PLATE_DRAG: f64 = 1.28;
const SIDESLIP_DRAG: f64 = 0.5;
const SIDE_FORCE_SLOPE: f64 = 2.0;
const ROLL_DAMPING: f64 = 0.45;
const YAW_DAMPING: f64 = 0.15;
/// Below this airspeed (m/s) aerodynamic forces are ignored.
const MIN_AIRSPEED: f64 = 1e-6;

/// Rigid-body state of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    /// Position (m).
    pub position: Vector3<f64>,
    /// Velocity (m/s).
    pub velocity: Vector3<f64>,
    /// (roll, pitch, yaw) in radians.
    pub orientation: Vector3<f64>,
    /// Body rates (rad/s).
    pub angular_velocity: Vector3<f64>,
}

/// Time derivative of a [`FlightState`].
#[derive(Debug, Clone, Copy)]
pub struct Derivative {
    pub d_position: Vector3<f64>,
    pub d_velocity: Vector3<f64>,
    pub d_orientation: Vector3<f64>,
    pub d_angular_velocity: Vector3<f64>,
}

impl FlightState {
    /// State at launch.
    pub fn from_initial(initial: &InitialConditions) -> Self {
        Self {
            position: initial.position,
            velocity: initial.velocity,
            orientation: initial.orientation,
            angular_velocity: initial.angular_velocity,
        }
    }

    /// Advance the state by a derivative scaled by `dt` (used inside RK4).
    #[inline]
    pub fn apply(&self, d: &Derivative, dt: f64) -> Self {
        Self {
            position: self.position + d.d_position * dt,
            velocity: self.velocity + d.d_velocity * dt,
            orientation: self.orientation + d.d_orientation * dt,
            angular_velocity: self.angular_velocity + d.d_angular_velocity * dt,
        }
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.orientation.iter().all(|v| v.is_finite())
            && self.angular_velocity.iter().all(|v| v.is_finite())
    }
}

impl Derivative {
    /// `(k1 + 2 k2 + 2 k3 + k4) / 6`.
    pub fn rk4_average(k1: &Self, k2: &Self, k3: &Self, k4: &Self) -> Self {
        let avg = |a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>, d: Vector3<f64>| {
            (a + b * 2.0 + c * 2.0 + d) / 6.0
        };
        Self {
            d_position: avg(k1.d_position, k2.d_position, k3.d_position, k4.d_position),
            d_velocity: avg(k1.d_velocity, k2.d_velocity, k3.d_velocity, k4.d_velocity),
            d_orientation: avg(
                k1.d_orientation,
                k2.d_orientation,
                k3.d_orientation,
                k4.d_orientation,
            ),
            d_angular_velocity: avg(
                k1.d_angular_velocity,
                k2.d_angular_velocity,
                k3.d_angular_velocity,
                k4.d_angular_velocity,
            ),
        }
    }
}

/// Body axes in the world frame.
#[derive(Debug, Clone, Copy)]
pub struct BodyAxes {
    pub forward: Vector3<f64>,
    pub right: Vector3<f64>,
    pub up: Vector3<f64>,
}

impl BodyAxes {
    /// Axes for (roll, pitch, yaw). Positive roll lowers the right wing.
    pub fn from_orientation(orientation: &Vector3<f64>) -> Self {
        let (roll, pitch, yaw) = (orientation.x, orientation.y, orientation.z);
        let (sr, cr) = roll.sin_cos();
        let (sp, cp) = pitch.sin_cos();
        let (sy, cy) = yaw.sin_cos();

        let forward = Vector3::new(cp * cy, cp * sy, sp);
        let level_right = Vector3::new(sy, -cy, 0.0);
        let level_up = level_right.cross(&forward);

        Self {
            forward,
            right: level_right * cr - level_up * sr,
            up: level_up * cr + level_right * sr,
        }
    }
}

/// Air-relative flow angles.
#[derive(Debug, Clone, Copy)]
pub struct AirData {
    /// Velocity relative to the air (m/s).
    pub relative_velocity: Vector3<f64>,
    /// Magnitude of `relative_velocity`.
    pub airspeed: f64,
    /// Angle of attack (rad), positive with flow from below.
    pub alpha: f64,
    /// Sideslip (rad), positive when drifting toward the right wing.
    pub beta: f64,
}

impl AirData {
    pub fn new(velocity: &Vector3<f64>, wind: &Vector3<f64>, axes: &BodyAxes) -> Self {
        let relative_velocity = velocity - wind;
        let airspeed = relative_velocity.norm();
        if airspeed < MIN_AIRSPEED {
            return Self {
                relative_velocity,
                airspeed,
                alpha: 0.0,
                beta: 0.0,
            };
        }
        let alpha = (-relative_velocity.dot(&axes.up)).atan2(relative_velocity.dot(&axes.forward));
        let beta = (relative_velocity.dot(&axes.right) / airspeed)
            .clamp(-1.0, 1.0)
            .asin();
        Self {
            relative_velocity,
            airspeed,
            alpha,
            beta,
        }
    }
}

/// Lift coefficient: linear in `sin α` up to stall, decaying beyond it.
pub fn lift_coefficient(alpha: f64, geometry: &Geometry) -> f64 {
    let magnitude = alpha.abs();
    if magnitude <= geometry.stall_angle {
        geometry.lift_slope * alpha.sin()
    } else {
        let peak = geometry.lift_slope * geometry.stall_angle.sin();
        let excess = magnitude - geometry.stall_angle;
        alpha.signum() * peak * (0.4 + 0.6 * (-excess / 0.2).exp()) * alpha.cos().abs()
    }
}

/// Drag coefficient for a given lift coefficient and flow angles.
pub fn drag_coefficient(cl: f64, alpha: f64, beta: f64, geometry: &Geometry) -> f64 {
    let sa = alpha.sin();
    let sb = beta.sin();
    geometry.zero_lift_drag
        + geometry.induced_drag_factor * cl * cl
        + FLAT_PLATE_DRAG * sa * sa
        + SIDESLIP_DRAG * sb * sb
}

/// Equations of motion for one geometry under one simulator configuration.
pub struct AeroModel<'a> {
    geometry: &'a Geometry,
    config: &'a SimulatorConfig,
}

impl<'a> AeroModel<'a> {
    pub fn new(geometry: &'a Geometry, config: &'a SimulatorConfig) -> Self {
        Self { geometry, config }
    }

    /// Right-hand side of the equations of motion for `state` in `wind`.
    pub fn derivative(&self, state: &FlightState, wind: &Vector3<f64>) -> Derivative {
        let g = self.geometry;
        let axes = BodyAxes::from_orientation(&state.orientation);
        let air = AirData::new(&state.velocity, wind, &axes);

        let mut force = Vector3::new(0.0, 0.0, -self.config.gravity * g.mass);
        let mut moment = Vector3::zeros();

        if air.airspeed >= MIN_AIRSPEED {
            let q = 0.5 * self.config.air_density * air.airspeed * air.airspeed;
            let qs = q * g.wing_area;
            let v_hat = air.relative_velocity / air.airspeed;

            let cl = lift_coefficient(air.alpha, g);
            let cd = drag_coefficient(cl, air.alpha, air.beta, g);

            let lift_dir = {
                let perp = axes.up - v_hat * axes.up.dot(&v_hat);
                let norm = perp.norm();
                if norm > 1e-9 { perp / norm } else { axes.up }
            };

            force += lift_dir * (qs * cl);
            force -= v_hat * (qs * cd);
            force -= axes.right * (q * g.side_area * SIDE_FORCE_SLOPE * air.beta.sin());

            // Non-dimensional rates.
            let rate = state.angular_velocity;
            let half_span_over_v = g.wing_span / (2.0 * air.airspeed);
            let half_chord_over_v = g.mean_chord / (2.0 * air.airspeed);

            let roll = -g.dihedral_effect * air.beta.sin() - ROLL_DAMPING * rate.x * half_span_over_v;
            let pitch = g.trim_moment
                - g.static_margin * cl
                - g.pitch_damping * rate.y * half_chord_over_v;
            let yaw = -g.directional_stability * air.beta.sin()
                - YAW_DAMPING * rate.z * half_span_over_v;

            moment = Vector3::new(
                qs * g.wing_span * roll,
                qs * g.mean_chord * pitch,
                qs * g.wing_span * yaw,
            );
        }

        Derivative {
            d_position: state.velocity,
            d_velocity: force / g.mass,
            d_orientation: state.angular_velocity,
            d_angular_velocity: moment.component_div(&g.moment_of_inertia),
        }
    }
}
