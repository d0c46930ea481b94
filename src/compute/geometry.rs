//! Geometry generator - physical properties of a folded plane.
//!
//! The plane is modelled as a trapezoidal wing sitting at the back of the
//! keel, folded from one A4 sheet. Everything is in SI units.

use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::schema::Genome;

/// Area of the A4 sheet every plane is folded from (m²).
pub const SHEET_AREA: f64 = 0.210 * 0.297;

/// Smallest wing area the simulator will fly (m²).
pub const MIN_WING_AREA: f64 = 1e-4;

const OSWALD_EFFICIENCY: f64 = 0.75;
const ELEVATOR_POWER: f64 = 2.0;
const SIDE_FORCE_SLOPE: f64 = 2.0;
const KEEL_DEPTH: f64 = 0.02;

/// Derived physical description of a plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Wing span (m).
    pub wing_span: f64,
    /// Keel length (m).
    pub body_length: f64,
    /// Mean aerodynamic chord (m).
    pub mean_chord: f64,
    /// Projected wing area (m²).
    pub wing_area: f64,
    /// span² / area.
    pub aspect_ratio: f64,
    /// Total mass (kg).
    pub mass: f64,
    /// Centre of mass, measured back from the nose (m).
    pub center_of_mass: f64,
    /// Centre of pressure, measured back from the nose (m).
    pub center_of_pressure: f64,
    /// Centre of pressure minus centre of mass (m); positive is statically stable.
    pub center_of_mass_offset: f64,
    /// `center_of_mass_offset / mean_chord`.
    pub static_margin: f64,
    /// Principal moments of inertia (roll, pitch, yaw) in kg·m².
    pub moment_of_inertia: Vector3<f64>,
    /// Lift curve slope (per rad).
    pub lift_slope: f64,
    /// Stall angle of attack (rad).
    pub stall_angle: f64,
    /// Zero-lift drag coefficient.
    pub zero_lift_drag: f64,
    /// Induced drag factor `1 / (π e AR)`.
    pub induced_drag_factor: f64,
    /// Lateral area producing side force (m²).
    pub side_area: f64,
    /// Roll moment per unit sideslip (dihedral effect).
    pub dihedral_effect: f64,
    /// Yaw moment per unit sideslip (weathercock stability).
    pub directional_stability: f64,
    /// Pitch damping derivative magnitude.
    pub pitch_damping: f64,
    /// Pitching moment coefficient at zero lift (elevator trim).
    pub trim_moment: f64,
}

impl Geometry {
    /// Whether the simulator can fly this geometry.
    pub fn is_flyable(&self) -> bool {
        let finite = [
            self.wing_span,
            self.mean_chord,
            self.wing_area,
            self.aspect_ratio,
            self.mass,
            self.lift_slope,
            self.zero_lift_drag,
            self.induced_drag_factor,
        ]
        .iter()
        .all(|v| v.is_finite());

        finite
            && self.wing_area > MIN_WING_AREA
            && self.mass > 0.0
            && self.mean_chord > 0.0
            && self
                .moment_of_inertia
                .iter()
                .all(|&i| i.is_finite() && i > 0.0)
    }

    /// Wing loading (N/m²) under gravity `g`.
    #[inline]
    pub fn wing_loading(&self, g: f64) -> f64 {
        self.mass * g / self.wing_area
    }
}

/// Derive a [`Geometry`] from a genome. Pure and total: degenerate
/// designs produce a geometry that fails [`Geometry::is_flyable`].
pub fn generate_geometry(genome: &Genome) -> Geometry {
    let span = genome.wing_span.max(0.0) / 100.0;
    let length = genome.body_length.max(0.0) / 100.0;
    let sweep = genome.wing_sweep.to_radians();
    let dihedral = genome.wing_dihedral.to_radians();
    let nose_fraction = (genome.nose_angle / 90.0).clamp(0.0, 1.0);
    let folds = genome.fold_count.max(1.0);

    // Planform: trapezoid whose root runs along the back of the keel.
    let root_chord = length * (0.55 + 0.25 * sweep.sin());
    let taper = (1.0 - 0.9 * sweep.sin()).clamp(0.1, 1.0);
    let tip_chord = root_chord * taper;
    let planform = 0.5 * span * (root_chord + tip_chord) * (1.0 - 0.3 * nose_fraction);
    let wing_area = planform * dihedral.cos();
    let aspect_ratio = if wing_area > 0.0 {
        span * span / wing_area
    } else {
        0.0
    };

    let mean_chord = if root_chord > 0.0 {
        2.0 / 3.0 * root_chord * (1.0 + taper + taper * taper) / (1.0 + taper)
    } else {
        0.0
    };
    let mac_station = span / 6.0 * (1.0 + 2.0 * taper) / (1.0 + taper);
    let center_of_pressure =
        (length - root_chord) + mac_station * sweep.tan() + 0.25 * mean_chord;

    // Mass: whole sheet; folds and weight distribution move it forward.
    let mass = genome.paper_density.max(0.0) / 1000.0 * SHEET_AREA;
    let nose_bias = genome.weight_distribution / 100.0 * (0.8 + 0.05 * folds);
    let center_of_mass = length * (0.6 - 0.4 * nose_bias);
    let center_of_mass_offset = center_of_pressure - center_of_mass;
    let static_margin = if mean_chord > 0.0 {
        center_of_mass_offset / mean_chord
    } else {
        0.0
    };

    let roll_inertia = mass * span * span / 16.0;
    let pitch_inertia =
        mass * (length * length / 12.0 + 0.5 * (0.5 * length - center_of_mass).powi(2));
    let moment_of_inertia = Vector3::new(
        roll_inertia,
        pitch_inertia,
        roll_inertia + pitch_inertia,
    );

    let tan_sweep = sweep.tan();
    let lift_slope = 2.0 * PI * aspect_ratio
        / (2.0 + (4.0 + aspect_ratio * aspect_ratio * (1.0 + tan_sweep * tan_sweep)).sqrt());
    let stall_angle = (12.0 + 0.2 * genome.wing_sweep + 8.0 / (aspect_ratio + 1.0))
        .min(40.0)
        .to_radians();

    let fin_area = genome.tail_fin_height.max(0.0) / 100.0 * length * 0.4;
    let side_area = fin_area + KEEL_DEPTH * length;
    let zero_lift_drag = 0.03
        + 0.03 * (genome.nose_angle / 45.0).clamp(0.0, 1.0)
        + 0.003 * folds
        + 0.04 / folds
        + if wing_area > 0.0 {
            0.02 * fin_area / wing_area
        } else {
            0.0
        };
    let induced_drag_factor = if aspect_ratio > 0.0 {
        1.0 / (PI * OSWALD_EFFICIENCY * aspect_ratio)
    } else {
        f64::INFINITY
    };

    let dihedral_effect = 0.5 * dihedral.sin() + 0.05 * (2.0 * sweep).sin() + 0.03;
    let fin_arm = 0.85 * length - center_of_mass;
    let directional_stability = if wing_area > 0.0 && span > 0.0 {
        SIDE_FORCE_SLOPE * side_area * fin_arm / (wing_area * span) + 0.05 * sweep.sin()
    } else {
        0.0
    };
    let pitch_damping = if mean_chord > 0.0 {
        4.0 + 2.0 * (length / mean_chord).clamp(1.0, 4.0)
    } else {
        4.0
    };
    let trim_moment = ELEVATOR_POWER * genome.elevator_angle.to_radians();

    Geometry {
        wing_span: span,
        body_length: length,
        mean_chord,
        wing_area,
        aspect_ratio,
        mass,
        center_of_mass,
        center_of_pressure,
        center_of_mass_offset,
        static_margin,
        moment_of_inertia,
        lift_slope,
        stall_angle,
        zero_lift_drag,
        induced_drag_factor,
        side_area,
        dihedral_effect,
        directional_stability,
        pitch_damping,
        trim_moment,
    }
}
