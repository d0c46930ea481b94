//! Compute module - Geometry, aerodynamics and flight simulation.

mod aero;
mod flight;
mod geometry;
mod stability;
mod wind;

pub mod evolution;

pub use aero::*;
pub use flight::*;
pub use geometry::*;
pub use stability::*;
pub use wind::*;
