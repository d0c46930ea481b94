//! Schema module - Configuration, genome and result types for paper-plane optimization.

mod archetype;
mod config;
mod evolution;
mod flight;
mod genome;

pub use archetype::*;
pub use config::*;
pub use evolution::*;
pub use flight::*;
pub use genome::*;
