//! Named preset designs used as seeds and test fixtures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{GENE_COUNT, Genome, GenomeConstraints};

/// Classic paper-plane archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// The schoolyard dart.
    Classic,
    /// Wide, heavily swept delta.
    Delta,
    /// Long-span, lightly loaded glider.
    Glider,
    /// Short, tail-up acrobat.
    Stunt,
    /// Nose-heavy long-distance design.
    LongDistance,
}

/// Preset gene values in [`super::Gene::ALL`] order:
/// span, length, nose, weight, folds, dihedral, sweep, fin, elevator, paper.
const ARCHETYPE_TABLE: [(Archetype, [f64; GENE_COUNT]); 5] = [
    (
        Archetype::Classic,
        [20.0, 28.0, 30.0, 55.0, 4.0, 5.0, 20.0, 1.5, 0.0, 80.0],
    ),
    (
        Archetype::Delta,
        [18.0, 25.0, 40.0, 50.0, 3.0, 0.0, 50.0, 2.0, 2.0, 80.0],
    ),
    (
        Archetype::Glider,
        [28.0, 22.0, 15.0, 65.0, 5.0, 8.0, 5.0, 1.0, 1.5, 70.0],
    ),
    (
        Archetype::Stunt,
        [14.0, 20.0, 35.0, 40.0, 3.0, -3.0, 30.0, 3.0, 5.0, 90.0],
    ),
    (
        Archetype::LongDistance,
        [24.0, 32.0, 20.0, 70.0, 6.0, 6.0, 15.0, 1.0, 1.0, 75.0],
    ),
];

impl Archetype {
    /// All archetypes in table order.
    pub const ALL: [Archetype; 5] = [
        Archetype::Classic,
        Archetype::Delta,
        Archetype::Glider,
        Archetype::Stunt,
        Archetype::LongDistance,
    ];

    /// Snake-case name.
    pub fn name(self) -> &'static str {
        match self {
            Archetype::Classic => "classic",
            Archetype::Delta => "delta",
            Archetype::Glider => "glider",
            Archetype::Stunt => "stunt",
            Archetype::LongDistance => "long_distance",
        }
    }

    /// Raw preset gene values.
    pub fn values(self) -> [f64; GENE_COUNT] {
        ARCHETYPE_TABLE
            .iter()
            .find(|(a, _)| *a == self)
            .map(|(_, v)| *v)
            .unwrap_or(ARCHETYPE_TABLE[0].1)
    }

    /// Preset genome, clamped into `constraints`.
    pub fn genome(self, constraints: &GenomeConstraints) -> Genome {
        Genome::from_values(self.values(), constraints)
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown archetype name.
#[derive(Debug, thiserror::Error)]
#[error("Unknown plane archetype: {0} (expected classic, delta, glider, stunt or long_distance)")]
pub struct ParseArchetypeError(pub String);

impl FromStr for Archetype {
    type Err = ParseArchetypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Archetype::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| ParseArchetypeError(s.to_string()))
    }
}
