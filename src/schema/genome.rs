//! Genome encoding for paper-plane designs.
//!
//! A genome is a fixed vector of bounded real-valued genes. The bounds live in
//! [`GenomeConstraints`] so a run can narrow the search space from JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Number of genes in a [`Genome`].
pub const GENE_COUNT: usize = 10;

/// Individual genes of a paper-plane genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gene {
    /// Wing span in centimetres.
    WingSpan,
    /// Fuselage (keel) length in centimetres.
    BodyLength,
    /// Half-angle of the folded nose in degrees.
    NoseAngle,
    /// Share of the paper mass folded into the nose, 0 = tail heavy, 100 = nose heavy.
    WeightDistribution,
    /// Number of folds; rounded to an integer.
    FoldCount,
    /// Wing dihedral in degrees (negative = anhedral).
    WingDihedral,
    /// Leading-edge sweep in degrees.
    WingSweep,
    /// Height of the vertical keel/fin in centimetres.
    TailFinHeight,
    /// Elevator deflection in degrees, positive = trailing edge up.
    ElevatorAngle,
    /// Paper grammage in g/m².
    PaperDensity,
}

impl Gene {
    /// All genes in genome order.
    pub const ALL: [Gene; GENE_COUNT] = [
        Gene::WingSpan,
        Gene::BodyLength,
        Gene::NoseAngle,
        Gene::WeightDistribution,
        Gene::FoldCount,
        Gene::WingDihedral,
        Gene::WingSweep,
        Gene::TailFinHeight,
        Gene::ElevatorAngle,
        Gene::PaperDensity,
    ];

    /// Position of this gene in the genome vector.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name used in configs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Gene::WingSpan => "wing_span",
            Gene::BodyLength => "body_length",
            Gene::NoseAngle => "nose_angle",
            Gene::WeightDistribution => "weight_distribution",
            Gene::FoldCount => "fold_count",
            Gene::WingDihedral => "wing_dihedral",
            Gene::WingSweep => "wing_sweep",
            Gene::TailFinHeight => "tail_fin_height",
            Gene::ElevatorAngle => "elevator_angle",
            Gene::PaperDensity => "paper_density",
        }
    }

    /// Whether the gene only takes integer values.
    #[inline]
    pub fn is_discrete(self) -> bool {
        matches!(self, Gene::FoldCount)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate paper-plane design.
///
/// Genomes are plain values: variation operators build new ones and a genome
/// is never changed after it has been scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub wing_span: f64,
    pub body_length: f64,
    pub nose_angle: f64,
    pub weight_distribution: f64,
    pub fold_count: f64,
    pub wing_dihedral: f64,
    pub wing_sweep: f64,
    pub tail_fin_height: f64,
    pub elevator_angle: f64,
    pub paper_density: f64,
}

impl Genome {
    /// Build a genome from raw values in [`Gene::ALL`] order, clamping each
    /// gene into `constraints`.
    pub fn from_values(values: [f64; GENE_COUNT], constraints: &GenomeConstraints) -> Self {
        let mut clamped = values;
        for gene in Gene::ALL {
            clamped[gene.index()] = constraints.clamp(gene, values[gene.index()]);
        }
        Self::from_raw(clamped)
    }

    fn from_raw(v: [f64; GENE_COUNT]) -> Self {
        Self {
            wing_span: v[0],
            body_length: v[1],
            nose_angle: v[2],
            weight_distribution: v[3],
            fold_count: v[4],
            wing_dihedral: v[5],
            wing_sweep: v[6],
            tail_fin_height: v[7],
            elevator_angle: v[8],
            paper_density: v[9],
        }
    }

    /// Gene values in [`Gene::ALL`] order.
    pub fn values(&self) -> [f64; GENE_COUNT] {
        [
            self.wing_span,
            self.body_length,
            self.nose_angle,
            self.weight_distribution,
            self.fold_count,
            self.wing_dihedral,
            self.wing_sweep,
            self.tail_fin_height,
            self.elevator_angle,
            self.paper_density,
        ]
    }

    /// Value of a single gene.
    #[inline]
    pub fn get(&self, gene: Gene) -> f64 {
        self.values()[gene.index()]
    }

    /// Copy of this genome with one gene replaced (and clamped).
    pub fn with_gene(&self, gene: Gene, value: f64, constraints: &GenomeConstraints) -> Self {
        let mut values = self.values();
        values[gene.index()] = value;
        Self::from_values(values, constraints)
    }

    /// Whether every gene lies within `constraints`.
    pub fn is_within(&self, constraints: &GenomeConstraints) -> bool {
        Gene::ALL.iter().all(|&gene| {
            let (lo, hi) = constraints.bounds(gene);
            let v = self.get(gene);
            v.is_finite() && v >= lo && v <= hi
        })
    }
}

/// Per-gene bounds of the search space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConstraints {
    #[serde(default = "default_wing_span_bounds")]
    pub wing_span: (f64, f64),
    #[serde(default = "default_body_length_bounds")]
    pub body_length: (f64, f64),
    #[serde(default = "default_nose_angle_bounds")]
    pub nose_angle: (f64, f64),
    #[serde(default = "default_weight_distribution_bounds")]
    pub weight_distribution: (f64, f64),
    #[serde(default = "default_fold_count_bounds")]
    pub fold_count: (f64, f64),
    #[serde(default = "default_wing_dihedral_bounds")]
    pub wing_dihedral: (f64, f64),
    #[serde(default = "default_wing_sweep_bounds")]
    pub wing_sweep: (f64, f64),
    #[serde(default = "default_tail_fin_height_bounds")]
    pub tail_fin_height: (f64, f64),
    #[serde(default = "default_elevator_angle_bounds")]
    pub elevator_angle: (f64, f64),
    #[serde(default = "default_paper_density_bounds")]
    pub paper_density: (f64, f64),
}

impl Default for GenomeConstraints {
    fn default() -> Self {
        Self {
            wing_span: default_wing_span_bounds(),
            body_length: default_body_length_bounds(),
            nose_angle: default_nose_angle_bounds(),
            weight_distribution: default_weight_distribution_bounds(),
            fold_count: default_fold_count_bounds(),
            wing_dihedral: default_wing_dihedral_bounds(),
            wing_sweep: default_wing_sweep_bounds(),
            tail_fin_height: default_tail_fin_height_bounds(),
            elevator_angle: default_elevator_angle_bounds(),
            paper_density: default_paper_density_bounds(),
        }
    }
}

fn default_wing_span_bounds() -> (f64, f64) {
    (8.0, 30.0)
}
fn default_body_length_bounds() -> (f64, f64) {
    (10.0, 35.0)
}
fn default_nose_angle_bounds() -> (f64, f64) {
    (0.0, 45.0)
}
fn default_weight_distribution_bounds() -> (f64, f64) {
    (0.0, 100.0)
}
fn default_fold_count_bounds() -> (f64, f64) {
    (2.0, 8.0)
}
fn default_wing_dihedral_bounds() -> (f64, f64) {
    (-10.0, 20.0)
}
fn default_wing_sweep_bounds() -> (f64, f64) {
    (0.0, 60.0)
}
fn default_tail_fin_height_bounds() -> (f64, f64) {
    (0.0, 5.0)
}
fn default_elevator_angle_bounds() -> (f64, f64) {
    (-10.0, 10.0)
}
fn default_paper_density_bounds() -> (f64, f64) {
    (60.0, 120.0)
}

impl GenomeConstraints {
    /// Bounds for a gene.
    pub fn bounds(&self, gene: Gene) -> (f64, f64) {
        match gene {
            Gene::WingSpan => self.wing_span,
            Gene::BodyLength => self.body_length,
            Gene::NoseAngle => self.nose_angle,
            Gene::WeightDistribution => self.weight_distribution,
            Gene::FoldCount => self.fold_count,
            Gene::WingDihedral => self.wing_dihedral,
            Gene::WingSweep => self.wing_sweep,
            Gene::TailFinHeight => self.tail_fin_height,
            Gene::ElevatorAngle => self.elevator_angle,
            Gene::PaperDensity => self.paper_density,
        }
    }

    /// Width of a gene's range.
    #[inline]
    pub fn range(&self, gene: Gene) -> f64 {
        let (lo, hi) = self.bounds(gene);
        hi - lo
    }

    /// Clamp a value into a gene's bounds. Discrete genes are rounded and
    /// kept on the integers inside the bounds; non-finite values fall back
    /// to the lower bound.
    pub fn clamp(&self, gene: Gene, value: f64) -> f64 {
        let (lo, hi) = self.bounds(gene);
        let value = if value.is_finite() { value } else { lo };
        if gene.is_discrete() && lo.ceil() <= hi.floor() {
            value.round().max(lo.ceil()).min(hi.floor())
        } else {
            value.max(lo).min(hi)
        }
    }

    /// Genome with every gene at its lower bound.
    pub fn min_genome(&self) -> Genome {
        Genome::from_values(Gene::ALL.map(|g| self.bounds(g).0), self)
    }

    /// Genome with every gene at its upper bound.
    pub fn max_genome(&self) -> Genome {
        Genome::from_values(Gene::ALL.map(|g| self.bounds(g).1), self)
    }

    /// Validate bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for gene in Gene::ALL {
            let (lo, hi) = self.bounds(gene);
            let empty = lo > hi || (gene.is_discrete() && lo.ceil() > hi.floor());
            if !lo.is_finite() || !hi.is_finite() || empty {
                return Err(ConfigError::InvalidBounds {
                    gene: gene.name(),
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gene_order_matches_values() {
        let constraints = GenomeConstraints::default();
        let genome = constraints.max_genome();
        for gene in Gene::ALL {
            assert_eq!(genome.get(gene), constraints.bounds(gene).1, "{gene}");
        }
    }

    #[test]
    fn test_from_values_clamps_and_rounds() {
        let constraints = GenomeConstraints::default();
        let genome = Genome::from_values(
            [100.0, -5.0, 20.0, 150.0, 3.6, 0.0, 10.0, 1.0, 0.0, f64::NAN],
            &constraints,
        );
        assert_eq!(genome.wing_span, 30.0);
        assert_eq!(genome.body_length, 10.0);
        assert_eq!(genome.weight_distribution, 100.0);
        assert_eq!(genome.fold_count, 4.0);
        assert_eq!(genome.paper_density, 60.0);
        assert!(genome.is_within(&constraints));
    }

    #[test]
    fn test_with_gene_leaves_original_untouched() {
        let constraints = GenomeConstraints::default();
        let genome = constraints.min_genome();
        let changed = genome.with_gene(Gene::NoseAngle, 30.0, &constraints);
        assert_eq!(genome.nose_angle, 0.0);
        assert_eq!(changed.nose_angle, 30.0);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let constraints = GenomeConstraints {
            wing_span: (30.0, 8.0),
            ..Default::default()
        };
        assert!(matches!(
            constraints.validate(),
            Err(ConfigError::InvalidBounds { gene: "wing_span", .. })
        ));
        assert!(GenomeConstraints::default().validate().is_ok());
    }

    #[test]
    fn test_fractional_discrete_bounds() {
        let constraints = GenomeConstraints {
            fold_count: (2.4, 6.6),
            ..Default::default()
        };
        assert!(constraints.validate().is_ok());
        assert_eq!(constraints.clamp(Gene::FoldCount, 2.0), 3.0);
        assert_eq!(constraints.clamp(Gene::FoldCount, 2.45), 3.0);
        assert_eq!(constraints.clamp(Gene::FoldCount, 4.4), 4.0);
        assert_eq!(constraints.clamp(Gene::FoldCount, 7.0), 6.0);
        assert_eq!(constraints.min_genome().fold_count, 3.0);
        assert_eq!(constraints.max_genome().fold_count, 6.0);

        let no_integer = GenomeConstraints {
            fold_count: (2.4, 2.6),
            ..Default::default()
        };
        assert!(matches!(
            no_integer.validate(),
            Err(ConfigError::InvalidBounds { gene: "fold_count", .. })
        ));
    }

    #[test]
    fn test_serialization() {
        let json = r#"{ "wing_span": [10.0, 20.0] }"#;
        let parsed: GenomeConstraints = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.wing_span, (10.0, 20.0));
        assert_eq!(parsed.body_length, (10.0, 35.0));
    }
}
