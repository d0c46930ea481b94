//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, archetype seeding, crossover, and mutation.

use crate::schema::{Archetype, CrossoverMethod, GENE_COUNT, Gene, Genome, GenomeConstraints};
use rand::prelude::*;

/// Relative jitter applied to archetype seeds in the initial population.
pub const ARCHETYPE_JITTER: f64 = 0.05;

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate a random genome uniformly within constraints.
    pub fn random_genome(&mut self, constraints: &GenomeConstraints) -> Genome {
        let values = Gene::ALL.map(|gene| self.uniform(constraints.bounds(gene)));
        Genome::from_values(values, constraints)
    }

    /// Archetype preset with independent Gaussian jitter on every gene.
    pub fn from_archetype(
        &mut self,
        archetype: Archetype,
        constraints: &GenomeConstraints,
        jitter: f64,
    ) -> Genome {
        let base = archetype.genome(constraints).values();
        let mut values = [0.0; GENE_COUNT];
        for gene in Gene::ALL {
            values[gene.index()] =
                self.gaussian_mutate(base[gene.index()], jitter, gene, constraints);
        }
        Genome::from_values(values, constraints)
    }

    /// Uniform random in bounds.
    fn uniform(&mut self, bounds: (f64, f64)) -> f64 {
        if bounds.1 > bounds.0 {
            self.rng.gen_range(bounds.0..=bounds.1)
        } else {
            bounds.0
        }
    }

    /// Gaussian mutation: add noise scaled by the gene's range, then clamp.
    pub fn gaussian_mutate(
        &mut self,
        value: f64,
        strength: f64,
        gene: Gene,
        constraints: &GenomeConstraints,
    ) -> f64 {
        let noise: f64 = self.rng.sample(rand_distr::StandardNormal);
        let mutated = value + noise * strength * constraints.range(gene);
        constraints.clamp(gene, mutated)
    }

    /// Perform crossover between two genomes.
    pub fn crossover(
        &mut self,
        parent1: &Genome,
        parent2: &Genome,
        method: CrossoverMethod,
        constraints: &GenomeConstraints,
    ) -> Genome {
        let (a, b) = (parent1.values(), parent2.values());
        let mut child = [0.0; GENE_COUNT];

        match method {
            CrossoverMethod::Blend => {
                let t = self.rng.r#gen::<f64>();
                for i in 0..GENE_COUNT {
                    child[i] = blend(a[i], b[i], t);
                }
            }
            CrossoverMethod::Uniform => {
                for i in 0..GENE_COUNT {
                    child[i] = if self.rng.gen_bool(0.5) { a[i] } else { b[i] };
                }
            }
        }

        Genome::from_values(child, constraints)
    }

    /// Mutate a genome: each gene independently with probability `rate`.
    pub fn mutate(
        &mut self,
        genome: &Genome,
        rate: f64,
        strength: f64,
        constraints: &GenomeConstraints,
    ) -> Genome {
        let mut values = genome.values();
        for gene in Gene::ALL {
            if self.rng.r#gen::<f64>() < rate {
                values[gene.index()] =
                    self.gaussian_mutate(values[gene.index()], strength, gene, constraints);
            }
        }
        Genome::from_values(values, constraints)
    }

    /// Bernoulli trial with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.r#gen::<f64>() < p
    }

    /// Uniform in [0, 1).
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen()
    }

    /// Uniform index in `0..len`.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}

/// Linear blend between two values.
fn blend(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Euclidean distance between two genomes with every gene normalized by its
/// range. Genes with an empty range contribute nothing.
pub fn genome_distance(g1: &Genome, g2: &Genome, constraints: &GenomeConstraints) -> f64 {
    Gene::ALL
        .iter()
        .map(|&gene| {
            let range = constraints.range(gene);
            if range > 0.0 {
                ((g1.get(gene) - g2.get(gene)) / range).powi(2)
            } else {
                0.0
            }
        })
        .sum::<f64>()
        .sqrt()
}
