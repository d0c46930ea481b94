//! Genetic algorithm over plane genomes.

use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::schema::{
    Archetype, ConditionPerformance, GenerationStats, Genome, Individual, Objective,
    OptimizationResult, OptimizerConfig, OptimizerError, Origin, RunStats, SelectionMethod,
};

use super::fitness::FitnessEvaluator;
use super::genome::{ARCHETYPE_JITTER, GenomeRng, genome_distance};
use super::summary::{OptimizationSummary, get_optimization_summary};

/// A genome waiting to be evaluated.
struct Pending {
    genome: Genome,
    parents: Vec<u64>,
    origin: Origin,
}

/// Mutable bookkeeping for one run.
struct RunState<'a> {
    rng: GenomeRng,
    evaluator: FitnessEvaluator,
    objective: Objective,
    generation: usize,
    next_id: u64,
    evaluations: u64,
    pool: Option<&'a rayon::ThreadPool>,
}

/// Genetic optimizer for paper-plane genomes.
///
/// Configuration is validated once in [`GeneticOptimizer::new`]; a run can
/// only fail on its own arguments.
pub struct GeneticOptimizer {
    config: OptimizerConfig,
    pool: Option<rayon::ThreadPool>,
}

impl GeneticOptimizer {
    /// Create an optimizer, validating the configuration.
    pub fn new(config: OptimizerConfig) -> Result<Self, OptimizerError> {
        config.validate()?;

        let pool = if config.parallel_workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel_workers)
                .build()
                .map_err(|e| OptimizerError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run the genetic algorithm (blocking).
    pub fn optimize(
        &self,
        generations: usize,
        objective: Objective,
    ) -> Result<OptimizationResult, OptimizerError> {
        self.optimize_with_callback(generations, objective, |_| {})
    }

    /// Run the genetic algorithm, reporting each generation's statistics.
    pub fn optimize_with_callback<F>(
        &self,
        generations: usize,
        objective: Objective,
        mut callback: F,
    ) -> Result<OptimizationResult, OptimizerError>
    where
        F: FnMut(&GenerationStats),
    {
        if generations == 0 {
            return Err(OptimizerError::NoGenerations);
        }

        let start_time = Instant::now();
        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let mut rng = GenomeRng::new(seed);
        let evaluator = FitnessEvaluator::new(&self.config.evaluation, rng.next_seed())?;

        info!(
            "Starting optimization: {} generations, population {}, objective {}, seed {}",
            generations, self.config.population_size, objective, seed
        );

        let mut run = RunState {
            rng,
            evaluator,
            objective,
            generation: 0,
            next_id: 0,
            evaluations: 0,
            pool: self.pool.as_ref(),
        };

        let initial = self.initial_population(&mut run.rng);
        let mut population = self.evaluate(&mut run, initial);

        let mut history = Vec::with_capacity(generations);
        let mut best: Option<(Individual, usize)> = None;

        for generation in 0..generations {
            if generation > 0 {
                run.generation = generation;
                population = self.next_generation(&population, &mut run);
            }
            population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

            let stats = self.generation_stats(generation, &population);
            info!(
                "Generation {}: best {:.4}, mean {:.4}, diversity {:.3}, success {:.0}%",
                generation,
                stats.best_fitness,
                stats.mean_fitness,
                stats.diversity,
                stats.success_rate * 100.0
            );

            let improved = match &best {
                Some((current, _)) => population[0].fitness() > current.fitness(),
                None => true,
            };
            if improved {
                best = Some((population[0].clone(), generation));
            }

            callback(&stats);
            history.push(stats);
        }

        let (best, best_generation) = match best {
            Some(found) => found,
            None => return Err(OptimizerError::NoGenerations),
        };

        let performance_by_condition = self
            .config
            .evaluation
            .conditions
            .iter()
            .zip(&best.record.trials)
            .map(|(condition, result)| ConditionPerformance {
                condition: condition.clone(),
                result: result.clone(),
            })
            .collect();

        let elapsed = start_time.elapsed().as_secs_f64();
        info!(
            "Optimization finished in {:.2} s: best fitness {:.4} (generation {})",
            elapsed,
            best.fitness(),
            best_generation
        );

        Ok(OptimizationResult {
            objective,
            best,
            best_generation,
            performance_by_condition,
            history,
            final_population: population,
            stats: RunStats {
                generations,
                population_size: self.config.population_size,
                total_evaluations: run.evaluations,
                elapsed_seconds: elapsed,
                evaluations_per_second: run.evaluations as f64 / elapsed.max(1e-9),
                random_seed: seed,
            },
        })
    }

    /// Human-readable digest of a finished run.
    pub fn summary(&self, result: &OptimizationResult) -> OptimizationSummary {
        get_optimization_summary(result, &self.config.constraints)
    }

    /// Jittered archetypes first (when enabled), then uniform random genomes.
    fn initial_population(&self, rng: &mut GenomeRng) -> Vec<Pending> {
        let size = self.config.population_size;
        let constraints = &self.config.constraints;
        let mut pending = Vec::with_capacity(size);

        if self.config.seed_archetypes {
            for archetype in Archetype::ALL.into_iter().take(size) {
                pending.push(Pending {
                    genome: rng.from_archetype(archetype, constraints, ARCHETYPE_JITTER),
                    parents: Vec::new(),
                    origin: Origin::Archetype(archetype),
                });
            }
        }
        while pending.len() < size {
            pending.push(Pending {
                genome: rng.random_genome(constraints),
                parents: Vec::new(),
                origin: Origin::Random,
            });
        }

        debug!(
            "Initialized population: {} archetype seeds, {} random",
            pending
                .iter()
                .filter(|p| matches!(p.origin, Origin::Archetype(_)))
                .count(),
            pending
                .iter()
                .filter(|p| p.origin == Origin::Random)
                .count()
        );
        pending
    }

    /// Evaluate pending genomes in parallel; output order matches input order.
    fn evaluate(&self, run: &mut RunState<'_>, pending: Vec<Pending>) -> Vec<Individual> {
        let first_id = run.next_id;
        run.next_id += pending.len() as u64;
        run.evaluations += pending.len() as u64;

        let evaluator = &run.evaluator;
        let objective = run.objective;
        let generation = run.generation;

        let evaluate_all = || {
            pending
                .into_par_iter()
                .enumerate()
                .map(|(i, p)| Individual {
                    id: first_id + i as u64,
                    record: evaluator.evaluate(&p.genome, objective),
                    genome: p.genome,
                    generation,
                    parents: p.parents,
                    origin: p.origin,
                })
                .collect::<Vec<_>>()
        };

        match run.pool {
            Some(pool) => pool.install(evaluate_all),
            None => evaluate_all(),
        }
    }

    /// Build the next population from a fully sorted previous one.
    fn next_generation(&self, population: &[Individual], run: &mut RunState<'_>) -> Vec<Individual> {
        let size = self.config.population_size;
        let elite_count = self.config.elite_count.min(population.len());
        let constraints = &self.config.constraints;

        let mut offspring = Vec::with_capacity(size - elite_count);
        while elite_count + offspring.len() < size {
            let idx1 = self.select_index(population, &mut run.rng);
            let idx2 = self.select_index(population, &mut run.rng);
            let parent1 = &population[idx1];
            let parent2 = &population[idx2];

            let (child, parents) = if run.rng.chance(self.config.crossover_rate) {
                (
                    run.rng.crossover(
                        &parent1.genome,
                        &parent2.genome,
                        self.config.crossover,
                        constraints,
                    ),
                    vec![parent1.id, parent2.id],
                )
            } else {
                (parent1.genome, vec![parent1.id])
            };

            let child = run.rng.mutate(
                &child,
                self.config.mutation_rate,
                self.config.mutation_strength,
                constraints,
            );

            offspring.push(Pending {
                genome: child,
                parents,
                origin: Origin::Offspring,
            });
        }

        let mut next = population[..elite_count].to_vec();
        next.extend(self.evaluate(run, offspring));
        next
    }

    /// Select a parent index from a population sorted best-first.
    fn select_index(&self, population: &[Individual], rng: &mut GenomeRng) -> usize {
        let n = population.len();
        match &self.config.selection {
            SelectionMethod::Tournament { size } => {
                let mut best_idx = rng.index(n);
                for _ in 1..*size {
                    let idx = rng.index(n);
                    if population[idx].fitness() > population[best_idx].fitness() {
                        best_idx = idx;
                    }
                }
                best_idx
            }
            SelectionMethod::RankBased => {
                // Probability proportional to rank
                let total_rank = n * (n + 1) / 2;
                let mut target = rng.index(total_rank);
                for i in 0..n {
                    let rank = n - i;
                    if target < rank {
                        return i;
                    }
                    target -= rank;
                }
                0
            }
            SelectionMethod::RouletteWheel => {
                let total_fitness: f64 = population.iter().map(|c| c.fitness().max(0.0)).sum();
                if !(total_fitness > 0.0) {
                    return rng.index(n);
                }

                let target = rng.unit() * total_fitness;
                let mut cumulative = 0.0;
                for (i, candidate) in population.iter().enumerate() {
                    cumulative += candidate.fitness().max(0.0);
                    if cumulative > target {
                        return i;
                    }
                }
                n - 1
            }
        }
    }

    fn generation_stats(&self, generation: usize, population: &[Individual]) -> GenerationStats {
        let n = population.len() as f64;
        let best = &population[0];
        let mean_fitness = population.iter().map(Individual::fitness).sum::<f64>() / n;
        let variance = population
            .iter()
            .map(|c| (c.fitness() - mean_fitness).powi(2))
            .sum::<f64>()
            / n;

        GenerationStats {
            generation,
            best_fitness: best.fitness(),
            mean_fitness,
            worst_fitness: population[population.len() - 1].fitness(),
            fitness_std: variance.sqrt(),
            diversity: self.compute_diversity(population),
            success_rate: population.iter().map(|c| c.record.success_rate).sum::<f64>() / n,
            best_id: best.id,
            best_genome: best.genome,
            best_mean_distance: best.record.mean_distance,
        }
    }

    /// Mean pairwise normalized genome distance.
    fn compute_diversity(&self, population: &[Individual]) -> f64 {
        if population.len() < 2 {
            return 0.0;
        }

        let mut total_distance = 0.0;
        let mut count = 0;

        for i in 0..population.len() {
            for j in (i + 1)..population.len() {
                total_distance += genome_distance(
                    &population[i].genome,
                    &population[j].genome,
                    &self.config.constraints,
                );
                count += 1;
            }
        }

        total_distance / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CrossoverMethod, EvaluationConfig, SimulatorConfig};

    /// Coarse simulator settings so tests stay quick.
    fn quick_config(population_size: usize, elite_count: usize) -> OptimizerConfig {
        OptimizerConfig {
            population_size,
            elite_count,
            random_seed: Some(42),
            evaluation: EvaluationConfig {
                simulator: SimulatorConfig {
                    dt: 0.005,
                    max_time: 5.0,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_optimizer_creation_validates() {
        assert!(GeneticOptimizer::new(quick_config(10, 2)).is_ok());
        assert!(matches!(
            GeneticOptimizer::new(quick_config(3, 2)),
            Err(OptimizerError::PopulationTooSmall { .. })
        ));
    }

    #[test]
    fn test_zero_generations_rejected() {
        let optimizer = GeneticOptimizer::new(quick_config(6, 1)).unwrap();
        assert!(matches!(
            optimizer.optimize(0, Objective::Distance),
            Err(OptimizerError::NoGenerations)
        ));
    }

    #[test]
    fn test_optimization_run() {
        let optimizer = GeneticOptimizer::new(quick_config(10, 2)).unwrap();
        let mut reported = Vec::new();
        let result = optimizer
            .optimize_with_callback(3, Objective::Balanced, |s| reported.push(s.generation))
            .unwrap();

        assert_eq!(reported, vec![0, 1, 2]);
        assert_eq!(result.history.len(), 3);
        assert_eq!(result.stats.generations, 3);
        assert_eq!(result.stats.random_seed, 42);
        assert_eq!(result.final_population.len(), 10);
        assert_eq!(
            result.performance_by_condition.len(),
            EvaluationConfig::default().conditions.len()
        );
        // Elites are not re-evaluated.
        assert_eq!(result.stats.total_evaluations, 10 + 2 * 8);
        assert!(
            result
                .final_population
                .windows(2)
                .all(|w| w[0].fitness() >= w[1].fitness())
        );
        assert!(
            result
                .history
                .iter()
                .all(|s| result.best.fitness() >= s.best_fitness)
        );
        let last = &result.history[2];
        assert_eq!(last.best_id, result.final_population[0].id);
        assert_eq!(
            last.best_mean_distance,
            result.final_population[0].record.mean_distance
        );
    }

    #[test]
    fn test_best_fitness_never_regresses() {
        let optimizer = GeneticOptimizer::new(quick_config(10, 2)).unwrap();
        let result = optimizer.optimize(5, Objective::Distance).unwrap();
        for pair in result.history.windows(2) {
            assert!(pair[1].best_fitness >= pair[0].best_fitness);
        }
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let config = OptimizerConfig {
            crossover: CrossoverMethod::Uniform,
            parallel_workers: 2,
            ..quick_config(8, 1)
        };
        let a = GeneticOptimizer::new(config.clone())
            .unwrap()
            .optimize(3, Objective::Stability)
            .unwrap();
        let b = GeneticOptimizer::new(config)
            .unwrap()
            .optimize(3, Objective::Stability)
            .unwrap();
        assert_eq!(a.best_genomes(), b.best_genomes());
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn test_elites_survive_unmodified() {
        let optimizer = GeneticOptimizer::new(quick_config(8, 3)).unwrap();
        let mut rng = GenomeRng::new(5);
        let evaluator =
            FitnessEvaluator::new(&optimizer.config.evaluation, rng.next_seed()).unwrap();
        let mut run = RunState {
            rng,
            evaluator,
            objective: Objective::Distance,
            generation: 0,
            next_id: 0,
            evaluations: 0,
            pool: None,
        };

        let initial = optimizer.initial_population(&mut run.rng);
        let mut population = optimizer.evaluate(&mut run, initial);
        population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        run.generation = 1;
        let next = optimizer.next_generation(&population, &mut run);
        assert_eq!(next.len(), 8);
        assert_eq!(&next[..3], &population[..3]);
        assert!(next[3..].iter().all(|c| c.generation == 1));
        assert!(next[3..].iter().all(|c| c.origin == Origin::Offspring));
        assert_eq!(run.evaluations, 8 + 5);
    }

    #[test]
    fn test_archetypes_seed_initial_population() {
        let optimizer = GeneticOptimizer::new(quick_config(7, 1)).unwrap();
        let mut rng = GenomeRng::new(1);
        let initial = optimizer.initial_population(&mut rng);
        assert_eq!(initial.len(), 7);
        for (pending, archetype) in initial.iter().zip(Archetype::ALL) {
            assert_eq!(pending.origin, Origin::Archetype(archetype));
        }
        assert!(initial[5..].iter().all(|p| p.origin == Origin::Random));
        assert!(
            initial
                .iter()
                .all(|p| p.genome.is_within(&optimizer.config.constraints))
        );
    }

    #[test]
    fn test_selection_methods_return_valid_indices() {
        let mut config = quick_config(6, 1);
        let optimizer = GeneticOptimizer::new(config.clone()).unwrap();
        let mut rng = GenomeRng::new(9);
        let evaluator = FitnessEvaluator::new(&config.evaluation, 0).unwrap();
        let mut run = RunState {
            rng: GenomeRng::new(2),
            evaluator,
            objective: Objective::Balanced,
            generation: 0,
            next_id: 0,
            evaluations: 0,
            pool: None,
        };
        let initial = optimizer.initial_population(&mut run.rng);
        let population = optimizer.evaluate(&mut run, initial);

        for selection in [
            SelectionMethod::Tournament { size: 3 },
            SelectionMethod::RankBased,
            SelectionMethod::RouletteWheel,
        ] {
            config.selection = selection;
            let optimizer = GeneticOptimizer::new(config.clone()).unwrap();
            for _ in 0..50 {
                assert!(optimizer.select_index(&population, &mut rng) < population.len());
            }
        }
    }
}
