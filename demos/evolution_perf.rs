//! Quick evolution performance test

use sigma_paperplane::{
    GeneticOptimizer,
    schema::{EvaluationConfig, Objective, OptimizerConfig, SelectionMethod, SimulatorConfig},
};
use std::time::Instant;

fn main() {
    println!("=== Evolution Performance Test ===\n");

    // Coarser steps trade accuracy for throughput
    for dt in [0.002, 0.005, 0.01] {
        println!("Time step: {} s", dt);

        let config = OptimizerConfig {
            population_size: 20,
            mutation_rate: 0.2,
            mutation_strength: 0.15,
            crossover_rate: 0.8,
            elite_count: 2,
            selection: SelectionMethod::Tournament { size: 3 },
            evaluation: EvaluationConfig {
                simulator: SimulatorConfig {
                    dt,
                    ..Default::default()
                },
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        };

        let optimizer = match GeneticOptimizer::new(config) {
            Ok(optimizer) => optimizer,
            Err(e) => {
                eprintln!("Invalid configuration: {}", e);
                std::process::exit(1);
            }
        };

        let start = Instant::now();
        let result = match optimizer.optimize(10, Objective::Balanced) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Optimization failed: {}", e);
                std::process::exit(1);
            }
        };
        let elapsed = start.elapsed();

        let total_evals = result.stats.total_evaluations;
        let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

        println!("  Generations:    {}", result.stats.generations);
        println!("  Evaluations:    {}", total_evals);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", evals_per_sec);
        println!("  Best fitness:   {:.4}", result.best.fitness());
        println!();
    }

    println!("=== Scalability Test (dt = 0.005 s) ===\n");

    for pop_size in [10, 20, 40, 80] {
        let config = OptimizerConfig {
            population_size: pop_size,
            elite_count: 2,
            evaluation: EvaluationConfig {
                simulator: SimulatorConfig {
                    dt: 0.005,
                    ..Default::default()
                },
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        };

        let Ok(optimizer) = GeneticOptimizer::new(config) else {
            eprintln!("Invalid configuration for population {}", pop_size);
            continue;
        };

        let start = Instant::now();
        let Ok(result) = optimizer.optimize(5, Objective::Distance) else {
            eprintln!("Optimization failed for population {}", pop_size);
            continue;
        };
        let elapsed = start.elapsed();

        let total_evals = result.stats.total_evaluations;
        let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

        println!(
            "Population {}: {} evals in {:.2}s ({:.1} evals/sec)",
            pop_size,
            total_evals,
            elapsed.as_secs_f64(),
            evals_per_sec
        );
    }
}
