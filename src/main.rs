//! Sigma PaperPlane CLI - Optimize, test and fly paper-plane designs.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use nalgebra::Vector3;

use sigma_paperplane::{
    compute::{
        FlightSimulator,
        evolution::{GeneticOptimizer, GenomeRng, OptimizationSummary, classify_genome},
        generate_geometry,
    },
    schema::{
        Archetype, FlightResult, Genome, GenomeConstraints, InitialConditions, Objective,
        OptimizerConfig, SimulatorConfig, WindCondition,
    },
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "sigma-paperplane",
    version,
    about = "Evolve and simulate paper airplane designs"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the genetic optimizer.
    Optimize {
        /// Number of generations.
        #[arg(short, long, default_value_t = 50)]
        generations: usize,
        /// Population size (overrides the config file).
        #[arg(short, long)]
        population: Option<usize>,
        /// distance, stability or balanced.
        #[arg(short, long, default_value_t = Objective::Balanced)]
        objective: Objective,
        /// Random seed (overrides the config file).
        #[arg(short, long)]
        seed: Option<u64>,
        /// Optimizer configuration as JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory for result.json and summary.json.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fly every archetype across the standard wind battery.
    Test {
        /// Turbulence seed.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
    },
    /// Fly a single archetype once.
    Simulate {
        /// Archetype to fly.
        #[arg(short, long, default_value_t = Archetype::Classic)]
        archetype: Archetype,
        /// Wind along the launch direction (m/s); negative is a headwind.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        tailwind: f64,
        /// Wind across the launch direction (m/s).
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        crosswind: f64,
        /// Gust intensity (m/s, one standard deviation).
        #[arg(long, default_value_t = 0.0)]
        turbulence: f64,
        /// Turbulence seed.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// Write the sampled trajectory as JSON.
        #[arg(long)]
        trajectory: Option<PathBuf>,
    },
    /// Print the default optimizer configuration as JSON.
    ExampleConfig,
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Some(Command::Optimize {
            generations,
            population,
            objective,
            seed,
            config,
            output,
        }) => run_optimization(
            generations,
            population,
            objective,
            seed,
            config.as_deref(),
            output.as_deref(),
        ),
        Some(Command::Test { seed }) => run_testing(seed),
        Some(Command::Simulate {
            archetype,
            tailwind,
            crosswind,
            turbulence,
            seed,
            trajectory,
        }) => run_simulation(
            archetype,
            tailwind,
            crosswind,
            turbulence,
            seed,
            trajectory.as_deref(),
        ),
        Some(Command::ExampleConfig) => print_example_config(),
        None => demo(),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_optimization(
    generations: usize,
    population: Option<usize>,
    objective: Objective,
    seed: Option<u64>,
    config_path: Option<&Path>,
    output: Option<&Path>,
) -> CliResult {
    let mut config = match config_path {
        Some(path) => OptimizerConfig::from_json_file(path)?,
        None => OptimizerConfig::default(),
    };
    if let Some(size) = population {
        config.population_size = size;
    }
    if seed.is_some() {
        config.random_seed = seed;
    }

    println!("Sigma PaperPlane Optimization");
    println!("=============================");
    println!("Objective:   {}", objective);
    println!("Generations: {}", generations);
    println!("Population:  {}", config.population_size);
    println!(
        "Conditions:  {}",
        config
            .evaluation
            .conditions
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let optimizer = GeneticOptimizer::new(config)?;
    let start = Instant::now();
    let result = optimizer.optimize_with_callback(generations, objective, |stats| {
        if (stats.generation + 1) % (generations / 10).max(1) == 0 {
            println!(
                "  Generation {}/{}: best={:.4}, mean={:.4}, diversity={:.3}, {:.1}s",
                stats.generation + 1,
                generations,
                stats.best_fitness,
                stats.mean_fitness,
                stats.diversity,
                start.elapsed().as_secs_f32()
            );
        }
    })?;

    let summary = optimizer.summary(&result);
    println!();
    print_summary(&summary);
    println!(
        "Evaluations: {} ({:.1}/s), seed {}",
        result.stats.total_evaluations, result.stats.evaluations_per_second, result.stats.random_seed
    );

    if let Some(dir) = output {
        fs::create_dir_all(dir)?;
        fs::write(
            dir.join("result.json"),
            serde_json::to_string_pretty(&result)?,
        )?;
        fs::write(
            dir.join("summary.json"),
            serde_json::to_string_pretty(&summary)?,
        )?;
        println!("Wrote result.json and summary.json to {}", dir.display());
    }

    Ok(())
}

fn print_summary(summary: &OptimizationSummary) {
    println!("Best plane type: {}", summary.best_plane_type);
    println!("Final fitness:   {:.3}", summary.best_fitness);
    println!(
        "Improvement:     {:+.3} over {} generations",
        summary.fitness_improvement, summary.generations
    );
    println!("Key parameters:");
    println!("  - Wing span:           {:.1} cm", summary.key_parameters.wing_span);
    println!("  - Body length:         {:.1} cm", summary.key_parameters.body_length);
    println!("  - Nose angle:          {:.1} deg", summary.key_parameters.nose_angle);
    println!(
        "  - Weight distribution: {:.1}%",
        summary.key_parameters.weight_distribution
    );
    println!("Performance by condition:");
    for perf in &summary.performance_by_condition {
        println!(
            "  {:<12} distance={:.2} m, time={:.2} s, stability={:.3}{}",
            perf.condition,
            perf.flight_distance,
            perf.flight_time,
            perf.stability,
            if perf.success { "" } else { " (failed)" }
        );
    }
}

fn run_testing(seed: u64) -> CliResult {
    let constraints = GenomeConstraints::default();
    let conditions = WindCondition::standard_battery();
    let simulator = FlightSimulator::new(SimulatorConfig::default())?;

    println!("Archetype comparison (seed {})", seed);
    print!("{:<14}", "type");
    for condition in &conditions {
        print!(" {:>22}", condition.name);
    }
    println!();

    for archetype in Archetype::ALL {
        let geometry = generate_geometry(&archetype.genome(&constraints));
        let results = simulator.test_multiple_conditions(&geometry, &conditions, seed);
        print!("{:<14}", archetype.name());
        for result in &results {
            print!(" {:>22}", format_cell(result));
        }
        println!();
    }

    Ok(())
}

fn format_cell(result: &FlightResult) -> String {
    format!(
        "{:.2} m / {:.2}{}",
        result.flight_distance,
        result.stability_metrics.overall_stability,
        if result.success { "" } else { "!" }
    )
}

fn run_simulation(
    archetype: Archetype,
    tailwind: f64,
    crosswind: f64,
    turbulence: f64,
    seed: u64,
    trajectory: Option<&Path>,
) -> CliResult {
    let wind = WindCondition {
        name: "custom".to_string(),
        velocity: Vector3::new(tailwind, crosswind, 0.0),
        gradient: 0.0,
        turbulence,
    };
    wind.validate()?;

    let config = SimulatorConfig {
        record_trajectory: trajectory.is_some(),
        ..Default::default()
    };
    let genome = archetype.genome(&GenomeConstraints::default());
    let geometry = generate_geometry(&genome);
    let simulator = FlightSimulator::new(config)?;
    let result = simulator.simulate_flight(&geometry, &InitialConditions::default(), &wind, seed);

    println!("{} plane", archetype);
    println!(
        "  Wing area {:.1} cm², aspect ratio {:.2}, mass {:.2} g, static margin {:.2}",
        geometry.wing_area * 1.0e4,
        geometry.aspect_ratio,
        geometry.mass * 1.0e3,
        geometry.static_margin
    );
    println!(
        "  Wing loading {:.2} N/m²",
        geometry.wing_loading(simulator.config().gravity)
    );
    print_flight(&result);

    if let Some(path) = trajectory {
        fs::write(path, serde_json::to_string_pretty(&result.trajectory)?)?;
        println!("Wrote {} trajectory points to {}", result.trajectory.len(), path.display());
    }

    Ok(())
}

fn print_flight(result: &FlightResult) {
    println!(
        "  Distance {:.2} m, time {:.2} s, max altitude {:.2} m",
        result.flight_distance, result.flight_time, result.max_altitude
    );
    println!(
        "  Stability {:.3} ({:?}, {})",
        result.stability_metrics.overall_stability,
        result.termination,
        if result.success { "success" } else { "failed" }
    );
}

fn print_example_config() -> CliResult {
    let config = OptimizerConfig::default();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn demo() -> CliResult {
    println!("Sigma PaperPlane demo (run with --help for commands)");
    println!();

    let constraints = GenomeConstraints::default();
    let genome: Genome = GenomeRng::random().random_genome(&constraints);
    let (nearest, distance) = classify_genome(&genome, &constraints);

    println!("Random design (closest to {}, distance {:.2}):", nearest, distance);
    for (gene, value) in sigma_paperplane::schema::Gene::ALL.iter().zip(genome.values()) {
        println!("  {:<20} {:>7.2}", gene.name(), value);
    }

    let simulator = FlightSimulator::default();
    let result = simulator.simulate_flight(
        &generate_geometry(&genome),
        &InitialConditions::default(),
        &WindCondition::calm(),
        0,
    );
    println!("Calm-air flight:");
    print_flight(&result);
    Ok(())
}
