//! fifoq CLI: run producer/consumer scenarios against one bounded queue.

use clap::{Parser, Subcommand};
use fifoq_core::ScenarioConfig;
use fifoq_exec::{init_tracing, Driver, LogSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fifoq")]
#[command(about = "Producers and consumers sharing one bounded blocking FIFO", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario (the built-in 3 producer / 4 consumer one by default)
    Run {
        /// Path to a scenario YAML file
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Queue capacity (overrides file and environment)
        #[arg(long)]
        capacity: Option<usize>,

        /// Stop all actors after this many milliseconds; runs until killed if omitted
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Print the final run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario YAML file
    Validate {
        /// Path to a scenario YAML file
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Show the resolved scenario without running it
    Explain {
        /// Path to a scenario YAML file
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            capacity,
            duration_ms,
            json,
        } => {
            init_tracing();
            if let Err(e) = run_scenario(scenario.as_ref(), capacity, duration_ms, json) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { scenario } => {
            if let Err(e) = validate_scenario(&scenario) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Scenario is valid");
        }
        Commands::Explain { scenario } => {
            if let Err(e) = explain_scenario(scenario.as_ref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn load_scenario(path: Option<&PathBuf>) -> Result<ScenarioConfig, fifoq_core::Error> {
    let mut config = match path {
        Some(path) => ScenarioConfig::from_yaml_file(path)?,
        None => ScenarioConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

fn run_scenario(
    path: Option<&PathBuf>,
    capacity: Option<usize>,
    duration_ms: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_scenario(path)?;
    if let Some(cap) = capacity {
        config.capacity = cap;
    }

    let driver = Driver::spawn(&config, Arc::new(LogSink))?;
    match duration_ms {
        Some(ms) => std::thread::sleep(Duration::from_millis(ms)),
        // Actors without max_items never stop; block here until killed.
        None => loop {
            std::thread::park();
        },
    }
    let report = driver.shutdown()?;

    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        println!("✓ Run finished");
        println!("  Duration: {}ms", report.duration_ms());
        println!("  Produced: {}", report.produced);
        println!("  Consumed: {}", report.consumed);
        println!("  Left in queue: {}", report.remaining);
        println!("  High water: {} / {}", report.queue.high_water, report.capacity);
    }
    Ok(())
}

fn validate_scenario(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = ScenarioConfig::from_yaml_file(path)?;
    config.validate()?;
    Ok(())
}

fn explain_scenario(path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_scenario(path)?;
    config.validate()?;

    println!("Scenario");
    println!("========");
    println!();
    println!("Queue capacity: {}", config.capacity);
    println!();
    println!("Producers ({}):", config.producers.len());
    for (i, p) in config.producers.iter().enumerate() {
        println!("  {}. {} - delay {}{}", i + 1, p.label, p.delay, limit(p.max_items));
    }
    println!();
    println!("Consumers ({}):", config.consumers.len());
    for (i, c) in config.consumers.iter().enumerate() {
        println!("  {}. {} - delay {}{}", i + 1, c.label, c.delay, limit(c.max_items));
    }

    Ok(())
}

fn limit(max_items: Option<u64>) -> String {
    max_items
        .map(|n| format!(", stops after {n}"))
        .unwrap_or_default()
}
