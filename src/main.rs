//! Crisis Sim - command line entry point
//!
//! Loads a scenario (or the built-in two-rival default), runs it and
//! prints a summary. The full output can be written as JSON.

use std::path::PathBuf;

use clap::Parser;
use crisis_sim::core::error::Result;
use crisis_sim::{simulate, Scenario};
use tracing_subscriber::EnvFilter;

/// Run a strategic escalation scenario
#[derive(Parser, Debug)]
#[command(name = "crisis-sim")]
#[command(about = "Simulate interacting strategic agents and their crises")]
struct Args {
    /// Scenario TOML file (defaults to two agents in mutual rivalry)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the number of steps
    #[arg(long)]
    steps: Option<u64>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Draw a fresh seed instead of the configured one
    #[arg(long, conflicts_with = "seed")]
    random_seed: bool,

    /// Write the full output as JSON to this path
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Output format for stdout: text or json
    #[arg(long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crisis_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut scenario = match &args.scenario {
        Some(path) => {
            tracing::info!("Loading scenario from {}", path.display());
            Scenario::load(path)?
        }
        None => Scenario::default(),
    };
    if let Some(steps) = args.steps {
        scenario.run.steps = steps;
    }
    if let Some(seed) = args.seed {
        scenario.run.seed = Some(seed);
    }
    if args.random_seed {
        scenario.run.seed = None;
    }

    let output = simulate(&scenario)?;

    match args.format.as_str() {
        "json" => println!("{}", output.to_json()?),
        _ => println!("{}", output.summary()),
    }

    if let Some(path) = &args.output {
        output.write_json(path)?;
        tracing::info!("Full output written to {}", path.display());
    }

    Ok(())
}
