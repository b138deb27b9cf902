use clap::Parser;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use evolver::cli::commands::{run_evolution, RunOptions};
use evolver::config::evolver::EvolverConfig;

#[derive(Parser)]
#[command(name = "evolve")]
#[command(about = "Applies sector evolution rules to a world map snapshot and writes the changed tiles")]
#[command(version)]
struct Cli {
    /// Radius used by the near-sector rules
    nearby_distance: u32,

    /// Day of the year, 0-359
    #[arg(value_parser = clap::value_parser!(u32).range(0..=359))]
    day_of_year: u32,

    /// Search radius for fresh water around thirsty crops (0 disables)
    water_crop_distance: u32,

    /// Process to signal once the evolution file is published
    notify_pid: Option<i32>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "evolver.toml")]
    config: String,

    /// Fixed random seed instead of the clock
    #[arg(long)]
    seed: Option<u64>,
}

fn init_tracing(config: &EvolverConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match EvolverConfig::load_or_default(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let opts = RunOptions {
        nearby_distance: cli.nearby_distance,
        day_of_year: cli.day_of_year,
        water_crop_distance: cli.water_crop_distance,
        notify_pid: cli.notify_pid,
        seed: cli.seed,
    };

    match run_evolution(&config, &opts) {
        Ok(outcome) => {
            if let Some(path) = outcome.diff_path {
                info!(
                    path = %path.display(),
                    seed = outcome.seed,
                    notified = outcome.notified,
                    "Evolution file published"
                );
            }
        }
        Err(e) => {
            error!(error = %e, "Evolution run failed");
            std::process::exit(1);
        }
    }
}
