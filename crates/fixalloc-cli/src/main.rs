//! fixalloc CLI
//!
//! Replays partition allocation scenarios and reports the resulting memory layout.

mod commands;

use clap::{Parser, Subcommand};
use fixalloc_core::{FitPolicy, LogFormat, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// fixalloc - fixed-partition memory allocation simulator
#[derive(Parser, Debug)]
#[command(name = "fixalloc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Simulator configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scenario and print the final partitions and jobs
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Use this policy for every allocation step
        #[arg(long)]
        policy: Option<FitPolicy>,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a scenario once per policy and compare the results
    Compare {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available placement policies
    Policies,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Run {
            scenario,
            policy,
            json,
        } => {
            commands::run(&config, &scenario, policy, json)?;
        }
        Commands::Compare { scenario, json } => {
            commands::compare(&config, &scenario, json)?;
        }
        Commands::Policies => {
            commands::policies(&config);
        }
    }

    Ok(())
}

/// Install the global subscriber; RUST_LOG takes precedence over the config file
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
    };
}
