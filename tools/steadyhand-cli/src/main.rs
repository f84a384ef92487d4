//! Steadyhand CLI: live tremor filtering, offline replay, and system checks.
//!
//! Usage:
//!   steadyhand run [OPTIONS]        Filter the live pointer until Ctrl+C or ESC
//!   steadyhand replay <EVENTS>      Run a recorded event stream through the filter
//!   steadyhand check                Check device permissions
//!   steadyhand config [--write]     Show the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use steadyhand_common::config::AppConfig;

mod commands;

use commands::PolicyArg;

#[derive(Parser)]
#[command(
    name = "steadyhand",
    about = "Tremor filtering for pointer input",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the XDG config path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the live pointer until Ctrl+C or ESC
    Run {
        /// Motion policy to use instead of the configured one
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Let every press through regardless of recent motion
        #[arg(long)]
        no_click_gate: bool,

        /// Write one JSONL record per filter decision
        #[arg(long)]
        decision_log: Option<PathBuf>,
    },

    /// Run a recorded JSONL event stream through the filter
    Replay {
        /// Path to the recorded events
        events: PathBuf,

        /// Motion policy to use instead of the configured one
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Let every press through regardless of recent motion
        #[arg(long)]
        no_click_gate: bool,

        /// Write one JSONL record per filter decision
        #[arg(long)]
        decision_log: Option<PathBuf>,
    },

    /// Check device permissions
    Check,

    /// Print the effective configuration
    Config {
        /// Save the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    steadyhand_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Run {
            policy,
            no_click_gate,
            decision_log,
        } => {
            commands::apply_overrides(&mut config, policy, no_click_gate, decision_log);
            commands::run::run(config).await
        }
        Commands::Replay {
            events,
            policy,
            no_click_gate,
            decision_log,
        } => {
            commands::apply_overrides(&mut config, policy, no_click_gate, decision_log);
            commands::replay::run(config, events).await
        }
        Commands::Check => commands::check::run(&config),
        Commands::Config { write } => commands::config::run(&config, cli.config, write),
    }
}
