//! CLI entry point for the nanofolio rebalancer.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use nanofolio::Strategy;
use nanofolio_rebalancer::config::{AdapterKind, Config, OutputFormat, Overrides};
use nanofolio_rebalancer::run::{self, Command as RunCommand};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Portfolio rebalancer for broker CSV exports")]
#[command(version)]
struct Cli {
    /// Path to a config TOML (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Assets export CSV
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Target allocation CSV
    #[arg(long, global = true)]
    allocation: Option<PathBuf>,

    /// Portfolio currency label
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Layout of the assets export
    #[arg(long, global = true, value_enum)]
    adapter: Option<AdapterKind>,

    /// Field delimiter of both input files
    #[arg(long, global = true)]
    delimiter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and validate both inputs
    Check,

    /// Show holdings joined with targets
    Summary,

    /// Compute the movements that bring the portfolio to its targets
    Rebalance {
        /// sell or no-sell
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Write the result to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let mut overrides = Overrides {
        assets: cli.assets,
        allocation: cli.allocation,
        currency: cli.currency,
        adapter: cli.adapter,
        delimiter: cli.delimiter,
        ..Overrides::default()
    };

    let command = match cli.command {
        Command::Check => RunCommand::Check,
        Command::Summary => RunCommand::Summary,
        Command::Rebalance {
            strategy,
            format,
            output,
        } => {
            overrides.strategy = strategy;
            overrides.format = format;
            RunCommand::Rebalance { output }
        }
    };

    let config = match Config::resolve(cli.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run::execute(&config, &command, &mut out) {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}
