use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod scenario;

use commands::run::Format;

#[derive(Parser)]
#[command(
    name = "taskgrid",
    about = "TaskGrid: threshold-balanced task scheduling simulator",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Log filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info,taskgrid=info")]
    log_level: String,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file against a fresh scheduler.
    ///
    /// Prints the result code of every step followed by the final task
    /// status. Exits non-zero if any step's `expect` code is not met.
    Run {
        /// Path to the scenario TOML file
        path: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Parse and validate a scenario file without running it
    Check {
        path: PathBuf,
    },
    /// Print an example scenario file
    Scaffold,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Run { path, format } => commands::run::run(&path, format),
        Commands::Check { path } => commands::run::check(&path),
        Commands::Scaffold => commands::scaffold::scaffold(),
    }
}

fn init_tracing(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
