//! CLI interface for tick-relay
//!
//! Provides subcommands for:
//! - `run`: Start the transfer pipeline
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tick-relay")]
#[command(about = "Batching transfer pipeline from a Redis trade stream into RedisTimeSeries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the transfer pipeline
    Run(RunArgs),
    /// Show the effective configuration
    Config,
}
