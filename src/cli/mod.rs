//! CLI interface for ticker-dash
//!
//! Provides subcommands for:
//! - `run`: Stream the tracked pairs and print the metrics table
//! - `config`: Show the effective configuration

mod render;
mod run;

pub use render::render_board;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ticker-dash")]
#[command(about = "Real-time market data dashboard for a fixed set of trading pairs")]
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
    /// Stream the tracked pairs and print metrics on every recompute
    Run(RunArgs),
    /// Show configuration
    Config,
}
