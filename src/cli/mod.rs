//! CLI interface for chainpulse
//!
//! Provides subcommands for:
//! - `run`: Run one feature (or all features) once
//! - `list`: List registered features
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chainpulse")]
#[command(about = "Market-data polling and chat alert pipeline")]
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
    /// Run one feature, or all features when none is named
    Run(RunArgs),
    /// List registered features
    List,
    /// Show the effective configuration
    Config,
}
