pub mod light;
pub mod output;
pub mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_BASE_URL, DEFAULT_PLUGIN};

#[derive(Parser)]
#[command(
    name = "chamberctl",
    version,
    about = "Chamber lighting CLI - cycle the OctoPrint chamber lighting mode and follow the light status"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as human-readable table instead of JSON
    #[arg(short = 't', long = "table", global = true)]
    pub table: bool,

    /// Verbose output (log HTTP requests/responses)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// OctoPrint base URL
    #[arg(long, env = "CHAMBER_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub url: String,

    /// Plugin identifier used in the API path
    #[arg(long, env = "CHAMBER_PLUGIN", default_value = DEFAULT_PLUGIN, global = true)]
    pub plugin: String,

    /// OctoPrint API key
    #[arg(long, env = "OCTOPRINT_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Settings JSON file to read the persisted mode from
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Use this mode index (0-3) instead of reading settings
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3), global = true)]
    pub mode: Option<u8>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 15, global = true)]
    pub timeout_secs: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether the chamber lights are on
    Status,

    /// Advance the lighting mode (Manual -> Auto -> On -> Off -> Manual)
    Next,

    /// List the lighting modes
    Modes,

    /// Show the resolved plugin settings
    Settings,

    /// Show the widget and keep it in sync; each line on stdin advances the mode, `q` quits
    Watch {
        /// Delay between status polls in milliseconds
        #[arg(long, default_value_t = 1000)]
        poll_interval_ms: u64,

        /// Upper bound for the retry delay after failed polls in milliseconds
        #[arg(long, default_value_t = 30000)]
        max_backoff_ms: u64,
    },
}
