//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "autoclassify",
    version,
    author = "neur0map",
    about = "Rank candidate bug classifications for CI failure lines",
    long_about = "autoclassify reads failure-line contexts exported from a CI job, scores the \
                  candidate bugs for each line, hides unlikely candidates, and picks the default \
                  classification a sheriff would be offered."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/autoclassify/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a single failure line
    Classify {
        /// JSON file holding one failure-line context
        file: PathBuf,

        /// JSON file holding the line logged just before it
        #[arg(long, value_name = "FILE")]
        previous: Option<PathBuf>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,

        /// Include hidden options in the listing
        #[arg(short, long)]
        all: bool,
    },

    /// Classify every line of a job, in log order
    Batch {
        /// JSON file holding an array of failure-line contexts
        file: PathBuf,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Print the default configuration file path
    Path,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
