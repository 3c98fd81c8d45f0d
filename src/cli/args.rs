//! CLI argument definitions using clap
//!
//! Commands:
//! - nidx match --config <path> [--inserts] [--verbose]
//! - nidx stats --config <path>
//! - nidx export --config <path>
//! - nidx rebuild --config <path>
//! - nidx compact --config <path>
//! - nidx reset --config <path>
//! - nidx delete --config <path> --key <id>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::NameKey;

/// nidx - names index of scientific names
#[derive(Parser, Debug)]
#[command(name = "nidx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Match names read as JSON lines from stdin
    Match {
        /// Path to configuration file
        #[arg(long, default_value = "./nidx.json")]
        config: PathBuf,

        /// Insert names that are not yet indexed
        #[arg(long)]
        inserts: bool,

        /// Include alternative candidates in the output
        #[arg(long)]
        verbose: bool,
    },

    /// Print the index size and creation time
    Stats {
        /// Path to configuration file
        #[arg(long, default_value = "./nidx.json")]
        config: PathBuf,
    },

    /// Write every index name as a JSON line
    Export {
        /// Path to configuration file
        #[arg(long, default_value = "./nidx.json")]
        config: PathBuf,
    },

    /// Reload the index store from the mirror
    Rebuild {
        /// Path to configuration file
        #[arg(long, default_value = "./nidx.json")]
        config: PathBuf,
    },

    /// Compact the index store
    Compact {
        /// Path to configuration file
        #[arg(long, default_value = "./nidx.json")]
        config: PathBuf,
    },

    /// Remove every name from the index and the mirror
    Reset {
        /// Path to configuration file
        #[arg(long, default_value = "./nidx.json")]
        config: PathBuf,
    },

    /// Delete a name and, if canonical, all of its variants
    Delete {
        /// Path to configuration file
        #[arg(long, default_value = "./nidx.json")]
        config: PathBuf,

        /// Key of the name to delete
        #[arg(long)]
        key: NameKey,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
