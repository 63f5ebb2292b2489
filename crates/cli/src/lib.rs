use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "marketsync")]
#[command(about = "MarketSync - incremental market data collection service")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the collector: sync loop, streaming client, health endpoint
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = "marketsync.yaml")]
        config: PathBuf,

        /// Treat all markets as open regardless of the calendar
        #[arg(long)]
        force_open: bool,

        /// Override the health endpoint port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single sync pass and exit
    Sync {
        /// Path to the configuration file
        #[arg(short, long, default_value = "marketsync.yaml")]
        config: PathBuf,

        /// Treat all markets as open regardless of the calendar
        #[arg(long)]
        force_open: bool,

        /// Symbols to sync, overriding the configured universe
        #[arg(short, long)]
        symbols: Vec<String>,
    },

    /// Run only the streaming client
    Stream {
        /// Path to the configuration file
        #[arg(short, long, default_value = "marketsync.yaml")]
        config: PathBuf,
    },

    /// Validate configuration without starting the collector
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "marketsync.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "marketsync.yaml")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
