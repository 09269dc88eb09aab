//! Command line interface for captiond.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// captiond - batch image captioning service.
#[derive(Parser, Debug)]
#[command(name = "captiond")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "captiond.toml")]
    pub config: PathBuf,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Starts the HTTP server.
    Serve {
        /// Listen address (overrides server.host).
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides server.port).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Captions one batch of image URLs and prints the JSON response.
    Caption {
        /// Image URLs.
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Writes a default configuration file.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Shows the effective configuration.
    Config,

    /// Shows version.
    Version,
}

/// Log filter directives for `level`: the service itself plus the HTTP
/// request traces emitted by `tower_http`.
pub fn log_directives(level: &str) -> Vec<String> {
    ["captiond", "tower_http"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect()
}
