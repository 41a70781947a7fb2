pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "montage")]
#[command(about = "Assemble pages from concurrently fetched fragments", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/montage/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of fragments fetched at the same time (overrides the config)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the configured page
    Fetch {
        /// Page parameter as key=value, repeatable
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,

        /// Print contents and statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configured page plan
    Check,
}
