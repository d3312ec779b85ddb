use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phishguard")]
#[command(
    author,
    version,
    about = "Classify URLs and text as phishing or legitimate"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Engine configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "PHISHGUARD_CONFIG",
        default_value = "phishguard.yaml"
    )]
    pub config: PathBuf,

    /// Override the heuristic decision threshold
    #[arg(short, long, global = true)]
    pub threshold: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan one input with every enabled model
    Scan {
        /// URL or text to classify
        input: String,
    },

    /// Score one input with a single configured model
    Model {
        /// Model id from the configuration
        id: String,

        /// URL or text to classify
        input: String,
    },

    /// Scan every line of a file concurrently, one JSON verdict per line
    Batch {
        /// Input file, one URL or text per line
        file: PathBuf,
    },

    /// Print the extracted feature map only
    Features {
        /// URL or text to inspect
        input: String,
    },
}
