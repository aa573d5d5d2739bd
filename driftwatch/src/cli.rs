// driftwatch/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "driftwatch")]
#[command(about = "Drift monitoring and guarded retraining for deployed classifiers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriftKindArg {
    Shift,
    Scale,
    Noise,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 📝 Appends one served prediction to the prediction log
    Log {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Feature payload as a JSON object (ex: '{"age": 41, "city": "Lyon"}')
        #[arg(long)]
        features: String,

        /// Predicted class (0 or 1)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
        prediction: u8,

        /// Predicted probability of the positive class
        #[arg(long)]
        probability: f64,

        /// Ground truth label, when already known
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
        label: Option<u8>,
    },

    /// 📊 Runs one drift check and the retraining response
    Check {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Records to compare (default: drift.window_size)
        #[arg(long, short)]
        window: Option<usize>,

        /// Output format: table | json
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// 🔁 Forces a retraining run (data floors still apply)
    Retrain {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Output format: table | json
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// 📐 Manages the reference distribution
    Reference {
        #[command(subcommand)]
        action: ReferenceAction,
    },

    /// 💉 Appends drifted copies of recent predictions (demo / testing)
    InjectDrift {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Numeric feature to drift
        #[arg(long)]
        feature: String,

        /// Drift type: shift | scale | noise
        #[arg(long, value_enum, default_value = "shift")]
        kind: DriftKindArg,

        #[arg(long, default_value = "1.5")]
        magnitude: f64,

        /// Number of most recent records to copy
        #[arg(long, default_value = "100")]
        window: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// 🚦 Shows retraining readiness (READY / WAITING)
    Status {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Output format: table | json
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// ⏱️ Runs drift checks on a fixed interval
    Watch {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Seconds between checks
        #[arg(long, default_value = "300")]
        interval: u64,

        /// Stop after this many checks (default: run forever)
        #[arg(long)]
        iterations: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum ReferenceAction {
    /// Builds the reference distribution from training rows (JSONL)
    Build {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Training rows, one JSON object per line
        #[arg(long = "from")]
        source: PathBuf,

        /// Model generation label
        #[arg(long, default_value = "v1")]
        generation: String,

        /// Columns to leave out (targets, identifiers)
        #[arg(long, value_delimiter = ',', default_value = "label")]
        exclude: Vec<String>,
    },
}
