//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::consistency::ConsistencyMode;
use crate::reconcile::{CheckMode, DEFAULT_SIZE_FACTOR, DEFAULT_THRESH_FACTOR};

#[derive(Debug, Parser)]
#[command(name = "boxrecon")]
#[command(about = "Find and correct anomalously sized boxes in box arrays from page layout analysis")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full analysis (normalize, medians, consistency, reconcile) on files
    Analyze(AnalyzeArgs),

    /// Print median dimensions and size deviation
    Stats(StatsArgs),

    /// Reconcile box sizes against the median
    Reconcile(ReconcileArgs),

    /// Translate and scale every box
    Transform(TransformArgs),

    /// Render a box array as PNG tiles
    Render(RenderArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Box array files (.ba text or .json)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for normalized and reconciled arrays
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Config file (defaults to the user config file when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also write PNG tiles for every array
    #[arg(long)]
    pub render: bool,
}

#[derive(Debug, Clone, Args)]
pub struct StatsArgs {
    /// Box array file
    pub input: PathBuf,

    /// Deviation reference
    #[arg(long, value_enum, default_value_t = ConsistencyModeArg::Pairwise)]
    pub mode: ConsistencyModeArg,
}

#[derive(Debug, Clone, Args)]
pub struct ReconcileArgs {
    /// Box array file
    pub input: PathBuf,

    /// Output file; format follows the extension
    #[arg(short, long)]
    pub output: PathBuf,

    /// Dimensions to check
    #[arg(long, value_enum, default_value_t = CheckModeArg::Both)]
    pub check: CheckModeArg,

    /// Fractional deviation from the median that marks a box anomalous
    #[arg(long, default_value_t = DEFAULT_THRESH_FACTOR)]
    pub thresh_factor: f64,

    /// Corrected sizes stay within [median / f, median * f]
    #[arg(long, default_value_t = DEFAULT_SIZE_FACTOR)]
    pub size_factor: f64,
}

#[derive(Debug, Clone, Args)]
pub struct TransformArgs {
    /// Box array file
    pub input: PathBuf,

    /// Output file; format follows the extension
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub dx: i32,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub dy: i32,

    #[arg(long, default_value_t = 1.0)]
    pub sx: f64,

    #[arg(long, default_value_t = 1.0)]
    pub sy: f64,
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Box array file
    pub input: PathBuf,

    /// Output PNG
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum canvas width before wrapping
    #[arg(long, default_value_t = 2200)]
    pub max_width: u32,

    /// Scale applied to box coordinates
    #[arg(long, default_value_t = 1.0)]
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckModeArg {
    Width,
    Height,
    Both,
}

impl From<CheckModeArg> for CheckMode {
    fn from(arg: CheckModeArg) -> Self {
        match arg {
            CheckModeArg::Width => CheckMode::Width,
            CheckModeArg::Height => CheckMode::Height,
            CheckModeArg::Both => CheckMode::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConsistencyModeArg {
    Pairwise,
    Median,
}

impl From<ConsistencyModeArg> for ConsistencyMode {
    fn from(arg: ConsistencyModeArg) -> Self {
        match arg {
            ConsistencyModeArg::Pairwise => ConsistencyMode::Pairwise,
            ConsistencyModeArg::Median => ConsistencyMode::Median,
        }
    }
}
