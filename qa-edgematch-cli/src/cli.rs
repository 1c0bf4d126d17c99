use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "edgematch",
    about = "Edge-match validation of features across a border",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an edge-match check over a dataset
    Run {
        /// Check definition (TOML)
        #[arg(long, short = 'c')]
        check: PathBuf,

        /// Dataset with the feature classes (JSON, shapes as WKT)
        #[arg(long, short = 'd')]
        data: PathBuf,

        /// Tile size; overrides the check definition
        #[arg(long)]
        tile_size: Option<f64>,

        /// Verified extent as `xmin,ymin,xmax,ymax`; defaults to the data extent
        #[arg(long)]
        extent: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Exit with a non-zero code when issues are found
        #[arg(long)]
        fail_on_issues: bool,
    },

    /// List the issue codes of a check kind
    Codes {
        /// Check kind
        #[arg(value_enum)]
        check: CheckKind,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    BorderingLines,
    CrossingAreas,
    BorderingPoints,
    CrossingLines,
}
