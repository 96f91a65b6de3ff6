use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "chapterscan",
    version,
    about = "Chapter structure detection for book PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve chapter page ranges for a book.
    Analyze(AnalyzeArgs),
    /// Locate and parse the table of contents only.
    Toc(TocArgs),
    /// Compare resolved chapters against a stored baseline.
    Compare(CompareArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Book PDF, or a form-feed separated `.txt` page dump.
    pub path: PathBuf,

    /// JSON file overriding detector defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the full report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Print the planned per-chapter split layout.
    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TocArgs {
    pub path: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    pub path: PathBuf,

    /// Stored report or chapter array to compare against.
    #[arg(long)]
    pub baseline: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,
}
