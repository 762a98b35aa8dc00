use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stave",
    about = "Stave: version control for sequencer project state",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the changes between two project files
    Diff(DiffArgs),
    /// Three-way merge a project into its ancestor
    Merge(MergeArgs),
    /// Print the revision item of a project
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub baseline: PathBuf,
    pub target: PathBuf,
}

#[derive(Args)]
pub struct MergeArgs {
    pub ancestor: PathBuf,
    pub target: PathBuf,
    /// Write the merged project here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct SnapshotArgs {
    pub project: PathBuf,
    /// Store payloads in a shared arena and reference them by content id
    #[arg(long)]
    pub dedup: bool,
}
