//! Command-line definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "content-sync", about = "Synchronize CMS entities with a portable file tree")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show what an import would change, without writing anything
    Report(RunArgs),
    /// Apply portable files to the store snapshot
    Import(RunArgs),
    /// Write store entities out as portable files
    Export(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Folder holding the portable files
    #[arg(long, default_value = "sync")]
    pub root: PathBuf,

    /// JSON snapshot of the live store
    #[arg(long, default_value = "store.json")]
    pub store: PathBuf,

    /// Optional manifest file; the root flag overrides its root
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Handler set to run
    #[arg(long, default_value = "default")]
    pub set: String,

    /// Group label recorded on notifications
    #[arg(long, default_value = "default")]
    pub group: String,

    /// Apply writes even when nothing material changed
    #[arg(long)]
    pub force: bool,

    /// Include entities flagged as disabled
    #[arg(long)]
    pub include_disabled: bool,

    /// Acting user recorded on notifications
    #[arg(long)]
    pub user: Option<String>,
}
