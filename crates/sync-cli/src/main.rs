//! Content Sync Manager CLI
//!
//! Thin wiring around the sync engine: argument parsing, logging setup,
//! and colored result printing. All engine behaviour lives in sync-core.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;
use sync_core::SyncOperation;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("subscriber already installed");
        }
    }

    match &cli.command {
        Commands::Report(args) => commands::run_operation(SyncOperation::Report, args, cli.verbose),
        Commands::Import(args) => commands::run_operation(SyncOperation::Import, args, cli.verbose),
        Commands::Export(args) => commands::run_operation(SyncOperation::Export, args, cli.verbose),
    }
}
