//! Command implementations

use colored::Colorize;

use sync_core::{
    HandlerOptions, Manifest, SyncActionResult, SyncCallbacks, SyncEngine, SyncOperation,
};
use sync_node::ChangeKind;
use sync_serializers::SerializerRegistry;
use sync_store::MemoryStore;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};

/// Run one bulk operation against the snapshot store. Returns `false`
/// when the run finished with item failures (so the process can exit
/// non-zero without discarding the partial result).
pub fn run_operation(operation: SyncOperation, args: &RunArgs, verbose: bool) -> Result<bool> {
    let manifest = match &args.manifest {
        Some(path) => Manifest::load(path)?,
        None => Manifest::default(),
    }
    .with_root(&args.root);

    if !args.store.exists() {
        return Err(CliError::user(format!(
            "store snapshot not found: {}",
            args.store.display()
        )));
    }
    let store = MemoryStore::load_snapshot(&args.store)?;

    let registry = SerializerRegistry::with_builtins();
    let engine = SyncEngine::new(&store, &registry, manifest);

    let mut options = HandlerOptions::new(operation)
        .with_set(args.set.as_str())
        .with_group(args.group.as_str());
    if args.force {
        options = options.with_force();
    }
    if args.include_disabled {
        options = options.with_disabled();
    }
    if let Some(user) = &args.user {
        options = options.with_user(user.as_str());
    }

    let callbacks = if verbose {
        SyncCallbacks::new().on_progress(|progress| {
            eprintln!("{} {}", "·".dimmed(), progress.message.dimmed());
        })
    } else {
        SyncCallbacks::new()
    };

    let result = engine.run(options, &callbacks)?;
    print_result(operation, &result);

    if operation == SyncOperation::Import && !result.cancelled {
        store.save_snapshot(&args.store)?;
    }

    Ok(!result.has_failures())
}

fn print_result(operation: SyncOperation, result: &SyncActionResult) {
    if result.cancelled {
        println!("{} {} cancelled before start", "↯".yellow(), operation);
        return;
    }

    for action in &result.actions {
        let label = format!("{:<12}", action.change.to_string());
        let label = match action.change {
            ChangeKind::NoChange => label.dimmed(),
            ChangeKind::Create => label.green(),
            ChangeKind::Update | ChangeKind::Hidden => label.yellow(),
            ChangeKind::Delete => label.red(),
            ChangeKind::Fail => label.red().bold(),
        };
        let name = format!("{} {}", action.kind, action.name);
        match &action.message {
            Some(message) => println!("{label} {name} ({message})"),
            None => println!("{label} {name}"),
        }
    }

    let summary = format!(
        "{}: {} items, {} changed",
        operation,
        result.actions.len(),
        result.change_count()
    );
    if result.has_failures() {
        let failed = result.actions.iter().filter(|a| !a.success).count();
        println!("{} ({} failed)", summary.red().bold(), failed);
    } else {
        println!("{}", summary.green().bold());
    }
}
