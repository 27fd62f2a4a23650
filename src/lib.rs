//! dupemover - content-addressed duplicate file quarantine
//!
//! Walks a directory, finds files whose bytes are identical to an earlier
//! file of the same size, and moves the later copies into a `duplicates`
//! folder inside that directory. Paths already classified are remembered in
//! a JSON state file, so repeated runs over a growing collection only look
//! at new files.
//!
//! The pipeline is:
//!
//! 1. [`config`] merges defaults, the config file, environment and flags
//! 2. [`state`] loads the set of paths handled by earlier runs
//! 3. [`duplicates`] walks the tree ([`scanner`]) and confirms pairs by
//!    content fingerprint
//! 4. [`actions`] moves each duplicate into quarantine
//! 5. [`state`] saves the updated set and [`output`] prints the report

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod state;

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{BatchMoveResult, QuarantineMover};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs, StateCommand, StateLocation};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{JsonOutput, RunReport, TextOutput};
use crate::progress::Progress;
use crate::state::{SeenSet, StateStore};

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for anything that aborts the run before a report can be
/// produced: bad configuration, an unreadable or corrupt state file, a
/// missing root, an unusable quarantine folder or a failed state save.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config_file.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Scan(ref args) => run_scan(&cli, args, config),
        Commands::State(ref command) => run_state(command, &config),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::Success)
        }
    }
}

fn state_store(location: Option<&std::path::Path>, config: &Config) -> StateStore {
    location
        .map(std::path::Path::to_path_buf)
        .or_else(|| config.state_file.clone())
        .map_or_else(StateStore::at_default_location, StateStore::new)
}

fn run_scan(cli: &Cli, args: &ScanArgs, mut config: Config) -> Result<ExitCode> {
    config
        .apply_scan_args(args)
        .context("Invalid scan options")?;
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    let store = (!args.no_state).then(|| state_store(None, &config));
    let seen = match store {
        Some(ref store) => store
            .load_or_reset(args.reset_state)
            .with_context(|| format!("Failed to load state from {}", store.path().display()))?,
        None => SeenSet::new(),
    };

    let show_progress =
        !cli.quiet && args.output == OutputFormat::Text && std::io::stderr().is_terminal();
    let progress = Arc::new(Progress::new(!show_progress));

    let mut finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_walker_config(config.walker_config())
        .with_shutdown_flag(handler.get_flag());
    if show_progress {
        finder_config = finder_config.with_progress_callback(progress.clone());
    }

    let finder = DuplicateFinder::new(finder_config, Arc::new(config.hasher()));
    let outcome = finder
        .find(&args.root, seen)
        .with_context(|| format!("Failed to scan {}", args.root.display()))?;

    let moves = if outcome.interrupted {
        BatchMoveResult {
            dry_run: args.dry_run,
            interrupted: true,
            ..Default::default()
        }
    } else {
        let mover = QuarantineMover::new(
            &outcome.quarantine_dir,
            config.move_config(args.dry_run, handler.get_flag()),
        );
        mover
            .move_batch(&outcome.pairs, show_progress.then_some(progress.as_ref()))
            .context("Failed to move duplicates")?
    };

    let report = RunReport::new(&outcome, moves);

    match store {
        Some(ref store) if !report.interrupted && !args.dry_run => {
            store
                .save(&outcome.seen)
                .with_context(|| format!("Failed to save state to {}", store.path().display()))?;
            log::info!(
                "Remembering {} path(s) in {}",
                outcome.seen.len(),
                store.path().display()
            );
        }
        Some(_) if report.interrupted => log::warn!("Interrupted; state not saved"),
        _ => log::debug!("State not saved"),
    }

    let mut stdout = std::io::stdout().lock();
    match args.output {
        OutputFormat::Json => JsonOutput::new(&report).write_to(&mut stdout)?,
        OutputFormat::Text if !cli.quiet => TextOutput::new(&report)
            .with_color(!cli.no_color && stdout.is_terminal())
            .with_details(cli.verbose > 0 || args.dry_run)
            .write_to(&mut stdout)?,
        OutputFormat::Text => {}
    }
    stdout.flush()?;

    Ok(report.exit_code())
}

fn run_state(command: &StateCommand, config: &Config) -> Result<ExitCode> {
    let location = |loc: &StateLocation| state_store(loc.path.as_deref(), config);

    match command {
        StateCommand::Show(loc) => {
            let store = location(loc);
            let seen = store
                .load()
                .with_context(|| format!("Failed to load state from {}", store.path().display()))?;
            println!(
                "{}: {} remembered path(s)",
                store.path().display(),
                seen.len()
            );
        }
        StateCommand::Clear(loc) => {
            let store = location(loc);
            let removed = store
                .clear()
                .with_context(|| format!("Failed to remove {}", store.path().display()))?;
            if removed {
                println!("Removed {}", store.path().display());
            } else {
                println!("No state file at {}", store.path().display());
            }
        }
    }

    Ok(ExitCode::Success)
}
