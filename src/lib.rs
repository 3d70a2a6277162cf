//! dupsweep - duplicate file finder with safe, reversible resolution.
//!
//! Files are grouped by size first; only sizes shared by two or more files
//! are fingerprinted with the selected digest. Confirmed groups can then be
//! resolved by keeping one copy per group and moving the rest to the trash.
//!
//! The pipeline is usable as a library:
//!
//! ```no_run
//! use dupsweep::actions::{plan_resolution, KeepStrategy};
//! use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let report = finder.scan(&[PathBuf::from("/photos")]).unwrap();
//! let actions = plan_resolution(&report.groups, KeepStrategy::ShortestName, true);
//! print!("{}", dupsweep::actions::preview(&actions));
//! ```

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

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{
    plan_resolution, DeleteConfig, DeleteError, ExecutionReport, SafeDeleter, SystemTrash, Trash,
};
use crate::cli::{Cli, Commands, ConfigArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, FinderError, ScanReport};
use crate::error::ExitCode;
use crate::output::{JsonOutput, Resolution, RunReport, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::WalkerConfig;

/// Run the command line application with the system trash.
///
/// # Errors
///
/// Returns an error for invalid configuration, unwritable output, or a
/// deletion that needed confirmation nobody could give.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    run_app_with_trash(cli, SystemTrash)
}

/// Run the command line application with an explicit trash backend.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_with_trash(cli: Cli, trash: impl Trash + 'static) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                log::warn!("Config file {} not found, using defaults", path.display());
            }
            Config::load_from_path(path)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => Config::load().context("Invalid configuration")?,
    };
    log::debug!("Effective configuration before flags: {:?}", config);

    match cli.command {
        Commands::Scan(ref args) => run_scan(&cli, args, &config, trash),
        Commands::Config(ref args) => run_config(&cli, args, &config),
    }
}

fn run_config(cli: &Cli, args: &ConfigArgs, config: &Config) -> anyhow::Result<ExitCode> {
    if args.init {
        let path = cli
            .config
            .clone()
            .or_else(Config::config_path)
            .context("No platform config directory; pass --config PATH")?;
        config
            .save_to(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{}", path.display());
    } else {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
    }
    Ok(ExitCode::Success)
}

fn run_scan(
    cli: &Cli,
    args: &ScanArgs,
    config: &Config,
    trash: impl Trash + 'static,
) -> anyhow::Result<ExitCode> {
    let handler = signal::install_handler();
    let show_progress = !cli.quiet && io::stderr().is_terminal();
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(!show_progress));

    let walker_config = WalkerConfig {
        follow_symlinks: args.follow_symlinks_flag().unwrap_or(config.follow_symlinks),
        skip_hidden: args.skip_hidden_flag().unwrap_or(config.skip_hidden),
        skip_empty: args.skip_empty_flag().unwrap_or(config.skip_empty),
        ..WalkerConfig::default()
    }
    .with_size_bounds(args.min_size, args.max_size)
    .with_extensions(&args.extensions)
    .with_exclude_extensions(&args.exclude_extensions);

    let finder_config = FinderConfig::default()
        .with_algorithm(args.algorithm.unwrap_or(config.algorithm))
        .with_io_threads(args.io_threads.unwrap_or(config.io_threads))
        .with_chunk_size(config.chunk_size)
        .with_walker_config(walker_config)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(Arc::clone(&progress));

    let report = match DuplicateFinder::new(finder_config).scan(&args.paths) {
        Ok(report) => report,
        Err(FinderError::Interrupted) => {
            log::warn!("Scan interrupted, no report written");
            return Ok(ExitCode::Interrupted);
        }
        Err(e) => return Err(e).context("Scan failed"),
    };
    log::info!(
        "Found {} duplicate group(s), {} reclaimable",
        report.groups.len(),
        report.summary.reclaimable_display()
    );

    let mut planned = Vec::new();
    let mut execution: Option<ExecutionReport> = None;
    let mut interrupted = false;
    let mut refused: Option<DeleteError> = None;

    if args.delete_duplicates && report.has_duplicates() {
        let strategy = args.keep_strategy.unwrap_or(config.keep_strategy);
        planned = plan_resolution(&report.groups, strategy, args.dry_run);

        if !args.dry_run {
            let permanent = args.permanent || !config.use_trash;
            let delete_config = DeleteConfig {
                use_trash: !permanent,
                permanent_fallback: args.permanent_fallback,
                force: args.yes,
            };
            let mut deleter = SafeDeleter::new(delete_config)
                .with_trash(trash)
                .with_shutdown_flag(handler.get_flag())
                .with_progress_callback(Arc::clone(&progress));
            if !args.yes && io::stdin().is_terminal() {
                deleter = deleter.with_confirm(move |count: usize, bytes: u64| {
                    prompt_confirm(count, bytes, permanent)
                });
            }

            match deleter.execute(std::mem::take(&mut planned)) {
                Ok(done) => {
                    interrupted = done.interrupted;
                    execution = Some(done);
                }
                Err(DeleteError::Interrupted) => interrupted = true,
                Err(DeleteError::ConfirmationDeclined) => eprintln!("Deletion cancelled"),
                Err(e @ DeleteError::ConfirmationRequired { .. }) => refused = Some(e),
            }
        }
    }

    let resolution = match &execution {
        Some(done) => Some(Resolution::Executed(done)),
        None if args.dry_run && !planned.is_empty() => Some(Resolution::DryRun(&planned)),
        None => None,
    };
    let run = RunReport {
        scan: &report,
        resolution,
    };

    let exit_code = if refused.is_some() {
        ExitCode::GeneralError
    } else {
        determine_exit_code(&report, execution.as_ref(), interrupted)
    };

    let color = !cli.no_color && args.file.is_none() && io::stdout().is_terminal();
    write_report(&run, args.output, args.file.as_deref(), color, exit_code)?;

    if let Some(e) = refused {
        return Err(anyhow::Error::new(e)
            .context("Refusing to delete without confirmation (pass --yes to skip the prompt)"));
    }
    Ok(exit_code)
}

/// Map run results to a process exit code.
#[must_use]
pub fn determine_exit_code(
    report: &ScanReport,
    execution: Option<&ExecutionReport>,
    interrupted: bool,
) -> ExitCode {
    if interrupted {
        ExitCode::Interrupted
    } else if !report.errors.is_empty() || execution.is_some_and(|e| e.failed > 0) {
        ExitCode::PartialSuccess
    } else if report.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}

fn prompt_confirm(count: usize, bytes: u64, permanent: bool) -> bool {
    let verb = if permanent {
        "Permanently delete"
    } else {
        "Move to trash"
    };
    let mut stderr = io::stderr();
    let _ = write!(
        stderr,
        "{} {} file(s) ({})? [y/N] ",
        verb,
        count,
        bytesize::ByteSize::b(bytes)
    );
    let _ = stderr.flush();

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn write_report(
    run: &RunReport<'_>,
    format: OutputFormat,
    file: Option<&Path>,
    color: bool,
    exit_code: ExitCode,
) -> anyhow::Result<()> {
    match file {
        Some(path) => {
            let handle = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(handle);
            render(&mut writer, run, format, color, exit_code)?;
            writer.flush()?;
            log::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            render(&mut lock, run, format, color, exit_code)?;
        }
    }
    Ok(())
}

fn render<W: Write>(
    writer: &mut W,
    run: &RunReport<'_>,
    format: OutputFormat,
    color: bool,
    exit_code: ExitCode,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => TextOutput::new(*run).with_color(color).write_to(writer)?,
        OutputFormat::Json => JsonOutput::new(run, exit_code).write_to(writer, true)?,
    }
    Ok(())
}
