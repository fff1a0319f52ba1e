//! reclaim - find and recover disk space.
//!
//! Usage:
//!   reclaim scan [PATH]      Report caches, duplicates, large and stale files
//!   reclaim clean [PATH]     Scan, then confirm and remove items one by one
//!   reclaim docker           Review and prune container runtime leftovers
//!   reclaim --help           Show help

mod cleanup;
mod docker;
mod render;
mod units;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use reclaim_analyze::{Engine, ScanConfig, ScanError, ScanReport};

use crate::cleanup::{Cleaner, RemovalMode, candidates};
use crate::docker::DockerCli;
use crate::units::{format_size, parse_duration, parse_size};

/// Exit status after an interrupt, matching shells.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "reclaim",
    version,
    about = "Find reclaimable disk space",
    long_about = "reclaim walks a directory tree once and reports build and cache \
                  directories, duplicate files, large files and stale files.\n\n\
                  Nothing is deleted unless you run `reclaim clean` and confirm each item."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Overridden by RECLAIM_LOG.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and print what can be reclaimed
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Maximum entries listed per section in text output
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,
    },

    /// Scan, then confirm and remove items one at a time
    Clean {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show what would be removed without removing anything
        #[arg(long)]
        dry_run: bool,

        /// Move to the system trash instead of deleting permanently
        #[arg(long, conflicts_with = "dry_run")]
        trash: bool,
    },

    /// Review images and containers and offer prune commands
    Docker {
        /// Ask the questions but run no prune commands
        #[arg(long)]
        dry_run: bool,

        /// Container client binary
        #[arg(long, default_value = "docker")]
        program: String,
    },
}

#[derive(Args, Debug, Clone)]
struct ScanArgs {
    /// Path to scan
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Report files larger than this (e.g., "100MB", "1.5GB")
    #[arg(long, default_value = "100MB", value_parser = parse_size)]
    large: u64,

    /// Number of large files to report
    #[arg(long, default_value = "10")]
    large_count: usize,

    /// Report files not accessed for longer than this (e.g., "180d", "1y")
    #[arg(long, default_value = "180d", value_parser = parse_duration)]
    stale: Duration,

    /// Minimum size for duplicate detection (e.g., "1KB")
    #[arg(long, default_value = "1KB", value_parser = parse_size)]
    min_dup_size: u64,

    /// Maximum directory depth to descend
    #[arg(short, long)]
    depth: Option<u32>,

    /// File or directory name globs to skip (repeatable)
    #[arg(short, long = "ignore", value_name = "GLOB")]
    ignore: Vec<String>,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Descend into other filesystems
    #[arg(short = 'x', long)]
    cross_filesystems: bool,

    /// Byte-compare duplicates after hashing
    #[arg(long)]
    verify: bool,

    /// Hashing threads (0 = shared pool)
    #[arg(long, default_value = "0")]
    threads: usize,
}

impl ScanArgs {
    fn to_config(&self) -> Result<ScanConfig> {
        let config = ScanConfig::builder()
            .root(self.path.clone())
            .large_file_threshold_bytes(self.large)
            .max_large_files_reported(self.large_count)
            .stale_after(self.stale)
            .min_duplicate_size_bytes(self.min_dup_size)
            .max_depth(self.depth)
            .ignore_patterns(self.ignore.clone())
            .follow_symlinks(self.follow_symlinks)
            .cross_filesystems(self.cross_filesystems)
            .verify_contents(self.verify)
            .hash_threads(self.threads)
            .build()
            .context("Invalid scan options")?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let result = match cli.command {
        Command::Scan { scan, format, top } => run_scan(&scan, format, top, &cancel).await,
        Command::Clean {
            scan,
            dry_run,
            trash,
        } => {
            let mode = match (dry_run, trash) {
                (true, _) => RemovalMode::DryRun,
                (false, true) => RemovalMode::Trash,
                (false, false) => RemovalMode::Permanent,
            };
            run_clean(&scan, mode, &cancel).await
        }
        Command::Docker { dry_run, program } => run_docker(program, dry_run).await,
    };

    match result {
        Err(e) if is_cancelled(&e) => {
            eprintln!("Scan cancelled.");
            std::process::exit(EXIT_INTERRUPTED);
        }
        other => other,
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("RECLAIM_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// The first Ctrl-C cancels the scan, a second one exits.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::debug!("interrupt received");
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });
}

fn is_cancelled(err: &color_eyre::Report) -> bool {
    err.downcast_ref::<ScanError>()
        .is_some_and(ScanError::is_cancelled)
}

/// Run the engine on a blocking thread, showing progress on a terminal.
async fn scan_report(args: &ScanArgs, cancel: &CancellationToken) -> Result<ScanReport> {
    let config = args.to_config()?;
    let engine = Engine::new();

    let progress = io::stderr().is_terminal().then(|| {
        let mut rx = engine.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(p) => eprint!(
                        "\r\x1b[2KScanning... {} items, {} ({} caches, {:.0} files/s)",
                        p.total_items(),
                        format_size(p.bytes_scanned),
                        p.cache_dirs_found,
                        p.files_per_second()
                    ),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    eprintln!("Scanning {}...", config.root.display());
    let cancel = cancel.clone();
    let report = tokio::task::spawn_blocking(move || engine.scan_with_cancel(&config, &cancel))
        .await
        .context("Scan task failed")?;

    if let Some(handle) = progress {
        handle.abort();
        eprint!("\r\x1b[2K");
    }

    // Keep ScanError as the root cause so cancellation can be recognised.
    Ok(report?)
}

async fn run_scan(args: &ScanArgs, format: OutputFormat, top: usize, cancel: &CancellationToken) -> Result<()> {
    let report = scan_report(args, cancel).await?;

    match format {
        OutputFormat::Text => {
            let mut out = io::stdout().lock();
            render::write_report(&mut out, &report, SystemTime::now(), top)?;
            out.flush()?;
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn run_clean(args: &ScanArgs, mode: RemovalMode, cancel: &CancellationToken) -> Result<()> {
    let report = scan_report(args, cancel).await?;
    let list = candidates(&report, SystemTime::now());
    if list.is_empty() {
        println!("Nothing to clean under {}.", report.root.display());
        return Ok(());
    }

    println!(
        "{} item(s) to review, {} reclaimable without losing data.",
        list.len(),
        format_size(report.total_reclaimable_bytes)
    );

    let cancel = cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut cleaner = Cleaner::new(io::stdin().lock(), io::stdout(), mode, cancel);
        cleaner.run(&list)
    })
    .await
    .context("Cleanup task failed")??;

    println!();
    let verb = if mode == RemovalMode::DryRun { "Would free" } else { "Freed" };
    println!(
        "{verb} {} from {} path(s); {} declined, {} failed.",
        format_size(outcome.bytes_freed),
        outcome.removed,
        outcome.declined,
        outcome.failed
    );

    if outcome.failed > 0 {
        return Err(eyre!("{} path(s) could not be removed", outcome.failed));
    }
    Ok(())
}

async fn run_docker(program: String, dry_run: bool) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let runtime = DockerCli::with_program(program);
        let mut input = io::stdin().lock();
        let mut output = io::stdout().lock();
        docker::run_cleanup(&runtime, &mut input, &mut output, dry_run)
    })
    .await
    .context("Container cleanup task failed")??;
    Ok(())
}
