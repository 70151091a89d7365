// src/lib.rs

pub mod cli;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod service;
pub mod types;
pub mod watch;

use std::path::Path;

use anyhow::Result;
use tokio::sync::watch as snapshot;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_from_path, write_to_path, Config, RawConfig};
use crate::daemon::{stop_background, Daemon};
use crate::engine::WatchSnapshot;
use crate::service::WatchService;

/// Name used for the PID file (`.watchf.pid`).
pub const DAEMON_NAME: &str = "watchf";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - `--stop` handling
/// - config file loading and flag overrides
/// - `--write-config` / `--dry-run`
/// - the daemon-wrapped watch service
/// - Ctrl-C handling and the final drain
pub async fn run(args: CliArgs) -> Result<()> {
    if args.stop {
        let pid = stop_background(DAEMON_NAME, Path::new("."))?;
        println!("stopped {DAEMON_NAME} (pid {pid})");
        return Ok(());
    }

    let base = match &args.config {
        Some(path) => load_from_path(path)?,
        None => RawConfig::default(),
    };
    let raw = args.merge_into(base);
    let cfg = Config::try_from(raw.clone())?;

    if args.write_config {
        let path = args.config.clone().unwrap_or_else(default_config_path);
        write_to_path(&path, &raw)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&args.path, &cfg);
        return Ok(());
    }

    if cfg.commands().is_empty() {
        warn!("no commands configured; events will only be logged");
    }

    let service = WatchService::new(args.path.clone(), cfg);
    let mut daemon = Daemon::new(DAEMON_NAME, service);
    daemon.start()?;

    let mut updates = match daemon.service().subscribe() {
        Some(rx) => rx,
        None => anyhow::bail!("watch service did not start"),
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            match res {
                Ok(()) => info!("interrupt received; shutting down"),
                Err(err) => warn!(error = %err, "failed to listen for Ctrl+C; shutting down"),
            }
        }
        _ = consumer_exited(&mut updates) => {
            warn!("event consumer exited; shutting down");
        }
    }

    if let Err(err) = daemon.stop() {
        debug!(error = %err, "stopping watch service");
    }
    daemon.service_mut().wait().await?;

    Ok(())
}

/// Resolves once the consumer task has dropped its snapshot sender.
async fn consumer_exited(updates: &mut snapshot::Receiver<WatchSnapshot>) {
    while updates.changed().await.is_ok() {}
}

/// Print the effective, validated settings.
fn print_dry_run(root: &Path, cfg: &Config) {
    println!("watchf dry-run");
    println!("  root = {}", root.display());
    println!("  recursive = {}", cfg.recursive());
    println!("  events = {}", cfg.mask());
    println!("  include_pattern = {}", cfg.pattern().as_str());
    println!("  interval = {:?}", cfg.min_interval());
    println!("  continue_on_error = {}", cfg.continue_on_error());
    match cfg.stabilize_timeout() {
        Some(timeout) => println!("  stabilize_timeout = {timeout:?}"),
        None => println!("  stabilize_timeout = none"),
    }
    println!();

    println!("commands ({}):", cfg.commands().len());
    for cmd in cfg.commands() {
        println!("  - {cmd}");
    }

    debug!("dry-run complete (no watching)");
}
