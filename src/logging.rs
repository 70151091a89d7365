// src/logging.rs

//! Logging setup for `watchf` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `--verbose` (debug)
//! 3. `WATCHF_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that stdout carries only the output of the
//! commands being run.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no level is given on the CLI.
pub const LOG_ENV_VAR: &str = "WATCHF_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool) -> Result<()> {
    let env_level = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, verbose, env_level.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn resolve_level(
    cli_level: Option<LogLevel>,
    verbose: bool,
    env_level: Option<&str>,
) -> tracing::Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    if verbose {
        return tracing::Level::DEBUG;
    }
    env_level
        .and_then(parse_level_str)
        .unwrap_or(tracing::Level::INFO)
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn cli_flag_beats_verbose_and_env() {
        assert_eq!(
            resolve_level(Some(LogLevel::Warn), true, Some("trace")),
            Level::WARN
        );
        assert_eq!(resolve_level(None, true, Some("error")), Level::DEBUG);
        assert_eq!(resolve_level(None, false, Some(" Trace ")), Level::TRACE);
    }

    #[test]
    fn unknown_env_value_falls_back_to_info() {
        assert_eq!(resolve_level(None, false, Some("loud")), Level::INFO);
        assert_eq!(resolve_level(None, false, None), Level::INFO);
    }
}
