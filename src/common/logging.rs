//! Logging and tracing configuration
//!
//! Runs log to stderr in compact form and, when the data directory is
//! writable, to a detailed run log that survives the process. A multi-minute
//! transfer that fails is diagnosed from that file.

use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::paths;

/// Initialize tracing for a run
///
/// Logs are controlled by the `RUST_LOG` environment variable. Default level
/// is INFO for this crate (DEBUG with `verbose`), WARN for dependencies.
/// Returns the run log path when file logging could be set up.
pub fn init(verbose: bool) -> Option<PathBuf> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("ssh_acceptance=debug,warn")
            } else {
                EnvFilter::new("ssh_acceptance=info,warn")
            }
        })
    };

    if let Some(log_file) = paths::run_log_path() {
        let opened = log_file
            .parent()
            .map(|dir| std::fs::create_dir_all(dir).is_ok())
            .unwrap_or(false)
            .then(|| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)
            });

        match opened {
            Some(Ok(file)) => {
                let file_layer = fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE);

                let stderr_layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact();

                tracing_subscriber::registry()
                    .with(filter())
                    .with(file_layer)
                    .with(stderr_layer)
                    .init();

                return Some(log_file);
            }
            Some(Err(e)) => {
                eprintln!("Warning: Could not open log file: {}", e);
            }
            None => {}
        }
    }

    // Fallback: stderr only
    tracing_subscriber::registry()
        .with(filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    None
}

/// Read the last `lines` lines of the run log
pub fn tail_run_log(lines: usize) -> std::io::Result<Vec<String>> {
    let Some(path) = paths::run_log_path() else {
        return Ok(Vec::new());
    };
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path)?;
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    Ok(all[start..].iter().map(|line| line.to_string()).collect())
}

/// Truncate the run log file
pub fn truncate_run_log() -> std::io::Result<()> {
    if let Some(path) = paths::run_log_path() {
        if path.exists() {
            std::fs::write(&path, "")?;
        }
    }
    Ok(())
}
