//! Subscriber setup: stderr always, plus an optional per-run log file.

use anyhow::{Context, Result};
use chrono::Local;
use rca_agents::TRANSCRIPT_TARGET;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Create `{dir}/run-YYYYMMDD-HHMMSS.log` and a non-blocking writer for it.
///
/// The guard must outlive all logging; dropping it flushes the file.
pub fn create_run_log_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create trace directory: {}", dir.display()))?;
    let file_name = format!("run-{}.log", Local::now().format("%Y%m%d-%H%M%S"));
    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// `RUST_LOG` filter, with the transcript target forced on when `verbose`.
pub fn build_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let mut filter = match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new("warn"),
    };
    if verbose {
        if let Ok(directive) = format!("{TRANSCRIPT_TARGET}=info").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber. Returns the file writer guard, if any.
pub fn init(verbose: bool, trace_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(rust_log.as_deref(), verbose);

    let (file_layer, guard) = match trace_dir {
        Some(dir) => {
            let (writer, guard) = create_run_log_writer(dir)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .ok();

    Ok(guard)
}
