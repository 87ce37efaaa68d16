use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Rotated log files kept on disk.
const MAX_LOG_FILES: usize = 5;

/// Install the process subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Human-facing output goes to
/// stderr so `-` outputs on stdout stay clean. When `dir` is set, a daily
/// rotated `dvpl.log.*` file receives the same events without ANSI colors.
/// The returned guards must live until exit so buffered lines are flushed.
pub fn init(level: LevelFilter, dir: Option<&Path>) -> anyhow::Result<Vec<WorkerGuard>> {
    let mut guards = Vec::new();

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = Layer::new().with_writer(std::io::stderr).with_target(false);

    let file_layer = match dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("dvpl")
                .filename_suffix("log")
                .max_log_files(MAX_LOG_FILES)
                .build(dir)
                .with_context(|| format!("initializing rolling log file in {:?}", dir))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            Some(Layer::new().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guards)
}
