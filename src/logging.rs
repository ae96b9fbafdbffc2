//! Tracing initialization.
//! Builds a subscriber with an EnvFilter derived from LogLevel, compact or
//! JSON formatting, and an optional non-blocking file layer.
//!
//! - RUST_LOG is not consulted; verbosity comes from LogLevel only.
//! - File logging is refused if any ancestor of the log path is a symlink.

use anyhow::Result;
use chrono::Local;
use h5strip::output as out;
use h5strip::platform::open_log_file_secure_append;
use h5strip::{LogLevel, path_has_symlink_ancestor};
use std::fmt as stdfmt;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, registry};

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Formatting layer writing to stdout, or to `writer` when given.
fn fmt_layer<S>(json: bool, writer: Option<NonBlocking>) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = tsfmt::layer().with_target(true);
    match (json, writer) {
        (true, Some(w)) => base.json().with_timer(LocalHumanTime).with_writer(w).boxed(),
        (true, None) => base.json().with_timer(LocalHumanTime).boxed(),
        (false, Some(w)) => base
            .compact()
            .with_timer(LocalHumanTime)
            .with_ansi(false)
            .with_writer(w)
            .boxed(),
        (false, None) => base.compact().with_timer(LocalHumanTime).boxed(),
    }
}

/// Open a non-blocking writer for the log file, or explain on stderr why not.
fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => {
            out::print_warn(&format!(
                "Refusing file logging: an ancestor of {} is a symlink; logging to stdout only.",
                path.display()
            ));
            return None;
        }
        Err(e) => {
            out::print_warn(&format!(
                "Cannot check log path {} for symlinks ({e}); logging to stdout only.",
                path.display()
            ));
            return None;
        }
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!(
                "Cannot open log file {} ({e}); logging to stdout only.",
                path.display()
            ));
            None
        }
    }
}

/// Install the global subscriber. The returned guard (present when a log
/// file is active) must be held until exit so buffered lines are flushed.
pub fn init_tracing(lvl: &LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::default().add_directive(to_level_filter(lvl).into());
    let (file_layer, guard) = match log_file.and_then(maybe_open_non_blocking_writer) {
        Some((writer, guard)) => (Some(fmt_layer(json, Some(writer))), Some(guard)),
        None => (None, None),
    };

    registry()
        .with(filter)
        .with(fmt_layer(json, None))
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}
