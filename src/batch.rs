//! Per-file and per-batch orchestration around the copy engine.
//!
//! - [`discover_inputs`] turns the `input` argument into a sorted file list.
//! - [`output_path`] names the stripped copy.
//! - [`strip_file`] opens both handles, runs the engine, and closes both
//!   handles on every exit path.
//! - [`strip_all`] processes files one after another; a failed file is
//!   recorded and the next one is attempted.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::engine;
use crate::errors::{NodeCopyError, StripError};
use crate::pattern::SkipMatcher;
use crate::shutdown;
use crate::store::tree::TreeFile;
use crate::store::{Container, Format, StoreError};

/// Marker inserted before the extension of every output file.
pub const STRIPPED_MARKER: &str = "stripped";

/// `<out_folder>/<input stem>.stripped.<ext>`
pub fn output_path(input: &Path, out_folder: &Path, format: Format) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    out_folder.join(format!("{stem}.{STRIPPED_MARKER}.{}", format.extension()))
}

/// True for file names produced by a previous run.
pub fn is_stripped_name(path: &Path, format: Format) -> bool {
    let marker = format!("{STRIPPED_MARKER}.{}", format.extension());
    path.file_name()
        .map(|n| n.to_string_lossy().contains(&marker))
        .unwrap_or(false)
}

/// Expand `input` into the files to process.
///
/// A directory is scanned one level deep for files (or links to files) with
/// the format's extension, skipping earlier outputs, sorted by name.
/// Unreadable entries are logged and left out. Anything else is
/// taken as a single file and left for [`strip_file`] to open (or fail on).
pub fn discover_inputs(input: &Path, format: Format) -> Vec<PathBuf> {
    if !input.is_dir() {
        return vec![input.to_path_buf()];
    }
    let ext = format.extension();
    WalkDir::new(input)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                let at = e.path().unwrap_or(input).display().to_string();
                warn!(path = %at, "cannot read directory entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|x| x == ext))
        .filter(|p| !is_stripped_name(p, format))
        .collect()
}

/// Summary of one stripped file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub groups_seen: usize,
    pub kept: usize,
    pub excluded: usize,
    pub copied: usize,
    pub failures: Vec<NodeCopyError>,
    pub elapsed: Duration,
}

/// What happened to one input.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Stripped(FileReport),
    /// Output already present and `force` unset; nothing was opened.
    SkippedExisting { source: PathBuf, output: PathBuf },
}

/// Strip one file according to `cfg`, using an already-compiled matcher.
pub fn strip_file(
    input: &Path,
    cfg: &Config,
    matcher: &SkipMatcher,
) -> Result<FileOutcome, StripError> {
    let output = output_path(input, &cfg.out_folder, cfg.format);
    if output.exists() && !cfg.force {
        debug!(file = %input.display(), output = %output.display(), "skipped, output already exists");
        return Ok(FileOutcome::SkippedExisting {
            source: input.to_path_buf(),
            output,
        });
    }

    info!(file = %input.display(), output = %output.display(), "Stripping");
    let started = Instant::now();
    let result = match cfg.format {
        Format::Tree => strip_with::<TreeFile>(input, &output, matcher),
        #[cfg(feature = "hdf5")]
        Format::Hdf5 => strip_with::<crate::store::hdf5::Hdf5File>(input, &output, matcher),
        #[cfg(not(feature = "hdf5"))]
        Format::Hdf5 => Err(StoreError::Unavailable { format: Format::Hdf5 }),
    };
    let report = result.map_err(|source| StripError::FileProcessing {
        file: input.to_path_buf(),
        source,
    })?;

    let outcome = report.outcome;
    Ok(FileOutcome::Stripped(FileReport {
        source: input.to_path_buf(),
        output,
        groups_seen: report.keep.groups_seen(),
        kept: report.keep.len(),
        excluded: report.keep.excluded().len(),
        copied: outcome.copied.len(),
        failures: outcome.failures,
        elapsed: started.elapsed(),
    }))
}

/// Open, run, close. Both handles are closed whether or not the engine
/// succeeded; a partial destination stays on disk.
fn strip_with<C: Container>(
    input: &Path,
    output: &Path,
    matcher: &SkipMatcher,
) -> Result<engine::EngineReport, StoreError> {
    let source = C::open(input)?;
    let mut dest = match C::create(output) {
        Ok(d) => d,
        Err(e) => {
            if let Err(close_err) = source.close() {
                warn!(file = %input.display(), "closing source after failed create: {close_err}");
            }
            return Err(e);
        }
    };

    let result = engine::run(&source, &mut dest, matcher);
    let dest_closed = dest.close();
    let source_closed = source.close();

    let report = result?;
    dest_closed?;
    source_closed?;
    Ok(report)
}

/// A file that could not be processed.
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub source: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub stripped: Vec<FileReport>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
    /// Inputs never started because an interrupt was requested.
    pub not_started: Vec<PathBuf>,
}

impl BatchReport {
    pub fn node_failures(&self) -> usize {
        self.stripped.iter().map(|r| r.failures.len()).sum()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "stripped={} skipped={} failed={} node_failures={}{}",
            self.stripped.len(),
            self.skipped.len(),
            self.failed.len(),
            self.node_failures(),
            if self.not_started.is_empty() {
                String::new()
            } else {
                format!(" interrupted_before={}", self.not_started.len())
            }
        )
    }
}

/// Process `inputs` sequentially. Never fails as a whole: per-file errors are
/// logged and collected.
pub fn strip_all(inputs: &[PathBuf], cfg: &Config, matcher: &SkipMatcher) -> BatchReport {
    let mut report = BatchReport::default();
    for (idx, input) in inputs.iter().enumerate() {
        if shutdown::is_requested() {
            warn!(remaining = inputs.len() - idx, "Interrupt requested; not starting further files");
            report.not_started.extend(inputs[idx..].iter().cloned());
            break;
        }
        match strip_file(input, cfg, matcher) {
            Ok(FileOutcome::Stripped(r)) => {
                info!(
                    file = %r.source.display(),
                    copied = r.copied,
                    excluded = r.excluded,
                    failed = r.failures.len(),
                    "Wrote {}",
                    r.output.display()
                );
                report.stripped.push(r);
            }
            Ok(FileOutcome::SkippedExisting { source, .. }) => report.skipped.push(source),
            Err(e) => {
                error!(code = e.code(), file = %input.display(), "failed to process {}: {e}", input.display());
                report.failed.push(FailedFile {
                    source: input.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    report
}
