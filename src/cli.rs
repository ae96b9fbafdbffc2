//! CLI definition and parsing.
//!
//! Notes:
//! - Flags override values from the XML config file.
//! - `--out_folder` and `--skip_list` are accepted as aliases of the
//!   dashed spellings.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::parse_skip_list;
use crate::config::types::{Config, LogLevel};
use crate::store::Format;

/// Strip bulky detector datasets from hierarchical data files.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Copy hierarchical data files while skipping bulky detector datasets"
)]
pub struct Args {
    /// Input file, or a directory whose files with the format's extension are all processed.
    #[arg(
        short = 'i',
        long,
        value_name = "PATH",
        value_hint = ValueHint::AnyPath,
        required_unless_present = "print_config"
    )]
    pub input: Option<PathBuf>,

    /// Where to put the stripped files (default: current directory).
    #[arg(long, alias = "out_folder", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub out_folder: Option<PathBuf>,

    /// Comma-separated patterns; datasets whose path contains any of them are skipped.
    #[arg(
        long,
        alias = "skip_list",
        value_name = "PATTERNS",
        conflicts_with = "no_skip",
        help = "Comma-separated skip patterns [default: CsPad,Camera]"
    )]
    pub skip_list: Option<String>,

    /// Copy every dataset.
    #[arg(long)]
    pub no_skip: bool,

    /// Treat patterns as plain substrings rather than regular expressions.
    #[arg(long)]
    pub literal: bool,

    /// Overwrite stripped files that already exist.
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Container format: hdf5 or tree.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<Format>,

    /// Read settings from this XML file instead of $H5STRIP_CONFIG or the default location.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Also append logs to this file.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the config file location and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Input path with stray surrounding quotes removed (shell/CMD quoting mistakes).
    pub fn resolved_input(&self) -> Option<PathBuf> {
        self.input.as_deref().map(sanitize_path)
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config value).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.clone()
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(dir) = &self.out_folder {
            cfg.out_folder = sanitize_path(dir);
        }
        if let Some(list) = &self.skip_list {
            cfg.skip_list = parse_skip_list(list);
            cfg.no_skip = false;
        }
        if self.no_skip {
            cfg.no_skip = true;
        }
        if self.literal {
            cfg.literal = true;
        }
        if self.force {
            cfg.force = true;
        }
        if let Some(format) = self.format {
            cfg.format = format;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(file) = &self.log_file {
            cfg.log_file = Some(file.clone());
        }
    }
}

fn sanitize_path(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    let trimmed = s.trim();
    let inner = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    PathBuf::from(inner)
}

pub fn parse() -> Args {
    Args::parse()
}
