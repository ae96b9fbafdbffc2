//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::DEFAULT_SKIP_LIST;
use crate::errors::StripError;
use crate::pattern::{PatternSyntax, SkipMatcher};
use crate::store::Format;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Progress, timing and failure notices (default)
    #[default]
    Normal,
    /// Per-file details
    Info,
    /// Per-node decisions
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for a strip run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory receiving `<stem>.stripped.<ext>` files
    pub out_folder: PathBuf,
    /// Skip patterns; ignored when `no_skip` is set
    pub skip_list: Vec<String>,
    /// Keep every dataset regardless of `skip_list`
    pub no_skip: bool,
    /// Treat patterns as plain substrings instead of regexes
    pub literal: bool,
    /// Overwrite existing stripped outputs
    pub force: bool,
    /// Container format to read and write
    pub format: Format,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_folder: PathBuf::from("."),
            skip_list: DEFAULT_SKIP_LIST.iter().map(|s| s.to_string()).collect(),
            no_skip: false,
            literal: false,
            force: false,
            format: Format::default(),
            log_level: LogLevel::Normal,
            log_file: None,
        }
    }
}

impl Config {
    /// Construct a Config writing into `out_folder`; other fields use defaults.
    pub fn new(out_folder: impl Into<PathBuf>) -> Self {
        Self {
            out_folder: out_folder.into(),
            ..Default::default()
        }
    }

    pub fn pattern_syntax(&self) -> PatternSyntax {
        if self.literal {
            PatternSyntax::Literal
        } else {
            PatternSyntax::Regex
        }
    }

    /// Compile the skip matcher for this run.
    pub fn matcher(&self) -> Result<SkipMatcher, StripError> {
        if self.no_skip {
            return Ok(SkipMatcher::MatchAll);
        }
        SkipMatcher::from_patterns(&self.skip_list, self.pattern_syntax())
    }
}
