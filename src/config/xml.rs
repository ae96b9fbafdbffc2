//! XML configuration support.
//!
//! Uses quick-xml + serde to parse a simple <config> file:
//! <config>
//!   <out_folder>/data/stripped</out_folder>
//!   <skip_list>CsPad,Camera</skip_list>
//!   <literal>false</literal>
//!   <no_skip>false</no_skip>
//!   <format>hdf5</format>
//!   <log_level>normal</log_level>
//!   <log_file>/var/log/h5strip.log</log_file>
//! </config>
//!
//! Unknown elements are rejected so typos surface instead of being ignored.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::parse_skip_list;
use super::paths::resolve_config_path;
use super::types::{Config, LogLevel};
use crate::store::Format;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    out_folder: Option<String>,
    skip_list: Option<String>,
    literal: Option<bool>,
    no_skip: Option<bool>,
    format: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Map XmlConfig onto defaults
fn xml_to_config(parsed: XmlConfig, path: &Path) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(dir) = non_blank(parsed.out_folder) {
        cfg.out_folder = PathBuf::from(dir);
    }
    if let Some(list) = non_blank(parsed.skip_list) {
        cfg.skip_list = parse_skip_list(&list);
    }
    cfg.literal = parsed.literal.unwrap_or(false);
    cfg.no_skip = parsed.no_skip.unwrap_or(false);
    if let Some(name) = non_blank(parsed.format) {
        cfg.format = match Format::parse(&name) {
            Some(f) => f,
            None => bail!("invalid <format> '{name}' in {}", path.display()),
        };
    }
    if let Some(level) = non_blank(parsed.log_level) {
        cfg.log_level = match LogLevel::parse(&level) {
            Some(l) => l,
            None => bail!("invalid <log_level> '{level}' in {}", path.display()),
        };
    }
    cfg.log_file = non_blank(parsed.log_file).map(PathBuf::from);

    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed, path)
}

/// Resolve and load the config file, falling back to defaults when the
/// default location has no file. An explicitly named file must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let Some((path, is_explicit)) = resolve_config_path(explicit) else {
        return Ok(Config::default());
    };
    if !path.exists() {
        if is_explicit {
            bail!("config file not found: {}", path.display());
        }
        debug!("No config file at {}; using defaults", path.display());
        return Ok(Config::default());
    }
    debug!("Loading config from {}", path.display());
    load_config_from_xml_path(&path)
}
