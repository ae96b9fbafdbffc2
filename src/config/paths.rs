//! Config file location and symlink checks.

use dirs::config_dir;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

/// OS-appropriate default config path (`<config dir>/h5strip/config.xml`).
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(mut base) = config_dir() {
        base.push("h5strip");
        base.push("config.xml");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("h5strip")
                .join("config.xml")
        })
    }
}

/// Where the config file is looked up, and whether it was asked for explicitly.
///
/// Order: `explicit` (the `--config` flag), then `$H5STRIP_CONFIG`, then the
/// OS default. An explicit location that does not exist is an error for the
/// caller; a missing default just means "use defaults".
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(p) = explicit {
        return Some((p.to_path_buf(), true));
    }
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some((PathBuf::from(p), true));
    }
    default_config_path().map(|p| (p, false))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    for anc in path.ancestors().skip(1) {
        if anc.as_os_str().is_empty() || !anc.exists() {
            continue;
        }
        if fs::symlink_metadata(anc)?.file_type().is_symlink() {
            return Ok(true);
        }
    }
    Ok(false)
}
