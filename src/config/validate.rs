//! Config validation.
//! Runs before any input file is opened: the output folder must be a writable
//! directory (created if missing) and the selected format must be built in.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::types::Config;

impl Config {
    /// Validate the output folder and format. Creates `out_folder` if missing.
    pub fn validate(&self) -> Result<()> {
        if !self.format.is_available() {
            bail!(
                "format '{}' is not available in this build (rebuild with --features {})",
                self.format,
                self.format
            );
        }

        let out = &self.out_folder;
        ensure_dir_is_or_create(out, "out_folder")?;
        ensure_writable(out, "out_folder")?;

        info!(
            "Config validated: out_folder='{}' format={} skip={:?} force={}",
            out.display(),
            self.format,
            if self.no_skip { &[][..] } else { &self.skip_list[..] },
            self.force
        );
        Ok(())
    }
}

/// Ensure directory exists (create if missing). If exists, it must be a directory.
fn ensure_dir_is_or_create(path: &Path, name: &str) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            error!("{name} exists but isn't a directory: {}", path.display());
            bail!("{name} exists but isn't a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create {name} directory '{}'", path.display()))?;
        info!("Created {name} directory: {}", path.display());
    }
    Ok(())
}

/// Ensure directory is writable using a non-destructive probe file.
fn ensure_writable(path: &Path, name: &str) -> Result<()> {
    let probe = path.join(format!(".h5strip_probe_{}.tmp", std::process::id()));
    fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&probe)
        .with_context(|| format!("Cannot write to {name} '{}'; check permissions", path.display()))?;
    let _ = fs::remove_file(&probe);
    debug!("{name} writable: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn creates_missing_out_folder() {
        let temp = assert_fs::TempDir::new().unwrap();
        let out = temp.child("nested").child("out");
        let cfg = Config {
            format: crate::store::Format::Tree,
            ..Config::new(out.path())
        };
        cfg.validate().unwrap();
        assert!(out.path().is_dir());
        // probe file cleaned up
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn rejects_file_as_out_folder() {
        let temp = assert_fs::TempDir::new().unwrap();
        let f = temp.child("file.txt");
        f.write_str("x").unwrap();
        let cfg = Config {
            format: crate::store::Format::Tree,
            ..Config::new(f.path())
        };
        assert!(cfg.validate().is_err());
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn rejects_unavailable_format() {
        let temp = assert_fs::TempDir::new().unwrap();
        let cfg = Config {
            format: crate::store::Format::Hdf5,
            ..Config::new(temp.path())
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("hdf5"));
    }
}
