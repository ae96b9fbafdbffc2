//! Platform helpers for the log file.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// Open `path` for appending, creating it (and its parent) if needed.
/// New files get mode 0600 on Unix; existing files keep their permissions.
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}
