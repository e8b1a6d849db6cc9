//! Startup helpers.
//!
//! # Responsibilities
//! - Record the process ID for chaos tooling that kills or pauses the service
//! - Remove it again on orderly exit

use std::fs;
use std::path::{Path, PathBuf};

/// A written PID file, removed when dropped.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove PID file");
        }
    }
}

/// Write the current process ID to `path`.
pub fn write_pid_file(path: &Path) -> std::io::Result<PidFile> {
    fs::write(path, std::process::id().to_string())?;
    tracing::info!(path = %path.display(), pid = std::process::id(), "PID file written");
    Ok(PidFile {
        path: path.to_path_buf(),
    })
}
