//! Exclusive run lock.
//!
//! Held for the duration of one selection run so two runs never screen the
//! same snapshot at once. The lock is advisory and released on drop.

use crate::domain::error::ScreenerError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Fails with [`ScreenerError::RunLocked`] if another process holds it.
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self, ScreenerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| ScreenerError::RunLocked {
                path: path.display().to_string(),
            })?;
        debug!(path = %path.display(), "run lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mainline.lock");

        let held = RunLock::acquire(&path).unwrap();
        assert_eq!(held.path(), path.as_path());
        let err = RunLock::acquire(&path).unwrap_err();
        assert!(matches!(err, ScreenerError::RunLocked { .. }));
    }

    #[test]
    fn released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mainline.lock");

        drop(RunLock::acquire(&path).unwrap());
        assert!(RunLock::acquire(&path).is_ok());
    }
}
