//! Process lock file
//!
//! Only one engine may write the tender stores at a time; a second instance
//! on the same data directory would also fail to open sled.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// PID lock held for the lifetime of the engine process
#[derive(Debug)]
pub struct ProcessLock {
    lock_path: PathBuf,
    owned: bool,
}

impl ProcessLock {
    const LOCK_FILE_NAME: &'static str = ".tender-engine.lock";

    /// Acquire the lock for `data_dir`, creating the directory if needed.
    ///
    /// Fails if a live engine process already holds it. Stale locks left by
    /// a crashed process are removed.
    pub fn acquire<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let lock_path = data_dir.join(Self::LOCK_FILE_NAME);

        if lock_path.exists() {
            match Self::holder_pid(&lock_path) {
                Ok(Some(pid)) => {
                    bail!(
                        "Another tender engine is already running (PID: {pid})\n\
                         If no other instance is running, remove the stale lock file: {}",
                        lock_path.display()
                    );
                }
                Ok(None) => {
                    tracing::info!(path = %lock_path.display(), "Removing stale lock file");
                    fs::remove_file(&lock_path).context("Failed to remove stale lock file")?;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Unreadable lock file, replacing it");
                    let _ = fs::remove_file(&lock_path);
                }
            }
        }

        let pid = std::process::id();
        fs::write(&lock_path, format!("{pid}\n"))
            .with_context(|| format!("Failed to write lock file: {}", lock_path.display()))?;

        tracing::debug!(pid, path = %lock_path.display(), "Acquired process lock");

        Ok(Self {
            lock_path,
            owned: true,
        })
    }

    /// PID of a live holder, `None` for a stale lock
    fn holder_pid(lock_path: &Path) -> Result<Option<u32>> {
        let contents = fs::read_to_string(lock_path).context("Failed to read lock file")?;
        let pid: u32 = contents
            .trim()
            .parse()
            .context("Failed to parse PID from lock file")?;

        Ok(Self::is_engine_process(pid).then_some(pid))
    }

    #[cfg(unix)]
    fn is_engine_process(pid: u32) -> bool {
        fs::read_to_string(format!("/proc/{pid}/cmdline"))
            .map(|cmdline| cmdline.contains("tender-engine") || cmdline.contains("tender_engine"))
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_engine_process(_pid: u32) -> bool {
        true
    }

    /// Release the lock (also done on drop)
    pub fn release(&mut self) {
        if self.owned {
            if let Err(e) = fs::remove_file(&self.lock_path) {
                tracing::warn!(error = %e, "Failed to remove lock file");
            }
            self.owned = false;
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_acquire_writes_pid() {
        let dir = tempdir().unwrap();
        let lock = ProcessLock::acquire(dir.path()).unwrap();
        let pid: u32 = fs::read_to_string(lock.path()).unwrap().trim().parse().unwrap();
        assert_eq!(pid, std::process::id());
    }

    #[test]
    fn test_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = {
            let lock = ProcessLock::acquire(dir.path()).unwrap();
            lock.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_lock_replaced() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(ProcessLock::LOCK_FILE_NAME), "999999999\n").unwrap();
        let lock = ProcessLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());
    }

    #[test]
    fn test_garbage_lock_replaced() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(ProcessLock::LOCK_FILE_NAME), "not a pid").unwrap();
        assert!(ProcessLock::acquire(dir.path()).is_ok());
    }
}
