//! Exclusive run lock
//!
//! Only one update run may execute at a time: the staged store and the
//! commit passes are not safe against interleaving. The lock is a
//! non-blocking exclusive `flock(2)` on `<stateDir>/.lock`, taken
//! through the `nix` crate's safe wrapper and held for the whole run.
//! `flock` rather than fcntl record locks: record locks do not conflict
//! between descriptors of one process, and the run lock must also
//! exclude a second updater inside the same process.

use crate::errors::{fs_error, lock_held, Result};
use crate::paths::StateDir;
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;

/// Guard holding the exclusive state-directory lock. The lock releases
/// when the guard drops (including on panic unwind).
#[derive(Debug)]
pub struct RunLock {
    _lock: Flock<File>,
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock, failing fast if another run holds it.
    ///
    /// ## Errors
    ///
    /// - `UpdErrorKind::Concurrency` when the lock is already held
    /// - `UpdErrorKind::Filesystem` when the lock file cannot be created
    ///   or the lock call itself fails
    pub fn acquire(state: &StateDir) -> Result<RunLock> {
        state.ensure_root()?;
        let path = state.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| fs_error("run_lock_open", &path, e))?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                tracing::debug!(path = %path.display(), "acquired run lock");
                Ok(RunLock { _lock: lock, path })
            }
            Err((_, Errno::EACCES | Errno::EAGAIN)) => Err(lock_held(&path)),
            Err((_, errno)) => Err(fs_error(
                "run_lock",
                &path,
                std::io::Error::from_raw_os_error(errno as i32),
            )),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // the Flock guard does the unlocking; this is the matching event
        tracing::debug!(path = %self.path.display(), "released run lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rswupd_core::errors::UpdErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_lock_file() {
        let tmp = TempDir::new().unwrap();
        let state = StateDir::new(tmp.path().join("state"));

        let _guard = RunLock::acquire(&state).unwrap();
        assert!(state.lock_path().exists());
    }

    #[test]
    fn test_second_acquire_fails_fast() {
        let tmp = TempDir::new().unwrap();
        let state = StateDir::new(tmp.path().join("state"));

        let _guard = RunLock::acquire(&state).unwrap();
        let err = RunLock::acquire(&state).unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Concurrency);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let tmp = TempDir::new().unwrap();
        let state = StateDir::new(tmp.path().join("state"));

        drop(RunLock::acquire(&state).unwrap());
        let reacquired = RunLock::acquire(&state);
        assert!(reacquired.is_ok());
    }
}
