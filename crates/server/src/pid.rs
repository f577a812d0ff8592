//! PidGuard — single-instance lock via a pid file and a signal-0 liveness
//! probe.
//!
//! Unlike an advisory `flock`, this is exactly what the protocol says: read
//! whatever pid is already on disk, ask the kernel (via signal 0) whether
//! that process still exists, and only then decide whether to proceed.

use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PidError {
    #[error("another instance is already running (pid {0})")]
    AlreadyRunning(i32),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct PidGuard {
    path: PathBuf,
    released: bool,
}

impl PidGuard {
    /// Acquires the lock at `path`, creating its parent directory (`0755`)
    /// if needed. Fails with [`PidError::AlreadyRunning`] if the pid
    /// currently recorded there is still alive.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, PidError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
            std::fs::set_permissions(parent, Permissions::from_mode(0o755))?;
        }

        if let Some(existing) = read_pid(&path) {
            if is_alive(existing) {
                return Err(PidError::AlreadyRunning(existing));
            }
            let _ = std::fs::remove_file(&path);
        }

        std::fs::write(&path, std::process::id().to_string())?;
        std::fs::set_permissions(&path, Permissions::from_mode(0o644))?;

        Ok(Self { path, released: false })
    }

    /// Deletes the pid file. Best-effort: absence is not an error.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
            self.released = true;
        }
    }
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

fn read_pid(path: &Path) -> Option<i32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Signal 0 sends no actual signal; the kernel still validates that the
/// pid exists and is reachable, which is the portable liveness probe. A
/// permission error means the process exists but is owned by someone
/// else, so it counts as alive.
fn is_alive(pid: i32) -> bool {
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_writes_current_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        let guard = PidGuard::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, std::process::id().to_string());
        guard.release();
    }

    #[test]
    fn release_removes_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        let guard = PidGuard::acquire(&path).unwrap();
        guard.release();
        assert!(!path.exists());
    }

    #[test]
    fn stale_pid_is_recovered_and_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        // A pid essentially guaranteed not to be alive on this host.
        std::fs::write(&path, "999999").unwrap();
        let guard = PidGuard::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, std::process::id().to_string());
        guard.release();
    }

    #[test]
    fn acquire_fails_when_current_process_pid_is_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        std::fs::write(&path, std::process::id().to_string()).unwrap();
        let err = PidGuard::acquire(&path).unwrap_err();
        assert!(matches!(err, PidError::AlreadyRunning(_)));
    }

    #[test]
    fn directory_is_created_with_expected_permissions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/state/daemon.pid");
        let guard = PidGuard::acquire(&path).unwrap();
        let mode = std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
        guard.release();
    }
}
