//! Advisory file locking around the chat history file.
//!
//! Uses flock() so a one-shot `qabot ask` and a running daemon never
//! interleave their read-modify-write cycles on `chat_history.json`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// A held file lock that releases on drop
pub struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock on `lock_path`, blocking until available.
    pub fn acquire_blocking(lock_path: &Path) -> io::Result<Self> {
        let file = Self::open(lock_path)?;
        Self::lock_exclusive(&file)?;
        Ok(FileLock { file })
    }

    fn open(lock_path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
    }

    #[cfg(unix)]
    fn lock_exclusive(file: &File) -> io::Result<()> {
        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    // No cross-process locking off unix; the in-process mutex still applies.
    #[cfg(not(unix))]
    fn lock_exclusive(_file: &File) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for FileLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        unsafe { libc::flock(fd, libc::LOCK_UN) };
    }
}
