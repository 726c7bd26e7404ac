//! Table Locks
//!
//! The capability an `EntryStore` needs from its environment to be safe with
//! more than one writer. Three flavours:
//! - `NoLock`: nothing is locked (single writer)
//! - `MutexLock`: a process-local mutex shared by all handles of a table
//! - `LockFile`: an exclusive `flock` on a `.lock` file in the table
//!   directory; acquisition fails fast while another holder has it. The
//!   kernel drops the lock when its holder exits, so a crashed writer never
//!   leaves the table locked. The file itself stays behind between uses.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};

use crate::error::{FlatDbError, Result};

/// Lock scoped to a single table
pub trait TableLock: Send + Sync + fmt::Debug {
    /// Acquire the lock; it is released when the guard drops
    fn acquire(&self) -> Result<TableGuard<'_>>;
}

/// Held lock on a table
#[must_use = "the table is unlocked as soon as the guard is dropped"]
pub struct TableGuard<'a> {
    _kind: GuardKind<'a>,
}

// Variants are held only for their Drop
#[allow(dead_code)]
enum GuardKind<'a> {
    Unlocked,
    Mutex(MutexGuard<'a, ()>),
    File(LockFileGuard),
}

impl TableGuard<'_> {
    /// Guard that holds nothing
    pub fn unlocked() -> Self {
        Self {
            _kind: GuardKind::Unlocked,
        }
    }
}

// =============================================================================
// NoLock
// =============================================================================

/// No locking at all
#[derive(Debug, Default)]
pub struct NoLock;

impl TableLock for NoLock {
    fn acquire(&self) -> Result<TableGuard<'_>> {
        Ok(TableGuard::unlocked())
    }
}

// =============================================================================
// MutexLock
// =============================================================================

/// Process-local mutex; blocks until the current holder is done
#[derive(Debug, Default)]
pub struct MutexLock {
    inner: Mutex<()>,
}

impl MutexLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableLock for MutexLock {
    fn acquire(&self) -> Result<TableGuard<'_>> {
        Ok(TableGuard {
            _kind: GuardKind::Mutex(self.inner.lock()),
        })
    }
}

// =============================================================================
// LockFile
// =============================================================================

/// Advisory lock file inside the table directory
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Lock file name; not a decimal id, so id scans skip it
    pub const FILENAME: &'static str = ".lock";

    pub fn new(table_dir: &Path) -> Self {
        Self {
            path: table_dir.join(Self::FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableLock for LockFile {
    fn acquire(&self) -> Result<TableGuard<'_>> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;

        match try_lock_exclusive(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                return Err(FlatDbError::TableLocked(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        // Holder pid, for whoever wonders who has the table
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        Ok(TableGuard {
            _kind: GuardKind::File(LockFileGuard {
                file,
                path: self.path.clone(),
            }),
        })
    }
}

struct LockFileGuard {
    file: File,
    path: PathBuf,
}

impl Drop for LockFileGuard {
    fn drop(&mut self) {
        // Closing the file releases the lock too; unlock explicitly so a
        // failure is at least logged
        if let Err(e) = unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock file");
        }
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and open for this call
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        // EWOULDBLOCK maps to ErrorKind::WouldBlock
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn unlock(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: as above
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> io::Result<()> {
    Err(io::Error::new(
        ErrorKind::Unsupported,
        "lock files need flock(2), which this platform lacks",
    ))
}

#[cfg(not(unix))]
fn unlock(_file: &File) -> io::Result<()> {
    Ok(())
}
