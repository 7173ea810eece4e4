//! Backing files for the queue and the admin record.
//!
//! Writes go to a sibling `.tmp` file which is fsynced and renamed over
//! the target, so a crash mid-write never leaves a truncated file behind.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::compliments::error::PersistError;

/// Whole-file storage for one piece of state.
pub trait StateFile: Send {
    /// Read the full contents. A missing file is `None`, not an error.
    fn read(&self) -> Result<Option<String>, PersistError>;

    /// Replace the full contents.
    fn write(&self, contents: &str) -> Result<(), PersistError>;

    /// Delete the file. Deleting a missing file succeeds.
    fn remove(&self) -> Result<(), PersistError>;
}

/// File on disk replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: std::io::Error) -> PersistError {
        PersistError::Io { path: self.path.clone(), source }
    }

    fn write_once(&self, contents: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path).map_err(|e| self.io_err(e))?;
            file.write_all(contents.as_bytes()).map_err(|e| self.io_err(e))?;
            file.sync_all().map_err(|e| self.io_err(e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.io_err(e)
        })
    }
}

impl StateFile for AtomicFile {
    fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), PersistError> {
        match self.write_once(contents) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Write to {:?} failed, retrying once: {e}", self.path);
                self.write_once(contents)
            }
        }
    }

    fn remove(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// In-memory `StateFile` whose writes can be made to fail.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryFile {
    contents: std::sync::Arc<std::sync::Mutex<Option<String>>>,
    fail_writes: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl MemoryFile {
    pub fn with_contents(contents: &str) -> Self {
        let file = Self::default();
        *file.contents.lock().unwrap() = Some(contents.to_string());
        file
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), PersistError> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PersistError::Io {
                path: PathBuf::from("memory"),
                source: std::io::Error::other("disk full"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
impl StateFile for MemoryFile {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<(), PersistError> {
        self.check_writable()?;
        *self.contents.lock().unwrap() = Some(contents.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), PersistError> {
        self.check_writable()?;
        *self.contents.lock().unwrap() = None;
        Ok(())
    }
}
