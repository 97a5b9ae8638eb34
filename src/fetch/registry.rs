//! Temp-storage bookkeeping for fetched files.
//!
//! Hosts that sweep their scratch directory want to know which files a fetch
//! produced. Registration is a notification only: the fetch has already
//! succeeded, so a failing registry is logged and otherwise ignored.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

/// Error returned by a [`TempFileRegistry`] that could not record a file.
#[derive(Debug, Error)]
#[error("temp file registration failed for {path}: {reason}")]
pub struct RegistryError {
    /// The file that was being registered.
    pub path: PathBuf,
    /// Why registration failed.
    pub reason: String,
}

/// Host-side bookkeeping of scratch files.
pub trait TempFileRegistry: Send + Sync {
    /// Records that `path` now exists and belongs to the host's temp storage.
    ///
    /// # Errors
    ///
    /// Implementations may fail; [`notify_registry`] swallows the error.
    fn register(&self, path: &Path) -> Result<(), RegistryError>;
}

/// Registry that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRegistry;

impl TempFileRegistry for NoopRegistry {
    fn register(&self, _path: &Path) -> Result<(), RegistryError> {
        Ok(())
    }
}

/// Registry that remembers every path so the owner can sweep them later.
#[derive(Debug, Default)]
pub struct TrackedTempFiles {
    paths: Mutex<Vec<PathBuf>>,
}

impl TrackedTempFiles {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of registered paths, in registration order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Deletes every registered file that still exists and forgets all paths.
    ///
    /// Returns the number of files removed.
    pub fn cleanup(&self) -> usize {
        let drained: Vec<PathBuf> = self
            .paths
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .drain(..)
            .collect();

        let mut removed = 0;
        for path in drained {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove tracked temp file");
                }
            }
        }
        removed
    }
}

impl TempFileRegistry for TrackedTempFiles {
    fn register(&self, path: &Path) -> Result<(), RegistryError> {
        self.paths
            .lock()
            .map_err(|_| RegistryError {
                path: path.to_path_buf(),
                reason: "tracker lock poisoned".to_string(),
            })?
            .push(path.to_path_buf());
        Ok(())
    }
}

/// Fire-and-forget registration. Failures are logged and deliberately dropped.
pub(crate) fn notify_registry(registry: &dyn TempFileRegistry, path: &Path) {
    match registry.register(path) {
        Ok(()) => debug!(path = %path.display(), "registered temp file"),
        Err(e) => warn!(error = %e, "ignoring temp file registration failure"),
    }
}
