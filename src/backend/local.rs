//! Local Filesystem Backend
//!
//! Copies files already reachable through the local filesystem. Also used
//! by the cache for the final cached-copy-to-destination transfer.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::errors::TransferError;
use super::registry::Transfer;

/// Transfer backend for `file://` URIs and bare local paths
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a local path from either a bare path or a file:// URI
    fn resolve_path(remote: &str) -> PathBuf {
        PathBuf::from(remote.strip_prefix("file://").unwrap_or(remote))
    }
}

/// Classify a local i/o failure against the path that produced it
fn classify(remote: &str, e: io::Error) -> TransferError {
    match e.kind() {
        io::ErrorKind::NotFound => TransferError::NotFound(remote.to_string()),
        io::ErrorKind::PermissionDenied => TransferError::Denied(remote.to_string()),
        _ => TransferError::Io(e),
    }
}

impl Transfer for LocalBackend {
    fn fetch(&self, remote: &str, dest: &Path) -> Result<(), TransferError> {
        let source = Self::resolve_path(remote);
        let mut reader = File::open(&source).map_err(|e| classify(remote, e))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write through a temp file so a failed copy never leaves a
        // partial destination
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        let bytes = io::copy(&mut reader, &mut tmp)?;
        tmp.persist(dest).map_err(|e| TransferError::Io(e.error))?;

        debug!(
            source = %source.display(),
            dest = %dest.display(),
            bytes = bytes,
            "Copied local file"
        );
        Ok(())
    }

    fn last_modified(&self, remote: &str) -> Result<SystemTime, TransferError> {
        let source = Self::resolve_path(remote);
        let metadata = fs::metadata(&source).map_err(|e| classify(remote, e))?;
        Ok(metadata.modified()?)
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}
