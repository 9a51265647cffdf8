//! Backend Capability Lookup
//!
//! Maps URI schemes to the transfer backend able to fetch files for them.
//! The cache stays scheme-agnostic; supporting a new remote source type
//! only requires registering another backend here.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use super::errors::TransferError;
use super::http::HttpBackend;
use super::local::LocalBackend;

/// Scheme assumed for paths without a `scheme://` prefix
const DEFAULT_SCHEME: &str = "file";

/// A capability able to move bytes for one class of remote paths
pub trait Transfer: Send + Sync {
    /// Fetch the remote file and place its bytes at `dest`.
    ///
    /// Implementations must write atomically: a failed fetch leaves no
    /// file at `dest`.
    fn fetch(&self, remote: &str, dest: &Path) -> Result<(), TransferError>;

    /// Report the remote file's last modification time
    fn last_modified(&self, remote: &str) -> Result<SystemTime, TransferError>;
}

/// Extract the URI scheme of a remote path ("s3://bucket/x" -> "s3").
/// Paths without a scheme are treated as local files.
pub fn scheme_of(path: &str) -> &str {
    match path.find("://") {
        Some(idx) if idx > 0 => &path[..idx],
        _ => DEFAULT_SCHEME,
    }
}

/// Scheme-keyed registry of transfer backends
pub struct BackendRegistry {
    /// Registered backends by lowercase URI scheme
    backends: HashMap<String, Arc<dyn Transfer>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registry with the built-in backends: local files and HTTP(S)
    pub fn with_defaults() -> Result<Self, TransferError> {
        let mut registry = Self::new();
        registry.register("file", Arc::new(LocalBackend::new()));
        let http = Arc::new(HttpBackend::new()?);
        registry.register("http", http.clone());
        registry.register("https", http);
        Ok(registry)
    }

    /// Register a backend for a URI scheme, replacing any previous one
    pub fn register(&mut self, scheme: &str, backend: Arc<dyn Transfer>) {
        self.backends.insert(scheme.to_ascii_lowercase(), backend);
    }

    /// Look up the backend able to fetch the given remote path
    pub fn resolve(&self, path: &str) -> Option<Arc<dyn Transfer>> {
        self.backends
            .get(&scheme_of(path).to_ascii_lowercase())
            .cloned()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
