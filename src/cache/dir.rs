//! Cache Root Bootstrap
//!
//! Resolves and creates the on-disk cache root before the cache starts
//! serving requests.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::info;

use super::errors::FetchError;

/// Resolve the cache root, creating the directory tree if absent.
///
/// Accepts a plain filesystem path or a file:// URI. Fails with a
/// configuration error when the location cannot be created or does not
/// resolve to a directory.
pub fn ensure_cache_dir(location: &str) -> Result<PathBuf, FetchError> {
    let path = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));

    let configuration = |source: io::Error| FetchError::Configuration {
        path: location.to_string(),
        source,
    };

    fs::create_dir_all(&path).map_err(configuration)?;
    let resolved = path.canonicalize().map_err(configuration)?;
    if !resolved.is_dir() {
        return Err(configuration(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    info!(cache_dir = %resolved.display(), "Cache root ready");
    Ok(resolved)
}

/// Default cache root under the platform cache directory
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("filestage")
}
