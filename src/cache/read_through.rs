//! Read-Through File Cache
//!
//! Serves remote files out of a local on-disk cache. Loads on miss with
//! single-flight semantics per key, re-validates cached copies against the
//! remote modification time, and refreshes stale entries behind a single
//! cache-wide lock.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use moka::sync::Cache;
use tracing::{debug, info, warn};

use crate::backend::{BackendRegistry, LocalBackend, Transfer};

use super::dir::ensure_cache_dir;
use super::errors::FetchError;
use super::key::derive_key;
use super::stats::{CacheStats, StatsSnapshot};

/// Read-through cache mapping remote paths to local file copies
pub struct ReadThroughCache {
    /// Root directory holding the cached files, one per remote path
    root: PathBuf,
    /// Scheme-keyed lookup of transfer backends
    backends: BackendRegistry,
    /// Local copy primitive for the final cached-file-to-destination step
    local: LocalBackend,
    /// Remote path -> cached file path; loads are single-flight per key
    entries: Cache<String, PathBuf>,
    /// Guards invalidation: delete-and-reload of a stale entry is
    /// exclusive across the whole cache, not per key
    refresh_lock: Mutex<()>,
    /// Aggregate hit/miss/load counters
    stats: CacheStats,
}

impl ReadThroughCache {
    /// Create a cache rooted at `location` (a path or file:// URI).
    ///
    /// The directory tree is created if absent; an unusable location is a
    /// fatal configuration error.
    pub fn new(location: &str, backends: BackendRegistry) -> Result<Self, FetchError> {
        let root = ensure_cache_dir(location)?;

        // Unbounded and without TTL: entries live for the process unless a
        // staleness check invalidates them
        let entries = Cache::builder().name("file_cache").build();

        Ok(Self {
            root,
            backends,
            local: LocalBackend::new(),
            entries,
            refresh_lock: Mutex::new(()),
            stats: CacheStats::default(),
        })
    }

    /// Materialize `remote` at `dest`.
    ///
    /// Resolves the remote path to a fresh local cached file, loading or
    /// refreshing it as needed, then copies the cached bytes to `dest`.
    /// The destination is never left partially written.
    pub fn materialize(&self, remote: &str, dest: &Path) -> Result<(), FetchError> {
        debug!(remote = remote, dest = %dest.display(), "Materialize requested");
        let cached = self.fresh_local_copy(remote)?;

        self.local
            .fetch(&cached.to_string_lossy(), dest)
            .map_err(|source| FetchError::Transfer {
                path: dest.display().to_string(),
                source,
            })
    }

    /// Load (or refresh) the cache entry for `remote` without copying it
    /// anywhere
    pub fn warm(&self, remote: &str) -> Result<(), FetchError> {
        self.fresh_local_copy(remote).map(|_| ())
    }

    /// Snapshot of the aggregate cache counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Log cache counters at debug level
    pub fn log_stats(&self) {
        self.stats.log();
    }

    /// Resolve `remote` to a cached file that is present and fresh
    fn fresh_local_copy(&self, remote: &str) -> Result<PathBuf, FetchError> {
        let result = match self.entries.get(remote) {
            None => {
                self.stats.record_miss();
                debug!(remote = remote, "File cache MISS");
                self.load(remote)
            }
            Some(_) => {
                self.stats.record_hit();
                debug!(remote = remote, "File cache HIT");
                // Re-acquire through the loading accessor so a concurrent
                // invalidation cannot hand us a half-installed entry
                match self.load(remote) {
                    Ok(cached) => self.validate(remote, cached),
                    Err(e) => Err(e),
                }
            }
        };

        result.map_err(|source| FetchError::Fetch {
            path: remote.to_string(),
            source,
        })
    }

    /// Single-flight accessor: at most one load per key runs at a time;
    /// concurrent callers wait for it and share its result
    fn load(&self, remote: &str) -> Result<PathBuf, Arc<FetchError>> {
        self.entries
            .try_get_with(remote.to_string(), || self.load_file(remote))
    }

    /// Loader: compute the canonical cache path for `remote` and fetch the
    /// remote bytes into it unless a copy is already on disk
    fn load_file(&self, remote: &str) -> Result<PathBuf, FetchError> {
        self.stats.record_load();
        match self.fetch_into_cache(remote) {
            Ok(path) => Ok(path),
            Err(e) => {
                self.stats.record_load_error();
                warn!(remote = remote, error = %e, "Cache load failed");
                Err(e)
            }
        }
    }

    fn fetch_into_cache(&self, remote: &str) -> Result<PathBuf, FetchError> {
        let cache_file = self.root.join(derive_key(remote));

        if cache_file.exists() {
            // Layout is deterministic, so a file left by a previous
            // process is the right bytes for this path
            debug!(
                remote = remote,
                cached = %cache_file.display(),
                "Reusing cache file from disk"
            );
            return Ok(cache_file);
        }

        let backend = self.backend_for(remote)?;
        backend
            .fetch(remote, &cache_file)
            .map_err(|source| FetchError::Transfer {
                path: remote.to_string(),
                source,
            })?;

        info!(
            remote = remote,
            cached = %cache_file.display(),
            "Fetched remote file into cache"
        );
        Ok(cache_file)
    }

    fn backend_for(&self, remote: &str) -> Result<Arc<dyn Transfer>, FetchError> {
        self.backends
            .resolve(remote)
            .ok_or_else(|| FetchError::NoBackend {
                path: remote.to_string(),
            })
    }

    /// Staleness check: compare the remote's modification time (queried
    /// fresh on every hit) against the cached file's mtime, refreshing the
    /// entry when the remote is strictly newer.
    fn validate(&self, remote: &str, cached: PathBuf) -> Result<PathBuf, Arc<FetchError>> {
        let backend = self.backend_for(remote).map_err(Arc::new)?;
        let remote_mtime =
            backend
                .last_modified(remote)
                .map_err(|source| {
                    Arc::new(FetchError::Transfer {
                        path: remote.to_string(),
                        source,
                    })
                })?;

        if !is_stale(remote_mtime, &cached) {
            return Ok(cached);
        }

        let _guard = self.refresh_lock.lock().unwrap();

        // Re-check under the lock: a thread that waited here may find the
        // entry already refreshed by whoever held the lock first
        if !is_stale(remote_mtime, &cached) {
            return Ok(cached);
        }

        info!(remote = remote, "Cached copy is stale, refreshing");
        self.entries.invalidate(remote);
        match fs::remove_file(&cached) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Arc::new(FetchError::LocalIo {
                    path: cached.display().to_string(),
                    source,
                }));
            }
        }

        // Reload while still holding the lock so no other thread observes
        // the entry half-refreshed
        self.load(remote)
    }
}

/// A cached file is stale when the remote was modified strictly after it,
/// or when it has gone missing from under the cache
fn is_stale(remote_mtime: SystemTime, cached: &Path) -> bool {
    match fs::metadata(cached).and_then(|m| m.modified()) {
        Ok(local_mtime) => remote_mtime > local_mtime,
        Err(_) => true,
    }
}
