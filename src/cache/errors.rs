//! Fetch Error Types
//!
//! Structured errors for the read-through cache. Every failure reaching a
//! caller names the path it was serving and carries the underlying cause.

use std::io;
use std::sync::Arc;

use crate::backend::TransferError;

/// Errors surfaced by the read-through cache
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The cache root cannot be created or is not a usable directory.
    /// Fatal at construction.
    #[error("cache location {path} is not usable")]
    Configuration {
        path: String,
        #[source]
        source: io::Error,
    },

    /// No transfer backend registered for the path's URI scheme
    #[error("no transfer backend registered for {path}")]
    NoBackend { path: String },

    /// A backend fetch or timestamp query failed
    #[error("transfer failed for {path}")]
    Transfer {
        path: String,
        #[source]
        source: TransferError,
    },

    /// A local filesystem operation failed during invalidation
    #[error("local i/o failed for {path}")]
    LocalIo {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Per-call wrapper: everything that goes wrong while resolving a
    /// remote path to a fresh cached file reports through this variant.
    /// The source is shared because concurrent callers waiting on one
    /// in-flight load all receive the same failure.
    #[error("failed to fetch file {path}")]
    Fetch {
        path: String,
        #[source]
        source: Arc<FetchError>,
    },
}
