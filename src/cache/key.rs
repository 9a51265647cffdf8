//! Cache Key Derivation
//!
//! Derives the on-disk name for a cached file from its remote path.
//! The name is a pure function of the path, so a cold cache and a warm
//! cache agree on layout across process restarts.

use sha1::{Digest, Sha1};

/// Derive the cache file name for a remote path.
///
/// SHA-1 over the path bytes, rendered as lowercase hex. Distinct paths
/// yield distinct names with overwhelming probability.
pub fn derive_key(remote: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(remote.as_bytes());
    format!("{:x}", hasher.finalize())
}
