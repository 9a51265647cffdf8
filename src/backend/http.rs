//! HTTP Transfer Backend
//!
//! Fetches http:// and https:// remote paths with reqwest and reads the
//! Last-Modified header for staleness timestamps.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::DateTime;
use reqwest::blocking::Client;
use reqwest::header::LAST_MODIFIED;
use tracing::debug;

use super::errors::TransferError;
use super::registry::Transfer;

/// HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transfer backend for http:// and https:// remote paths
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self, TransferError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(request_error)?;
        Ok(Self { client })
    }
}

fn request_error(e: reqwest::Error) -> TransferError {
    if e.is_timeout() {
        TransferError::Timeout
    } else {
        TransferError::Network(e.to_string())
    }
}

/// Parse an RFC 2822 Last-Modified header value
fn parse_last_modified(value: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(SystemTime::from)
}

impl Transfer for HttpBackend {
    fn fetch(&self, remote: &str, dest: &Path) -> Result<(), TransferError> {
        let mut response = self.client.get(remote).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransferError::from_status(status.as_u16(), &body));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        // Stream into a temp file so a dropped connection never leaves a
        // partial destination
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        let bytes = io::copy(&mut response, &mut tmp)?;
        tmp.persist(dest).map_err(|e| TransferError::Io(e.error))?;

        debug!(remote = remote, bytes = bytes, "Downloaded remote file");
        Ok(())
    }

    fn last_modified(&self, remote: &str) -> Result<SystemTime, TransferError> {
        let response = self.client.head(remote).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransferError::from_status(status.as_u16(), &body));
        }

        let parsed = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_last_modified);

        match parsed {
            Some(mtime) => Ok(mtime),
            None => {
                // No usable Last-Modified: report the epoch so the cached
                // copy is never considered stale
                debug!(remote = remote, "Remote reports no Last-Modified header");
                Ok(SystemTime::UNIX_EPOCH)
            }
        }
    }
}
