//! Error types for the HTTP(S) object store.

use thiserror::Error;

/// Errors surfaced by location parsing and the fetch engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed URI, bad credentials, non-2xx/3xx HTTP status, invalid
    /// redirect combination, or malformed token-mode size payload. Carries
    /// the offending URI or path plus a human-readable reason.
    #[error("bad store URI `{path}`: {reason}")]
    BadUri { path: String, reason: String },

    /// Redirect chain exceeded the maximum hop count.
    #[error("the HTTP URL exceeded {redirects} maximum redirects")]
    MaxRedirects { redirects: u32 },

    /// The transfer itself failed (connect, TLS handshake, timeout, ...).
    #[error("transfer failed: {0}")]
    Transfer(#[from] curl::Error),

    /// Transfer worker thread could not be started or died before responding.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn bad_uri(path: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::BadUri {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
