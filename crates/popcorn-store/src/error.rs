//! Error types for the store layer.
//!
//! All errors are propagated via [`StoreError`], which wraps the underlying
//! [`reqwest`] and [`serde_json`] errors with the route that failed.

/// Errors that can occur when reading or writing member state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error on {route}: {source}")]
    Http {
        /// Route that was requested.
        route: String,
        /// The underlying transport error.
        source: reqwest::Error,
    },

    /// The API service answered with a non-success status.
    #[error("API returned {status} for {route}: {body}")]
    Status {
        /// Route that was requested.
        route: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A response body did not match the expected shape.
    #[error("failed to decode response from {route}: {source}")]
    Decode {
        /// Route that was requested.
        route: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The store was misconfigured.
    #[error("configuration error: {0}")]
    Config(String),

    /// The in-memory store was told to fail (tests only).
    #[error("injected failure: {0}")]
    Injected(&'static str),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
