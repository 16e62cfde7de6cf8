use thiserror::Error;

use poisweep_core::GeoError;

/// Errors returned by the place-search provider client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The credential was missing or rejected (HTTP 401/403). Fatal for a
    /// whole aggregation pass; never retried.
    #[error("authentication rejected by provider: {0}")]
    Auth(String),

    /// Transient failure: connection error, timeout, or HTTP 5xx. Retried
    /// with backoff up to the configured limit.
    #[error("transient provider error: {0}")]
    Transient(String),

    /// The response body could not be parsed as a record list.
    #[error("malformed provider response for {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    /// Any other non-2xx status (plain 4xx). Not retried.
    #[error("provider API error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    /// Caller-side argument violation (empty query, non-positive radius or
    /// limit). Surfaced before any network call.
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Network or TLS failure from the underlying HTTP client that is not
    /// classified as transient (e.g. client construction, invalid URL).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A record carried coordinates outside valid degree ranges.
    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl ProviderError {
    /// Collapses the error to the detail string stored in an anchor outcome.
    #[must_use]
    pub fn detail(&self) -> String {
        self.to_string()
    }
}
