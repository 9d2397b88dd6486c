use thiserror::Error;

/// Errors returned by the metafield API client's passthrough calls.
#[derive(Debug, Error)]
pub enum MetafieldError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid metafield API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
