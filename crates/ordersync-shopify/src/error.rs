use thiserror::Error;

/// Errors from the Admin GraphQL order-detail client.
#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Admin API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// The payload cannot be turned into a [`ordersync_core::NormalizedOrder`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("order id not found in order payload")]
    MissingOrderId,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("malformed {0}")]
    Malformed(&'static str),

    #[error("signature mismatch")]
    Mismatch,
}
