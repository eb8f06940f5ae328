use thiserror::Error;

/// Errors returned by the POS API client.
#[derive(Debug, Error)]
pub enum PosError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The sign-in endpoint rejected the credential (anything but 201).
    #[error("sign-in rejected with HTTP status {status}")]
    Unauthenticated { status: u16 },

    /// A fetch endpoint returned a non-200 status.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL is not a valid URL.
    #[error("invalid POS base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
