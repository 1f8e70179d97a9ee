//! Error types for the content client.
//!
//! Every variant carries enough context to diagnose the failure from a log
//! line. The client logs each failure where it occurs and re-returns it —
//! no retries, no swallowing.

/// All errors a [`ContentApi`](crate::ContentApi) implementation can return.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The API answered with a non-success HTTP status.
    #[error("request failed with HTTP {status}: {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error body or status text from the backend.
        message: String,
    },

    /// The request never completed — DNS, connect, or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not decode into the expected type.
    #[error("response decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// The referenced entity does not exist (fixture client).
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity kind ("section", "service").
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// The upload endpoint answered with a non-success status.
    #[error("upload failed with HTTP {status}: {message}")]
    UploadFailed {
        /// HTTP status code.
        status: u16,
        /// Error body or status text from the backend.
        message: String,
    },

    /// Missing or invalid client configuration.
    #[error("client config error: {0}")]
    Config(String),
}
