//! Error types for `crest-core`.

/// Errors from the settings store and its preference backends.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Reading or writing the preference file failed.
    #[error("preference store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The preference file held malformed JSON.
    #[error("preference store decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// No usable location for the preference file could be determined.
    #[error("no preference path: {0}")]
    NoPath(String),
}
