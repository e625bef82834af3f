use thiserror::Error;

/// Central error type for Pagesmith operations.
#[derive(Error, Debug)]
pub enum PagesmithError {
    #[error("Chain conflict for site {site}: expected parent {expected:?}, got {got:?}")]
    ChainConflict {
        site: String,
        expected: Option<String>,
        got: Option<String>,
    },

    #[error("Invalid version record: {0}")]
    InvalidRecord(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Remote store error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Pagesmith results.
pub type PagesmithResult<T> = Result<T, PagesmithError>;
