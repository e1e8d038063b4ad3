//! Error types for the JobScout core library.

/// All errors that can occur in the core library.
#[derive(thiserror::Error, Debug)]
pub enum ScoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Cookie file is not a JSON array")]
    NotAnArray,
}

pub type ScoutResult<T> = Result<T, ScoutError>;
