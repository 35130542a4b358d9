use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),

    #[error("profile fetch failed: {0}")]
    ProfileFetch(String),

    #[error("export error: {0}")]
    Export(String),
}

impl From<csv::Error> for ScienceError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
