use thiserror::Error;

/// Failures of a single page fetch. None of them are fatal to the list.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("invalid server url: {0}")]
    Url(String),
}
