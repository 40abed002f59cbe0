use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiftError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<chromiumoxide::error::CdpError> for SiftError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        SiftError::Browser(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SiftError>;
