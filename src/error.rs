use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum EnrollError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("No API token configured. Pass --api-token or set ENROLL_API_TOKEN.")]
    MissingToken,

    #[error("API token contains characters not allowed in an HTTP header")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Record source error: {0}")]
    Source(#[from] SourceError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
