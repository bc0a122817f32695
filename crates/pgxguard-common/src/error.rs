use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgxError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reference table error: {0}")]
    Reference(String),

    #[error("Narrative service error: {0}")]
    Narrative(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PgxError>;
