use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Document store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unexpected response shape from {0}")]
    ResponseShape(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
