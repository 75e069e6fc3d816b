use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("BSON error: {0}")]
    Bson(#[from] mongodb::bson::raw::Error),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Invalid sample request: {0}")]
    InvalidRequest(String),
}

/// Convenience Result type using our Error
pub type Result<T> = std::result::Result<T, Error>;
