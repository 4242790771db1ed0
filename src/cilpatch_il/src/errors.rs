use thiserror::Error;

#[derive(Debug, Error)]
pub enum IlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Dotscope error: {0}")]
    Dotscope(#[from] dotscope::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IlError>;
