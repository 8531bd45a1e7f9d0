//! Error type for the overlay engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Could not determine a data directory")]
    NoDataDir,

    #[error("{0} have not been implemented")]
    Unsupported(String),

    #[error("Invalid point of interest: {0}")]
    InvalidPoi(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
