//! Errors raised while interpreting pack data.

use thiserror::Error;

/// Failure to interpret a raw attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    #[error("Invalid GUID value: {0}")]
    InvalidGuid(String),
}
