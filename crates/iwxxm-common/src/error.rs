//! Error types for the TAC → IWXXM translation crates.
//!
//! Decode failures are deliberately NOT represented here: a decoder always
//! returns a report and records trouble in its `err_msg` field. These errors
//! cover the infrastructure around the decoders — vocabulary loading,
//! document serialization and bulletin routing.

use thiserror::Error;

/// Result type alias using TacError.
pub type TacResult<T> = Result<T, TacError>;

/// Primary error type for translation infrastructure.
#[derive(Debug, Error)]
pub enum TacError {
    #[error("Code registry error: {0}")]
    Registry(String),

    #[error("Container not found in vocabulary file: {0}")]
    ContainerNotFound(String),

    #[error("Invalid AHL heading: {0}")]
    InvalidAhl(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for TacError {
    fn from(err: quick_xml::Error) -> Self {
        TacError::Xml(err.to_string())
    }
}
