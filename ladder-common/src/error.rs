//! Common error types for Ladder

use thiserror::Error;

/// Common result type for Ladder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Ladder crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or option value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unit name not present in the unit scale table
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Mesh quality name not recognized
    #[error("Unknown mesh quality: {0}")]
    UnknownQuality(String),

    /// Meshing algorithm id or name not recognized
    #[error("Unknown meshing algorithm: {0}")]
    UnknownAlgorithm(String),
}
