//! Error types for the rendering core

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can surface from the rendering core.
///
/// Parsing, styling and layout degrade instead of failing, so most variants
/// describe misuse of the API rather than malformed content.
#[derive(Error, Debug)]
pub enum Error {
    /// The parsed tree has nothing to lay out
    #[error("Document has no usable content")]
    EmptyDocument,

    /// Failed to render content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// A node handle does not refer to a live node of the expected kind
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// I/O error while reading documents or configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
