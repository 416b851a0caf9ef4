//! Error types for the editor modules.
//!
//! None of these ever escape a module as a panic: async boundaries turn them
//! into the empty/no-op outcome and log them.

/// The mention source rejected a query or produced unusable data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("mention source rejected query: {0}")]
    Rejected(String),

    #[error("mention source returned malformed results: {0}")]
    Malformed(String),
}

/// A dropped or pasted file could not be turned into an embeddable image.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("file is empty")]
    Empty,

    #[error("not an image: {mime}")]
    NotAnImage { mime: String },

    #[error("failed to read file: {0}")]
    Read(String),
}

/// Error type for platform (DOM / JS interop) operations.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}
