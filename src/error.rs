//! Error types for the preprocessing pipeline.
//!
//! Decoding is the only checked failure. Every later stage is infallible for a
//! decoded, non-empty image.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the preprocessing entry points.
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// The file at `path` could not be turned into an image
    /// (missing, unreadable, corrupt, unsupported or empty).
    #[error("Could not load image: {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// An in-memory buffer could not be turned into an image.
    #[error("Could not decode image buffer: {message}")]
    DecodeBuffer { message: String },
}

impl PreprocessError {
    /// True for both decode variants.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::DecodeBuffer { .. })
    }
}

/// Convenience alias for preprocessing results.
pub type Result<T> = std::result::Result<T, PreprocessError>;
