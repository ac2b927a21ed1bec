//! Error handling for pose-labels
//!
//! This module defines the crate error type and a Result alias used by the
//! container, the serializers and the video backends.
//!
//! Lookups that are documented as non-failing (`Labels::find`,
//! `Labels::instances`) never produce these errors; only the strict accessors
//! and the I/O paths do.

use thiserror::Error;

/// Main error type for pose-labels operations
#[derive(Error, Debug)]
pub enum LabelsError {
    /// Strict lookup found no matching entry
    #[error("Not found: {0}")]
    NotFound(String),

    /// Positional lookup past the end of the frame list
    #[error("Frame index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Invalid skeleton definition (duplicate node, unknown edge endpoint)
    #[error("Invalid skeleton: {0}")]
    InvalidSkeleton(String),

    /// Frame rejected by `Labels::append`
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Malformed or unrecognized persisted record
    #[error("Format error: {0}")]
    Format(String),

    /// Pixel access on a video without a usable backend
    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    /// Video backend failure while embedding frame data
    #[error("Frame data for video {video} frame {frame_idx}: {source}")]
    FrameData {
        video: String,
        frame_idx: usize,
        #[source]
        source: Box<LabelsError>,
    },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not available in this build
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// JSON encode/decode errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame-data archive errors
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Image encode/decode errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// HDF5 library errors
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LabelsError>,
    },
}

impl LabelsError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        LabelsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a format error
    pub fn format(message: impl Into<String>) -> Self {
        LabelsError::Format(message.into())
    }

    /// Innermost error, skipping context wrappers
    pub fn root(&self) -> &LabelsError {
        match self {
            LabelsError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for `NotFound` (through any context wrappers)
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), LabelsError::NotFound(_))
    }

    /// True for `Format` (through any context wrappers)
    pub fn is_format(&self) -> bool {
        matches!(self.root(), LabelsError::Format(_))
    }
}

/// Result type alias for pose-labels operations
pub type Result<T> = std::result::Result<T, LabelsError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<LabelsError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
