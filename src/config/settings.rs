//! Settings sections of the dataset configuration
//!
//! # Main Types
//!
//! - [`SerializerSettings`] - JSON formatting and frame-data archive options
//! - [`MatchingSettings`] - Tolerances for structural comparison
//! - [`LoggingSettings`] - Log filter and optional log file

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::matching::MATCH_TOLERANCE;

/// How datasets are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerSettings {
    /// Pretty-print JSON records
    pub pretty_json: bool,

    /// Image encoding for embedded frames
    pub frame_image_format: FrameImageFormat,

    /// Compression of archive entries
    pub compression: ArchiveCompression,

    /// Directory of embedded frames inside archives
    pub archive_frame_dir: String,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self {
            pretty_json: false,
            frame_image_format: FrameImageFormat::Png,
            compression: ArchiveCompression::Deflated,
            archive_frame_dir: crate::io::DEFAULT_FRAME_DIR.to_string(),
        }
    }
}

/// Image encoding for embedded frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameImageFormat {
    /// Lossless
    #[default]
    Png,
    /// Lossy, 8-bit RGB
    Jpeg,
}

impl std::fmt::Display for FrameImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameImageFormat::Png => write!(f, "PNG"),
            FrameImageFormat::Jpeg => write!(f, "JPEG"),
        }
    }
}

/// Compression method for archive entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    Stored,
    #[default]
    Deflated,
}

impl std::fmt::Display for ArchiveCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveCompression::Stored => write!(f, "Stored"),
            ArchiveCompression::Deflated => write!(f, "Deflated"),
        }
    }
}

/// Structural comparison settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Absolute coordinate tolerance when comparing points
    pub point_tolerance: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            point_tolerance: MATCH_TOLERANCE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,

    /// Directory for daily-rolling log files (console only when unset)
    pub log_dir: Option<PathBuf>,

    /// File name prefix for log files
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,pose_labels=debug".to_string(),
            log_dir: None,
            file_prefix: "pose-labels.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializer_defaults() {
        let settings = SerializerSettings::default();
        assert!(!settings.pretty_json);
        assert_eq!(settings.frame_image_format, FrameImageFormat::Png);
        assert_eq!(settings.compression, ArchiveCompression::Deflated);
        assert_eq!(settings.archive_frame_dir, "frame_data");
    }

    #[test]
    fn test_enums_use_lowercase_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: FrameImageFormat,
            compression: ArchiveCompression,
        }
        let parsed: Wrapper = toml::from_str("format = \"jpeg\"\ncompression = \"stored\"").unwrap();
        assert_eq!(parsed.format, FrameImageFormat::Jpeg);
        assert_eq!(parsed.compression, ArchiveCompression::Stored);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let settings: LoggingSettings = toml::from_str("log_dir = \"/var/log/labels\"").unwrap();
        assert_eq!(settings.log_dir, Some(PathBuf::from("/var/log/labels")));
        assert_eq!(settings.filter, LoggingSettings::default().filter);
    }

    #[test]
    fn test_matching_default_tolerance() {
        assert_eq!(MatchingSettings::default().point_tolerance, 1e-3);
    }
}
