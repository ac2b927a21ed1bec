//! Configuration for pose-labels
//!
//! A single TOML file configures how datasets are written, compared and
//! logged. Every section and field has a default, so a missing or partial
//! file is valid.
//!
//! # Config Location
//!
//! The default file lives in the platform configuration directory:
//! - **Linux**: `~/.config/io.pose-labels/pose-labels.toml`
//! - **macOS**: `~/Library/Application Support/io.pose-labels/pose-labels.toml`
//! - **Windows**: `%APPDATA%\io.pose-labels\pose-labels.toml`
//!
//! # Example
//!
//! ```toml
//! [serializer]
//! pretty_json = true
//! frame_image_format = "png"
//! compression = "deflated"
//!
//! [matching]
//! point_tolerance = 0.001
//!
//! [logging]
//! filter = "info,pose_labels=debug"
//! log_dir = "/var/log/pose-labels"
//! ```

mod settings;

pub use settings::*;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LabelsError, Result};
use crate::io::SaveOptions;
use crate::labels::Labels;

/// Application identifier for config directories
pub const APP_ID: &str = "io.pose-labels";

/// Config filename
pub const CONFIG_FILE: &str = "pose-labels.toml";

/// Current config schema version
pub const CONFIG_VERSION: u32 = 1;

// ==================== Config Directory ====================

/// Platform configuration directory for this crate
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().ok_or_else(|| {
        LabelsError::Config("Could not determine config directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            LabelsError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Path of the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Dataset Config ====================

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Config schema version
    #[serde(default = "default_config_version")]
    pub version: u32,

    #[serde(default)]
    pub serializer: SerializerSettings,

    #[serde(default)]
    pub matching: MatchingSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_config_version() -> u32 {
    CONFIG_VERSION
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            serializer: SerializerSettings::default(),
            matching: MatchingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl DatasetConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LabelsError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            LabelsError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load the default config file, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LabelsError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| LabelsError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            LabelsError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Save to the default location
    pub fn save_default(&self) -> Result<PathBuf> {
        let path = ensure_config_dir()?.join(CONFIG_FILE);
        self.save(&path)?;
        Ok(path)
    }

    /// Save options for plain JSON output
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::from(&self.serializer)
    }

    /// Structural comparison using the configured point tolerance
    pub fn labels_match(&self, a: &Labels, b: &Labels) -> bool {
        a.matches_within(b, self.matching.point_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = DatasetConfig::default();
        config.serializer.pretty_json = true;
        config.serializer.frame_image_format = FrameImageFormat::Jpeg;
        config.matching.point_tolerance = 0.5;
        config.logging.log_dir = Some(dir.path().join("logs"));

        config.save(&path).unwrap();
        let loaded = DatasetConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: DatasetConfig = toml::from_str("").unwrap();
        assert_eq!(config, DatasetConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config: DatasetConfig = toml::from_str("[serializer]\npretty_json = true\n").unwrap();
        assert!(config.serializer.pretty_json);
        assert_eq!(config.serializer.archive_frame_dir, "frame_data");
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "serializer = 3").unwrap();
        assert!(matches!(
            DatasetConfig::load(&path),
            Err(LabelsError::Config(_))
        ));
    }

    #[test]
    fn test_save_options_follow_serializer() {
        let mut config = DatasetConfig::default();
        config.serializer.pretty_json = true;
        let options = config.save_options();
        assert!(options.pretty);
        assert!(!options.save_frame_data);
    }

    #[test]
    fn test_labels_match_uses_point_tolerance() {
        use crate::model::{Instance, LabeledFrame, Point, Skeleton};
        use crate::video::Video;

        let build = |x: f64| {
            let mut labels = Labels::new();
            let video = labels.add_video(Video::from_filename("a.mp4"));
            let skeleton = labels.add_skeleton(Skeleton::from_names("s", &["a"], &[]).unwrap());
            labels
                .append(LabeledFrame::with_instances(
                    video,
                    0,
                    vec![Instance::with_points(skeleton, vec![Point::new(x, 0.0)])],
                ))
                .unwrap();
            labels
        };

        let mut config = DatasetConfig::default();
        assert!(!config.labels_match(&build(1.0), &build(1.2)));
        config.matching.point_tolerance = 0.5;
        assert!(config.labels_match(&build(1.0), &build(1.2)));
    }
}
