//! Dataset persistence
//!
//! Loading is two-staged: the input is probed for its schema (frame-data
//! archive, current JSON record, or legacy v1 JSON), legacy records are
//! upgraded to the current [`LabelsRecord`], and a single builder turns the
//! record into a [`Labels`] graph. Saving always writes the current schema.
//!
//! # Formats
//!
//! - Plain JSON record (see [`record`])
//! - Frame-data archive: `<destination>.zip` holding the JSON record plus one
//!   encoded image per labeled frame (see [`archive`])
//! - HDF5 dataset layout and tracking analysis export (see [`hdf5`],
//!   [`analysis`]); the HDF5 writers need the `hdf5` cargo feature
//!
//! # Example
//!
//! ```ignore
//! use pose_labels::io::{self, LoadOptions, SaveOptions};
//!
//! let labels = io::load("session.json", &LoadOptions::default())?;
//! let written = io::save(&labels, "session.json", &SaveOptions::default().with_frame_data())?;
//!
//! // Reload, reusing skeletons/videos/tracks of the graph we already hold
//! let reloaded = io::load(&written, &LoadOptions::default().with_match_to(&labels))?;
//! ```

pub mod analysis;
pub mod archive;
pub mod convert;
mod graph;
pub mod hdf5;
pub mod legacy;
pub mod record;

pub use record::{to_record, LabelsRecord, FORMAT_VERSION};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::config::{ArchiveCompression, FrameImageFormat, SerializerSettings};
use crate::error::{LabelsError, Result, ResultExt};
use crate::labels::Labels;
use crate::video::{VideoBackend, VideoDescriptor};
use legacy::LegacyRecord;

/// Local file header magic of a zip archive
pub const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Default directory for embedded frames inside an archive
pub const DEFAULT_FRAME_DIR: &str = "frame_data";

/// Attaches a pixel backend to a loaded video descriptor
pub type VideoOpener<'a> = dyn Fn(&VideoDescriptor) -> Option<Arc<dyn VideoBackend>> + 'a;

/// Detected input schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Zip archive with an embedded record and frame images
    Archive,
    /// Current JSON record
    Current,
    /// Legacy v1 JSON
    Legacy,
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Archive => write!(f, "frame-data archive"),
            Schema::Current => write!(f, "current JSON"),
            Schema::Legacy => write!(f, "legacy v1 JSON"),
        }
    }
}

/// Probe a parsed JSON document for its schema.
pub fn probe_json(value: &Value) -> Result<Schema> {
    let object = value
        .as_object()
        .ok_or_else(|| LabelsError::format("top-level JSON value is not an object"))?;

    if object.contains_key("labels") && object.contains_key("skeletons") {
        Ok(Schema::Current)
    } else if object.contains_key("skel_node_names") {
        Ok(Schema::Legacy)
    } else {
        Err(LabelsError::format(
            "unrecognized dataset schema (expected `labels`+`skeletons` or `skel_node_names`)",
        ))
    }
}

/// Probe raw bytes: zip magic first, then the JSON structure.
pub fn detect_schema(bytes: &[u8]) -> Result<Schema> {
    if bytes.starts_with(ZIP_MAGIC) {
        return Ok(Schema::Archive);
    }
    let value: Value = serde_json::from_slice(bytes)?;
    probe_json(&value)
}

// ==================== Options ====================

/// Options for [`load`]
#[derive(Clone, Copy, Default)]
pub struct LoadOptions<'a> {
    /// Reference graph whose matching entities are reused
    pub match_to: Option<&'a Labels>,
    /// Backend resolver for videos that are not reused from `match_to`
    pub video_opener: Option<&'a VideoOpener<'a>>,
}

impl<'a> LoadOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match_to(mut self, labels: &'a Labels) -> Self {
        self.match_to = Some(labels);
        self
    }

    pub fn with_video_opener(mut self, opener: &'a VideoOpener<'a>) -> Self {
        self.video_opener = Some(opener);
        self
    }

    pub(crate) fn open_video(&self, descriptor: &VideoDescriptor) -> Option<Arc<dyn VideoBackend>> {
        self.video_opener.and_then(|open| open(descriptor))
    }
}

impl fmt::Debug for LoadOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("match_to", &self.match_to.map(|l| l.len()))
            .field("video_opener", &self.video_opener.is_some())
            .finish()
    }
}

/// Options for [`save`]
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Write a frame-data archive instead of a bare JSON file
    pub save_frame_data: bool,
    /// Pretty-print the JSON record
    pub pretty: bool,
    pub image_format: FrameImageFormat,
    pub compression: ArchiveCompression,
    /// Directory of frame images inside the archive
    pub frame_dir: String,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self::from(&SerializerSettings::default())
    }
}

impl From<&SerializerSettings> for SaveOptions {
    fn from(settings: &SerializerSettings) -> Self {
        Self {
            save_frame_data: false,
            pretty: settings.pretty_json,
            image_format: settings.frame_image_format,
            compression: settings.compression,
            frame_dir: settings.archive_frame_dir.clone(),
        }
    }
}

impl SaveOptions {
    pub fn with_frame_data(mut self) -> Self {
        self.save_frame_data = true;
        self
    }

    pub fn with_image_format(mut self, format: FrameImageFormat) -> Self {
        self.image_format = format;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

// ==================== Pipeline ====================

/// Build a labels graph from a current-schema record.
pub fn from_record(record: LabelsRecord, options: &LoadOptions<'_>) -> Result<Labels> {
    graph::build_labels(record, options, None)
}

/// Parse a JSON document of either schema into a current record.
pub(crate) fn record_from_value(value: Value) -> Result<LabelsRecord> {
    let schema = probe_json(&value)?;
    tracing::debug!("Detected {} record", schema);
    match schema {
        Schema::Legacy => {
            let legacy: LegacyRecord =
                serde_json::from_value(value).map_err(|e| LabelsError::format(e.to_string()))?;
            legacy.upgrade()
        }
        _ => serde_json::from_value(value).map_err(|e| LabelsError::format(e.to_string())),
    }
}

pub fn from_json_str(json: &str, options: &LoadOptions<'_>) -> Result<Labels> {
    let value: Value = serde_json::from_str(json)?;
    from_record(record_from_value(value)?, options)
}

pub fn to_json_string(labels: &Labels, pretty: bool) -> Result<String> {
    let record = to_record(labels);
    Ok(if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    })
}

/// Load a dataset from any supported file.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions<'_>) -> Result<Labels> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let labels = match detect_schema(&bytes)
        .with_context(|| format!("Failed to detect schema of {}", path.display()))?
    {
        Schema::Archive => archive::read_archive(path, options),
        _ => {
            let value: Value = serde_json::from_slice(&bytes)?;
            record_from_value(value).and_then(|record| from_record(record, options))
        }
    }
    .with_context(|| format!("Failed to load {}", path.display()))?;

    tracing::info!(
        "Loaded {} frames, {} videos, {} skeletons, {} tracks from {}",
        labels.len(),
        labels.video_count(),
        labels.skeleton_count(),
        labels.track_count(),
        path.display()
    );
    Ok(labels)
}

/// Save a dataset, returning the path actually written (`<path>.zip` when
/// frame data is embedded).
pub fn save(labels: &Labels, path: impl AsRef<Path>, options: &SaveOptions) -> Result<PathBuf> {
    let path = path.as_ref();

    let written = if options.save_frame_data {
        archive::write_archive(labels, path, options)?
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = to_json_string(labels, options.pretty)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        path.to_path_buf()
    };

    tracing::info!(
        "Saved {} frames, {} videos to {}",
        labels.len(),
        labels.video_count(),
        written.display()
    );
    Ok(written)
}

impl Labels {
    /// Load a dataset with default options.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Labels> {
        load(path, &LoadOptions::default())
    }

    /// Save as plain JSON with default options.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        save(self, path, &SaveOptions::default()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Instance, LabeledFrame, Point, Skeleton};
    use crate::video::Video;

    fn sample() -> Labels {
        let mut labels = Labels::new();
        let video = labels.add_video(Video::from_filename("fly.mp4"));
        let skeleton = labels.add_skeleton(
            Skeleton::from_names("fly", &["head", "thorax"], &[("head", "thorax")]).unwrap(),
        );
        let instance = Instance::with_points(skeleton, vec![Point::new(1.0, 2.0), Point::missing()]);
        labels
            .append(LabeledFrame::with_instances(video, 3, vec![instance]))
            .unwrap();
        labels
    }

    #[test]
    fn test_detect_schema() {
        assert_eq!(detect_schema(b"PK\x03\x04rest").unwrap(), Schema::Archive);
        assert_eq!(
            detect_schema(br#"{"labels": [], "skeletons": []}"#).unwrap(),
            Schema::Current
        );
        assert_eq!(
            detect_schema(br#"{"skel_node_names": []}"#).unwrap(),
            Schema::Legacy
        );
        assert!(detect_schema(br#"{"frames": []}"#).unwrap_err().is_format());
        assert!(detect_schema(b"[1, 2]").unwrap_err().is_format());
    }

    #[test]
    fn test_json_round_trip_in_memory() {
        use crate::matching::StructuralEq;

        let labels = sample();
        let json = to_json_string(&labels, false).unwrap();
        let loaded = from_json_str(&json, &LoadOptions::default()).unwrap();
        assert!(labels.matches(&loaded));
        assert_eq!(loaded.by_index(0).unwrap().frame_idx, 3);
        assert!(loaded.by_index(0).unwrap().instances[0].point(1).is_missing());
    }

    #[test]
    fn test_unsupported_version_is_format_error() {
        let json = r#"{"format_version": 99, "nodes": [], "skeletons": [], "videos": [], "labels": []}"#;
        let err = from_json_str(json, &LoadOptions::default()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_missing_field_is_format_error() {
        let json = r#"{"nodes": [], "skeletons": [], "labels": []}"#;
        let err = from_json_str(json, &LoadOptions::default()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_dangling_reference_is_format_error() {
        let json = r#"{"nodes": ["a"], "skeletons": [{"name": "s", "nodes": [0]}],
            "videos": [{"filename": "v.mp4"}],
            "labels": [{"video": 0, "frame_idx": 0, "instances": [{"skeleton": 4, "points": {}}]}]}"#;
        let err = from_json_str(json, &LoadOptions::default()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_video_opener_attaches_backend() {
        use crate::video::InMemoryVideo;

        let json = to_json_string(&sample(), false).unwrap();
        let opener = |d: &VideoDescriptor| -> Option<Arc<dyn VideoBackend>> {
            (d.filename == "fly.mp4")
                .then(|| Arc::new(InMemoryVideo::blank_gray(5, 8, 8)) as Arc<dyn VideoBackend>)
        };
        let options = LoadOptions::new().with_video_opener(&opener);
        let loaded = from_json_str(&json, &options).unwrap();
        let (_, video) = loaded.videos().next().unwrap();
        assert_eq!(video.frame_count(), Some(5));
        assert!(video.get_frame(4).is_ok());
    }
}
