//! Video collaborators
//!
//! The labels graph never decodes video itself. A [`Video`] pairs the
//! persisted [`VideoDescriptor`] (what the dataset records and compares) with
//! a [`VideoBackend`] that can produce pixels on demand.
//!
//! # Backends
//!
//! - [`DetachedVideo`] - descriptor only; pixel access fails
//! - [`InMemoryVideo`] - decoded frames held in memory
//! - [`ArchiveVideo`] - frames read from a frame-data archive
//!
//! Real decoders live outside this crate and plug in by implementing
//! [`VideoBackend`] (see `LoadOptions::with_video_opener`).
//!
//! Pixel access is a blocking call and is never cached here.

pub mod archive;
pub mod memory;

pub use archive::ArchiveVideo;
pub use memory::InMemoryVideo;

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{LabelsError, Result};
use crate::model::id::Uid;

/// Frame count and per-frame geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoShape {
    pub frames: usize,
    pub height: u32,
    pub width: u32,
    pub channels: u8,
}

impl VideoShape {
    /// Shape of a single decoded image, repeated `frames` times
    pub fn of_image(image: &DynamicImage, frames: usize) -> Self {
        Self {
            frames,
            height: image.height(),
            width: image.width(),
            channels: image.color().channel_count(),
        }
    }
}

/// Persisted description of a video source.
///
/// This is what two videos are compared on; the backend is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    pub filename: String,
    /// Dataset path inside a container file (HDF5 videos)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<VideoShape>,
}

impl VideoDescriptor {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            dataset: None,
            shape: None,
        }
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_shape(mut self, shape: VideoShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Same source. Shapes are compared only when both sides know theirs.
    pub fn same_source(&self, other: &VideoDescriptor) -> bool {
        let shapes_agree = match (self.shape, other.shape) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        self.filename == other.filename && self.dataset == other.dataset && shapes_agree
    }
}

impl fmt::Display for VideoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dataset {
            Some(dataset) => write!(f, "{}:{}", self.filename, dataset),
            None => write!(f, "{}", self.filename),
        }
    }
}

/// Pixel source for a video.
pub trait VideoBackend: Send + Sync {
    /// Shape if known without decoding
    fn shape(&self) -> Option<VideoShape>;

    /// Decode one frame
    fn get_frame(&self, frame_idx: usize) -> Result<DynamicImage>;
}

/// Backend for videos whose pixels are not reachable.
#[derive(Debug, Clone)]
pub struct DetachedVideo {
    label: String,
    shape: Option<VideoShape>,
}

impl DetachedVideo {
    pub fn new(descriptor: &VideoDescriptor) -> Self {
        Self {
            label: descriptor.to_string(),
            shape: descriptor.shape,
        }
    }
}

impl VideoBackend for DetachedVideo {
    fn shape(&self) -> Option<VideoShape> {
        self.shape
    }

    fn get_frame(&self, frame_idx: usize) -> Result<DynamicImage> {
        Err(LabelsError::VideoUnavailable(format!(
            "no decoder attached to '{}' (frame {})",
            self.label, frame_idx
        )))
    }
}

/// A video referenced by the dataset.
///
/// Cloning shares the backend and keeps the identity.
#[derive(Clone)]
pub struct Video {
    uid: Uid,
    descriptor: VideoDescriptor,
    backend: Arc<dyn VideoBackend>,
}

impl Video {
    /// Video without pixel access
    pub fn new(descriptor: VideoDescriptor) -> Self {
        let backend = Arc::new(DetachedVideo::new(&descriptor));
        Self {
            uid: Uid::fresh(),
            descriptor,
            backend,
        }
    }

    pub fn from_filename(filename: impl Into<String>) -> Self {
        Self::new(VideoDescriptor::new(filename))
    }

    pub fn with_backend(descriptor: VideoDescriptor, backend: Arc<dyn VideoBackend>) -> Self {
        Self {
            uid: Uid::fresh(),
            descriptor,
            backend,
        }
    }

    /// In-memory video; the descriptor records the decoded shape.
    pub fn from_frames(filename: impl Into<String>, frames: Vec<DynamicImage>) -> Self {
        let backend = InMemoryVideo::new(frames);
        let mut descriptor = VideoDescriptor::new(filename);
        descriptor.shape = backend.shape();
        Self::with_backend(descriptor, Arc::new(backend))
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn same_as(&self, other: &Video) -> bool {
        self.uid == other.uid
    }

    /// Same descriptor and backend, new identity
    pub fn duplicate(&self) -> Self {
        Self {
            uid: Uid::fresh(),
            ..self.clone()
        }
    }

    pub fn descriptor(&self) -> &VideoDescriptor {
        &self.descriptor
    }

    pub fn filename(&self) -> &str {
        &self.descriptor.filename
    }

    pub fn shape(&self) -> Option<VideoShape> {
        self.backend.shape().or(self.descriptor.shape)
    }

    pub fn frame_count(&self) -> Option<usize> {
        self.shape().map(|s| s.frames)
    }

    pub fn get_frame(&self, frame_idx: usize) -> Result<DynamicImage> {
        self.backend.get_frame(frame_idx)
    }

    /// Swap the pixel source, keeping identity and descriptor.
    pub fn set_backend(&mut self, backend: Arc<dyn VideoBackend>) {
        self.backend = backend;
    }
}

impl fmt::Debug for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Video")
            .field("uid", &self.uid)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
