//! Labeled frames

use crate::model::id::VideoId;
use crate::model::instance::Instance;

/// The instances annotated at one `(video, frame_idx)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFrame {
    pub video: VideoId,
    pub frame_idx: usize,
    pub instances: Vec<Instance>,
}

impl LabeledFrame {
    pub fn new(video: VideoId, frame_idx: usize) -> Self {
        Self {
            video,
            frame_idx,
            instances: Vec::new(),
        }
    }

    pub fn with_instances(video: VideoId, frame_idx: usize, instances: Vec<Instance>) -> Self {
        Self {
            video,
            frame_idx,
            instances,
        }
    }

    pub fn key(&self) -> (VideoId, usize) {
        (self.video, self.frame_idx)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}
