//! # pose-labels: Mergeable Pose Annotation Datasets
//!
//! An indexed, deduplicated object graph for multi-animal tracked pose
//! annotations: labeled frames drawn from videos, each holding instances of a
//! skeleton, optionally bound to a persistent track.
//!
//! ## Architecture
//!
//! - **Model**: `Skeleton`, `Track`, `Point`, `Instance`, `LabeledFrame`
//! - **Labels**: the container, owning frames plus arenas of videos,
//!   skeletons and tracks referenced by typed ids
//! - **Matching**: structural equality used to merge a reload into an
//!   existing graph
//! - **IO**: JSON records (current and legacy), frame-data archives, HDF5
//!   and analysis exports
//! - **Video**: the pixel-source seam (`VideoBackend`) used when embedding
//!   frames
//!
//! ## Example
//!
//! ```ignore
//! use pose_labels::{io, Instance, LabeledFrame, Labels, Point, Skeleton, Video};
//!
//! let mut labels = Labels::new();
//! let video = labels.add_video(Video::from_filename("centered_pair.mp4"));
//! let skeleton = labels.add_skeleton(Skeleton::from_names(
//!     "fly",
//!     &["head", "thorax"],
//!     &[("head", "thorax")],
//! )?);
//!
//! let instance = Instance::with_points(skeleton, vec![Point::new(10.0, 20.0)]);
//! labels.append(LabeledFrame::with_instances(video, 0, vec![instance]))?;
//!
//! io::save(&labels, "session.json", &io::SaveOptions::default())?;
//! let reloaded = io::load(
//!     "session.json",
//!     &io::LoadOptions::default().with_match_to(&labels),
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod labels;
pub mod logging;
pub mod matching;
pub mod model;
pub mod video;

// Re-export commonly used types
pub use config::DatasetConfig;
pub use error::{LabelsError, Result, ResultExt};
pub use io::{load, save, LoadOptions, SaveOptions};
pub use labels::{AppendOutcome, Labels, Member};
pub use matching::{InstanceRef, StructuralEq, MATCH_TOLERANCE};
pub use model::{
    Instance, LabeledFrame, Point, Skeleton, SkeletonId, Track, TrackId, Uid, VideoId,
};
pub use video::{Video, VideoBackend, VideoDescriptor, VideoShape};
