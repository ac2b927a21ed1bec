//! Core entity types of the labels graph
//!
//! - [`Skeleton`] - named nodes and their connectivity
//! - [`Track`] - persistent identity across frames
//! - [`Point`] - one landmark coordinate (NaN = missing)
//! - [`Instance`] - one skeleton occurrence in a frame
//! - [`LabeledFrame`] - all instances at a `(video, frame_idx)`
//!
//! Instances and frames refer to skeletons, tracks and videos through the
//! arena ids in [`id`], which are issued by a [`Labels`](crate::Labels).

pub mod frame;
pub mod id;
pub mod instance;
pub mod point;
pub mod skeleton;
pub mod track;

pub use frame::LabeledFrame;
pub use id::{SkeletonId, TrackId, Uid, VideoId};
pub use instance::Instance;
pub use point::Point;
pub use skeleton::Skeleton;
pub use track::Track;
