//! Structural equality
//!
//! [`StructuralEq::matches`] compares entities by content, never by identity:
//! two skeletons parsed from the same record match even though they are
//! distinct objects. The same predicate drives `match_to` merging on load and
//! the round-trip assertions in the tests.
//!
//! Points compare within [`MATCH_TOLERANCE`] so that values that went through
//! a text round trip still match. Instances and frames hold arena ids, so
//! they are compared through [`InstanceRef`] / [`FrameRef`] views that carry
//! the resolved skeleton, track and video.

use crate::labels::Labels;
use crate::model::{Instance, LabeledFrame, Point, Skeleton, Track};
use crate::video::Video;

/// Absolute coordinate tolerance for point comparison
pub const MATCH_TOLERANCE: f64 = 1e-3;

/// Content-based equality
pub trait StructuralEq<Rhs: ?Sized = Self> {
    fn matches(&self, other: &Rhs) -> bool;
}

impl Point {
    /// Coordinates equal within `tolerance`, or both missing.
    /// Visibility and score are not compared.
    pub fn matches_within(&self, other: &Point, tolerance: f64) -> bool {
        match (self.is_missing(), other.is_missing()) {
            (true, true) => true,
            (false, false) => {
                (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
            }
            _ => false,
        }
    }
}

impl StructuralEq for Point {
    fn matches(&self, other: &Point) -> bool {
        self.matches_within(other, MATCH_TOLERANCE)
    }
}

/// Same node names in the same order and the same edge set. The display
/// name is not compared.
impl StructuralEq for Skeleton {
    fn matches(&self, other: &Skeleton) -> bool {
        self.node_names() == other.node_names() && self.sorted_edges() == other.sorted_edges()
    }
}

impl StructuralEq for Track {
    fn matches(&self, other: &Track) -> bool {
        self.same_value(other)
    }
}

impl StructuralEq for Video {
    fn matches(&self, other: &Video) -> bool {
        self.descriptor().same_source(other.descriptor())
    }
}

/// An instance with its skeleton and track resolved.
#[derive(Debug, Clone, Copy)]
pub struct InstanceRef<'a> {
    pub instance: &'a Instance,
    pub skeleton: &'a Skeleton,
    pub track: Option<&'a Track>,
}

impl InstanceRef<'_> {
    pub fn matches_within(&self, other: &InstanceRef<'_>, tolerance: f64) -> bool {
        if !self.skeleton.matches(other.skeleton) {
            return false;
        }
        (0..self.skeleton.node_count()).all(|node| {
            self.instance
                .point(node)
                .matches_within(&other.instance.point(node), tolerance)
        })
    }
}

/// Skeletons match and every point matches within [`MATCH_TOLERANCE`].
/// Tracks are not compared.
impl StructuralEq for InstanceRef<'_> {
    fn matches(&self, other: &InstanceRef<'_>) -> bool {
        self.matches_within(other, MATCH_TOLERANCE)
    }
}

/// A frame with its container, for resolving instances.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a> {
    pub labels: &'a Labels,
    pub frame: &'a LabeledFrame,
    pub video: Option<&'a Video>,
}

impl FrameRef<'_> {
    /// Resolved instances; `None` for an instance whose skeleton is foreign
    /// to the container.
    pub fn instances(&self) -> impl Iterator<Item = Option<InstanceRef<'_>>> + '_ {
        self.frame
            .instances
            .iter()
            .map(|i| self.labels.instance_ref(i))
    }
}

impl FrameRef<'_> {
    pub fn matches_within(&self, other: &FrameRef<'_>, tolerance: f64) -> bool {
        let videos_match = match (self.video, other.video) {
            (Some(a), Some(b)) => a.matches(b),
            _ => false,
        };
        videos_match
            && self.frame.frame_idx == other.frame.frame_idx
            && self.frame.instances.len() == other.frame.instances.len()
            && self
                .instances()
                .zip(other.instances())
                .all(|pair| match pair {
                    (Some(a), Some(b)) => a.matches_within(&b, tolerance),
                    _ => false,
                })
    }
}

impl StructuralEq for FrameRef<'_> {
    fn matches(&self, other: &FrameRef<'_>) -> bool {
        self.matches_within(other, MATCH_TOLERANCE)
    }
}

impl Labels {
    /// Structural comparison with an explicit point tolerance.
    ///
    /// Skeleton-by-skeleton, track-by-track, video-by-video and then
    /// frame-by-frame in order.
    pub fn matches_within(&self, other: &Labels, tolerance: f64) -> bool {
        fn pairwise<'a, T: StructuralEq + 'a>(
            a: impl Iterator<Item = &'a T>,
            b: impl Iterator<Item = &'a T>,
        ) -> bool {
            let a: Vec<_> = a.collect();
            let b: Vec<_> = b.collect();
            a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.matches(y))
        }

        pairwise(self.skeletons().map(|(_, s)| s), other.skeletons().map(|(_, s)| s))
            && pairwise(self.tracks().map(|(_, t)| t), other.tracks().map(|(_, t)| t))
            && pairwise(self.videos().map(|(_, v)| v), other.videos().map(|(_, v)| v))
            && self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| self.frame_ref(a).matches_within(&other.frame_ref(b), tolerance))
    }
}

impl StructuralEq for Labels {
    fn matches(&self, other: &Labels) -> bool {
        self.matches_within(other, MATCH_TOLERANCE)
    }
}
