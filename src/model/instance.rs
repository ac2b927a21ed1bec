//! Skeleton occurrences

use crate::model::id::{SkeletonId, TrackId};
use crate::model::point::Point;

/// One occurrence of a skeleton's landmarks in one frame.
///
/// `points[i]` belongs to node `i` of the bound skeleton. Nodes past the end
/// of `points` are missing; `Labels::append` pads the vector to the node
/// count so that every retained instance has exactly one point per node.
#[derive(Debug, Clone)]
pub struct Instance {
    pub skeleton: SkeletonId,
    pub track: Option<TrackId>,
    points: Vec<Point>,
}

impl Instance {
    /// Instance with every point missing
    pub fn new(skeleton: SkeletonId) -> Self {
        Self {
            skeleton,
            track: None,
            points: Vec::new(),
        }
    }

    pub fn with_points(skeleton: SkeletonId, points: Vec<Point>) -> Self {
        Self {
            skeleton,
            track: None,
            points,
        }
    }

    pub fn with_track(mut self, track: TrackId) -> Self {
        self.track = Some(track);
        self
    }

    /// Point for a node position, missing if never set
    pub fn point(&self, node: usize) -> Point {
        self.points.get(node).copied().unwrap_or_else(Point::missing)
    }

    pub fn set_point(&mut self, node: usize, point: Point) {
        if node >= self.points.len() {
            self.points.resize(node + 1, Point::missing());
        }
        self.points[node] = point;
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// `(node position, point)` for every annotated node
    pub fn annotated(&self) -> impl Iterator<Item = (usize, &Point)> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_missing())
    }

    pub fn annotated_count(&self) -> usize {
        self.annotated().count()
    }

    pub(crate) fn pad_to(&mut self, node_count: usize) {
        if self.points.len() < node_count {
            self.points.resize(node_count, Point::missing());
        }
    }
}

/// Equal skeleton, track and points, where trailing unset points count as
/// missing.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        let len = self.points.len().max(other.points.len());
        self.skeleton == other.skeleton
            && self.track == other.track
            && (0..len).all(|i| self.point(i) == other.point(i))
    }
}
