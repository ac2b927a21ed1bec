//! Current persisted schema
//!
//! ```json
//! {
//!   "format_version": 2,
//!   "nodes": ["head", "thorax"],
//!   "skeletons": [{"name": "fly", "nodes": [0, 1], "edges": [[0, 1]]}],
//!   "videos": [{"filename": "fly.mp4"}],
//!   "tracks": [{"name": "female", "spawned_on": 0}],
//!   "labels": [{"video": 0, "frame_idx": 12, "instances": [
//!     {"skeleton": 0, "track": 0, "points": {"0": [10.5, 20.0, true]}}
//!   ]}]
//! }
//! ```
//!
//! Skeleton `nodes` index the top-level `nodes` list; skeleton `edges` index
//! the skeleton's own node list; instance `points` are keyed by top-level
//! node index. Entities are referenced by position everywhere.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::model::{Point, SkeletonId, TrackId, VideoId};
use crate::video::VideoDescriptor;

/// Schema version written by this crate
pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,
    pub nodes: Vec<String>,
    pub skeletons: Vec<SkeletonRecord>,
    pub videos: Vec<VideoDescriptor>,
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
    pub labels: Vec<FrameRecord>,
    /// Present when the record is stored inside a frame-data archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_data: Option<FrameDataRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkeletonRecord {
    pub name: String,
    pub nodes: Vec<usize>,
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub name: String,
    pub spawned_on: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub video: usize,
    pub frame_idx: usize,
    pub instances: Vec<InstanceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub skeleton: usize,
    #[serde(default)]
    pub track: Option<usize>,
    pub points: BTreeMap<usize, PointRecord>,
}

/// `[x, y, visible]` or `[x, y, visible, score]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointRecord {
    Scored(f64, f64, bool, f64),
    Plain(f64, f64, bool),
}

impl From<&Point> for PointRecord {
    fn from(p: &Point) -> Self {
        // JSON has no NaN/inf; a non-finite score is written as no score
        match p.score {
            Some(score) if score.is_finite() => PointRecord::Scored(p.x, p.y, p.visible, score),
            _ => PointRecord::Plain(p.x, p.y, p.visible),
        }
    }
}

impl From<PointRecord> for Point {
    fn from(record: PointRecord) -> Self {
        match record {
            PointRecord::Scored(x, y, visible, score) => Point {
                x,
                y,
                visible,
                score: Some(score),
            },
            PointRecord::Plain(x, y, visible) => Point::with_visibility(x, y, visible),
        }
    }
}

/// Where embedded frames live inside an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDataRecord {
    pub dir: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub generator: String,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

impl Provenance {
    pub fn now() -> Self {
        Self {
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            saved_at: chrono::Utc::now(),
        }
    }
}

/// Positions of live entities in the written record.
#[derive(Debug, Default)]
pub(crate) struct RecordIndex {
    pub nodes: Vec<String>,
    pub videos: HashMap<VideoId, usize>,
    pub skeletons: HashMap<SkeletonId, usize>,
    pub tracks: HashMap<TrackId, usize>,
}

impl RecordIndex {
    pub fn new(labels: &Labels) -> Self {
        Self {
            nodes: labels.nodes().into_iter().map(String::from).collect(),
            videos: labels.videos().enumerate().map(|(i, (id, _))| (id, i)).collect(),
            skeletons: labels
                .skeletons()
                .enumerate()
                .map(|(i, (id, _))| (id, i))
                .collect(),
            tracks: labels.tracks().enumerate().map(|(i, (id, _))| (id, i)).collect(),
        }
    }

    pub fn node(&self, name: &str) -> usize {
        // Every skeleton node is in `nodes` by construction.
        self.nodes.iter().position(|n| n == name).unwrap_or(usize::MAX)
    }
}

/// Flatten a labels graph into the current schema.
pub fn to_record(labels: &Labels) -> LabelsRecord {
    let index = RecordIndex::new(labels);

    let skeletons = labels
        .skeletons()
        .map(|(_, skeleton)| SkeletonRecord {
            name: skeleton.name.clone(),
            nodes: skeleton.node_names().iter().map(|n| index.node(n)).collect(),
            edges: skeleton.edges().iter().map(|&(s, d)| [s, d]).collect(),
        })
        .collect();

    let videos = labels
        .videos()
        .map(|(_, video)| {
            let mut descriptor = video.descriptor().clone();
            if descriptor.shape.is_none() {
                descriptor.shape = video.shape();
            }
            descriptor
        })
        .collect();

    let tracks = labels
        .tracks()
        .map(|(_, track)| TrackRecord {
            name: track.name.clone(),
            spawned_on: track.spawned_on,
        })
        .collect();

    let frames = labels
        .iter()
        .map(|frame| FrameRecord {
            video: index.videos[&frame.video],
            frame_idx: frame.frame_idx,
            instances: frame
                .instances
                .iter()
                .map(|instance| {
                    let node_names = labels
                        .skeleton(instance.skeleton)
                        .map(|s| s.node_names())
                        .unwrap_or_default();
                    InstanceRecord {
                        skeleton: index.skeletons[&instance.skeleton],
                        track: instance.track.map(|t| index.tracks[&t]),
                        // Infinite coordinates cannot be written; they load as missing
                        points: instance
                            .annotated()
                            .filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
                            .filter_map(|(node, point)| {
                                node_names
                                    .get(node)
                                    .map(|name| (index.node(name), PointRecord::from(point)))
                            })
                            .collect(),
                    }
                })
                .collect(),
        })
        .collect();

    LabelsRecord {
        format_version: Some(FORMAT_VERSION),
        nodes: index.nodes,
        skeletons,
        videos,
        tracks,
        labels: frames,
        frame_data: None,
        provenance: Some(Provenance::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_record_shapes() {
        let plain: PointRecord = serde_json::from_str("[1.5, 2.5, true]").unwrap();
        assert!(matches!(plain, PointRecord::Plain(x, _, true) if x == 1.5));

        let scored: PointRecord = serde_json::from_str("[1.5, 2.5, false, 0.75]").unwrap();
        let point = Point::from(scored);
        assert_eq!(point.score, Some(0.75));
        assert!(!point.visible);

        assert!(serde_json::from_str::<PointRecord>("[1.5]").is_err());
    }

    #[test]
    fn test_point_record_serializes_as_array() {
        let json = serde_json::to_string(&PointRecord::from(&Point::new(1.0, 2.0))).unwrap();
        assert_eq!(json, "[1.0,2.0,true]");
    }

    #[test]
    fn test_non_finite_values_reload() {
        use crate::io::{from_json_str, to_json_string, LoadOptions};
        use crate::model::{Instance, LabeledFrame, Skeleton};
        use crate::video::Video;

        let mut labels = Labels::new();
        let video = labels.add_video(Video::from_filename("a.mp4"));
        let skeleton = labels.add_skeleton(Skeleton::from_names("s", &["a", "b"], &[]).unwrap());
        let instance = Instance::with_points(
            skeleton,
            vec![
                Point::predicted(1.0, 2.0, f64::NAN),
                Point::new(f64::INFINITY, 3.0),
            ],
        );
        labels
            .append(LabeledFrame::with_instances(video, 0, vec![instance]))
            .unwrap();

        let json = to_json_string(&labels, false).unwrap();
        assert!(json.contains(r#""points":{"0":[1.0,2.0,true]}"#));
        let loaded = from_json_str(&json, &LoadOptions::default()).unwrap();
        let point = loaded.by_index(0).unwrap().instances[0].point(0);
        assert_eq!(point.xy(), [1.0, 2.0]);
        assert_eq!(point.score, None);
        assert!(loaded.by_index(0).unwrap().instances[0].point(1).is_missing());
    }

    #[test]
    fn test_points_keyed_by_node_index() {
        let json = r#"{"skeleton": 0, "points": {"3": [0.0, 1.0, true]}}"#;
        let record: InstanceRecord = serde_json::from_str(json).unwrap();
        assert!(record.track.is_none());
        assert!(record.points.contains_key(&3));
    }
}
