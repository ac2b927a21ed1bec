//! Legacy (v1) schema and its upgrade to the current record
//!
//! v1 files describe a single implicit skeleton through a flat node-name list
//! and store one row per annotated point:
//!
//! ```json
//! {
//!   "skel_node_names": ["head", "thorax"],
//!   "skel_edges": [[1, 2]],
//!   "videos": [{"id": 1, "filepath": "fly.mp4", "format": "media"}],
//!   "points": [{"videoId": 1, "frameIdx": 1, "instanceId": 1,
//!               "node": 1, "x": 11.0, "y": 21.0, "visible": true}]
//! }
//! ```
//!
//! Frame indices, node indices, edges and coordinates are 1-based (they were
//! written by MATLAB tooling) and are shifted to 0-based on upgrade.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer};

use crate::error::{LabelsError, Result};
use crate::io::record::{
    FrameRecord, InstanceRecord, LabelsRecord, PointRecord, SkeletonRecord, FORMAT_VERSION,
};
use crate::video::VideoDescriptor;

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRecord {
    pub skel_node_names: Vec<String>,
    #[serde(default)]
    pub skel_edges: Vec<[i64; 2]>,
    #[serde(default)]
    pub skel_name: Option<String>,
    pub videos: Vec<LegacyVideo>,
    pub points: Vec<LegacyPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyVideo {
    pub id: i64,
    pub filepath: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPoint {
    pub video_id: i64,
    pub frame_idx: i64,
    pub instance_id: i64,
    pub node: i64,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_visible", deserialize_with = "bool_or_number")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// MATLAB exports write logicals as 0/1.
fn bool_or_number<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(f64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Number(n) => n != 0.0,
    })
}

fn zero_based(value: i64, what: &str) -> Result<usize> {
    if value < 1 {
        return Err(LabelsError::format(format!(
            "legacy {} must be 1-based, got {}",
            what, value
        )));
    }
    Ok((value - 1) as usize)
}

impl LegacyRecord {
    /// Normalize into the current schema.
    ///
    /// Frames are ordered by `(videoId, frameIdx)` and instances within a
    /// frame by `instanceId`. Every instance binds to the single skeleton.
    pub fn upgrade(self) -> Result<LabelsRecord> {
        let node_count = self.skel_node_names.len();

        let mut edges = Vec::with_capacity(self.skel_edges.len());
        for [src, dst] in &self.skel_edges {
            let (src, dst) = (zero_based(*src, "edge")?, zero_based(*dst, "edge")?);
            if src >= node_count || dst >= node_count {
                return Err(LabelsError::format(format!(
                    "legacy edge ({}, {}) out of range for {} nodes",
                    src + 1,
                    dst + 1,
                    node_count
                )));
            }
            edges.push([src, dst]);
        }

        let video_positions: HashMap<i64, usize> = self
            .videos
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, i))
            .collect();

        // (video, frame) -> instance id -> node -> point
        let mut grouped: BTreeMap<(usize, usize), BTreeMap<i64, BTreeMap<usize, PointRecord>>> =
            BTreeMap::new();
        for point in &self.points {
            let video = *video_positions.get(&point.video_id).ok_or_else(|| {
                LabelsError::format(format!("legacy point refers to unknown video {}", point.video_id))
            })?;
            let frame_idx = zero_based(point.frame_idx, "frameIdx")?;
            let node = zero_based(point.node, "node")?;
            if node >= node_count {
                return Err(LabelsError::format(format!(
                    "legacy node {} out of range for {} nodes",
                    point.node, node_count
                )));
            }
            grouped
                .entry((video, frame_idx))
                .or_default()
                .entry(point.instance_id)
                .or_default()
                .insert(
                    node,
                    PointRecord::Plain(point.x - 1.0, point.y - 1.0, point.visible),
                );
        }

        let labels = grouped
            .into_iter()
            .map(|((video, frame_idx), instances)| FrameRecord {
                video,
                frame_idx,
                instances: instances
                    .into_values()
                    .map(|points| InstanceRecord {
                        skeleton: 0,
                        track: None,
                        points,
                    })
                    .collect(),
            })
            .collect();

        let videos = self
            .videos
            .into_iter()
            .map(|v| {
                let mut descriptor = VideoDescriptor::new(v.filepath);
                if v.format.as_deref() == Some("hdf5") {
                    descriptor.dataset = v.dataset;
                }
                descriptor
            })
            .collect();

        Ok(LabelsRecord {
            format_version: Some(FORMAT_VERSION),
            nodes: self.skel_node_names,
            skeletons: vec![SkeletonRecord {
                name: self.skel_name.unwrap_or_else(|| "Skeleton-0".to_string()),
                nodes: (0..node_count).collect(),
                edges,
            }],
            videos,
            tracks: Vec::new(),
            labels,
            frame_data: None,
            provenance: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_json() -> &'static str {
        r#"{
            "skel_node_names": ["head", "thorax", "abdomen"],
            "skel_edges": [[1, 2], [2, 3]],
            "videos": [{"id": 7, "filepath": "centered_pair.mp4", "format": "media"}],
            "points": [
                {"videoId": 7, "frameIdx": 5, "instanceId": 2, "node": 1, "x": 11, "y": 21, "visible": 1},
                {"videoId": 7, "frameIdx": 5, "instanceId": 1, "node": 2, "x": 31, "y": 41, "visible": true},
                {"videoId": 7, "frameIdx": 1, "instanceId": 3, "node": 3, "x": 2, "y": 2, "visible": 0}
            ]
        }"#
    }

    #[test]
    fn test_upgrade_shifts_to_zero_based() {
        let legacy: LegacyRecord = serde_json::from_str(legacy_json()).unwrap();
        let record = legacy.upgrade().unwrap();

        assert_eq!(record.nodes, vec!["head", "thorax", "abdomen"]);
        assert_eq!(record.skeletons[0].edges, vec![[0, 1], [1, 2]]);
        assert_eq!(record.labels.len(), 2);

        // Sorted by frame index
        assert_eq!(record.labels[0].frame_idx, 0);
        assert_eq!(record.labels[1].frame_idx, 4);

        // Instances ordered by instance id: id 1 first
        let frame = &record.labels[1];
        assert_eq!(frame.instances.len(), 2);
        assert!(frame.instances[0].points.contains_key(&1));
        match frame.instances[1].points[&0] {
            PointRecord::Plain(x, y, visible) => {
                assert_eq!((x, y), (10.0, 20.0));
                assert!(visible);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_upgrade_rejects_zero_index() {
        let json = r#"{"skel_node_names": ["a"], "videos": [{"id": 1, "filepath": "v"}],
            "points": [{"videoId": 1, "frameIdx": 0, "instanceId": 1, "node": 1, "x": 1, "y": 1}]}"#;
        let legacy: LegacyRecord = serde_json::from_str(json).unwrap();
        assert!(legacy.upgrade().unwrap_err().is_format());
    }

    #[test]
    fn test_upgrade_rejects_unknown_video() {
        let json = r#"{"skel_node_names": ["a"], "videos": [],
            "points": [{"videoId": 1, "frameIdx": 1, "instanceId": 1, "node": 1, "x": 1, "y": 1}]}"#;
        let legacy: LegacyRecord = serde_json::from_str(json).unwrap();
        assert!(legacy.upgrade().unwrap_err().is_format());
    }

    #[test]
    fn test_hdf5_video_keeps_dataset() {
        let json = r#"{"skel_node_names": ["a"], "points": [],
            "videos": [{"id": 1, "filepath": "box.h5", "format": "hdf5", "dataset": "box"}]}"#;
        let legacy: LegacyRecord = serde_json::from_str(json).unwrap();
        let record = legacy.upgrade().unwrap();
        assert_eq!(record.videos[0].dataset.as_deref(), Some("box"));
    }
}
