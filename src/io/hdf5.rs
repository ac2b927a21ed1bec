//! HDF5 dataset layout
//!
//! The labels graph is flattened into three row tables that reference each
//! other by half-open ranges, plus the JSON metadata (the record without its
//! `labels`):
//!
//! | Table | Columns |
//! |---|---|
//! | `frames` | frame_id, video, frame_idx, instance_start, instance_end |
//! | `instances` | instance_id, frame_id, skeleton, track (-1 = none), point_start, point_end |
//! | `points` | x, y, visible, score (NaN = none) |
//!
//! Every instance owns one point row per skeleton node. Building the layout
//! needs no native library; writing it needs the `hdf5` feature.

use std::path::Path;

use crate::error::Result;
use crate::io::record::{to_record, RecordIndex};
use crate::labels::Labels;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRow {
    pub frame_id: u64,
    pub video: u64,
    pub frame_idx: u64,
    pub instance_start: u64,
    pub instance_end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceRow {
    pub instance_id: u64,
    pub frame_id: u64,
    pub skeleton: u64,
    pub track: i64,
    pub point_start: u64,
    pub point_end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRow {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
    pub score: f64,
}

/// Flattened tables ready to be written
#[derive(Debug, Clone)]
pub struct HdfLayout {
    pub metadata: String,
    pub frames: Vec<FrameRow>,
    pub instances: Vec<InstanceRow>,
    pub points: Vec<PointRow>,
}

impl HdfLayout {
    pub fn from_labels(labels: &Labels) -> Result<Self> {
        let index = RecordIndex::new(labels);

        let mut metadata = to_record(labels);
        metadata.labels.clear();
        let metadata = serde_json::to_string(&metadata)?;

        let mut frames = Vec::with_capacity(labels.len());
        let mut instances = Vec::new();
        let mut points = Vec::new();

        for (frame_id, frame) in labels.iter().enumerate() {
            let instance_start = instances.len() as u64;
            for instance in &frame.instances {
                let point_start = points.len() as u64;
                points.extend(instance.points().iter().map(|p| PointRow {
                    x: p.x,
                    y: p.y,
                    visible: p.visible,
                    score: p.score.unwrap_or(f64::NAN),
                }));
                instances.push(InstanceRow {
                    instance_id: instances.len() as u64,
                    frame_id: frame_id as u64,
                    skeleton: index.skeletons[&instance.skeleton] as u64,
                    track: instance.track.map_or(-1, |t| index.tracks[&t] as i64),
                    point_start,
                    point_end: points.len() as u64,
                });
            }
            frames.push(FrameRow {
                frame_id: frame_id as u64,
                video: index.videos[&frame.video] as u64,
                frame_idx: frame.frame_idx as u64,
                instance_start,
                instance_end: instances.len() as u64,
            });
        }

        Ok(Self {
            metadata,
            frames,
            instances,
            points,
        })
    }

    /// `frames` as a row-major `n x 5` matrix
    pub fn frame_matrix(&self) -> Vec<u64> {
        self.frames
            .iter()
            .flat_map(|r| [r.frame_id, r.video, r.frame_idx, r.instance_start, r.instance_end])
            .collect()
    }

    /// `instances` as a row-major `n x 6` matrix
    pub fn instance_matrix(&self) -> Vec<i64> {
        self.instances
            .iter()
            .flat_map(|r| {
                [
                    r.instance_id as i64,
                    r.frame_id as i64,
                    r.skeleton as i64,
                    r.track,
                    r.point_start as i64,
                    r.point_end as i64,
                ]
            })
            .collect()
    }

    /// `points` as a row-major `n x 4` matrix (visible as 0/1)
    pub fn point_matrix(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|r| [r.x, r.y, if r.visible { 1.0 } else { 0.0 }, r.score])
            .collect()
    }
}

/// Write the dataset layout to an HDF5 file.
#[cfg(feature = "hdf5")]
pub fn save_hdf5(labels: &Labels, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let layout = HdfLayout::from_labels(labels)?;

    let file = ::hdf5::File::create(path)?;
    file.new_dataset::<u8>()
        .shape(layout.metadata.len())
        .create("metadata")?
        .write_raw(layout.metadata.as_bytes())?;
    file.new_dataset::<u64>()
        .shape((layout.frames.len(), 5))
        .create("frames")?
        .write_raw(&layout.frame_matrix())?;
    file.new_dataset::<i64>()
        .shape((layout.instances.len(), 6))
        .create("instances")?
        .write_raw(&layout.instance_matrix())?;
    file.new_dataset::<f64>()
        .shape((layout.points.len(), 4))
        .create("points")?
        .write_raw(&layout.point_matrix())?;

    tracing::info!(
        "Wrote HDF5 dataset with {} frames, {} instances to {}",
        layout.frames.len(),
        layout.instances.len(),
        path.display()
    );
    Ok(())
}

#[cfg(not(feature = "hdf5"))]
pub fn save_hdf5(_labels: &Labels, path: impl AsRef<Path>) -> Result<()> {
    Err(crate::error::LabelsError::Unsupported(format!(
        "cannot write {}: built without the `hdf5` feature",
        path.as_ref().display()
    )))
}
