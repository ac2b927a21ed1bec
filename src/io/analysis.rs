//! Tracking analysis export
//!
//! Per-video matrices for downstream analysis:
//!
//! - `track_occupancy` (tracks x frames): 1 where the track has an instance
//! - `tracks` (frames x nodes x 2 x tracks): coordinates, NaN where missing
//! - `track_names`, `node_names`
//!
//! Node positions follow [`Labels::nodes`], so instances of different
//! skeletons land in the same columns when they share node names.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array4};

use crate::error::{LabelsError, Result};
use crate::labels::Labels;
use crate::model::{TrackId, VideoId};

#[derive(Debug, Clone)]
pub struct TrackingAnalysis {
    pub node_names: Vec<String>,
    pub track_names: Vec<String>,
    pub track_occupancy: Array2<u8>,
    pub tracks: Array4<f64>,
    /// `frame_idx` of row 0
    pub first_frame: usize,
}

impl TrackingAnalysis {
    /// Build the matrices for one video.
    ///
    /// With `all_frames` the frame axis covers `0..=max frame_idx`; otherwise
    /// it covers only the labeled span `min..=max`. Instances without a track
    /// fill one anonymous column when the dataset has no tracks at all, and
    /// are skipped otherwise.
    pub fn from_labels(labels: &Labels, video: VideoId, all_frames: bool) -> Result<Self> {
        let frames = labels.by_video(video)?;

        let node_names: Vec<String> = labels.nodes().into_iter().map(String::from).collect();
        let node_column: HashMap<&str, usize> = node_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let track_ids: Vec<TrackId> = labels.tracks().map(|(id, _)| id).collect();
        let anonymous = track_ids.is_empty();
        let mut track_names: Vec<String> = labels.tracks().map(|(_, t)| t.name.clone()).collect();
        if anonymous && frames.iter().any(|f| !f.instances.is_empty()) {
            track_names.push(String::new());
        }
        let track_column: HashMap<TrackId, usize> =
            track_ids.iter().enumerate().map(|(i, &t)| (t, i)).collect();

        let (first_frame, frame_count) = match (
            frames.iter().map(|f| f.frame_idx).min(),
            frames.iter().map(|f| f.frame_idx).max(),
        ) {
            (Some(_), Some(max)) if all_frames => (0, max + 1),
            (Some(min), Some(max)) => (min, max - min + 1),
            _ => (0, 0),
        };

        let mut track_occupancy = Array2::<u8>::zeros((track_names.len(), frame_count));
        let mut tracks = Array4::<f64>::from_elem(
            (frame_count, node_names.len(), 2, track_names.len()),
            f64::NAN,
        );

        for frame in &frames {
            let row = frame.frame_idx - first_frame;
            for instance in &frame.instances {
                let column = match instance.track {
                    Some(track) => track_column.get(&track).copied(),
                    None if anonymous => Some(0),
                    None => None,
                };
                let Some(column) = column else {
                    continue;
                };
                let skeleton = labels.skeleton(instance.skeleton).ok_or_else(|| {
                    LabelsError::InvalidFrame(format!("{} is not registered", instance.skeleton))
                })?;

                track_occupancy[[column, row]] = 1;
                for (node, point) in instance.annotated() {
                    let Some(&node_col) = skeleton
                        .node_names()
                        .get(node)
                        .and_then(|name| node_column.get(name.as_str()))
                    else {
                        continue;
                    };
                    tracks[[row, node_col, 0, column]] = point.x;
                    tracks[[row, node_col, 1, column]] = point.y;
                }
            }
        }

        tracing::debug!(
            "Analysis for {}: {} frames x {} nodes x {} tracks",
            video,
            frame_count,
            node_names.len(),
            track_names.len()
        );

        Ok(Self {
            node_names,
            track_names,
            track_occupancy,
            tracks,
            first_frame,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.tracks.shape()[0]
    }

    /// Write the matrices to an HDF5 analysis file.
    #[cfg(feature = "hdf5")]
    pub fn save_hdf5(&self, path: impl AsRef<Path>) -> Result<()> {
        use ::hdf5::types::VarLenUnicode;

        fn names(values: &[String]) -> Result<Vec<VarLenUnicode>> {
            values
                .iter()
                .map(|v| {
                    v.parse::<VarLenUnicode>()
                        .map_err(|e| LabelsError::format(e.to_string()))
                })
                .collect()
        }

        let path = path.as_ref();
        let file = ::hdf5::File::create(path)?;
        file.new_dataset::<u8>()
            .shape(self.track_occupancy.dim())
            .create("track_occupancy")?
            .write_raw(&self.track_occupancy.iter().copied().collect::<Vec<_>>())?;
        file.new_dataset::<f64>()
            .shape(self.tracks.shape().to_vec())
            .create("tracks")?
            .write_raw(&self.tracks.iter().copied().collect::<Vec<_>>())?;
        let track_names = names(&self.track_names)?;
        file.new_dataset::<VarLenUnicode>()
            .shape(track_names.len())
            .create("track_names")?
            .write_raw(&track_names)?;
        let node_names = names(&self.node_names)?;
        file.new_dataset::<VarLenUnicode>()
            .shape(node_names.len())
            .create("node_names")?
            .write_raw(&node_names)?;

        tracing::info!("Wrote analysis file {}", path.display());
        Ok(())
    }

    #[cfg(not(feature = "hdf5"))]
    pub fn save_hdf5(&self, path: impl AsRef<Path>) -> Result<()> {
        Err(LabelsError::Unsupported(format!(
            "cannot write {}: built without the `hdf5` feature",
            path.as_ref().display()
        )))
    }
}

/// Default analysis file for a dataset path: known dataset extensions are
/// stripped and `.analysis.h5` appended.
pub fn analysis_output_path(input: &Path) -> PathBuf {
    let name = input.to_string_lossy().into_owned();
    let stem = [".json.zip", ".json", ".h5", ".slp"]
        .iter()
        .find_map(|ext| name.strip_suffix(*ext))
        .unwrap_or(name.as_str());
    PathBuf::from(format!("{}.analysis.h5", stem))
}
