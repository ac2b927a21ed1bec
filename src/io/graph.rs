//! Record -> labels graph construction, with `match_to` merging
//!
//! Entities are built bottom-up: skeletons, then videos and tracks, then
//! instances and frames. When a reference graph is supplied, every skeleton,
//! video and track that structurally matches one of its entities is replaced
//! by that entity (same identity), so callers can keep comparing against
//! their live objects after a reload.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{LabelsError, Result};
use crate::io::record::{LabelsRecord, FORMAT_VERSION};
use crate::io::LoadOptions;
use crate::labels::{AppendOutcome, Labels};
use crate::matching::StructuralEq;
use crate::model::{
    Instance, LabeledFrame, Point, Skeleton, SkeletonId, Track, TrackId, Uid, VideoId,
};
use crate::video::{Video, VideoBackend, VideoDescriptor};

/// Backend provider keyed by the video's position in the record
pub(crate) type BackendFor<'a> = &'a dyn Fn(usize, &VideoDescriptor) -> Option<Arc<dyn VideoBackend>>;

/// Counts of entities reused from `match_to`
#[derive(Debug, Default, Clone, Copy)]
struct Reuse {
    skeletons: usize,
    videos: usize,
    tracks: usize,
}

/// Pick the `match_to` entity to stand in for the record entity at
/// `position`. The entity at the same position wins if it matches; otherwise
/// the first matching one. An entity is handed out at most once, so distinct
/// record entities never collapse onto one identity.
fn claim<'m, T>(
    candidates: impl Iterator<Item = &'m T>,
    position: usize,
    claimed: &mut HashSet<Uid>,
    uid: impl Fn(&T) -> Uid,
    matches: impl Fn(&T) -> bool,
) -> Option<&'m T>
where
    T: 'm,
{
    let mut found = None;
    for (i, candidate) in candidates.enumerate() {
        if claimed.contains(&uid(candidate)) || !matches(candidate) {
            continue;
        }
        if i == position {
            found = Some(candidate);
            break;
        }
        found.get_or_insert(candidate);
    }
    if let Some(candidate) = found {
        claimed.insert(uid(candidate));
    }
    found
}

pub(crate) fn build_labels(
    record: LabelsRecord,
    options: &LoadOptions<'_>,
    backend_for: Option<BackendFor<'_>>,
) -> Result<Labels> {
    if let Some(version) = record.format_version {
        if version != FORMAT_VERSION {
            return Err(LabelsError::format(format!(
                "unsupported format_version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }
    }

    let mut labels = Labels::new();
    let mut reuse = Reuse::default();
    let mut claimed: HashSet<Uid> = HashSet::new();

    // Skeletons, plus for each a map from record node index to node position.
    let mut skeleton_ids: Vec<SkeletonId> = Vec::with_capacity(record.skeletons.len());
    let mut node_positions: Vec<Vec<Option<usize>>> = Vec::with_capacity(record.skeletons.len());
    for (i, sk) in record.skeletons.iter().enumerate() {
        let mut skeleton = Skeleton::new(sk.name.clone());
        let mut positions = vec![None; record.nodes.len()];
        for &node in &sk.nodes {
            let name = record.nodes.get(node).ok_or_else(|| {
                LabelsError::format(format!("skeleton {} refers to unknown node {}", i, node))
            })?;
            let position = skeleton
                .add_node(name.clone())
                .map_err(|e| LabelsError::format(e.to_string()))?;
            positions[node] = Some(position);
        }
        for &[src, dst] in &sk.edges {
            skeleton
                .add_edge_by_index(src, dst)
                .map_err(|e| LabelsError::format(e.to_string()))?;
        }

        if let Some(existing) = options.match_to.and_then(|m| {
            claim(
                m.skeletons().map(|(_, s)| s),
                i,
                &mut claimed,
                Skeleton::uid,
                |s| s.matches(&skeleton),
            )
        }) {
            tracing::debug!("Reusing skeleton '{}' from match_to", existing.name);
            skeleton = existing.clone();
            reuse.skeletons += 1;
        }
        skeleton_ids.push(labels.add_skeleton(skeleton));
        node_positions.push(positions);
    }

    let mut video_ids: Vec<VideoId> = Vec::with_capacity(record.videos.len());
    for (i, descriptor) in record.videos.into_iter().enumerate() {
        let candidate = Video::new(descriptor.clone());
        let video = match options.match_to.and_then(|m| {
            claim(
                m.videos().map(|(_, v)| v),
                i,
                &mut claimed,
                Video::uid,
                |v| v.matches(&candidate),
            )
        }) {
            Some(existing) => {
                tracing::debug!("Reusing video '{}' from match_to", existing.filename());
                reuse.videos += 1;
                existing.clone()
            }
            None => {
                let backend = backend_for
                    .and_then(|f| f(i, &descriptor))
                    .or_else(|| options.open_video(&descriptor));
                match backend {
                    Some(backend) => Video::with_backend(descriptor, backend),
                    None => candidate,
                }
            }
        };
        video_ids.push(labels.add_video(video));
    }

    let mut track_ids: Vec<TrackId> = Vec::with_capacity(record.tracks.len());
    for (i, tr) in record.tracks.into_iter().enumerate() {
        let mut track = Track::new(tr.name, tr.spawned_on);
        if let Some(existing) = options.match_to.and_then(|m| {
            claim(
                m.tracks().map(|(_, t)| t),
                i,
                &mut claimed,
                Track::uid,
                |t| t.matches(&track),
            )
        }) {
            track = existing.clone();
            reuse.tracks += 1;
        }
        track_ids.push(labels.add_track(track));
    }

    let mut duplicates = 0usize;
    for (f, fr) in record.labels.into_iter().enumerate() {
        let video = *video_ids.get(fr.video).ok_or_else(|| {
            LabelsError::format(format!("frame {} refers to unknown video {}", f, fr.video))
        })?;

        let mut instances = Vec::with_capacity(fr.instances.len());
        for ir in fr.instances {
            let skeleton = *skeleton_ids.get(ir.skeleton).ok_or_else(|| {
                LabelsError::format(format!(
                    "frame {} refers to unknown skeleton {}",
                    f, ir.skeleton
                ))
            })?;
            let positions = &node_positions[ir.skeleton];

            let mut instance = Instance::new(skeleton);
            if let Some(t) = ir.track {
                let track = *track_ids.get(t).ok_or_else(|| {
                    LabelsError::format(format!("frame {} refers to unknown track {}", f, t))
                })?;
                instance = instance.with_track(track);
            }
            for (node, point) in ir.points {
                let position = positions.get(node).copied().flatten().ok_or_else(|| {
                    LabelsError::format(format!(
                        "frame {} has a point for node {} outside skeleton {}",
                        f, node, ir.skeleton
                    ))
                })?;
                instance.set_point(position, Point::from(point));
            }
            instances.push(instance);
        }

        let outcome = labels
            .append(LabeledFrame::with_instances(video, fr.frame_idx, instances))
            .map_err(|e| LabelsError::format(e.to_string()))?;
        if outcome == AppendOutcome::Duplicate {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        tracing::debug!("Suppressed {} duplicate frames while loading", duplicates);
    }
    if options.match_to.is_some() {
        tracing::debug!(
            "match_to reused {} skeletons, {} videos, {} tracks",
            reuse.skeletons,
            reuse.videos,
            reuse.tracks
        );
    }

    Ok(labels)
}
