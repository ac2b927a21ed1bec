//! The labels container
//!
//! [`Labels`] owns the ordered list of [`LabeledFrame`]s together with the
//! arenas of videos, skeletons and tracks they refer to.
//!
//! # Invariants
//!
//! - At most one frame per `(video, frame_idx)`; empty frames are never kept.
//! - Every video, skeleton and track referenced by a retained frame is
//!   registered. Videos and skeletons may also be registered with no frames.
//! - No two registered skeletons match structurally, and no two tracks share
//!   `(name, spawned_on)`.
//! - Every retained instance has exactly one point per skeleton node.
//!
//! Removing a video drops its frames but leaves skeletons and tracks in
//! place, even if nothing references them anymore.
//!
//! # Lookups
//!
//! `find`/`find_first`/`instances` never fail. The strict accessors
//! (`by_index`, `by_video`, `by_video_and_frame`) return `Err` when the
//! requested entry does not exist.

pub mod arena;

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{LabelsError, Result};
use crate::matching::{FrameRef, InstanceRef, StructuralEq};
use crate::model::{
    Instance, LabeledFrame, Skeleton, SkeletonId, Track, TrackId, VideoId,
};
use crate::video::Video;

use arena::Arena;

/// Result of [`Labels::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Frame stored at this position
    Inserted(usize),
    /// Frame had no instances and was dropped
    Empty,
    /// A frame for the same `(video, frame_idx)` already exists
    Duplicate,
}

impl AppendOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, AppendOutcome::Inserted(_))
    }
}

/// Anything that can be tested for membership with [`Labels::contains`]
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Video(VideoId),
    Skeleton(SkeletonId),
    Track(TrackId),
    Frame(&'a LabeledFrame),
    Key(VideoId, usize),
}

impl From<VideoId> for Member<'_> {
    fn from(id: VideoId) -> Self {
        Member::Video(id)
    }
}

impl From<SkeletonId> for Member<'_> {
    fn from(id: SkeletonId) -> Self {
        Member::Skeleton(id)
    }
}

impl From<TrackId> for Member<'_> {
    fn from(id: TrackId) -> Self {
        Member::Track(id)
    }
}

impl<'a> From<&'a LabeledFrame> for Member<'a> {
    fn from(frame: &'a LabeledFrame) -> Self {
        Member::Frame(frame)
    }
}

impl From<(VideoId, usize)> for Member<'_> {
    fn from((video, frame_idx): (VideoId, usize)) -> Self {
        Member::Key(video, frame_idx)
    }
}

/// Indexed collection of labeled frames.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    frames: Vec<LabeledFrame>,
    videos: Arena<VideoId, Video>,
    skeletons: Arena<SkeletonId, Skeleton>,
    tracks: Arena<TrackId, Track>,
    /// `(video, frame_idx)` -> position in `frames`
    index: HashMap<(VideoId, usize), usize>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Registration ====================

    /// Register a video. Registering the same video (by identity) again
    /// returns its existing id, reviving it if it had been removed.
    pub fn add_video(&mut self, video: Video) -> VideoId {
        if let Some(id) = self.videos.find_slot(|v| v.same_as(&video)) {
            self.videos.revive(id);
            return id;
        }
        self.videos.push(video)
    }

    /// Register a skeleton. A skeleton that is the same object as, or
    /// structurally matches, a registered one maps onto that slot.
    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonId {
        if let Some(id) = self.skeletons.find(|s| s.same_as(&skeleton)) {
            return id;
        }
        if let Some(id) = self.skeletons.find(|s| s.matches(&skeleton)) {
            tracing::debug!(
                "Skeleton '{}' matches registered skeleton {}, reusing",
                skeleton.name,
                id
            );
            return id;
        }
        self.skeletons.push(skeleton)
    }

    /// Register a track; tracks with equal `(name, spawned_on)` share a slot.
    pub fn add_track(&mut self, track: Track) -> TrackId {
        if let Some(id) = self
            .tracks
            .find(|t| t.same_as(&track) || t.same_value(&track))
        {
            return id;
        }
        self.tracks.push(track)
    }

    // ==================== Mutation ====================

    /// Insert a frame.
    ///
    /// Empty frames and frames whose `(video, frame_idx)` is already present
    /// are silently dropped. Ids that were not issued by this container, or
    /// instances with more points than their skeleton has nodes, are
    /// rejected.
    pub fn append(&mut self, mut frame: LabeledFrame) -> Result<AppendOutcome> {
        if !self.videos.has_slot(frame.video) {
            return Err(LabelsError::InvalidFrame(format!(
                "{} is not registered",
                frame.video
            )));
        }
        if frame.is_empty() {
            return Ok(AppendOutcome::Empty);
        }
        if self.index.contains_key(&frame.key()) {
            tracing::trace!(
                "Suppressing duplicate frame {} of {}",
                frame.frame_idx,
                frame.video
            );
            return Ok(AppendOutcome::Duplicate);
        }

        for instance in &mut frame.instances {
            let node_count = self
                .skeletons
                .get(instance.skeleton)
                .map(|s| s.node_count())
                .ok_or_else(|| {
                    LabelsError::InvalidFrame(format!("{} is not registered", instance.skeleton))
                })?;
            if let Some(track) = instance.track {
                if self.tracks.get(track).is_none() {
                    return Err(LabelsError::InvalidFrame(format!(
                        "{} is not registered",
                        track
                    )));
                }
            }
            if instance.points().len() > node_count {
                return Err(LabelsError::InvalidFrame(format!(
                    "instance has {} points but {} has {} nodes",
                    instance.points().len(),
                    instance.skeleton,
                    node_count
                )));
            }
            instance.pad_to(node_count);
        }

        self.videos.revive(frame.video);
        let position = self.frames.len();
        self.index.insert(frame.key(), position);
        self.frames.push(frame);
        Ok(AppendOutcome::Inserted(position))
    }

    /// Append several frames, returning how many were stored.
    pub fn extend<I>(&mut self, frames: I) -> Result<usize>
    where
        I: IntoIterator<Item = LabeledFrame>,
    {
        let mut inserted = 0;
        for frame in frames {
            if self.append(frame)?.is_inserted() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Remove a video and all of its frames. Skeletons and tracks stay.
    /// Returns the number of frames removed.
    pub fn remove_video(&mut self, video: VideoId) -> usize {
        let before = self.frames.len();
        self.frames.retain(|f| f.video != video);
        let removed = before - self.frames.len();
        if self.videos.retire(video) || removed > 0 {
            tracing::debug!("Removed {} with {} frames", video, removed);
        }
        self.rebuild_index();
        removed
    }

    /// Remove the frame at `(video, frame_idx)`, if any.
    pub fn remove_frame(&mut self, video: VideoId, frame_idx: usize) -> Option<LabeledFrame> {
        let position = self.index.get(&(video, frame_idx)).copied()?;
        let frame = self.frames.remove(position);
        self.rebuild_index();
        Some(frame)
    }

    /// Keep only the frames for which `keep` returns true.
    pub fn retain_frames(&mut self, mut keep: impl FnMut(&LabeledFrame) -> bool) {
        self.frames.retain(|f| keep(f));
        self.rebuild_index();
    }

    /// Keep only the frames at positions in `range`.
    pub fn retain_range(&mut self, range: Range<usize>) {
        let mut position = 0;
        self.retain_frames(|_| {
            let keep = range.contains(&position);
            position += 1;
            keep
        });
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .frames
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key(), i))
            .collect();
    }

    // ==================== Lookup ====================

    /// Frames of `video`, optionally only the one at `frame_idx`.
    /// Never fails; returns an empty list when nothing matches.
    pub fn find(&self, video: VideoId, frame_idx: Option<usize>) -> Vec<&LabeledFrame> {
        match frame_idx {
            Some(frame_idx) => self
                .index
                .get(&(video, frame_idx))
                .map(|&i| vec![&self.frames[i]])
                .unwrap_or_default(),
            None => self.frames.iter().filter(|f| f.video == video).collect(),
        }
    }

    pub fn find_first(&self, video: VideoId, frame_idx: Option<usize>) -> Option<&LabeledFrame> {
        match frame_idx {
            Some(frame_idx) => self.index.get(&(video, frame_idx)).map(|&i| &self.frames[i]),
            None => self.frames.iter().find(|f| f.video == video),
        }
    }

    /// The `n`th retained frame
    pub fn by_index(&self, n: usize) -> Result<&LabeledFrame> {
        self.frames.get(n).ok_or(LabelsError::IndexOutOfRange {
            index: n,
            len: self.frames.len(),
        })
    }

    /// All frames of a registered video. Fails if the video is not in the
    /// container.
    pub fn by_video(&self, video: VideoId) -> Result<Vec<&LabeledFrame>> {
        if !self.contains_video(video) {
            return Err(LabelsError::NotFound(format!("{}", video)));
        }
        Ok(self.find(video, None))
    }

    /// Exactly the frame at `(video, frame_idx)`.
    pub fn by_video_and_frame(&self, video: VideoId, frame_idx: usize) -> Result<&LabeledFrame> {
        self.find_first(video, Some(frame_idx)).ok_or_else(|| {
            LabelsError::NotFound(format!("{} frame {}", video, frame_idx))
        })
    }

    // ==================== Membership ====================

    pub fn contains<'a>(&self, member: impl Into<Member<'a>>) -> bool {
        match member.into() {
            Member::Video(id) => self.contains_video(id),
            Member::Skeleton(id) => self.contains_skeleton(id),
            Member::Track(id) => self.contains_track(id),
            Member::Frame(frame) => self.contains_frame(frame),
            Member::Key(video, frame_idx) => self.contains_key(video, frame_idx),
        }
    }

    pub fn contains_video(&self, video: VideoId) -> bool {
        self.videos.is_live(video)
    }

    pub fn contains_skeleton(&self, skeleton: SkeletonId) -> bool {
        self.skeletons.is_live(skeleton)
    }

    pub fn contains_track(&self, track: TrackId) -> bool {
        self.tracks.is_live(track)
    }

    /// A retained frame with the same key and the same instances
    pub fn contains_frame(&self, frame: &LabeledFrame) -> bool {
        self.find_first(frame.video, Some(frame.frame_idx))
            .is_some_and(|f| f == frame)
    }

    pub fn contains_key(&self, video: VideoId, frame_idx: usize) -> bool {
        !self.find(video, Some(frame_idx)).is_empty()
    }

    // ==================== Iteration ====================

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn labeled_frames(&self) -> &[LabeledFrame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledFrame> {
        self.frames.iter()
    }

    /// Every instance of every retained frame, recomputed on each call
    pub fn all_instances(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.frames.iter().flat_map(|f| f.instances.iter())
    }

    /// Instances, optionally limited to one video
    pub fn instances(&self, video: Option<VideoId>) -> impl Iterator<Item = &Instance> + '_ {
        self.frames
            .iter()
            .filter(move |f| video.map_or(true, |v| f.video == v))
            .flat_map(|f| f.instances.iter())
    }

    pub fn videos(&self) -> impl Iterator<Item = (VideoId, &Video)> + '_ {
        self.videos.iter()
    }

    pub fn skeletons(&self) -> impl Iterator<Item = (SkeletonId, &Skeleton)> + '_ {
        self.skeletons.iter()
    }

    pub fn tracks(&self) -> impl Iterator<Item = (TrackId, &Track)> + '_ {
        self.tracks.iter()
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    pub fn skeleton_count(&self) -> usize {
        self.skeletons.len()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn video(&self, id: VideoId) -> Option<&Video> {
        self.videos.get(id)
    }

    pub fn video_mut(&mut self, id: VideoId) -> Option<&mut Video> {
        self.videos.get_mut(id)
    }

    pub fn skeleton(&self, id: SkeletonId) -> Option<&Skeleton> {
        self.skeletons.get(id)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Registered id of `video` (by identity)
    pub fn video_id(&self, video: &Video) -> Option<VideoId> {
        self.videos.find(|v| v.same_as(video))
    }

    /// Registered id of `skeleton` (by identity)
    pub fn skeleton_id(&self, skeleton: &Skeleton) -> Option<SkeletonId> {
        self.skeletons.find(|s| s.same_as(skeleton))
    }

    /// Distinct node names over all skeletons, in first-seen order
    pub fn nodes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, skeleton) in self.skeletons.iter() {
            for name in skeleton.node_names() {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Resolve an instance's skeleton and track for structural comparison.
    ///
    /// `None` if the instance's skeleton was not issued by this container.
    pub fn instance_ref<'a>(&'a self, instance: &'a Instance) -> Option<InstanceRef<'a>> {
        Some(InstanceRef {
            instance,
            skeleton: self.skeletons.slot(instance.skeleton)?,
            track: instance.track.and_then(|t| self.tracks.slot(t)),
        })
    }

    /// Resolve a frame for structural comparison.
    pub fn frame_ref<'a>(&'a self, frame: &'a LabeledFrame) -> FrameRef<'a> {
        FrameRef {
            labels: self,
            frame,
            video: self.videos.slot(frame.video),
        }
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a LabeledFrame;
    type IntoIter = std::slice::Iter<'a, LabeledFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
