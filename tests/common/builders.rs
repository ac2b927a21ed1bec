//! Test data builders for creating datasets

use pose_labels::{
    Instance, LabeledFrame, Labels, Point, Skeleton, SkeletonId, Track, Video, VideoId,
};
use serde_json::json;

/// Node names of the 24-node fly skeleton used by the legacy fixture
pub const FLY_NODES: [&str; 24] = [
    "head", "neck", "thorax", "abdomen", "wingL", "wingR", "forelegL1", "forelegL2",
    "forelegL3", "forelegR1", "forelegR2", "forelegR3", "midlegL1", "midlegL2", "midlegL3",
    "midlegR1", "midlegR2", "midlegR3", "hindlegL1", "hindlegL2", "hindlegL3", "hindlegR1",
    "hindlegR2", "hindlegR3",
];

/// Number of frames in the legacy fixture
pub const LEGACY_FRAME_COUNT: usize = 70;

/// 0-based frame index of the `i`th legacy frame (frame 40 is 573)
pub fn legacy_frame_idx(i: usize) -> usize {
    i * 14 + 13
}

/// Legacy v1 JSON: one video, 70 frames with two flies each, 24 nodes.
/// Every index in the file is 1-based.
pub fn legacy_json() -> String {
    let mut points = Vec::new();
    for i in 0..LEGACY_FRAME_COUNT {
        for instance in 1..=2 {
            for node in 0..FLY_NODES.len() {
                // Leave a few nodes unlabeled on the second fly
                if instance == 2 && node % 5 == 4 {
                    continue;
                }
                let x = 1.0 + (i * 10 + node) as f64;
                let y = 1.0 + (instance * 100 + node) as f64;
                let visible = u8::from(node != 0);
                points.push(json!({
                    "videoId": 1,
                    "frameIdx": legacy_frame_idx(i) + 1,
                    "instanceId": instance,
                    "node": node + 1,
                    "x": x,
                    "y": y,
                    "visible": visible,
                }));
            }
        }
    }

    let edges: Vec<[usize; 2]> = (2..FLY_NODES.len()).map(|n| [2, n + 1]).collect();
    json!({
        "skel_node_names": FLY_NODES,
        "skel_edges": edges,
        "videos": [{"id": 1, "filepath": "centered_pair_low_quality.mp4", "format": "media"}],
        "points": points,
    })
    .to_string()
}

pub fn fly_skeleton() -> Skeleton {
    let edges: Vec<(&str, &str)> = FLY_NODES[2..].iter().map(|n| ("neck", *n)).collect();
    Skeleton::from_names("fly", &FLY_NODES, &edges).expect("valid fly skeleton")
}

/// Builder for small multi-video datasets
pub struct LabelsBuilder {
    videos: Vec<Video>,
    frames_per_video: usize,
    instances_per_frame: usize,
    tracks: usize,
}

impl LabelsBuilder {
    pub fn new() -> Self {
        Self {
            videos: vec![Video::from_filename("video_0.mp4")],
            frames_per_video: 10,
            instances_per_frame: 2,
            tracks: 0,
        }
    }

    pub fn videos(mut self, count: usize) -> Self {
        self.videos = (0..count)
            .map(|i| Video::from_filename(format!("video_{}.mp4", i)))
            .collect();
        self
    }

    pub fn with_videos(mut self, videos: Vec<Video>) -> Self {
        self.videos = videos;
        self
    }

    pub fn frames_per_video(mut self, count: usize) -> Self {
        self.frames_per_video = count;
        self
    }

    pub fn instances_per_frame(mut self, count: usize) -> Self {
        self.instances_per_frame = count;
        self
    }

    /// Assign instance `i` of every frame to track `i` (up to `count` tracks)
    pub fn tracks(mut self, count: usize) -> Self {
        self.tracks = count;
        self
    }

    pub fn build(self) -> (Labels, Vec<VideoId>, SkeletonId) {
        let mut labels = Labels::new();
        let skeleton = labels.add_skeleton(
            Skeleton::from_names(
                "pair",
                &["head", "thorax", "tail"],
                &[("head", "thorax"), ("thorax", "tail")],
            )
            .expect("valid skeleton"),
        );
        let tracks: Vec<_> = (0..self.tracks)
            .map(|i| labels.add_track(Track::new(format!("track_{}", i), 0)))
            .collect();
        let video_ids: Vec<_> = self.videos.into_iter().map(|v| labels.add_video(v)).collect();

        for (v, &video) in video_ids.iter().enumerate() {
            for frame_idx in 0..self.frames_per_video {
                let instances = (0..self.instances_per_frame)
                    .map(|i| {
                        let base = (v * 1000 + frame_idx * 10 + i) as f64;
                        let mut instance = Instance::with_points(
                            skeleton,
                            vec![Point::new(base, base + 0.5), Point::new(base + 1.0, base + 1.5)],
                        );
                        if let Some(&track) = tracks.get(i) {
                            instance = instance.with_track(track);
                        }
                        instance
                    })
                    .collect();
                labels
                    .append(LabeledFrame::with_instances(video, frame_idx, instances))
                    .expect("append builder frame");
            }
        }
        (labels, video_ids, skeleton)
    }
}

impl Default for LabelsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
