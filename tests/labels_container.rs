//! Integration tests for the labels container
//!
//! These tests validate container semantics through the public API:
//! - Membership after append and remove
//! - Strict and non-failing lookups
//! - Instance access and mutation
//! - Structural properties (proptest)

mod common;

use common::builders::LabelsBuilder;
use common::frame_indices;
use pose_labels::{
    AppendOutcome, Instance, LabeledFrame, Labels, LabelsError, Point, Skeleton, StructuralEq,
    Track, Video,
};
use proptest::prelude::*;

#[test]
fn test_accessors_and_mutability() {
    let (mut labels, videos, skeleton) = LabelsBuilder::new().videos(2).frames_per_video(10).build();
    assert_eq!(labels.len(), 20);
    assert_eq!(labels.video_count(), 2);

    assert_eq!(labels.remove_video(videos[1]), 10);
    assert_eq!(labels.len(), 10);
    assert_eq!(frame_indices(&labels), (0..10).collect::<Vec<_>>());
    assert!(labels.iter().all(|f| f.video == videos[0]));

    // Removed video is gone in every membership form
    assert!(!labels.contains(videos[1]));
    assert!(labels.find(videos[1], None).is_empty());
    assert!(labels.by_video(videos[1]).unwrap_err().is_not_found());
    assert!(labels.contains(skeleton));

    // Mutate a frame through remove + re-append
    let mut frame = labels.remove_frame(videos[0], 4).unwrap();
    frame.instances[0].set_point(2, Point::new(7.0, 8.0));
    assert_eq!(labels.append(frame.clone()).unwrap(), AppendOutcome::Inserted(9));
    assert!(labels.contains(&frame));
    assert_eq!(
        labels.by_video_and_frame(videos[0], 4).unwrap().instances[0].point(2),
        Point::new(7.0, 8.0)
    );
}

#[test]
fn test_containment_forms() {
    let (mut labels, videos, skeleton) = LabelsBuilder::new().frames_per_video(3).build();
    let video = videos[0];
    let frame = labels.by_index(1).unwrap().clone();

    assert!(labels.contains(video));
    assert!(labels.contains(skeleton));
    assert!(labels.contains(&frame));
    assert!(labels.contains((video, 1)));

    let mut changed = frame.clone();
    changed.instances.pop();
    assert!(!labels.contains(&changed));

    labels.remove_video(video);
    assert!(!labels.contains(video));
    assert!(!labels.contains(&frame));
    assert!(!labels.contains((video, 1)));
}

#[test]
fn test_lookup_errors() {
    let (labels, videos, _) = LabelsBuilder::new().frames_per_video(2).build();
    assert!(matches!(
        labels.by_index(2),
        Err(LabelsError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(labels.by_video_and_frame(videos[0], 99).unwrap_err().is_not_found());
    assert!(labels.find(videos[0], Some(99)).is_empty());
    assert_eq!(labels.find(videos[0], None).len(), 2);
    assert_eq!(labels.find_first(videos[0], None).map(|f| f.frame_idx), Some(0));
}

#[test]
fn test_instance_access() {
    let (labels, videos, _) = LabelsBuilder::new()
        .videos(2)
        .frames_per_video(4)
        .instances_per_frame(3)
        .tracks(2)
        .build();

    assert_eq!(labels.all_instances().count(), 24);
    assert_eq!(labels.instances(Some(videos[1])).count(), 12);

    let tracked = labels.all_instances().filter(|i| i.track.is_some()).count();
    assert_eq!(tracked, 16);

    let instance = &labels.by_index(0).unwrap().instances[0];
    assert_eq!(instance.points().len(), 3);
    assert_eq!(instance.point(0).xy(), [0.0, 0.5]);
    assert!(instance.point(2).is_missing());

    let resolved = labels.instance_ref(instance).unwrap();
    assert_eq!(resolved.skeleton.name, "pair");
    assert_eq!(resolved.track.map(|t| t.name.as_str()), Some("track_0"));
}

#[test]
fn test_registration_dedup() {
    let mut labels = Labels::new();
    let video = Video::from_filename("a.mp4");
    let a = labels.add_video(video.clone());
    let b = labels.add_video(video.clone());
    let c = labels.add_video(video.duplicate());
    assert_eq!(a, b);
    assert_ne!(a, c);

    let skeleton = Skeleton::from_names("s", &["x", "y"], &[("x", "y")]).unwrap();
    let s1 = labels.add_skeleton(skeleton.clone());
    let s2 = labels.add_skeleton(skeleton.duplicate());
    assert_eq!(s1, s2);
    assert_eq!(labels.skeleton_count(), 1);

    let t1 = labels.add_track(Track::new("female", 0));
    let t2 = labels.add_track(Track::new("female", 0));
    assert_eq!(t1, t2);
}

fn arb_frames() -> impl Strategy<Value = Vec<(bool, usize, usize)>> {
    // (second video?, frame_idx, instance count)
    prop::collection::vec((any::<bool>(), 0usize..30, 0usize..4), 0..60)
}

proptest! {
    #[test]
    fn prop_skeleton_matches_itself(names in prop::collection::hash_set("[a-z]{1,6}", 1..8)) {
        let names: Vec<String> = names.into_iter().collect();
        let edges: Vec<(String, String)> = names
            .windows(2)
            .map(|w| (w[0].clone(), w[1].clone()))
            .collect();
        let skeleton = Skeleton::from_names("s", &names, &edges).unwrap();
        prop_assert!(skeleton.matches(&skeleton));
        prop_assert!(skeleton.matches(&skeleton.duplicate()));
    }

    #[test]
    fn prop_append_keeps_invariants(frames in arb_frames()) {
        let mut labels = Labels::new();
        let v0 = labels.add_video(Video::from_filename("v0.mp4"));
        let v1 = labels.add_video(Video::from_filename("v1.mp4"));
        let skeleton = labels.add_skeleton(Skeleton::from_names("s", &["a", "b"], &[]).unwrap());

        let mut expected_instances = 0;
        for (second, frame_idx, count) in frames {
            let video = if second { v1 } else { v0 };
            let before = labels.len();
            let frame = LabeledFrame::with_instances(
                video,
                frame_idx,
                (0..count).map(|_| Instance::new(skeleton)).collect(),
            );
            match labels.append(frame).unwrap() {
                AppendOutcome::Inserted(position) => {
                    prop_assert_eq!(position, before);
                    expected_instances += count;
                }
                AppendOutcome::Empty => prop_assert_eq!(count, 0),
                AppendOutcome::Duplicate => {}
            }
            if count == 0 {
                prop_assert_eq!(labels.len(), before);
            }
        }

        prop_assert_eq!(labels.all_instances().count(), expected_instances);
        let per_frame: usize = labels.iter().map(|f| f.instances.len()).sum();
        prop_assert_eq!(per_frame, expected_instances);

        // At most one frame per key, never an empty frame
        let mut keys: Vec<_> = labels.iter().map(|f| f.key()).collect();
        prop_assert!(labels.iter().all(|f| !f.is_empty()));
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), labels.len());

        // instances(Some(v)) yields exactly the instances of v's frames
        for video in [v0, v1] {
            let from_frames: usize = labels
                .find(video, None)
                .iter()
                .map(|f| f.instances.len())
                .sum();
            prop_assert_eq!(labels.instances(Some(video)).count(), from_frames);
        }
    }

    #[test]
    fn prop_remove_video_keeps_other_frames_in_order(per_video in 1usize..15) {
        let (mut labels, videos, _) = LabelsBuilder::new()
            .videos(2)
            .frames_per_video(per_video)
            .build();
        let kept: Vec<_> = frame_indices(&labels)[..per_video].to_vec();
        prop_assert_eq!(labels.remove_video(videos[1]), per_video);
        prop_assert_eq!(frame_indices(&labels), kept);
        prop_assert!(labels.iter().all(|f| f.video == videos[0]));
    }
}
