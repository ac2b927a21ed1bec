//! Mock video backends

use std::sync::Arc;

use image::DynamicImage;
use mockall::mock;
use pose_labels::{LabelsError, VideoBackend, VideoShape};

mock! {
    pub Backend {}

    impl VideoBackend for Backend {
        fn shape(&self) -> Option<VideoShape>;
        fn get_frame(&self, frame_idx: usize) -> pose_labels::Result<DynamicImage>;
    }
}

/// Backend that decodes every frame except `broken`
pub fn backend_failing_on(broken: usize) -> Arc<dyn VideoBackend> {
    let mut backend = MockBackend::new();
    backend.expect_shape().return_const(None);
    backend.expect_get_frame().returning(move |frame_idx| {
        if frame_idx == broken {
            Err(LabelsError::VideoUnavailable(format!(
                "decoder error at frame {}",
                frame_idx
            )))
        } else {
            Ok(DynamicImage::ImageLuma8(image::GrayImage::new(4, 4)))
        }
    });
    Arc::new(backend)
}
