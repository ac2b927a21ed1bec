//! Video backend over a frame-data archive
//!
//! Archives written with `save_frame_data` hold one encoded image per labeled
//! frame. This backend serves those images so a reloaded dataset can show
//! its frames without the original video file.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::error::{LabelsError, Result};
use crate::video::{VideoBackend, VideoShape};

/// Archive entry name for one embedded frame.
pub fn frame_entry_name(frame_dir: &str, video_index: usize, frame_idx: usize, ext: &str) -> String {
    format!(
        "{}/video{}_frame{}.{}",
        frame_dir.trim_end_matches('/'),
        video_index,
        frame_idx,
        ext
    )
}

/// Inverse of [`frame_entry_name`]: `(video_index, frame_idx, ext)`.
pub fn parse_frame_entry_name<'a>(
    frame_dir: &str,
    name: &'a str,
) -> Option<(usize, usize, &'a str)> {
    let rest = name
        .strip_prefix(frame_dir.trim_end_matches('/'))?
        .strip_prefix('/')?;
    let (stem, ext) = rest.rsplit_once('.')?;
    let (video, frame) = stem.strip_prefix("video")?.split_once("_frame")?;
    Some((video.parse().ok()?, frame.parse().ok()?, ext))
}

/// Frames of one video stored inside a frame-data archive.
#[derive(Debug, Clone)]
pub struct ArchiveVideo {
    archive: PathBuf,
    frame_dir: String,
    video_index: usize,
    ext: String,
    frames: BTreeSet<usize>,
    shape: Option<VideoShape>,
}

impl ArchiveVideo {
    pub fn new(
        archive: impl Into<PathBuf>,
        frame_dir: impl Into<String>,
        video_index: usize,
        ext: impl Into<String>,
        frames: BTreeSet<usize>,
        shape: Option<VideoShape>,
    ) -> Self {
        Self {
            archive: archive.into(),
            frame_dir: frame_dir.into(),
            video_index,
            ext: ext.into(),
            frames,
            shape,
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive
    }

    /// Frame indices with embedded pixel data
    pub fn available_frames(&self) -> &BTreeSet<usize> {
        &self.frames
    }

    pub fn has_frame(&self, frame_idx: usize) -> bool {
        self.frames.contains(&frame_idx)
    }
}

impl VideoBackend for ArchiveVideo {
    fn shape(&self) -> Option<VideoShape> {
        self.shape
    }

    fn get_frame(&self, frame_idx: usize) -> Result<DynamicImage> {
        if !self.has_frame(frame_idx) {
            return Err(LabelsError::VideoUnavailable(format!(
                "frame {} of video {} not embedded in {}",
                frame_idx,
                self.video_index,
                self.archive.display()
            )));
        }

        let file = File::open(&self.archive)?;
        let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
        let name = frame_entry_name(&self.frame_dir, self.video_index, frame_idx, &self.ext);
        let mut entry = zip.by_name(&name)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;

        let format = ImageFormat::from_extension(&self.ext).unwrap_or(ImageFormat::Png);
        Ok(image::load_from_memory_with_format(&bytes, format)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_round_trip() {
        let name = frame_entry_name("frame_data/", 2, 573, "png");
        assert_eq!(name, "frame_data/video2_frame573.png");
        assert_eq!(
            parse_frame_entry_name("frame_data", &name),
            Some((2, 573, "png"))
        );
    }

    #[test]
    fn test_parse_rejects_other_entries() {
        assert_eq!(parse_frame_entry_name("frame_data", "dataset.json"), None);
        assert_eq!(
            parse_frame_entry_name("frame_data", "frame_data/readme.txt"),
            None
        );
    }

    #[test]
    fn test_missing_frame_is_unavailable() {
        let video = ArchiveVideo::new(
            "/nonexistent.zip",
            "frame_data",
            0,
            "png",
            BTreeSet::from([1, 2]),
            None,
        );
        assert!(matches!(
            video.get_frame(3),
            Err(LabelsError::VideoUnavailable(_))
        ));
    }
}
