//! Frame-data archives
//!
//! A frame-data archive is a zip file holding the JSON record (entry named
//! after the destination file) and one encoded image per labeled frame at
//! `<frame_dir>/video{v}_frame{f}.{ext}`, where `v` is the video's position
//! in the record. The record's `frame_data` field names the directory and
//! the image format so the reader does not have to guess.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::{ArchiveCompression, FrameImageFormat};
use crate::error::{LabelsError, Result, ResultExt};
use crate::io::record::{to_record, FrameDataRecord, RecordIndex};
use crate::io::{graph, record_from_value, LoadOptions, SaveOptions, DEFAULT_FRAME_DIR};
use crate::labels::Labels;
use crate::video::archive::{frame_entry_name, parse_frame_entry_name};
use crate::video::{ArchiveVideo, VideoBackend, VideoDescriptor};

/// `<path>.zip`
pub fn archive_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".zip");
    PathBuf::from(name)
}

fn record_entry_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "labels.json".to_string());
    if name.ends_with(".json") {
        name
    } else {
        format!("{}.json", name)
    }
}

impl FrameImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FrameImageFormat::Png => "png",
            FrameImageFormat::Jpeg => "jpg",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            FrameImageFormat::Png => ImageFormat::Png,
            FrameImageFormat::Jpeg => ImageFormat::Jpeg,
        }
    }

    /// Encode one frame. JPEG has no alpha or 16-bit support, so frames are
    /// converted to 8-bit RGB first.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut bytes = Cursor::new(Vec::new());
        match self {
            FrameImageFormat::Png => image.write_to(&mut bytes, self.image_format())?,
            FrameImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
                .write_to(&mut bytes, self.image_format())?,
        }
        Ok(bytes.into_inner())
    }
}

impl From<ArchiveCompression> for CompressionMethod {
    fn from(compression: ArchiveCompression) -> Self {
        match compression {
            ArchiveCompression::Stored => CompressionMethod::Stored,
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// Write `labels` and the pixels of every labeled frame to `<path>.zip`.
///
/// The archive is assembled under a temporary name and renamed into place,
/// so a failing video backend never leaves a truncated archive behind.
pub fn write_archive(labels: &Labels, path: &Path, options: &SaveOptions) -> Result<PathBuf> {
    let destination = archive_path(path);
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut partial = OsString::from(destination.as_os_str());
    partial.push(".tmp");
    let partial = PathBuf::from(partial);

    let result = write_entries(labels, path, &partial, options);
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::rename(&partial, &destination)
        .with_context(|| format!("Failed to move archive into {}", destination.display()))?;
    Ok(destination)
}

fn write_entries(labels: &Labels, path: &Path, partial: &Path, options: &SaveOptions) -> Result<()> {
    let file = File::create(partial)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let entry_options =
        SimpleFileOptions::default().compression_method(options.compression.into());

    let index = RecordIndex::new(labels);
    let ext = options.image_format.extension();
    let mut written = 0usize;

    for frame in labels.iter() {
        let Some(video) = labels.video(frame.video) else {
            continue;
        };
        let video_index = index.videos[&frame.video];

        let image = video
            .get_frame(frame.frame_idx)
            .map_err(|e| LabelsError::FrameData {
                video: video.descriptor().to_string(),
                frame_idx: frame.frame_idx,
                source: Box::new(e),
            })?;
        let bytes = options.image_format.encode(&image)?;

        zip.start_file(
            frame_entry_name(&options.frame_dir, video_index, frame.frame_idx, ext),
            entry_options,
        )?;
        zip.write_all(&bytes)?;
        written += 1;
    }

    let mut record = to_record(labels);
    record.frame_data = Some(FrameDataRecord {
        dir: options.frame_dir.trim_end_matches('/').to_string(),
        format: ext.to_string(),
    });
    let json = if options.pretty {
        serde_json::to_vec_pretty(&record)?
    } else {
        serde_json::to_vec(&record)?
    };
    zip.start_file(record_entry_name(path), entry_options)?;
    zip.write_all(&json)?;

    let mut writer = zip.finish()?;
    writer.flush()?;

    tracing::debug!("Embedded {} frames as {}", written, ext);
    Ok(())
}

/// Load a frame-data archive, attaching [`ArchiveVideo`] backends to the
/// videos that have embedded frames.
pub fn read_archive(path: &Path, options: &LoadOptions<'_>) -> Result<Labels> {
    let file = File::open(path)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let names: Vec<String> = zip.file_names().map(String::from).collect();
    let json_entries: Vec<&String> = names.iter().filter(|n| n.ends_with(".json")).collect();
    let entry = match json_entries.as_slice() {
        [entry] => (*entry).clone(),
        [] => return Err(LabelsError::format("archive contains no JSON record")),
        _ => {
            return Err(LabelsError::format(format!(
                "archive contains {} JSON records",
                json_entries.len()
            )))
        }
    };

    let mut json = String::new();
    zip.by_name(&entry)?
        .read_to_string(&mut json)
        .with_context(|| format!("Failed to read {}", entry))?;
    let value: Value = serde_json::from_str(&json)?;
    let record = record_from_value(value)?;

    let frame_data = record.frame_data.clone().unwrap_or_else(|| FrameDataRecord {
        dir: DEFAULT_FRAME_DIR.to_string(),
        format: FrameImageFormat::Png.extension().to_string(),
    });

    let mut embedded: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for name in &names {
        if let Some((video, frame_idx, ext)) = parse_frame_entry_name(&frame_data.dir, name) {
            if ext == frame_data.format {
                embedded.entry(video).or_default().insert(frame_idx);
            }
        }
    }
    tracing::debug!(
        "Archive {} embeds frames for {} videos",
        path.display(),
        embedded.len()
    );

    let backend_for = |i: usize, descriptor: &VideoDescriptor| -> Option<Arc<dyn VideoBackend>> {
        embedded.get(&i).map(|frames| {
            Arc::new(ArchiveVideo::new(
                path,
                frame_data.dir.clone(),
                i,
                frame_data.format.clone(),
                frames.clone(),
                descriptor.shape,
            )) as Arc<dyn VideoBackend>
        })
    };

    let backend_for: graph::BackendFor<'_> = &backend_for;
    graph::build_labels(record, options, Some(backend_for))
}
