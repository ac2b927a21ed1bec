//! Conversions between dataset files
//!
//! The input format is detected; the output format is chosen by the caller.
//! Without an explicit output path, datasets are written to
//! `<input>.<ext>` and analysis files to [`analysis_output_path`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{LabelsError, Result};
use crate::io::analysis::{analysis_output_path, TrackingAnalysis};
use crate::io::{hdf5, load, save, LoadOptions, SaveOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain JSON record
    Json,
    /// JSON record with embedded frames
    Archive,
    /// HDF5 dataset layout
    Hdf5,
    /// Per-video tracking matrices
    Analysis,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Archive => "json",
            OutputFormat::Hdf5 => "h5",
            OutputFormat::Analysis => "analysis.h5",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = LabelsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "zip" | "json.zip" | "archive" => Ok(OutputFormat::Archive),
            "h5" | "hdf5" => Ok(OutputFormat::Hdf5),
            "analysis" => Ok(OutputFormat::Analysis),
            other => Err(LabelsError::Unsupported(format!(
                "unknown output format '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Archive => "json.zip",
            OutputFormat::Hdf5 => "h5",
            OutputFormat::Analysis => "analysis",
        };
        write!(f, "{}", name)
    }
}

/// Output path used when none is given.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    match format {
        OutputFormat::Analysis => analysis_output_path(input),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".");
            name.push(format.extension());
            PathBuf::from(name)
        }
    }
}

/// Analysis file for the `index`th of `count` videos
fn analysis_path_for(base: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return base.to_path_buf();
    }
    let name = base.to_string_lossy();
    let stem = name.strip_suffix(".analysis.h5").unwrap_or(&name);
    PathBuf::from(format!("{}.video{}.analysis.h5", stem, index))
}

/// Load `input` and write it as `format`. Returns every file written.
pub fn convert(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    options: &LoadOptions<'_>,
    save_options: &SaveOptions,
) -> Result<Vec<PathBuf>> {
    let labels = load(input, options)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input, format));
    tracing::info!("Converting {} to {} ({})", input.display(), output.display(), format);

    match format {
        OutputFormat::Json => Ok(vec![save(&labels, &output, save_options)?]),
        OutputFormat::Archive => {
            let options = save_options.clone().with_frame_data();
            Ok(vec![save(&labels, &output, &options)?])
        }
        OutputFormat::Hdf5 => {
            hdf5::save_hdf5(&labels, &output)?;
            Ok(vec![output])
        }
        OutputFormat::Analysis => {
            let videos: Vec<_> = labels.videos().map(|(id, _)| id).collect();
            let mut written = Vec::with_capacity(videos.len());
            for (i, &video) in videos.iter().enumerate() {
                let path = analysis_path_for(&output, i, videos.len());
                TrackingAnalysis::from_labels(&labels, video, true)?.save_hdf5(&path)?;
                written.push(path);
            }
            Ok(written)
        }
    }
}
