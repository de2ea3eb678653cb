//! Split animated GIFs into frames and assemble frames into GIFs.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, ImageFormat};
use serde::Serialize;

use crate::error::{Result, ToolboxError};
use crate::progress::Progress;

/// Report from extracting a GIF.
#[derive(Debug, Serialize)]
pub struct ExtractReport {
    pub gif_file: String,
    /// Absolute folder the frames were written to.
    pub out_folder: String,
    pub frames: usize,
}

/// Report from building a GIF.
#[derive(Debug, Serialize)]
pub struct BuildReport {
    /// Absolute path of the written GIF.
    pub out_file: String,
    pub frames: usize,
    pub duration_ms: u32,
}

/// File name used for the `index`th extracted frame.
pub fn frame_filename(index: usize) -> String {
    format!("frame_{:04}.png", index)
}

/// Write every frame of `gif_file` to `out_folder` as `frame_NNNN.png`.
pub fn extract(gif_file: &Path, out_folder: &Path, progress: &dyn Progress) -> Result<ExtractReport> {
    if !gif_file.is_file() {
        return Err(ToolboxError::NotFound(gif_file.display().to_string()));
    }
    fs::create_dir_all(out_folder)?;
    let out_folder = std::path::absolute(out_folder)?;

    let decoder = GifDecoder::new(BufReader::new(File::open(gif_file)?))?;
    let frames = decoder.into_frames().collect_frames()?;

    progress.start(frames.len() as u64, "Extracting frames");
    for (i, frame) in frames.iter().enumerate() {
        let target = out_folder.join(frame_filename(i));
        frame
            .buffer()
            .save_with_format(&target, ImageFormat::Png)?;
        progress.advance(1);
    }
    progress.finish();

    log::info!(
        "Extracted GIF frames; gif={}, frames={}, out_folder={}",
        gif_file.display(),
        frames.len(),
        out_folder.display()
    );

    Ok(ExtractReport {
        gif_file: gif_file.display().to_string(),
        out_folder: out_folder.display().to_string(),
        frames: frames.len(),
    })
}

/// The `*.png` files directly inside `folder`, sorted by name.
pub fn collect_frames(folder: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.png",
        glob::Pattern::escape(&folder.display().to_string())
    );
    let mut paths = Vec::new();
    let entries = glob::glob(&pattern)
        .map_err(|e| ToolboxError::InvalidInput(format!("Invalid frame pattern '{}': {}", pattern, e)))?;
    for entry in entries {
        let path = entry.map_err(|e| ToolboxError::IoError(e.into_error()))?;
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Assemble the PNG frames in `image_folder` into a looping GIF.
pub fn build(
    image_folder: &Path,
    out_file: &Path,
    duration_ms: u32,
    progress: &dyn Progress,
) -> Result<BuildReport> {
    let paths = collect_frames(image_folder)?;
    if paths.is_empty() {
        return Err(ToolboxError::InvalidInput(format!(
            "No images found in {}",
            image_folder.display()
        )));
    }

    let out_file = std::path::absolute(out_file)?;
    if let Some(parent) = out_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut encoder = GifEncoder::new(BufWriter::new(File::create(&out_file)?));
    encoder.set_repeat(Repeat::Infinite)?;

    progress.start(paths.len() as u64, "Writing frames");
    for path in &paths {
        let rgba = image::open(path)?.to_rgba8();
        let delay = Delay::from_numer_denom_ms(duration_ms, 1);
        encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
        progress.advance(1);
    }
    progress.finish();

    log::info!(
        "Built GIF; out_file={}, frames={}, duration_ms={}",
        out_file.display(),
        paths.len(),
        duration_ms
    );

    Ok(BuildReport {
        out_file: out_file.display().to_string(),
        frames: paths.len(),
        duration_ms,
    })
}
