//! Concatenate video files with ffmpeg.
//!
//! Inputs are listed in a temporary concat-demuxer script and re-encoded
//! into a single output so clips with different codecs still join.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::error::{Result, ToolboxError};
use crate::progress::Progress;

/// Encoder settings for a merge.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Explicit ffmpeg binary; looked up on PATH when absent.
    pub ffmpeg: Option<PathBuf>,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

/// Report from a merge.
#[derive(Debug, Serialize)]
pub struct MergeReport {
    pub inputs: Vec<String>,
    pub output: String,
    pub elapsed_ms: u128,
}

/// Check that there is at least one input and that every input exists.
pub fn validate_inputs(inputs: &[PathBuf]) -> Result<()> {
    if inputs.is_empty() {
        return Err(ToolboxError::InvalidInput(
            "No video files specified to merge".to_string(),
        ));
    }
    for input in inputs {
        if !input.is_file() {
            return Err(ToolboxError::NotFound(input.display().to_string()));
        }
    }
    Ok(())
}

/// Resolve the ffmpeg executable.
pub fn locate_ffmpeg(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => which::which(path).map_err(|_| ToolboxError::ToolNotFound(path.display().to_string())),
        None => which::which("ffmpeg").map_err(|_| ToolboxError::ToolNotFound("ffmpeg".to_string())),
    }
}

/// Render the concat-demuxer script listing `inputs` in order.
pub fn concat_script(inputs: &[PathBuf]) -> Result<String> {
    let mut script = String::from("ffconcat version 1.0\n");
    for input in inputs {
        let absolute = std::path::absolute(input)?;
        // Single quotes are closed, escaped, and reopened.
        let quoted = absolute.display().to_string().replace('\'', r"'\''");
        script.push_str(&format!("file '{}'\n", quoted));
    }
    Ok(script)
}

/// ffmpeg arguments that read `list_file` and encode to `output`.
pub fn ffmpeg_args(list_file: &Path, output: &Path, options: &MergeOptions) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_file.display().to_string(),
        "-c:v".to_string(),
        options.video_codec.clone(),
        "-c:a".to_string(),
        options.audio_codec.clone(),
        output.display().to_string(),
    ]
}

/// Merge `inputs` into `output`.
pub fn merge(
    inputs: &[PathBuf],
    output: &Path,
    options: &MergeOptions,
    progress: &dyn Progress,
) -> Result<MergeReport> {
    validate_inputs(inputs)?;
    let ffmpeg = locate_ffmpeg(options.ffmpeg.as_deref())?;

    let mut list = tempfile::Builder::new()
        .prefix("toolbox-concat-")
        .suffix(".txt")
        .tempfile()?;
    list.write_all(concat_script(inputs)?.as_bytes())?;
    list.flush()?;

    let args = ffmpeg_args(list.path(), output, options);
    log::debug!("Running ffmpeg; binary={}, args={:?}", ffmpeg.display(), args);

    let started = std::time::Instant::now();
    progress.start(0, &format!("Merging {} video files...", inputs.len()));
    let result = Command::new(&ffmpeg).args(&args).output();
    progress.finish();

    let out = result.map_err(|e| ToolboxError::ToolFailed {
        tool: "ffmpeg".to_string(),
        reason: format!("Failed to run {}: {}", ffmpeg.display(), e),
    })?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(10).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        log::error!("ffmpeg failed; status={}", out.status);
        return Err(ToolboxError::ToolFailed {
            tool: "ffmpeg".to_string(),
            reason: format!("exited with {}\n{}", out.status, tail.join("\n")),
        });
    }

    let elapsed_ms = started.elapsed().as_millis();
    log::info!(
        "Merged videos; inputs={}, output={}, elapsed_ms={}",
        inputs.len(),
        output.display(),
        elapsed_ms
    );

    Ok(MergeReport {
        inputs: inputs.iter().map(|p| p.display().to_string()).collect(),
        output: output.display().to_string(),
        elapsed_ms,
    })
}
