//! A grab bag of small network, image, and video utilities.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use toolbox_core::config::{CliOverrides, ToolboxConfig};
//! use toolbox_core::Toolbox;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ToolboxConfig::load(None, &CliOverrides::default())?;
//! let tb = Toolbox::new(config);
//! let summary = tb.ipv4("192.168.0.1/24")?;
//! println!("{} usable addresses", summary.usable_addresses);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration loading (TOML, env vars, CLI overrides)
//! - [`net`]: IPv4 CIDR parsing and subnet math
//! - [`image`]: GIF frames, LSB steganography, pixel scrambling, terminal preview
//! - [`video`]: ffmpeg-backed merging
//! - [`bits`]: Bit masks used by the stego cursor
//! - [`util`]: Byte formatting and file/stdio helpers
//! - [`progress`]: Progress reporting hook for long-running loops
//! - [`error`]: Error types

pub mod bits;
pub mod config;
pub mod error;
pub mod image;
pub mod net;
pub mod progress;
pub mod util;
pub mod video;

use std::path::{Path, PathBuf};

use config::ToolboxConfig;
use error::{Result, ToolboxError};
use progress::Progress;

pub use crate::image::gif::{BuildReport, ExtractReport};
pub use crate::image::scramble::{OutputFormat, ScrambleMode, ScrambleReport};
pub use crate::image::show::HalfBlockGrid;
pub use crate::image::stego::{ContainerInfo, FormatStrategy, SaveReport, ValidateReport};
pub use config::CliOverrides;
pub use net::NetworkSummary;
pub use video::MergeReport;

/// Main entry point for the toolbox library.
///
/// Wraps a resolved [`ToolboxConfig`] so each command picks up its
/// configured defaults.
pub struct Toolbox {
    pub config: ToolboxConfig,
}

impl Toolbox {
    pub fn new(config: ToolboxConfig) -> Self {
        Self { config }
    }

    /// Describe an IPv4 network given in CIDR notation.
    pub fn ipv4(&self, cidr: &str) -> Result<NetworkSummary> {
        net::describe(cidr)
    }

    /// Split a GIF into PNG frames, defaulting to the configured folder.
    pub fn gif_extract(
        &self,
        gif_file: &Path,
        out_folder: Option<&Path>,
        progress: &dyn Progress,
    ) -> Result<ExtractReport> {
        let folder = out_folder.unwrap_or(self.config.gif.out_folder.as_path());
        image::gif::extract(gif_file, folder, progress)
    }

    /// Assemble a folder of PNG frames into a GIF using the configured frame duration.
    pub fn gif_build(
        &self,
        image_folder: &Path,
        out_file: &Path,
        progress: &dyn Progress,
    ) -> Result<BuildReport> {
        image::gif::build(image_folder, out_file, self.config.gif.duration_ms, progress)
    }

    pub fn stego_initialize(&self, path: &Path, force: bool) -> Result<SaveReport> {
        image::stego::initialize(path, self.config.stego.lsb, force)
    }

    pub fn stego_validate(&self, path: &Path, header_only: bool) -> Result<ValidateReport> {
        image::stego::validate(path, self.config.stego.lsb, header_only)
    }

    pub fn stego_cat(&self, path: &Path) -> Result<Vec<u8>> {
        image::stego::cat(path, self.config.stego.lsb)
    }

    pub fn stego_write(&self, path: &Path, data: &[u8]) -> Result<SaveReport> {
        image::stego::write(path, self.config.stego.lsb, data)
    }

    pub fn stego_format(
        &self,
        path: &Path,
        strategy: FormatStrategy,
        progress: &dyn Progress,
    ) -> Result<SaveReport> {
        image::stego::format(path, self.config.stego.lsb, strategy, progress)
    }

    pub fn stego_info(&self, path: &Path) -> Result<ContainerInfo> {
        image::stego::info(path, self.config.stego.lsb)
    }

    /// Scramble or unscramble images with the configured password and format.
    pub fn scramble(
        &self,
        file_paths: &[PathBuf],
        mode: ScrambleMode,
        out_dir: Option<PathBuf>,
    ) -> Result<ScrambleReport> {
        let options = image::scramble::ScrambleOptions {
            password: self.config.scramble.password.clone().unwrap_or_default(),
            mode,
            out_dir,
            out_format: self.config.scramble.out_format,
        };
        image::scramble::run(file_paths, &options)
    }

    /// Load an image as half-block cells at the configured width.
    pub fn show(&self, file_path: &Path) -> Result<HalfBlockGrid> {
        image::show::load(file_path, self.config.show.width)
    }

    /// Concatenate videos into the configured output file.
    pub fn video_merge(&self, inputs: &[PathBuf], progress: &dyn Progress) -> Result<MergeReport> {
        let options = video::MergeOptions {
            ffmpeg: self.config.video.ffmpeg.clone(),
            video_codec: self.config.video.video_codec.clone(),
            audio_codec: self.config.video.audio_codec.clone(),
        };
        if self.config.video.output_filename.as_os_str().is_empty() {
            return Err(ToolboxError::InvalidInput(
                "Output filename must not be empty".to_string(),
            ));
        }
        video::merge(inputs, &self.config.video.output_filename, &options, progress)
    }
}
