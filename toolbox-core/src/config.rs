//! Configuration loading and resolution.
//!
//! Supports a TOML config file, environment variables, and CLI overrides
//! with a defined priority order (CLI > env > TOML > defaults).

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Result, ToolboxError};
use crate::image::scramble::OutputFormat;
use crate::image::show::DEFAULT_WIDTH;
use crate::image::stego::DEFAULT_LSB;

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "toolbox.toml";

/// Helper macro to apply an optional owned value directly to a target field.
///
/// Replaces: `if let Some(v) = $opt { $target = v; }`
macro_rules! apply_option {
    ($opt:expr => $target:expr) => {
        if let Some(v) = $opt {
            $target = v;
        }
    };
}

/// Helper macro to apply an optional owned value, wrapping it in `Some()`.
///
/// Replaces: `if let Some(v) = $opt { $target = Some(v); }`
macro_rules! apply_option_some {
    ($opt:expr => $target:expr) => {
        if let Some(v) = $opt {
            $target = Some(v);
        }
    };
}

/// Helper macro to clone a borrowed optional value directly to a target field.
///
/// Replaces: `if let Some(ref v) = $opt { $target = v.clone(); }`
macro_rules! apply_option_clone {
    ($opt:expr => $target:expr) => {
        if let Some(ref v) = $opt {
            $target = v.clone();
        }
    };
}

/// Helper macro to clone a borrowed optional value, wrapping it in `Some()`.
///
/// Replaces: `if let Some(ref v) = $opt { $target = Some(v.clone()); }`
macro_rules! apply_option_some_clone {
    ($opt:expr => $target:expr) => {
        if let Some(ref v) = $opt {
            $target = Some(v.clone());
        }
    };
}

/// Top-level configuration for toolbox.
#[derive(Debug, Clone, Default)]
pub struct ToolboxConfig {
    pub stego: StegoConfig,
    pub gif: GifConfig,
    pub scramble: ScrambleConfig,
    pub video: VideoConfig,
    pub show: ShowConfig,
}

/// Steganography settings.
#[derive(Debug, Clone)]
pub struct StegoConfig {
    /// Low bits per color channel used for hidden data (1..=8).
    pub lsb: u8,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self { lsb: DEFAULT_LSB }
    }
}

/// GIF extract/build settings.
#[derive(Debug, Clone)]
pub struct GifConfig {
    /// Per-frame delay when building, in milliseconds.
    pub duration_ms: u32,
    /// Default folder for extracted frames.
    pub out_folder: PathBuf,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            duration_ms: 80,
            out_folder: PathBuf::from("out"),
        }
    }
}

/// Pixel scramble settings.
#[derive(Clone, Default)]
pub struct ScrambleConfig {
    pub password: Option<String>,
    pub out_format: OutputFormat,
}

impl fmt::Debug for ScrambleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrambleConfig")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("out_format", &self.out_format)
            .finish()
    }
}

/// ffmpeg settings for `video merge`.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    /// Explicit ffmpeg binary; `PATH` is searched when unset.
    pub ffmpeg: Option<PathBuf>,
    pub video_codec: String,
    pub audio_codec: String,
    pub output_filename: PathBuf,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            output_filename: PathBuf::from("output.mp4"),
        }
    }
}

/// Terminal preview settings.
#[derive(Debug, Clone)]
pub struct ShowConfig {
    /// Maximum columns used by `image show`.
    pub width: u32,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
        }
    }
}

// ── TOML deserialization structs ──

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    stego: Option<TomlStegoConfig>,
    gif: Option<TomlGifConfig>,
    scramble: Option<TomlScrambleConfig>,
    video: Option<TomlVideoConfig>,
    show: Option<TomlShowConfig>,
}

#[derive(Deserialize, Default)]
struct TomlStegoConfig {
    lsb: Option<u8>,
}

#[derive(Deserialize, Default)]
struct TomlGifConfig {
    duration_ms: Option<u32>,
    out_folder: Option<String>,
}

#[derive(Deserialize, Default)]
struct TomlScrambleConfig {
    password: Option<String>,
    out_format: Option<String>,
}

#[derive(Deserialize, Default)]
struct TomlVideoConfig {
    ffmpeg: Option<String>,
    video_codec: Option<String>,
    audio_codec: Option<String>,
    output_filename: Option<String>,
}

#[derive(Deserialize, Default)]
struct TomlShowConfig {
    width: Option<u32>,
}

/// CLI overrides that take highest priority.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the stego LSB width.
    pub lsb: Option<u8>,
    /// Override the GIF frame duration.
    pub duration_ms: Option<u32>,
    /// Override the GIF extract folder.
    pub out_folder: Option<PathBuf>,
    /// Override the scramble password.
    pub password: Option<String>,
    /// Override the scramble output format.
    pub out_format: Option<OutputFormat>,
    /// Override the merged video filename.
    pub output_filename: Option<PathBuf>,
    /// Override the preview width.
    pub width: Option<u32>,
}

impl ToolboxConfig {
    /// Load configuration with the following priority (highest wins):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. TOML config file
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>, overrides: &CliOverrides) -> Result<Self> {
        let mut config = ToolboxConfig::default();

        // Layer 3: TOML config file
        let toml_path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);
        match std::fs::read_to_string(toml_path) {
            Ok(content) => {
                let toml_config: TomlConfig = toml::from_str(&content).map_err(|e| {
                    ToolboxError::ConfigError(format!(
                        "Failed to parse config file '{}': {}",
                        toml_path, e
                    ))
                })?;
                config.apply_toml(toml_config)?;
                log::debug!("Loaded config file; path={}", toml_path);
            }
            // The default file is optional
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && config_path.is_none() => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolboxError::ConfigError(format!(
                    "Config file '{}' not found",
                    toml_path
                )));
            }
            Err(e) => {
                return Err(ToolboxError::ConfigError(format!(
                    "Failed to read config file '{}': {}",
                    toml_path, e
                )));
            }
        }

        // Layer 2: Environment variables
        config.apply_env()?;

        // Layer 1: CLI overrides
        config.apply_cli(overrides);

        config.validate()?;
        Ok(config)
    }

    fn apply_toml(&mut self, toml: TomlConfig) -> Result<()> {
        if let Some(s) = toml.stego {
            apply_option!(s.lsb => self.stego.lsb);
        }

        if let Some(g) = toml.gif {
            apply_option!(g.duration_ms => self.gif.duration_ms);
            if let Some(v) = g.out_folder {
                self.gif.out_folder = PathBuf::from(v);
            }
        }

        if let Some(s) = toml.scramble {
            apply_option_some!(s.password => self.scramble.password);
            if let Some(v) = s.out_format {
                self.scramble.out_format = v.parse().map_err(|_| {
                    ToolboxError::ConfigError(format!(
                        "Invalid scramble.out_format '{}'. Use 'PNG' or 'JPEG'.",
                        v
                    ))
                })?;
            }
        }

        if let Some(v) = toml.video {
            apply_option_some!(v.ffmpeg.map(PathBuf::from) => self.video.ffmpeg);
            apply_option!(v.video_codec => self.video.video_codec);
            apply_option!(v.audio_codec => self.video.audio_codec);
            apply_option!(v.output_filename.map(PathBuf::from) => self.video.output_filename);
        }

        if let Some(s) = toml.show {
            apply_option!(s.width => self.show.width);
        }

        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("TOOLBOX_STEGO_LSB") {
            self.stego.lsb = v.trim().parse::<u8>().map_err(|_| {
                ToolboxError::ConfigError(format!(
                    "Invalid TOOLBOX_STEGO_LSB '{}'; expected a number from 1 to 8",
                    v
                ))
            })?;
        }
        if let Ok(v) = std::env::var("TOOLBOX_GIF_DURATION") {
            self.gif.duration_ms = v.trim().parse::<u32>().map_err(|_| {
                ToolboxError::ConfigError(format!(
                    "Invalid TOOLBOX_GIF_DURATION '{}'; expected milliseconds",
                    v
                ))
            })?;
        }
        if let Ok(v) = std::env::var("SCRAMBLE_PASSWORD") {
            if !v.is_empty() {
                self.scramble.password = Some(v);
            }
        }
        if let Ok(v) = std::env::var("TOOLBOX_FFMPEG") {
            self.video.ffmpeg = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("TOOLBOX_VIDEO_CODEC") {
            self.video.video_codec = v;
        }
        if let Ok(v) = std::env::var("TOOLBOX_AUDIO_CODEC") {
            self.video.audio_codec = v;
        }
        Ok(())
    }

    fn apply_cli(&mut self, overrides: &CliOverrides) {
        apply_option!(overrides.lsb => self.stego.lsb);
        apply_option!(overrides.duration_ms => self.gif.duration_ms);
        apply_option_clone!(overrides.out_folder => self.gif.out_folder);
        apply_option_some_clone!(overrides.password => self.scramble.password);
        apply_option!(overrides.out_format => self.scramble.out_format);
        apply_option_clone!(overrides.output_filename => self.video.output_filename);
        apply_option!(overrides.width => self.show.width);
    }

    fn validate(&self) -> Result<()> {
        if !(1..=8).contains(&self.stego.lsb) {
            return Err(ToolboxError::ConfigError(format!(
                "stego lsb must be between 1 and 8, got {}",
                self.stego.lsb
            )));
        }
        if self.show.width == 0 {
            return Err(ToolboxError::ConfigError(
                "show width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "TOOLBOX_STEGO_LSB",
            "TOOLBOX_GIF_DURATION",
            "SCRAMBLE_PASSWORD",
            "TOOLBOX_FFMPEG",
            "TOOLBOX_VIDEO_CODEC",
            "TOOLBOX_AUDIO_CODEC",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = ToolboxConfig::default();
        assert_eq!(config.stego.lsb, 2);
        assert_eq!(config.gif.duration_ms, 80);
        assert_eq!(config.gif.out_folder, PathBuf::from("out"));
        assert_eq!(config.scramble.out_format, OutputFormat::Png);
        assert_eq!(config.video.video_codec, "libx264");
        assert_eq!(config.video.audio_codec, "aac");
        assert_eq!(config.video.output_filename, PathBuf::from("output.mp4"));
        assert_eq!(config.show.width, 80);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[stego]
lsb = 3

[gif]
duration_ms = 120
out_folder = "frames"

[scramble]
password = "swordfish"
out_format = "jpeg"

[video]
ffmpeg = "/opt/ffmpeg/bin/ffmpeg"
video_codec = "libx265"

[show]
width = 40
"#;

        let toml_config: TomlConfig = toml::from_str(toml_str).unwrap();
        let mut config = ToolboxConfig::default();
        config.apply_toml(toml_config).unwrap();

        assert_eq!(config.stego.lsb, 3);
        assert_eq!(config.gif.duration_ms, 120);
        assert_eq!(config.gif.out_folder, PathBuf::from("frames"));
        assert_eq!(config.scramble.password.as_deref(), Some("swordfish"));
        assert_eq!(config.scramble.out_format, OutputFormat::Jpeg);
        assert_eq!(
            config.video.ffmpeg,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(config.video.video_codec, "libx265");
        assert_eq!(config.video.audio_codec, "aac");
        assert_eq!(config.show.width, 40);
    }

    #[test]
    fn test_toml_invalid_out_format() {
        let toml_config: TomlConfig = toml::from_str("[scramble]\nout_format = \"bmp\"\n").unwrap();
        let mut config = ToolboxConfig::default();
        assert!(config.apply_toml(toml_config).is_err());
    }

    #[test]
    fn test_toml_unknown_section_rejected() {
        assert!(toml::from_str::<TomlConfig>("[database]\nurl = \"x\"\n").is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ToolboxConfig::default();
        let overrides = CliOverrides {
            lsb: Some(4),
            duration_ms: Some(200),
            out_folder: Some(PathBuf::from("custom")),
            password: Some("pw".to_string()),
            out_format: Some(OutputFormat::Jpeg),
            output_filename: Some(PathBuf::from("joined.mp4")),
            width: Some(120),
        };

        config.apply_cli(&overrides);

        assert_eq!(config.stego.lsb, 4);
        assert_eq!(config.gif.duration_ms, 200);
        assert_eq!(config.gif.out_folder, PathBuf::from("custom"));
        assert_eq!(config.scramble.password.as_deref(), Some("pw"));
        assert_eq!(config.scramble.out_format, OutputFormat::Jpeg);
        assert_eq!(config.video.output_filename, PathBuf::from("joined.mp4"));
        assert_eq!(config.show.width, 120);
    }

    #[test]
    fn test_validate_lsb_range() {
        let mut config = ToolboxConfig::default();
        config.stego.lsb = 0;
        assert!(config.validate().is_err());
        config.stego.lsb = 9;
        assert!(config.validate().is_err());
        config.stego.lsb = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let config = ScrambleConfig {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_toml() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolbox.toml");
        std::fs::write(&path, "[stego]\nlsb = 3\n[video]\naudio_codec = \"mp3\"\n").unwrap();

        std::env::set_var("TOOLBOX_STEGO_LSB", "5");
        std::env::set_var("SCRAMBLE_PASSWORD", "from-env");
        let config = ToolboxConfig::load(path.to_str(), &CliOverrides::default()).unwrap();
        clear_env();

        assert_eq!(config.stego.lsb, 5);
        assert_eq!(config.scramble.password.as_deref(), Some("from-env"));
        assert_eq!(config.video.audio_codec, "mp3");
    }

    #[test]
    #[serial]
    fn test_cli_overrides_env() {
        clear_env();
        std::env::set_var("TOOLBOX_GIF_DURATION", "300");
        let overrides = CliOverrides {
            duration_ms: Some(40),
            ..Default::default()
        };
        let config = ToolboxConfig::load(None, &overrides).unwrap();
        clear_env();
        assert_eq!(config.gif.duration_ms, 40);
    }

    #[test]
    #[serial]
    fn test_invalid_env_lsb() {
        clear_env();
        std::env::set_var("TOOLBOX_STEGO_LSB", "lots");
        let result = ToolboxConfig::load(None, &CliOverrides::default());
        clear_env();
        assert!(matches!(result, Err(ToolboxError::ConfigError(_))));
    }

    #[test]
    #[serial]
    fn test_invalid_env_gif_duration() {
        clear_env();
        std::env::set_var("TOOLBOX_GIF_DURATION", "fast");
        let result = ToolboxConfig::load(None, &CliOverrides::default());
        clear_env();
        let err = result.unwrap_err();
        assert!(matches!(err, ToolboxError::ConfigError(_)));
        assert!(err.to_string().contains("TOOLBOX_GIF_DURATION"));
    }

    #[test]
    #[serial]
    fn test_unreadable_config_file_reports_io_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let err = ToolboxConfig::load(dir.path().to_str(), &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ToolboxError::ConfigError(_)));
        assert!(err.to_string().contains("Failed to read config file"));
        assert!(!err.to_string().contains("not found"));
    }

    #[test]
    #[serial]
    fn test_explicit_missing_config_file() {
        clear_env();
        let err = ToolboxConfig::load(Some("/no/such/toolbox.toml"), &CliOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
