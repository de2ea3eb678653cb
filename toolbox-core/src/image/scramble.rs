//! Password-keyed pixel scrambling.
//!
//! Pixels are shuffled with a permutation derived from the SHA-256 digest
//! of the password, so the same password reverses the shuffle. Only
//! lossless output (PNG) unscrambles exactly.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, ToolboxError};
use crate::util::iter_files;

/// Direction of the pixel shuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrambleMode {
    Scramble,
    Unscramble,
}

impl ScrambleMode {
    fn suffix(self) -> &'static str {
        match self {
            ScrambleMode::Scramble => "scrambled",
            ScrambleMode::Unscramble => "unscrambled",
        }
    }
}

/// Encoding for scrambled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "PNG" => Ok(OutputFormat::Png),
            "JPEG" | "JPG" => Ok(OutputFormat::Jpeg),
            _ => Err(ToolboxError::InvalidInput(format!(
                "Invalid output format '{}'. Use 'PNG' or 'JPEG'.",
                s
            ))),
        }
    }
}

/// Options for a scramble run.
#[derive(Debug, Clone)]
pub struct ScrambleOptions {
    pub password: String,
    pub mode: ScrambleMode,
    /// Directory for results; defaults to each input's own directory.
    pub out_dir: Option<PathBuf>,
    pub out_format: OutputFormat,
}

/// One processed image.
#[derive(Debug, Serialize)]
pub struct ScrambledFile {
    pub input: String,
    pub output: String,
    pub pixels: usize,
}

/// Report from a scramble run.
#[derive(Debug, Serialize)]
pub struct ScrambleReport {
    pub mode: ScrambleMode,
    pub files: Vec<ScrambledFile>,
}

/// Deterministic permutation of `len` indices keyed by `password`.
pub fn permutation(password: &str, len: usize) -> Vec<usize> {
    let digest = Sha256::digest(password.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let mut rng = fastrand::Rng::with_seed(u64::from_be_bytes(seed));

    let mut order: Vec<usize> = (0..len).collect();
    // Fisher-Yates, walking down from the end.
    for i in (1..len).rev() {
        let j = rng.usize(..=i);
        order.swap(i, j);
    }
    order
}

/// Shuffle or unshuffle the pixels of `img` into a new buffer.
pub fn scramble_pixels(img: &RgbaImage, password: &str, mode: ScrambleMode) -> RgbaImage {
    let (width, height) = img.dimensions();
    let pixels: Vec<_> = img.pixels().copied().collect();
    let order = permutation(password, pixels.len());

    let mut out = pixels.clone();
    for (i, &src) in order.iter().enumerate() {
        match mode {
            ScrambleMode::Scramble => out[i] = pixels[src],
            ScrambleMode::Unscramble => out[src] = pixels[i],
        }
    }

    let mut result = RgbaImage::new(width, height);
    for (dst, px) in result.pixels_mut().zip(out) {
        *dst = px;
    }
    result
}

/// Output path for `input`: `<stem>_<suffix>.<ext>` in `out_dir` or beside the input.
pub fn output_path(input: &Path, options: &ScrambleOptions) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let file_name = format!(
        "{}_{}.{}",
        stem,
        options.mode.suffix(),
        options.out_format.extension()
    );
    match &options.out_dir {
        Some(dir) => dir.join(file_name),
        None => input
            .parent()
            .map(|p| p.join(&file_name))
            .unwrap_or_else(|| PathBuf::from(&file_name)),
    }
}

fn scramble_file(input: &Path, options: &ScrambleOptions) -> Result<ScrambledFile> {
    let img = image::open(input)?.to_rgba8();
    let result = scramble_pixels(&img, &options.password, options.mode);
    let output = output_path(input, options);

    let encoded = match options.out_format {
        OutputFormat::Png => DynamicImage::ImageRgba8(result),
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(result).to_rgb8()),
    };
    encoded.save_with_format(&output, options.out_format.image_format())?;

    log::info!(
        "Wrote {} image; input={}, output={}",
        options.mode.suffix(),
        input.display(),
        output.display()
    );

    Ok(ScrambledFile {
        input: input.display().to_string(),
        output: output.display().to_string(),
        pixels: (img.width() * img.height()) as usize,
    })
}

/// Whether a file found while walking a directory should be processed.
///
/// Files with no known image extension and this mode's own earlier outputs
/// are skipped.
fn is_candidate(file: &Path, mode: ScrambleMode) -> bool {
    if ImageFormat::from_path(file).is_err() {
        log::warn!("Skipping non-image file; path={}", file.display());
        return false;
    }
    let own_output = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(&format!("_{}", mode.suffix())))
        .unwrap_or(false);
    if own_output {
        log::debug!("Skipping earlier output; path={}", file.display());
        return false;
    }
    true
}

/// Scramble or unscramble every image named by `file_paths`. Directories are
/// expanded recursively, skipping non-image files and earlier outputs.
pub fn run(file_paths: &[PathBuf], options: &ScrambleOptions) -> Result<ScrambleReport> {
    if options.password.is_empty() {
        return Err(ToolboxError::ConfigError(
            "A password is required. Pass --password or set SCRAMBLE_PASSWORD.".to_string(),
        ));
    }
    if let Some(dir) = &options.out_dir {
        fs::create_dir_all(dir)?;
    }

    let mut inputs = Vec::new();
    for path in file_paths {
        let found = iter_files(path)?;
        if path.is_dir() {
            inputs.extend(
                found
                    .into_iter()
                    .filter(|file| is_candidate(file, options.mode)),
            );
        } else {
            inputs.extend(found);
        }
    }

    let mut files = Vec::with_capacity(inputs.len());
    for input in &inputs {
        files.push(scramble_file(input, options)?);
    }

    Ok(ScrambleReport {
        mode: options.mode,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 9) as u8, (y * 17) as u8, ((x * y) % 256) as u8, 255])
        })
    }

    fn options(mode: ScrambleMode, out_dir: Option<PathBuf>) -> ScrambleOptions {
        ScrambleOptions {
            password: "hunter2".to_string(),
            mode,
            out_dir,
            out_format: OutputFormat::Png,
        }
    }

    #[test]
    fn test_permutation_is_deterministic() {
        let a = permutation("pw", 100);
        let b = permutation("pw", 100);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
        assert_ne!(permutation("other", 100), a);
    }

    #[test]
    fn test_permutation_edge_lengths() {
        assert!(permutation("pw", 0).is_empty());
        assert_eq!(permutation("pw", 1), vec![0]);
    }

    #[test]
    fn test_scramble_roundtrip_in_memory() {
        let img = gradient(20, 15);
        let scrambled = scramble_pixels(&img, "hunter2", ScrambleMode::Scramble);
        assert_ne!(scrambled, img);
        let restored = scramble_pixels(&scrambled, "hunter2", ScrambleMode::Unscramble);
        assert_eq!(restored, img);

        let wrong = scramble_pixels(&scrambled, "wrong", ScrambleMode::Unscramble);
        assert_ne!(wrong, img);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("JPEG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert!("bmp".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_path() {
        let opts = options(ScrambleMode::Scramble, None);
        assert_eq!(
            output_path(Path::new("/tmp/pics/cat.jpg"), &opts),
            PathBuf::from("/tmp/pics/cat_scrambled.png")
        );
        let opts = options(ScrambleMode::Unscramble, Some(PathBuf::from("out")));
        assert_eq!(
            output_path(Path::new("/tmp/pics/cat_scrambled.png"), &opts),
            PathBuf::from("out/cat_scrambled_unscrambled.png")
        );
    }

    #[test]
    fn test_run_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        let original = gradient(16, 16);
        original.save(&input).unwrap();

        let scrambled_dir = dir.path().join("scrambled");
        let report = run(
            &[input.clone()],
            &options(ScrambleMode::Scramble, Some(scrambled_dir.clone())),
        )
        .unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].pixels, 256);

        let restored_dir = dir.path().join("restored");
        let report = run(
            &[scrambled_dir.clone()],
            &options(ScrambleMode::Unscramble, Some(restored_dir)),
        )
        .unwrap();
        let restored = image::open(&report.files[0].output).unwrap().to_rgba8();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_run_skips_non_images_and_earlier_outputs() {
        let dir = tempfile::tempdir().unwrap();
        gradient(8, 8).save(dir.path().join("a.png")).unwrap();
        fs::write(dir.path().join("readme.txt"), "not an image").unwrap();

        let report = run(
            &[dir.path().to_path_buf()],
            &options(ScrambleMode::Scramble, None),
        )
        .unwrap();
        assert_eq!(report.files.len(), 1);
        assert!(dir.path().join("a_scrambled.png").is_file());

        // A second pass leaves a_scrambled.png alone.
        let report = run(
            &[dir.path().to_path_buf()],
            &options(ScrambleMode::Scramble, None),
        )
        .unwrap();
        assert_eq!(report.files.len(), 1);
        assert!(report.files[0].input.ends_with("a.png"));
        assert!(!dir.path().join("a_scrambled_scrambled.png").exists());
    }

    #[test]
    fn test_run_named_non_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "text").unwrap();
        assert!(run(&[path], &options(ScrambleMode::Scramble, None)).is_err());
    }

    #[test]
    fn test_run_requires_password() {
        let mut opts = options(ScrambleMode::Scramble, None);
        opts.password.clear();
        assert!(matches!(
            run(&[], &opts),
            Err(ToolboxError::ConfigError(_))
        ));
    }
}
