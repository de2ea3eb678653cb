//! Least-significant-bit steganography over RGB images.
//!
//! A container is an ordinary RGB image whose color channels carry a
//! bitstream in their low `lsb` bits. The stream starts with a 14 byte
//! header (magic, payload length, checksum, reserved) followed by the
//! payload. Containers are always saved as PNG so the hidden bits survive.
//!
//! ```text
//! stream bits : 1 0 1 0 1 0 1 0 | 1 1 0 0 ...
//! lsb = 3     : [1 0 1][0 1 0][1 0 1][1 0 0] ...
//! channel     :   0      1      2      3
//! ```

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::bits::{mask, split};
use crate::error::{Result, ToolboxError};
use crate::progress::Progress;

/// Marker identifying an initialized container.
pub const MAGIC_BYTES: [u8; 2] = *b"=)";

/// Encoded header size in bytes.
pub const HEADER_LEN: usize = 14;

/// LSB width used when none is configured.
pub const DEFAULT_LSB: u8 = 2;

const FORMAT_CHUNK: usize = 4096;

/// Fixed-size container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub magic: [u8; 2],
    /// Payload length in bytes.
    pub count: u32,
    /// First four bytes of the SHA-256 digest of the payload.
    pub checksum: [u8; 4],
    pub reserved: [u8; 4],
}

impl Header {
    /// A header for an empty container.
    pub fn empty() -> Self {
        Self {
            magic: MAGIC_BYTES,
            count: 0,
            checksum: checksum(&[]),
            reserved: [0; 4],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC_BYTES
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&self.magic);
        out[2..6].copy_from_slice(&self.count.to_be_bytes());
        out[6..10].copy_from_slice(&self.checksum);
        out[10..14].copy_from_slice(&self.reserved);
        out
    }

    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let mut header = Header::default();
        header.magic.copy_from_slice(&bytes[0..2]);
        header.count = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        header.checksum.copy_from_slice(&bytes[6..10]);
        header.reserved.copy_from_slice(&bytes[10..14]);
        header
    }
}

/// Truncated SHA-256 digest used as the payload checksum.
pub fn checksum(data: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(data);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Lowercase hex encoding.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Where a byte position lands in the channel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    /// Byte offset in the stream.
    pub pos: usize,
    /// Channel index holding the first bit of that byte.
    pub idx: usize,
    /// Low bits of that channel still available to the byte.
    pub bits: u8,
}

/// Byte cursor over a bitstream packed into the low bits of each channel.
#[derive(Debug, Clone)]
pub struct BitCursor {
    lsb: u8,
    pos: usize,
}

impl BitCursor {
    pub fn new(lsb: u8) -> Result<Self> {
        validate_lsb(lsb)?;
        Ok(Self { lsb, pos: 0 })
    }

    pub fn lsb(&self) -> u8 {
        self.lsb
    }

    /// Locate a byte position without moving the cursor.
    pub fn locate(&self, pos: usize) -> CursorPosition {
        let bit = pos * 8;
        CursorPosition {
            pos,
            idx: bit / self.lsb as usize,
            bits: self.lsb - (bit % self.lsb as usize) as u8,
        }
    }

    /// Move to a byte position.
    pub fn seek(&mut self, pos: usize) -> CursorPosition {
        self.pos = pos;
        self.locate(pos)
    }

    pub fn position(&self) -> CursorPosition {
        self.locate(self.pos)
    }

    /// Number of whole bytes `channels` can hold.
    pub fn byte_capacity(&self, channels: &[u8]) -> usize {
        channels.len() * self.lsb as usize / 8
    }

    fn check_bounds(&self, channels: &[u8], count: usize) -> Result<()> {
        let capacity = self.byte_capacity(channels);
        if self.pos + count > capacity {
            return Err(ToolboxError::CapacityExceeded {
                requested: self.pos + count,
                capacity,
            });
        }
        Ok(())
    }

    /// Read `count` bytes and advance.
    pub fn read(&mut self, channels: &[u8], count: usize) -> Result<Vec<u8>> {
        self.check_bounds(channels, count)?;
        let lsb = self.lsb as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut byte = 0u8;
            for k in 0..8 {
                let bit = self.pos * 8 + k;
                let (_, field) = split(channels[bit / lsb] as u64, lsb as i32);
                let shift = lsb - 1 - bit % lsb;
                byte = (byte << 1) | ((field >> shift) & 1) as u8;
            }
            out.push(byte);
            self.pos += 1;
        }
        Ok(out)
    }

    /// Write `data` and advance. Bits above `lsb` in each channel are untouched.
    pub fn write(&mut self, channels: &mut [u8], data: &[u8]) -> Result<()> {
        self.check_bounds(channels, data.len())?;
        let lsb = self.lsb as usize;
        for &byte in data {
            for k in 0..8 {
                let bit = self.pos * 8 + k;
                let shift = lsb - 1 - bit % lsb;
                let value = (byte >> (7 - k)) & 1;
                let channel = &mut channels[bit / lsb];
                *channel = (*channel & !(1u8 << shift)) | (value << shift);
            }
            self.pos += 1;
        }
        Ok(())
    }
}

fn validate_lsb(lsb: u8) -> Result<()> {
    if !(1..=8).contains(&lsb) {
        return Err(ToolboxError::InvalidInput(format!(
            "LSB count must be between 1 and 8, got {}",
            lsb
        )));
    }
    Ok(())
}

/// How `format` fills the payload area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStrategy {
    #[default]
    Random,
    Zeros,
    Ones,
}

impl FormatStrategy {
    fn fill(self, rng: &mut fastrand::Rng, buf: &mut [u8]) {
        match self {
            FormatStrategy::Random => rng.fill(buf),
            FormatStrategy::Zeros => buf.fill(0x00),
            FormatStrategy::Ones => buf.fill(0xFF),
        }
    }
}

impl std::fmt::Display for FormatStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatStrategy::Random => write!(f, "random"),
            FormatStrategy::Zeros => write!(f, "zeros"),
            FormatStrategy::Ones => write!(f, "ones"),
        }
    }
}

/// An image opened as a stego container.
pub struct Container {
    path: PathBuf,
    width: u32,
    height: u32,
    channels: Vec<u8>,
    lsb: u8,
    header: Header,
}

impl Container {
    /// Open an RGB image file as a container.
    pub fn open(path: &Path, lsb: u8) -> Result<Self> {
        if !path.is_file() {
            return Err(ToolboxError::NotFound(path.display().to_string()));
        }
        let rgb = match image::open(path)? {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => {
                return Err(ToolboxError::InvalidInput(format!(
                    "Unsupported image mode {:?}, expected 8-bit RGB",
                    other.color()
                )))
            }
        };
        Self::from_image(path, rgb, lsb)
    }

    /// Wrap an in-memory image. `path` is where [`Container::save`] writes.
    pub fn from_image(path: &Path, rgb: RgbImage, lsb: u8) -> Result<Self> {
        validate_lsb(lsb)?;
        let (width, height) = rgb.dimensions();
        let channels = rgb.into_raw();

        let mut cursor = BitCursor::new(lsb)?;
        let header = if cursor.byte_capacity(&channels) >= HEADER_LEN {
            let raw = cursor.read(&channels, HEADER_LEN)?;
            let mut bytes = [0u8; HEADER_LEN];
            bytes.copy_from_slice(&raw);
            Header::from_bytes(&bytes)
        } else {
            Header::default()
        };

        log::debug!(
            "Opened container; path={}, width={}, height={}, lsb={}, valid_header={}",
            path.display(),
            width,
            height,
            lsb,
            header.is_valid()
        );

        Ok(Self {
            path: std::path::absolute(path)?,
            width,
            height,
            channels,
            lsb,
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn lsb(&self) -> u8 {
        self.lsb
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of color channel bytes (width * height * 3).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Payload capacity in bytes.
    pub fn capacity(&self) -> usize {
        (self.channels.len() * self.lsb as usize / 8).saturating_sub(HEADER_LEN)
    }

    /// Payload length, clamped to what the image can physically hold.
    pub fn used(&self) -> usize {
        (self.header.count as usize).min(self.capacity())
    }

    fn cursor_at(&self, offset: usize) -> Result<BitCursor> {
        let mut cursor = BitCursor::new(self.lsb)?;
        cursor.seek(HEADER_LEN + offset);
        Ok(cursor)
    }

    fn require_valid(&self, action: &str) -> Result<()> {
        if !self.header.is_valid() {
            return Err(ToolboxError::InvalidContainer {
                path: self.path.display().to_string(),
                reason: format!("attempt to {} an uninitialized container", action),
            });
        }
        Ok(())
    }

    /// Write a fresh, empty header. Refuses to clobber a valid container unless `force`.
    pub fn initialize(&mut self, force: bool) -> Result<()> {
        if self.header.is_valid() && !force {
            return Err(ToolboxError::AlreadyInitialized {
                path: self.path.display().to_string(),
            });
        }
        self.header = Header::empty();
        log::info!("Initialized container; path={}", self.path.display());
        Ok(())
    }

    /// Check the header and, unless `header_only`, the payload checksum.
    pub fn validate(&self, header_only: bool) -> Result<()> {
        if !self.header.is_valid() {
            return Err(ToolboxError::InvalidContainer {
                path: self.path.display().to_string(),
                reason: format!("magic bytes {} do not match", to_hex(&self.header.magic)),
            });
        }
        if header_only {
            return Ok(());
        }
        let found = self.calc_checksum()?;
        if found != self.header.checksum {
            return Err(ToolboxError::ChecksumMismatch {
                path: self.path.display().to_string(),
                expected: to_hex(&self.header.checksum),
                found: to_hex(&found),
            });
        }
        Ok(())
    }

    /// Checksum of the payload as it currently sits in the channels.
    pub fn calc_checksum(&self) -> Result<[u8; 4]> {
        let payload = self.cursor_at(0)?.read(&self.channels, self.used())?;
        Ok(checksum(&payload))
    }

    /// Read up to `count` payload bytes starting at `offset`. Reads past the
    /// payload end are clamped.
    pub fn read_at(&self, offset: usize, count: usize) -> Result<Vec<u8>> {
        self.require_valid("read from")?;
        let available = self.used().saturating_sub(offset);
        let count = if count > available {
            log::warn!(
                "Read past boundary; requested={}, available={}",
                count,
                available
            );
            available
        } else {
            count
        };
        self.cursor_at(offset.min(self.used()))?
            .read(&self.channels, count)
    }

    /// The full payload.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        self.read_at(0, self.used())
    }

    /// Replace the payload with `data`.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.require_valid("write to")?;
        if data.len() > self.capacity() {
            return Err(ToolboxError::CapacityExceeded {
                requested: data.len(),
                capacity: self.capacity(),
            });
        }
        self.cursor_at(0)?.write(&mut self.channels, data)?;
        self.header.count = data.len() as u32;
        log::debug!("Wrote payload; bytes={}", data.len());
        Ok(())
    }

    /// Overwrite part of the payload at `offset`, extending it if needed.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.require_valid("write to")?;
        let end = offset + data.len();
        if end > self.capacity() {
            return Err(ToolboxError::CapacityExceeded {
                requested: end,
                capacity: self.capacity(),
            });
        }
        self.cursor_at(offset)?.write(&mut self.channels, data)?;
        self.header.count = self.header.count.max(end as u32);
        Ok(())
    }

    /// Overwrite the whole payload area and reset the payload length to zero.
    pub fn format(&mut self, strategy: FormatStrategy, progress: &dyn Progress) -> Result<()> {
        self.require_valid("format")?;
        log::info!("Formatting container; strategy={}", strategy);

        let capacity = self.capacity();
        let mut cursor = self.cursor_at(0)?;
        let mut rng = fastrand::Rng::new();
        let mut buf = vec![0u8; FORMAT_CHUNK];

        progress.start(capacity as u64, "Formatting");
        let mut remaining = capacity;
        while remaining > 0 {
            let n = remaining.min(FORMAT_CHUNK);
            strategy.fill(&mut rng, &mut buf[..n]);
            cursor.write(&mut self.channels, &buf[..n])?;
            remaining -= n;
            progress.advance(n as u64);
        }
        progress.finish();

        self.header.count = 0;
        Ok(())
    }

    /// Save next to the source as `<stem>.png`, returning the written path.
    pub fn save(&mut self) -> Result<PathBuf> {
        let target = self.path.with_extension("png");
        self.save_as(&target)?;
        Ok(target)
    }

    /// Recompute the checksum, embed the header, and encode a PNG at `target`.
    pub fn save_as(&mut self, target: &Path) -> Result<()> {
        if self.header.is_valid() {
            self.header.checksum = self.calc_checksum()?;
            let header = self.header.to_bytes();
            BitCursor::new(self.lsb)?.write(&mut self.channels, &header)?;
        }

        let rgb = RgbImage::from_raw(self.width, self.height, self.channels.clone())
            .ok_or_else(|| {
                ToolboxError::InvalidInput("Channel buffer does not match image size".to_string())
            })?;
        rgb.save_with_format(target, ImageFormat::Png)?;

        self.path = std::path::absolute(target)?;
        log::info!("Saved container; path={}", self.path.display());
        Ok(())
    }

    /// Percentage of color fidelity left after embedding header and payload.
    pub fn visual_integrity(&self) -> f64 {
        let max = self.channels.len() as f64 * 256.0;
        if max == 0.0 {
            return 100.0;
        }
        let touched = BitCursor {
            lsb: self.lsb,
            pos: 0,
        }
        .locate(HEADER_LEN + self.used())
        .idx;
        let degradation = (mask(self.lsb as u32) + 1) as f64 * touched as f64;
        ((max - degradation) / max * 100.0).max(0.0)
    }

    /// Summarize the container for display.
    pub fn info(&self) -> ContainerInfo {
        let capacity = self.capacity();
        let used = self.used();
        let valid = self.header.is_valid();
        ContainerInfo {
            path: self.path.display().to_string(),
            valid_header: valid,
            width: self.width,
            height: self.height,
            capacity,
            used,
            used_percent: if capacity == 0 {
                0.0
            } else {
                used as f64 / capacity as f64 * 100.0
            },
            channels: self.channels.len(),
            lsb: self.lsb,
            checksum: to_hex(&self.header.checksum),
            reserved: to_hex(&self.header.reserved),
            header_end: valid.then_some(HEADER_LEN),
            visual_integrity: self.visual_integrity(),
        }
    }
}

/// Container details shown by `image stego info`.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub path: String,
    pub valid_header: bool,
    pub width: u32,
    pub height: u32,
    /// Payload capacity in bytes.
    pub capacity: usize,
    /// Payload length in bytes.
    pub used: usize,
    pub used_percent: f64,
    /// Number of color channel bytes.
    pub channels: usize,
    pub lsb: u8,
    pub checksum: String,
    pub reserved: String,
    /// Byte offset where the payload begins; absent for invalid headers.
    pub header_end: Option<usize>,
    pub visual_integrity: f64,
}

/// Outcome of `image stego validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateReport {
    pub path: String,
    pub valid: bool,
    pub header_only: bool,
    /// Why validation failed, when it did.
    pub reason: Option<String>,
}

/// Outcome of commands that save a container.
#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    /// Where the container was written.
    pub path: String,
    /// Payload length after the command.
    pub used: usize,
    pub capacity: usize,
}

impl SaveReport {
    fn from_container(container: &Container) -> Self {
        Self {
            path: container.path().display().to_string(),
            used: container.used(),
            capacity: container.capacity(),
        }
    }
}

/// Turn an image into an empty container and save it.
pub fn initialize(path: &Path, lsb: u8, force: bool) -> Result<SaveReport> {
    let mut container = Container::open(path, lsb)?;
    container.initialize(force)?;
    container.save()?;
    Ok(SaveReport::from_container(&container))
}

/// Validate a container. Failures are reported, not returned as errors.
pub fn validate(path: &Path, lsb: u8, header_only: bool) -> Result<ValidateReport> {
    let container = Container::open(path, lsb)?;
    let outcome = container.validate(header_only);
    let reason = match outcome {
        Ok(()) => None,
        Err(e @ ToolboxError::InvalidContainer { .. })
        | Err(e @ ToolboxError::ChecksumMismatch { .. }) => Some(e.to_string()),
        Err(e) => return Err(e),
    };
    Ok(ValidateReport {
        path: container.path().display().to_string(),
        valid: reason.is_none(),
        header_only,
        reason,
    })
}

/// Read a container's payload.
pub fn cat(path: &Path, lsb: u8) -> Result<Vec<u8>> {
    Container::open(path, lsb)?.read_all()
}

/// Replace a container's payload and save it.
pub fn write(path: &Path, lsb: u8, data: &[u8]) -> Result<SaveReport> {
    let mut container = Container::open(path, lsb)?;
    container.write(data)?;
    container.save()?;
    Ok(SaveReport::from_container(&container))
}

/// Wipe a container's payload area and save it.
pub fn format(
    path: &Path,
    lsb: u8,
    strategy: FormatStrategy,
    progress: &dyn Progress,
) -> Result<SaveReport> {
    let mut container = Container::open(path, lsb)?;
    container.format(strategy, progress)?;
    container.save()?;
    Ok(SaveReport::from_container(&container))
}

/// Describe a container without modifying it.
pub fn info(path: &Path, lsb: u8) -> Result<ContainerInfo> {
    Ok(Container::open(path, lsb)?.info())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    fn test_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 13) as u8, ((x + y) * 3) as u8])
        })
    }

    fn test_container(lsb: u8) -> Container {
        let mut c = Container::from_image(Path::new("img.png"), test_image(32, 32), lsb).unwrap();
        c.initialize(true).unwrap();
        c
    }

    #[test]
    fn test_cursor_seek() {
        let mut cursor = BitCursor::new(3).unwrap();
        let p = |pos, idx, bits| CursorPosition { pos, idx, bits };
        assert_eq!(cursor.seek(0), p(0, 0, 3));
        assert_eq!(cursor.seek(1), p(1, 2, 1));
        assert_eq!(cursor.seek(2), p(2, 5, 2));
        assert_eq!(cursor.position(), p(2, 5, 2));
    }

    #[test]
    fn test_cursor_rejects_bad_lsb() {
        assert!(BitCursor::new(0).is_err());
        assert!(BitCursor::new(9).is_err());
        assert!(BitCursor::new(8).is_ok());
    }

    #[test]
    fn test_cursor_bit_layout() {
        // 0b1010_1010 0b1010_1010 with lsb=3 spreads over six channels.
        let mut channels = vec![0u8; 6];
        let mut cursor = BitCursor::new(3).unwrap();
        cursor.write(&mut channels, &[0xAA, 0xAA]).unwrap();
        assert_eq!(channels, vec![0b101, 0b010, 0b101, 0b010, 0b101, 0b000]);
    }

    #[test]
    fn test_cursor_preserves_high_bits() {
        let mut channels = vec![0xFFu8; 8];
        let mut cursor = BitCursor::new(2).unwrap();
        cursor.write(&mut channels, &[0x00, 0x00]).unwrap();
        assert!(channels.iter().all(|c| *c == 0xFC));
    }

    #[test]
    fn test_cursor_unaligned_roundtrip() {
        let mut channels = vec![0x55u8; 64];
        let mut cursor = BitCursor::new(3).unwrap();
        cursor.seek(5);
        cursor.write(&mut channels, b"hello").unwrap();
        cursor.seek(5);
        assert_eq!(cursor.read(&channels, 5).unwrap(), b"hello");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut channels = vec![0u8; 8];
        let mut cursor = BitCursor::new(1).unwrap();
        assert!(cursor.write(&mut channels, &[1]).is_ok());
        assert!(matches!(
            cursor.write(&mut channels, &[1]),
            Err(ToolboxError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_header_bytes() {
        let header = Header {
            magic: MAGIC_BYTES,
            count: 0x01020304,
            checksum: [9, 8, 7, 6],
            reserved: [0; 4],
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..2], b"=)");
        assert_eq!(&bytes[2..6], &[1, 2, 3, 4]);
        assert_eq!(Header::from_bytes(&bytes), header);
    }

    #[test]
    fn test_container_dimensions() {
        let c = test_container(2);
        assert_eq!(c.channel_count(), 32 * 32 * 3);
        assert_eq!(c.capacity(), 32 * 32 * 3 * 2 / 8 - HEADER_LEN);
    }

    #[test]
    fn test_container_read() {
        let mut c = test_container(2);
        c.write(b"aaaa").unwrap();
        assert_eq!(c.read_at(0, 0).unwrap().len(), 0);
        assert_eq!(c.read_at(0, 4).unwrap().len(), 4);
        // Nothing left past the payload end.
        assert_eq!(c.read_at(4, 4).unwrap().len(), 0);
        assert_eq!(c.read_at(2, 10).unwrap(), b"aa");
    }

    #[test]
    fn test_container_write_at() {
        let mut c = test_container(2);
        c.write_at(0, b"abcd").unwrap();
        assert_eq!(c.read_at(0, 4).unwrap(), b"abcd");
        c.write_at(2, b"XYZ").unwrap();
        assert_eq!(c.read_all().unwrap(), b"abXYZ");
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut c = test_container(1);
        let too_big = vec![0u8; c.capacity() + 1];
        assert!(matches!(
            c.write(&too_big),
            Err(ToolboxError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_uninitialized_rejects_io() {
        let mut c = Container::from_image(Path::new("img.png"), test_image(8, 8), 2).unwrap();
        assert!(!c.header().is_valid());
        assert!(c.read_all().is_err());
        assert!(c.write(b"x").is_err());
        assert!(c.validate(true).is_err());
    }

    #[test]
    fn test_initialize_refuses_without_force() {
        let mut c = test_container(2);
        assert!(matches!(
            c.initialize(false),
            Err(ToolboxError::AlreadyInitialized { .. })
        ));
        assert!(c.initialize(true).is_ok());
    }

    #[test]
    fn test_checksum_detects_tampering() {
        let mut c = test_container(2);
        c.write(b"secret").unwrap();
        c.header.checksum = c.calc_checksum().unwrap();
        assert!(c.validate(false).is_ok());

        // Flip a payload bit behind the header's back.
        let idx = BitCursor::new(2).unwrap().locate(HEADER_LEN).idx;
        c.channels[idx] ^= 0b01;
        assert!(matches!(
            c.validate(false),
            Err(ToolboxError::ChecksumMismatch { .. })
        ));
        assert!(c.validate(true).is_ok());
    }

    #[test]
    fn test_format_resets_count() {
        let mut c = test_container(2);
        c.write(b"data").unwrap();
        c.format(FormatStrategy::Ones, &NoProgress).unwrap();
        assert_eq!(c.used(), 0);
        let raw = c.cursor_at(0).unwrap().read(&c.channels, 16).unwrap();
        assert!(raw.iter().all(|b| *b == 0xFF));

        c.format(FormatStrategy::Zeros, &NoProgress).unwrap();
        let raw = c.cursor_at(0).unwrap().read(&c.channels, 16).unwrap();
        assert!(raw.iter().all(|b| *b == 0x00));
    }

    #[test]
    fn test_info() {
        let mut c = test_container(2);
        c.write(&[1u8; 100]).unwrap();
        let info = c.info();
        assert!(info.valid_header);
        assert_eq!(info.used, 100);
        assert_eq!(info.lsb, 2);
        assert_eq!(info.header_end, Some(HEADER_LEN));
        assert!(info.visual_integrity > 0.0 && info.visual_integrity < 100.0);
        assert_eq!(info.reserved, "00000000");
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cover.png");
        test_image(40, 30).save(&source).unwrap();

        let report = initialize(&source, DEFAULT_LSB, false).unwrap();
        assert_eq!(report.used, 0);

        write(&source, DEFAULT_LSB, b"hidden message").unwrap();
        assert_eq!(cat(&source, DEFAULT_LSB).unwrap(), b"hidden message");

        let report = validate(&source, DEFAULT_LSB, false).unwrap();
        assert!(report.valid, "{:?}", report.reason);

        let report = format(&source, DEFAULT_LSB, FormatStrategy::Random, &NoProgress).unwrap();
        assert_eq!(report.used, 0);
        assert!(cat(&source, DEFAULT_LSB).unwrap().is_empty());
        assert!(validate(&source, DEFAULT_LSB, false).unwrap().valid);
    }

    #[test]
    fn test_validate_reports_plain_image() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plain.png");
        RgbImage::new(16, 16).save(&source).unwrap();
        let report = validate(&source, DEFAULT_LSB, true).unwrap();
        assert!(!report.valid);
        assert!(report.reason.unwrap().contains("invalid header"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = Container::open(Path::new("/no/such/image.png"), 2)
            .err()
            .unwrap();
        assert!(matches!(err, ToolboxError::NotFound(_)));
    }
}
