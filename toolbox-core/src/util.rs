//! Small helpers for human-friendly numbers and byte-oriented CLI input/output.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, ToolboxError};

const BYTE_SUFFIXES: [&str; 6] = ["bytes", "kb", "mb", "gb", "tb", "pb"];

/// Insert `,` thousands separators into an integer: `1234567` -> `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Friendly byte count: `12340` -> `12.05 kb`, `512` -> `512 bytes`.
pub fn bytes_str(num: u64) -> String {
    let mut value = num as f64;
    let mut idx = 0;
    while value > 1024.0 && idx < BYTE_SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        return format!("{} {}", group_thousands(num), BYTE_SUFFIXES[0]);
    }
    let whole = value.trunc() as u64;
    let frac = ((value - value.trunc()) * 100.0).round() as u64;
    // Rounding can carry into the integer part (e.g. 1.999 -> 2.00).
    let (whole, frac) = if frac >= 100 { (whole + 1, 0) } else { (whole, frac) };
    format!("{}.{:02} {}", group_thousands(whole), frac, BYTE_SUFFIXES[idx])
}

/// Resolve a `--data` style argument into bytes.
///
/// `-` reads all of `stdin`, an existing file path reads that file,
/// anything else is taken as the literal text.
pub fn read_byte_content<R: Read>(file_or_data: &str, mut stdin: R) -> Result<Vec<u8>> {
    if file_or_data == "-" {
        let mut buf = Vec::new();
        stdin.read_to_end(&mut buf)?;
        return Ok(buf);
    }
    let path = Path::new(file_or_data);
    if path.is_file() {
        return Ok(fs::read(path)?);
    }
    Ok(file_or_data.as_bytes().to_vec())
}

/// Write bytes to `-` (the given stdout) or to a file, creating or truncating it.
pub fn write_byte_content<W: Write>(file: &str, data: &[u8], mut stdout: W) -> Result<()> {
    if file == "-" {
        stdout.write_all(data)?;
        stdout.flush()?;
        return Ok(());
    }
    let path = Path::new(file);
    if path.is_dir() {
        return Err(ToolboxError::InvalidInput(format!(
            "Could not determine output file destination [{}]",
            file
        )));
    }
    fs::write(path, data)?;
    Ok(())
}

/// Recursively list the files beneath `path`, sorted for stable output.
///
/// A path that is itself a file yields just that file.
pub fn iter_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(ToolboxError::NotFound(path.display().to_string()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ToolboxError::IoError(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other(format!("Failed to walk {}", path.display()))
            }))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
