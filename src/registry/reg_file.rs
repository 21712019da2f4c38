//! Minimal reader for exported `.reg` files.
//!
//! `reg export` writes UTF-16LE with a byte-order mark; hand-made files are
//! often UTF-8. Only the first `[KEY]` header is ever needed here.

use std::path::Path;

use crate::error::Result;

/// First line of every file produced by `reg export`.
pub const REG_FILE_HEADER: &str = "Windows Registry Editor Version 5.00";

/// Read a `.reg` file as text, decoding UTF-16LE/BE when a BOM is present.
pub fn read_reg_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode(&bytes))
}

/// The registry path named by the first `[...]` header, if any.
///
/// Deletion headers (`[-KEY]`) are skipped.
pub fn first_key_path(path: &Path) -> Option<String> {
    let text = read_reg_text(path).ok()?;
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .find(|key| !key.is_empty() && !key.starts_with('-'))
        .map(str::to_string)
}

fn decode(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
