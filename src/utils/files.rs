//! Small file and byte helpers shared by the downloaders and the CLI.

use crate::utils::error::Result;
use std::path::Path;

/// Map every byte to the Unicode scalar of the same value (Latin-1).
pub fn bytes_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

pub async fn load_file_to_array<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(path).await?)
}

pub async fn save_array_to_file<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Load a text file, honouring UTF-8 and UTF-16 byte order marks.
///
/// Content that is not valid UTF-8 (after any UTF-8 BOM) is read as Latin-1.
pub async fn load_file_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(decode_text(&bytes))
}

pub async fn save_string_to_file<P: AsRef<Path>>(content: &str, path: P) -> Result<()> {
    tokio::fs::write(path, content.as_bytes()).await?;
    Ok(())
}

pub async fn is_file_exist<P: AsRef<Path>>(path: P) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

fn decode_text(bytes: &[u8]) -> String {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => decode_utf8_or_latin1(rest),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => decode_utf8_or_latin1(bytes),
    }
}

fn decode_utf8_or_latin1(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes_to_string(bytes),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    // 奇數長度時最後一個位元組直接丟棄
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
