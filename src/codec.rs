//! Shared pieces of the binary persistence format.
//!
//! Lists and tables serialize to a bincode payload wrapped in base64 text;
//! their file variants additionally gzip the base64 bytes. Datasets gzip
//! their raw bincode payload with no base64 layer; that asymmetry is part
//! of the format and is preserved here on purpose.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{CollectionError, CollectionResult};

/// Width of the fixed, NUL-padded name header on serialized tables.
///
/// Legacy width; existing archives depend on it, so it is not negotiable at
/// decode time.
pub const TABLE_NAME_LEN: usize = 80;

/// Wrap raw payload bytes in printable base64 text.
pub(crate) fn base64_encode(raw: &[u8]) -> Vec<u8> {
    BASE64.encode(raw).into_bytes()
}

/// Undo [`base64_encode`].
pub(crate) fn base64_decode(text: &[u8]) -> CollectionResult<Vec<u8>> {
    Ok(BASE64.decode(text)?)
}

/// Prefix `payload` with the fixed-width, NUL-padded name header.
///
/// The caller guarantees `name` fits in [`TABLE_NAME_LEN`] bytes; the table
/// constructor enforces that bound.
pub(crate) fn pack_name_header(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = [0u8; TABLE_NAME_LEN];
    header[..name.len()].copy_from_slice(name.as_bytes());

    let mut out = Vec::with_capacity(TABLE_NAME_LEN + payload.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(payload);
    out
}

/// Split off the fixed-width name header, stopping the name at the first NUL.
///
/// Fails with [`CollectionError::ShortData`] when the input cannot even hold
/// the header.
pub(crate) fn split_name_header(data: &[u8]) -> CollectionResult<(String, &[u8])> {
    if data.len() < TABLE_NAME_LEN {
        return Err(CollectionError::ShortData {
            len: data.len(),
            expected: TABLE_NAME_LEN,
        });
    }

    let header = &data[..TABLE_NAME_LEN];
    let end = header.iter().position(|&b| b == 0).unwrap_or(TABLE_NAME_LEN);
    let name = String::from_utf8_lossy(&header[..end]).into_owned();

    Ok((name, &data[TABLE_NAME_LEN..]))
}

/// Gzip `data` and write it to `path`, overwriting any existing file.
pub(crate) fn write_gzip(path: &Path, data: &[u8]) -> CollectionResult<()> {
    let file = File::create(path)?;
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(data)?;
    enc.finish()?;
    Ok(())
}

/// Read `path` and gunzip its contents.
pub(crate) fn read_gzip(path: &Path) -> CollectionResult<Vec<u8>> {
    let file = File::open(path)?;
    let mut dec = GzDecoder::new(file);
    let mut data = Vec::new();
    dec.read_to_end(&mut data)?;
    Ok(data)
}
