//! gzip compression of serialized payloads.

use crate::config::MAX_DECOMPRESSED_SIZE;
use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Compress a buffer into a gzip stream.
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 64), Compression::new(level));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a gzip stream, rejecting malformed or oversized input.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .take(MAX_DECOMPRESSED_SIZE + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::Decode(e.to_string()))?;

    if out.len() as u64 > MAX_DECOMPRESSED_SIZE {
        return Err(Error::Decode(format!(
            "decompressed payload exceeds {} bytes",
            MAX_DECOMPRESSED_SIZE
        )));
    }
    Ok(out)
}
