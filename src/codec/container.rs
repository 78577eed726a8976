//! Container writer and reader.
//!
//! ```text
//! header(32) | metadataLength(4) metadata(N) | payload(M)
//! ```
//!
//! The payload is the gzip-compressed JSON record list, wrapped in an
//! [`EncryptionEnvelope`] when a password is given. The header checksum is a
//! CRC-32 over everything after the header.

use crate::codec::compression::{compress, decompress};
use crate::codec::header::{ContainerHeader, Flags, HEADER_SIZE};
use crate::codec::metadata::ContainerMetadata;
use crate::config::{CodecConfig, CONTAINER_MAGIC, FORMAT_VERSION};
use crate::crypto::{EncryptionEnvelope, PasswordCipher};
use crate::error::{Error, IntegrityFailure, Result};
use crate::profile::ExportPayload;
use chrono::Utc;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use tracing::{debug, info};

/// Length of the metadata block's length prefix.
const METADATA_PREFIX_LEN: usize = 4;

/// Writes and reads containers. Holds configuration only.
#[derive(Debug, Clone, Default)]
pub struct ContainerCodec {
    config: CodecConfig,
    cipher: PasswordCipher,
}

impl ContainerCodec {
    /// Create a codec with the given configuration.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cipher: PasswordCipher::new(),
        })
    }

    /// Write `payload` as a container to `sink`, encrypting when `password` is non-empty.
    pub fn write<W: Write>(
        &self,
        payload: &ExportPayload,
        mut sink: W,
        password: &str,
    ) -> Result<ContainerMetadata> {
        let encrypted = !password.is_empty();
        let metadata = ContainerMetadata::new(
            payload.len(),
            encrypted,
            self.cipher.iterations(),
            Utc::now(),
        );

        let metadata_bytes = serde_json::to_vec(&metadata)?;
        let payload_bytes = serde_json::to_vec(payload)?;
        let compressed = compress(&payload_bytes, self.config.compression_level)?;

        let payload_block = if encrypted {
            self.cipher.encrypt(&compressed, password)?.to_bytes()
        } else {
            compressed
        };

        let mut metadata_block = Vec::with_capacity(METADATA_PREFIX_LEN + metadata_bytes.len());
        metadata_block.extend_from_slice(&(metadata_bytes.len() as u32).to_le_bytes());
        metadata_block.extend_from_slice(&metadata_bytes);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&metadata_block);
        hasher.update(&payload_block);

        let header = ContainerHeader {
            magic: CONTAINER_MAGIC,
            version: FORMAT_VERSION,
            flags: Flags {
                encrypted,
                compressed: true,
            },
            timestamp: metadata.exported_at.timestamp(),
            total_length: (metadata_block.len() + payload_block.len()) as u64,
            checksum: hasher.finalize(),
        };

        sink.write_all(&header.to_bytes())?;
        sink.write_all(&metadata_block)?;
        sink.write_all(&payload_block)?;
        sink.flush()?;

        info!(
            profiles = payload.len(),
            encrypted,
            raw_bytes = payload_bytes.len(),
            container_bytes = HEADER_SIZE as u64 + header.total_length,
            "container written"
        );

        Ok(metadata)
    }

    /// Read and fully decode a container.
    pub fn read<R: Read>(&self, source: R, password: &str) -> Result<ExportPayload> {
        self.read_with_metadata(source, password)
            .map(|(_, payload)| payload)
    }

    /// Read and fully decode a container, returning its metadata alongside the payload.
    pub fn read_with_metadata<R: Read>(
        &self,
        mut source: R,
        password: &str,
    ) -> Result<(ContainerMetadata, ExportPayload)> {
        let header = read_header(&mut source)?;

        let body = read_up_to(&mut source, header.total_length)?;
        if (body.len() as u64) < header.total_length {
            return Err(IntegrityFailure::Truncated {
                expected: header.total_length,
                actual: body.len() as u64,
            }
            .into());
        }

        let actual = crc32fast::hash(&body);
        if actual != header.checksum {
            return Err(IntegrityFailure::ChecksumMismatch {
                expected: header.checksum,
                actual,
            }
            .into());
        }

        let (metadata_bytes, payload_block) = split_body(&body)?;
        let metadata: ContainerMetadata = serde_json::from_slice(metadata_bytes)
            .map_err(|e| Error::format(format!("metadata is not valid JSON: {}", e)))?;
        check_header_against_metadata(&header, &metadata)?;

        debug!(
            profiles = metadata.profile_count,
            encrypted = header.flags.encrypted,
            compressed = header.flags.compressed,
            "container integrity verified"
        );

        let mut data = if header.flags.encrypted {
            if password.is_empty() {
                return Err(Error::PasswordRequired);
            }
            let envelope = EncryptionEnvelope::from_bytes(payload_block)?;
            let cipher = match metadata.kdf_iterations {
                Some(iterations) => PasswordCipher::with_iterations(iterations)?,
                None => self.cipher.clone(),
            };
            cipher.decrypt(&envelope, password)?
        } else {
            payload_block.to_vec()
        };

        if header.flags.compressed {
            data = decompress(&data)?;
        }

        let payload: ExportPayload = serde_json::from_slice(&data)
            .map_err(|e| Error::format(format!("payload is not valid JSON: {}", e)))?;
        payload
            .check_unique()
            .map_err(|e| Error::format(e.to_string()))?;
        if payload.len() != metadata.profile_count {
            return Err(Error::format(format!(
                "metadata lists {} profiles, payload holds {}",
                metadata.profile_count,
                payload.len()
            )));
        }

        Ok((metadata, payload))
    }

    /// Read header and metadata only, skipping the payload and its checksum.
    ///
    /// The source is left at the position it had on entry.
    pub fn validate<R: Read + Seek>(&self, mut source: R) -> Result<ContainerMetadata> {
        let start = source.stream_position()?;
        let result = inspect(&mut source);
        source.seek(SeekFrom::Start(start))?;
        result
    }
}

fn read_header<R: Read>(source: &mut R) -> Result<ContainerHeader> {
    let mut buf = [0u8; HEADER_SIZE];
    source.read_exact(&mut buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::format("input too short to be a container"),
        _ => Error::Io(e),
    })?;
    ContainerHeader::from_bytes(&buf)
}

/// Read at most `limit` bytes without trusting `limit` for allocation.
fn read_up_to<R: Read>(source: &mut R, limit: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    source.take(limit).read_to_end(&mut buf)?;
    Ok(buf)
}

fn split_body(body: &[u8]) -> Result<(&[u8], &[u8])> {
    if body.len() < METADATA_PREFIX_LEN {
        return Err(IntegrityFailure::HeaderMismatch("total_length").into());
    }
    let (prefix, rest) = body.split_at(METADATA_PREFIX_LEN);
    let metadata_len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if metadata_len > rest.len() {
        return Err(IntegrityFailure::HeaderMismatch("metadata_length").into());
    }
    Ok(rest.split_at(metadata_len))
}

/// Header fields sit outside the checksum; bind them to the checksummed metadata.
fn check_header_against_metadata(
    header: &ContainerHeader,
    metadata: &ContainerMetadata,
) -> Result<()> {
    if metadata.format_version != header.version {
        return Err(IntegrityFailure::HeaderMismatch("version").into());
    }
    if header.flags.encrypted != metadata.is_encrypted()
        || header.flags.compressed != metadata.is_compressed()
    {
        return Err(IntegrityFailure::HeaderMismatch("flags").into());
    }
    if header.timestamp != metadata.exported_at.timestamp() {
        return Err(IntegrityFailure::HeaderMismatch("timestamp").into());
    }
    Ok(())
}

fn inspect<R: Read>(source: &mut R) -> Result<ContainerMetadata> {
    let header = read_header(source)?;

    let mut prefix = [0u8; METADATA_PREFIX_LEN];
    source.read_exact(&mut prefix).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::format("truncated before metadata block"),
        _ => Error::Io(e),
    })?;
    let metadata_len = u32::from_le_bytes(prefix) as u64;
    if metadata_len + METADATA_PREFIX_LEN as u64 > header.total_length {
        return Err(Error::format(format!(
            "metadata length {} exceeds container length {}",
            metadata_len, header.total_length
        )));
    }

    let metadata_bytes = read_up_to(source, metadata_len)?;
    if (metadata_bytes.len() as u64) < metadata_len {
        return Err(Error::format("truncated metadata block"));
    }

    serde_json::from_slice(&metadata_bytes)
        .map_err(|e| Error::format(format!("metadata is not valid JSON: {}", e)))
}
