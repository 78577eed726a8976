//! Fixed 32-byte container header.

use crate::config::{CONTAINER_MAGIC, FORMAT_VERSION};
use crate::error::{Error, IntegrityFailure, Result};

/// Encoded header length in bytes.
pub const HEADER_SIZE: usize = 32;

const FLAG_ENCRYPTED: u32 = 1 << 0;
const FLAG_COMPRESSED: u32 = 1 << 1;
const KNOWN_FLAGS: u32 = FLAG_ENCRYPTED | FLAG_COMPRESSED;

/// Payload transforms applied by the writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub encrypted: bool,
    pub compressed: bool,
}

impl Flags {
    fn to_bits(self) -> u32 {
        let mut bits = 0;
        if self.encrypted {
            bits |= FLAG_ENCRYPTED;
        }
        if self.compressed {
            bits |= FLAG_COMPRESSED;
        }
        bits
    }

    fn from_bits(bits: u32) -> Result<Self> {
        if bits & !KNOWN_FLAGS != 0 {
            return Err(IntegrityFailure::HeaderMismatch("flags").into());
        }
        Ok(Self {
            encrypted: bits & FLAG_ENCRYPTED != 0,
            compressed: bits & FLAG_COMPRESSED != 0,
        })
    }
}

/// Container header, little-endian on disk:
///
/// ```text
/// 0  magic(4)  4 version(4)  8 flags(4)  12 timestamp(8)  20 totalLength(8)  28 checksum(4)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub flags: Flags,
    /// Export time, unix seconds.
    pub timestamp: i64,
    /// Bytes of metadata block (with its length prefix) plus payload block.
    pub total_length: u64,
    /// CRC-32 over metadata block and payload block.
    pub checksum: u32,
}

impl ContainerHeader {
    /// Serialize to the fixed on-disk layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8..12].copy_from_slice(&self.flags.to_bits().to_le_bytes());
        out[12..20].copy_from_slice(&self.timestamp.to_le_bytes());
        out[20..28].copy_from_slice(&self.total_length.to_le_bytes());
        out[28..32].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    /// Parse the fixed on-disk layout, checking magic, then version, then flags.
    pub fn from_bytes(data: &[u8; HEADER_SIZE]) -> Result<Self> {
        let magic: [u8; 4] = field(data, 0);
        if magic != CONTAINER_MAGIC {
            return Err(Error::format("bad magic, not a ccswitch container"));
        }

        let version = u32::from_le_bytes(field(data, 4));
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        Ok(Self {
            magic,
            version,
            flags: Flags::from_bits(u32::from_le_bytes(field(data, 8)))?,
            timestamp: i64::from_le_bytes(field(data, 12)),
            total_length: u64::from_le_bytes(field(data, 20)),
            checksum: u32::from_le_bytes(field(data, 28)),
        })
    }
}

fn field<const N: usize>(data: &[u8; HEADER_SIZE], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}
