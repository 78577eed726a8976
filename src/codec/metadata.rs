//! Descriptive metadata block stored ahead of the payload.

use crate::config::{COMPRESSION_ALGORITHM, ENCRYPTION_ALGORITHM, FORMAT_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a container holds one profile or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Single,
    Multiple,
}

impl ExportType {
    /// Export type for a payload of `count` records.
    pub fn for_count(count: usize) -> Self {
        if count == 1 {
            ExportType::Single
        } else {
            ExportType::Multiple
        }
    }
}

/// Metadata describing a container's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub producer_version: String,
    pub export_type: ExportType,
    pub profile_count: usize,
    /// AEAD name, empty when the payload is not encrypted.
    #[serde(default)]
    pub encryption_algorithm: String,
    /// Compression stream name, empty when the payload is not compressed.
    #[serde(default)]
    pub compression_algorithm: String,
    /// PBKDF2 iterations used by the writer; absent means the standard count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_iterations: Option<u32>,
}

impl ContainerMetadata {
    /// Metadata for a new container of `profile_count` records.
    pub fn new(
        profile_count: usize,
        encrypted: bool,
        kdf_iterations: u32,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            exported_at,
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
            export_type: ExportType::for_count(profile_count),
            profile_count,
            encryption_algorithm: if encrypted {
                ENCRYPTION_ALGORITHM.to_string()
            } else {
                String::new()
            },
            compression_algorithm: COMPRESSION_ALGORITHM.to_string(),
            kdf_iterations: encrypted.then_some(kdf_iterations),
        }
    }

    /// Whether importing this container needs a password.
    pub fn is_encrypted(&self) -> bool {
        !self.encryption_algorithm.is_empty()
    }

    /// Whether the payload is compressed.
    pub fn is_compressed(&self) -> bool {
        !self.compression_algorithm.is_empty()
    }
}
