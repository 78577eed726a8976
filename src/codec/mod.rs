//! Binary container format for profile backups.
//!
//! This module handles:
//! - gzip compression of the serialized payload
//! - The fixed header and its flag bitset
//! - Writing, reading and cheaply validating whole containers

mod compression;
mod container;
mod header;
mod metadata;

pub use compression::{compress, decompress};
pub use container::ContainerCodec;
pub use header::{ContainerHeader, Flags, HEADER_SIZE};
pub use metadata::{ContainerMetadata, ExportType};
