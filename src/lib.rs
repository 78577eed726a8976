//! ccswitch
//!
//! Manages named configuration profiles for a CLI's settings file and backs
//! them up into self-describing `.ccx` containers.
//!
//! # Features
//!
//! - **Binary Containers**: Fixed header, JSON metadata block and payload, CRC-32 checked
//! - **AES-256-GCM Encryption**: Optional, keyed by PBKDF2-HMAC-SHA256 from a password
//! - **gzip Compression**: Always applied before encryption
//! - **Conflict-Aware Import**: Rename, overwrite, prefix, skip or dry-run
//!
//! # Architecture
//!
//! ```text
//! Profiles → JSON → Compress (gzip) → Encrypt (AES-256-GCM) → Container (.ccx)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use ccswitch::codec::ContainerCodec;
//! use ccswitch::profile::FileStore;
//! use ccswitch::transfer::{Exporter, ImportOptions, Importer};
//! use ccswitch::AppConfig;
//! use std::fs::File;
//! use std::path::Path;
//!
//! let config = AppConfig::resolve(None, None).unwrap();
//! let store = FileStore::open(&config).unwrap();
//!
//! // Back up every profile with a password
//! Exporter::new(&store, ContainerCodec::default())
//!     .export_all("hunter2", Path::new("backup.ccx"))
//!     .unwrap();
//!
//! // Restore under a prefix
//! let options = ImportOptions { prefix: "restored-".into(), ..Default::default() };
//! let result = Importer::new(&store, ContainerCodec::default())
//!     .import(File::open("backup.ccx").unwrap(), "hunter2", &options)
//!     .unwrap();
//! println!("{:?}", result.summary());
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod profile;
pub mod transfer;

pub use config::{AppConfig, CodecConfig};
pub use error::{Error, IntegrityFailure, Result};
