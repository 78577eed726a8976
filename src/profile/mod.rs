//! Profiles and the store they live in.
//!
//! This module handles:
//! - Profile snapshots as carried in containers
//! - The store interface the exporter and importer rely on
//! - A directory-backed store with atomic per-profile writes

mod file_store;
mod record;
mod store;

pub use file_store::{validate_name, FileStore};
pub use record::{ExportPayload, ProfileRecord};
pub use store::{ProfileInfo, ProfileStore, StoredProfile};
