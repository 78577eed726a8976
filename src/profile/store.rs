//! Interface the backup subsystem needs from a profile store.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Descriptive information about a stored profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInfo {
    pub name: String,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A profile's content together with its info.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub content: Value,
    pub info: ProfileInfo,
}

/// Named profile storage. Every method must be atomic for a single profile.
pub trait ProfileStore {
    /// Whether a profile with this name exists.
    fn exists(&self, name: &str) -> bool;

    /// Load a profile.
    fn get(&self, name: &str) -> Result<StoredProfile>;

    /// Create an empty profile. Fails if it already exists.
    fn create(&self, name: &str) -> Result<()>;

    /// Replace an existing profile's content.
    fn update(&self, name: &str, content: &Value) -> Result<()>;

    /// List profiles, sorted by name.
    fn list(&self) -> Result<Vec<ProfileInfo>>;

    /// Delete a profile.
    fn delete(&self, name: &str) -> Result<()>;

    /// Name of the active profile, if any.
    fn current(&self) -> Result<Option<String>>;
}
