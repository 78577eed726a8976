//! Profile snapshots carried inside a container.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// A single profile as exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Profile name, unique within a container.
    pub name: String,
    /// Whether this was the active profile at export time.
    pub is_current: bool,
    /// The profile's settings document.
    pub content: Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Create a record stamped with the current time.
    pub fn new(name: impl Into<String>, content: Value) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            is_current: false,
            content,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Ordered list of records with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    profiles: Vec<ProfileRecord>,
}

impl ExportPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from records, rejecting duplicate names.
    pub fn from_records(records: Vec<ProfileRecord>) -> Result<Self> {
        let mut payload = Self::new();
        for record in records {
            payload.push(record)?;
        }
        Ok(payload)
    }

    /// Append a record, keeping insertion order.
    pub fn push(&mut self, record: ProfileRecord) -> Result<()> {
        if self.profiles.iter().any(|p| p.name == record.name) {
            return Err(Error::DuplicateProfile(record.name));
        }
        self.profiles.push(record);
        Ok(())
    }

    /// Records in export order.
    pub fn profiles(&self) -> &[ProfileRecord] {
        &self.profiles
    }

    /// Consume the payload, yielding its records.
    pub fn into_profiles(self) -> Vec<ProfileRecord> {
        self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Check the unique-name invariant on a payload decoded from untrusted bytes.
    pub(crate) fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.profiles.len());
        for record in &self.profiles {
            if !seen.insert(record.name.as_str()) {
                return Err(Error::DuplicateProfile(record.name.clone()));
            }
        }
        Ok(())
    }
}
