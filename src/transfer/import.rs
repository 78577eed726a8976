//! Import profiles from a container, resolving name conflicts against the store.

use crate::codec::{ContainerCodec, ContainerMetadata};
use crate::error::{Error, Result};
use crate::profile::{ProfileRecord, ProfileStore};
use crate::transfer::naming::alternative_name;
use serde_json::Value;
use std::collections::HashSet;
use std::io::{Read, Seek};
use tracing::{debug, info, warn};

/// How incoming profiles are merged into the store.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Replace existing profiles of the same name.
    pub overwrite: bool,
    /// Prepended to every incoming name.
    pub prefix: String,
    /// Report what would happen without touching the store.
    pub dry_run: bool,
    /// Skip conflicting profiles instead of renaming them. `overwrite` wins.
    pub skip_existing: bool,
}

/// An incoming profile whose name is already taken in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    /// Name as stored in the container.
    pub original_name: String,
    /// Existing store name it collides with.
    pub conflicting_name: String,
    /// Free name it could be imported under.
    pub suggested_alternative: String,
}

/// A profile imported under a generated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedProfile {
    pub from: String,
    pub to: String,
}

/// A profile that could not be imported.
#[derive(Debug)]
pub struct ImportFailure {
    pub name: String,
    pub error: Error,
}

/// Counts derived from an [`ImportResult`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub renamed: usize,
    pub errored: usize,
}

/// Outcome of an import, per profile.
#[derive(Debug)]
pub struct ImportResult {
    pub metadata: ContainerMetadata,
    /// Final names written (suffixed with " (dry run)" in dry runs).
    pub profiles_imported: Vec<String>,
    pub profiles_skipped: Vec<String>,
    /// Imported under an alternative name; a subset of `profiles_imported`.
    pub profiles_renamed: Vec<RenamedProfile>,
    /// Collisions seen during a dry run.
    pub conflicts: Vec<ConflictRecord>,
    pub errors: Vec<ImportFailure>,
}

impl ImportResult {
    fn new(metadata: ContainerMetadata) -> Self {
        Self {
            metadata,
            profiles_imported: Vec::new(),
            profiles_skipped: Vec::new(),
            profiles_renamed: Vec::new(),
            conflicts: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Counts computed from the result lists.
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            total: self.profiles_imported.len() + self.profiles_skipped.len() + self.errors.len(),
            imported: self.profiles_imported.len(),
            skipped: self.profiles_skipped.len(),
            renamed: self.profiles_renamed.len(),
            errored: self.errors.len(),
        }
    }

    /// Number of profiles imported under a generated name.
    pub fn renamed_count(&self) -> usize {
        self.profiles_renamed.len()
    }

    /// Whether every record was handled without error.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Reads containers and merges their profiles into a store.
pub struct Importer<'a, S: ProfileStore + ?Sized> {
    store: &'a S,
    codec: ContainerCodec,
}

impl<'a, S: ProfileStore + ?Sized> Importer<'a, S> {
    /// Create an importer writing to `store`.
    pub fn new(store: &'a S, codec: ContainerCodec) -> Self {
        Self { store, codec }
    }

    /// Inspect a container's metadata without decoding its payload.
    pub fn validate_file<R: Read + Seek>(&self, source: R) -> Result<ContainerMetadata> {
        self.codec.validate(source)
    }

    /// List incoming profiles whose names already exist. Never mutates the store.
    pub fn check_conflicts<R: Read>(&self, source: R, password: &str) -> Result<Vec<ConflictRecord>> {
        let payload = self.codec.read(source, password)?;
        let mut suggested: HashSet<String> = HashSet::new();
        let mut conflicts = Vec::new();

        for record in payload.profiles() {
            if !self.store.exists(&record.name) {
                continue;
            }
            let alternative = alternative_name(&record.name, |n| {
                self.store.exists(n) || suggested.contains(n)
            });
            suggested.insert(alternative.clone());
            conflicts.push(ConflictRecord {
                original_name: record.name.clone(),
                conflicting_name: record.name.clone(),
                suggested_alternative: alternative,
            });
        }

        debug!(conflicts = conflicts.len(), "conflict scan complete");
        Ok(conflicts)
    }

    /// Import every record in the container, isolating per-record failures.
    pub fn import<R: Read>(
        &self,
        source: R,
        password: &str,
        options: &ImportOptions,
    ) -> Result<ImportResult> {
        let (metadata, payload) = self.codec.read_with_metadata(source, password)?;
        let mut result = ImportResult::new(metadata);
        let mut suggested = HashSet::new();

        for record in payload.into_profiles() {
            self.import_record(record, options, &mut suggested, &mut result);
        }

        let summary = result.summary();
        info!(
            total = summary.total,
            imported = summary.imported,
            skipped = summary.skipped,
            renamed = summary.renamed,
            errored = summary.errored,
            dry_run = options.dry_run,
            "import complete"
        );
        Ok(result)
    }

    fn import_record(
        &self,
        record: ProfileRecord,
        options: &ImportOptions,
        suggested: &mut HashSet<String>,
        result: &mut ImportResult,
    ) {
        let mut final_name = if options.prefix.is_empty() {
            record.name.clone()
        } else {
            format!("{}{}", options.prefix, record.name)
        };
        let mut renamed_from = None;

        if self.store.exists(&final_name) {
            if options.dry_run {
                let alternative = alternative_name(&final_name, |n| {
                    self.store.exists(n) || suggested.contains(n)
                });
                suggested.insert(alternative.clone());
                result.conflicts.push(ConflictRecord {
                    original_name: record.name.clone(),
                    conflicting_name: final_name.clone(),
                    suggested_alternative: alternative,
                });
                if options.skip_existing && !options.overwrite {
                    result.profiles_skipped.push(final_name);
                    return;
                }
            } else if options.overwrite {
                debug!(profile = %final_name, "overwriting existing profile");
            } else if options.skip_existing {
                debug!(profile = %final_name, "skipping existing profile");
                result.profiles_skipped.push(final_name);
                return;
            } else {
                let alternative = alternative_name(&final_name, |n| self.store.exists(n));
                debug!(from = %final_name, to = %alternative, "renaming conflicting profile");
                renamed_from = Some(std::mem::replace(&mut final_name, alternative));
            }
        }

        if options.dry_run {
            result
                .profiles_imported
                .push(format!("{} (dry run)", final_name));
            return;
        }

        match self.apply(&final_name, &record.content) {
            Ok(()) => {
                if let Some(from) = renamed_from {
                    result.profiles_renamed.push(RenamedProfile {
                        from,
                        to: final_name.clone(),
                    });
                }
                result.profiles_imported.push(final_name);
            }
            Err(error) => {
                warn!(profile = %final_name, error = %error, "profile import failed");
                result.errors.push(ImportFailure {
                    name: final_name,
                    error,
                });
            }
        }
    }

    /// Write one profile, rolling back a fresh create if populating it fails.
    fn apply(&self, name: &str, content: &Value) -> Result<()> {
        validate_content(name, content)?;

        if self.store.exists(name) {
            return self.store.update(name, content);
        }

        self.store.create(name)?;
        if let Err(e) = self.store.update(name, content) {
            if let Err(rollback) = self.store.delete(name) {
                warn!(profile = %name, error = %rollback, "rollback of empty profile failed");
            }
            return Err(e);
        }
        Ok(())
    }
}

/// Profile content may be any JSON document except `null`.
fn validate_content(name: &str, content: &Value) -> Result<()> {
    if content.is_null() {
        return Err(Error::ProfileContent {
            name: name.to_string(),
            reason: "content is null".to_string(),
        });
    }
    Ok(())
}
