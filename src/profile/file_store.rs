//! Directory-backed profile store.
//!
//! Each profile is `<dir>/<name>.json`; the active profile's name lives in
//! `<dir>/.current`. Every write goes to a temporary sibling, is flushed, then
//! renamed over the target so readers never see a partial file.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::profile::store::{ProfileInfo, ProfileStore, StoredProfile};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File holding the active profile's name.
const CURRENT_MARKER: &str = ".current";

/// Extension of profile files.
const PROFILE_EXTENSION: &str = "json";

/// Longest name whose `.<name>.json.tmp` sibling still fits a 255-byte file name.
const MAX_NAME_LEN: usize = 245;

/// Profile store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    settings_path: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the store described by `config`.
    pub fn open(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.profiles_dir)?;
        Ok(Self {
            dir: config.profiles_dir.clone(),
            settings_path: config.settings_path.clone(),
        })
    }

    /// Directory holding the profiles.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PROFILE_EXTENSION))
    }

    fn marker_path(&self) -> PathBuf {
        self.dir.join(CURRENT_MARKER)
    }

    /// Copy a profile onto the settings file and mark it active.
    pub fn switch_to(&self, name: &str) -> Result<()> {
        let profile = self.get(name)?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(
            &self.settings_path,
            &serde_json::to_vec_pretty(&profile.content)?,
        )?;
        write_atomic(&self.marker_path(), name.as_bytes())?;

        info!(profile = %name, settings = %self.settings_path.display(), "switched profile");
        Ok(())
    }

    fn info_for(&self, name: &str, current: Option<&str>) -> Result<ProfileInfo> {
        let meta = fs::metadata(self.profile_path(name)).map_err(|e| not_found(e, name))?;
        let modified: DateTime<Utc> = meta.modified()?.into();
        let created: DateTime<Utc> = meta.created().map(Into::into).unwrap_or(modified);

        Ok(ProfileInfo {
            name: name.to_string(),
            is_current: current == Some(name),
            created_at: created,
            modified_at: modified,
        })
    }
}

impl ProfileStore for FileStore {
    fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.profile_path(name).is_file()
    }

    fn get(&self, name: &str) -> Result<StoredProfile> {
        validate_name(name)?;
        let raw = fs::read(self.profile_path(name)).map_err(|e| not_found(e, name))?;
        let content: Value = serde_json::from_slice(&raw)?;
        let current = self.current()?;

        Ok(StoredProfile {
            content,
            info: self.info_for(name, current.as_deref())?,
        })
    }

    fn create(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.exists(name) {
            return Err(Error::ProfileExists(name.to_string()));
        }
        write_atomic(&self.profile_path(name), b"{}")?;
        debug!(profile = %name, "profile created");
        Ok(())
    }

    fn update(&self, name: &str, content: &Value) -> Result<()> {
        validate_name(name)?;
        if !self.exists(name) {
            return Err(Error::ProfileNotFound(name.to_string()));
        }
        write_atomic(&self.profile_path(name), &serde_json::to_vec_pretty(content)?)?;
        debug!(profile = %name, "profile updated");
        Ok(())
    }

    fn list(&self) -> Result<Vec<ProfileInfo>> {
        let current = self.current()?;
        let mut profiles = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(PROFILE_EXTENSION)
            {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_name(name).is_err() {
                continue;
            }
            match self.info_for(name, current.as_deref()) {
                Ok(info) => profiles.push(info),
                // Deleted between read_dir and stat.
                Err(Error::ProfileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let was_current = self.current()?.as_deref() == Some(name);

        fs::remove_file(self.profile_path(name)).map_err(|e| not_found(e, name))?;
        if was_current {
            match fs::remove_file(self.marker_path()) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        debug!(profile = %name, "profile deleted");
        Ok(())
    }

    fn current(&self) -> Result<Option<String>> {
        let raw = match fs::read_to_string(self.marker_path()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let name = raw.trim();
        if validate_name(name).is_err() || !self.profile_path(name).is_file() {
            return Ok(None);
        }
        Ok(Some(name.to_string()))
    }
}

/// Check that a profile name is usable as a file stem.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.len() > MAX_NAME_LEN
        || name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());
    if bad {
        return Err(Error::InvalidProfileName(name.to_string()));
    }
    Ok(())
}

fn not_found(e: std::io::Error, name: &str) -> Error {
    if e.kind() == ErrorKind::NotFound {
        Error::ProfileNotFound(name.to_string())
    } else {
        Error::Io(e)
    }
}

/// Write `data` to a temporary sibling of `path`, flush it, then rename it into place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Config(format!("Not a file path: {}", path.display())))?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let result = (|| -> std::io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> FileStore {
        let config = AppConfig::new(dir.path().join("profiles"), dir.path().join("settings.json"));
        FileStore::open(&config).unwrap()
    }

    #[test]
    fn test_create_update_get() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.create("work").unwrap();
        assert!(store.exists("work"));
        assert_eq!(store.get("work").unwrap().content, json!({}));

        store.update("work", &json!({"env": {"TOKEN": "x"}})).unwrap();
        assert_eq!(store.get("work").unwrap().content, json!({"env": {"TOKEN": "x"}}));
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.create("work").unwrap();
        assert!(matches!(store.create("work"), Err(Error::ProfileExists(_))));
    }

    #[test]
    fn test_update_missing_fails() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        assert!(matches!(
            store.update("ghost", &json!({})),
            Err(Error::ProfileNotFound(_))
        ));
        assert!(matches!(store.get("ghost"), Err(Error::ProfileNotFound(_))));
    }

    #[test]
    fn test_list_sorted_and_skips_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.create("zeta").unwrap();
        store.create("alpha").unwrap();
        fs::write(store.dir().join("notes.txt"), "hi").unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn test_switch_sets_current_and_settings() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.create("work").unwrap();
        store.update("work", &json!({"model": "big"})).unwrap();
        assert_eq!(store.current().unwrap(), None);

        store.switch_to("work").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("work"));
        assert!(store.get("work").unwrap().info.is_current);

        let settings: Value =
            serde_json::from_slice(&fs::read(dir.path().join("settings.json")).unwrap()).unwrap();
        assert_eq!(settings, json!({"model": "big"}));
    }

    #[test]
    fn test_delete_clears_current() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.create("work").unwrap();
        store.switch_to("work").unwrap();
        store.delete("work").unwrap();

        assert!(!store.exists("work"));
        assert_eq!(store.current().unwrap(), None);
        assert!(matches!(store.delete("work"), Err(Error::ProfileNotFound(_))));
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", ".hidden", "a/b", "..", "a\\b"] {
            assert!(validate_name(name).is_err(), "{:?} should be rejected", name);
        }
        assert!(validate_name("team-work-1").is_ok());
    }

    #[test]
    fn test_long_names_rejected_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let longest = "w".repeat(MAX_NAME_LEN);
        store.create(&longest).unwrap();
        store.update(&longest, &json!({"a": 1})).unwrap();
        assert!(store.exists(&longest));

        let too_long = "w".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            store.create(&too_long),
            Err(Error::InvalidProfileName(_))
        ));

        let renamed = crate::transfer::alternative_name(&longest, |n| store.exists(n));
        assert!(matches!(
            store.create(&renamed),
            Err(Error::InvalidProfileName(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_files_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.create("work").unwrap();

        let mode = fs::metadata(store.dir().join("work.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
