//! Export profiles from a store into a container file.

use crate::codec::{ContainerCodec, ContainerMetadata};
use crate::error::{Error, Result};
use crate::profile::{ExportPayload, ProfileRecord, ProfileStore};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Builds containers from profiles in a store.
pub struct Exporter<'a, S: ProfileStore + ?Sized> {
    store: &'a S,
    codec: ContainerCodec,
}

impl<'a, S: ProfileStore + ?Sized> Exporter<'a, S> {
    /// Create an exporter reading from `store`.
    pub fn new(store: &'a S, codec: ContainerCodec) -> Self {
        Self { store, codec }
    }

    /// Export one named profile.
    pub fn export_profile(
        &self,
        name: &str,
        password: &str,
        output: &Path,
    ) -> Result<ContainerMetadata> {
        let payload = ExportPayload::from_records(vec![self.snapshot(name)?])?;
        self.write_container(&payload, password, output)
    }

    /// Export every profile in the store.
    pub fn export_all(&self, password: &str, output: &Path) -> Result<ContainerMetadata> {
        let payload = self.collect_all()?;
        self.write_container(&payload, password, output)
    }

    /// Export the active profile.
    pub fn export_current(&self, password: &str, output: &Path) -> Result<ContainerMetadata> {
        let name = self.store.current()?.ok_or(Error::NoCurrentProfile)?;
        self.export_profile(&name, password, output)
    }

    /// Snapshot a single profile as a record.
    pub fn snapshot(&self, name: &str) -> Result<ProfileRecord> {
        let stored = self.store.get(name)?;
        Ok(ProfileRecord {
            name: stored.info.name,
            is_current: stored.info.is_current,
            content: stored.content,
            created_at: stored.info.created_at,
            modified_at: stored.info.modified_at,
        })
    }

    /// Snapshot every profile, each read independently.
    pub fn collect_all(&self) -> Result<ExportPayload> {
        let mut payload = ExportPayload::new();
        for info in self.store.list()? {
            match self.snapshot(&info.name) {
                Ok(record) => payload.push(record)?,
                Err(Error::ProfileNotFound(name)) => {
                    warn!(profile = %name, "profile disappeared during export, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        if payload.is_empty() {
            return Err(Error::NoProfiles);
        }
        Ok(payload)
    }

    fn write_container(
        &self,
        payload: &ExportPayload,
        password: &str,
        output: &Path,
    ) -> Result<ContainerMetadata> {
        let metadata = write_owner_only(output, |writer| {
            self.codec.write(payload, writer, password)
        })?;

        info!(
            output = %output.display(),
            profiles = metadata.profile_count,
            encrypted = metadata.is_encrypted(),
            "export complete"
        );
        Ok(metadata)
    }
}

/// Write `output` through `write` with owner-only permissions, removing the file if any
/// step fails.
fn write_owner_only<T, F>(output: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<T>,
{
    let file = open_owner_only(output)?;

    let result = (|| -> Result<T> {
        let mut writer = BufWriter::new(&file);
        let value = write(&mut writer)?;
        writer.flush()?;
        drop(writer);
        file.sync_all()?;
        restrict_to_owner(output)?;
        Ok(value)
    })();

    if result.is_err() {
        drop(file);
        match fs::remove_file(output) {
            Ok(()) => debug!(output = %output.display(), "removed partial export"),
            Err(e) => {
                warn!(output = %output.display(), error = %e, "could not remove partial export")
            }
        }
    }
    result
}

/// Open `path` for writing with owner-only permissions set before any bytes land.
fn open_owner_only(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;
    // The mode above only applies to newly created files.
    restrict_to_owner(path)?;
    Ok(file)
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}
