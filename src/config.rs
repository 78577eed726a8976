//! Configuration constants and types for ccswitch.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Container magic number: "CCXF" in bytes.
pub const CONTAINER_MAGIC: [u8; 4] = [0x43, 0x43, 0x58, 0x46];

/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;

/// File extension for exported containers.
pub const CONTAINER_EXTENSION: &str = "ccx";

/// Name recorded in metadata for the AEAD.
pub const ENCRYPTION_ALGORITHM: &str = "AES-256-GCM";

/// Name recorded in metadata for the compression stream.
pub const COMPRESSION_ALGORITHM: &str = "gzip";

/// Default gzip level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Upper bound on decompressed payload size (64 MiB).
pub const MAX_DECOMPRESSED_SIZE: u64 = 64 * 1024 * 1024;

/// Environment variable overriding the profiles directory.
pub const PROFILES_DIR_ENV: &str = "CCSWITCH_PROFILES_DIR";

/// Environment variable overriding the settings file path.
pub const SETTINGS_PATH_ENV: &str = "CCSWITCH_SETTINGS";

/// PBKDF2-HMAC-SHA256 parameters for key derivation.
pub mod pbkdf2_params {
    /// Iterations used for every new container.
    pub const ITERATIONS: u32 = 100_000;

    /// Lowest iteration count accepted from container metadata.
    pub const MIN_ITERATIONS: u32 = ITERATIONS;

    /// Highest iteration count accepted from container metadata.
    pub const MAX_ITERATIONS: u32 = 10_000_000;

    /// Output length in bytes (256 bits).
    pub const KEY_LENGTH: usize = 32;

    /// Salt length in bytes.
    pub const SALT_LENGTH: usize = 16;
}

/// Nonce length for AES-GCM (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// Codec tuning shared by the exporter and importer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// gzip compression level (0-9).
    pub compression_level: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CodecConfig {
    /// Create a codec configuration with a custom compression level.
    pub fn new(compression_level: u32) -> Self {
        Self {
            compression_level: compression_level.min(9),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(Error::Config(format!(
                "Compression level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

/// Where profiles live and which settings file they are switched onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding one JSON file per profile.
    pub profiles_dir: PathBuf,

    /// The managed CLI's settings file.
    pub settings_path: PathBuf,
}

impl AppConfig {
    /// Create a configuration from explicit paths.
    pub fn new(profiles_dir: impl Into<PathBuf>, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
            settings_path: settings_path.into(),
        }
    }

    /// Resolve paths from explicit overrides, then the environment, then the home directory.
    pub fn resolve(profiles_dir: Option<PathBuf>, settings_path: Option<PathBuf>) -> Result<Self> {
        let profiles_dir = match profiles_dir.or_else(|| env_path(PROFILES_DIR_ENV)) {
            Some(dir) => dir,
            None => home()?.join(".ccswitch").join("profiles"),
        };
        let settings_path = match settings_path.or_else(|| env_path(SETTINGS_PATH_ENV)) {
            Some(path) => path,
            None => home()?.join(".cc").join("settings.json"),
        };

        let config = Self {
            profiles_dir,
            settings_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.profiles_dir.as_os_str().is_empty() {
            return Err(Error::Config("Profiles directory must not be empty".to_string()));
        }
        if self.settings_path.file_name().is_none() {
            return Err(Error::Config(format!(
                "Settings path must name a file: {}",
                self.settings_path.display()
            )));
        }
        if self.settings_path.starts_with(&self.profiles_dir) {
            return Err(Error::Config(
                "Settings file must live outside the profiles directory".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_config_clamps_level() {
        assert_eq!(CodecConfig::new(42).compression_level, 9);
        assert!(CodecConfig::default().validate().is_ok());
    }

    #[test]
    fn test_codec_config_rejects_bad_level() {
        let config = CodecConfig {
            compression_level: 12,
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_prefers_explicit_paths() {
        let config = AppConfig::resolve(
            Some(PathBuf::from("/tmp/ccs/profiles")),
            Some(PathBuf::from("/tmp/ccs/settings.json")),
        )
        .unwrap();

        assert_eq!(config.profiles_dir, PathBuf::from("/tmp/ccs/profiles"));
        assert_eq!(config.settings_path, PathBuf::from("/tmp/ccs/settings.json"));
    }

    #[test]
    fn test_settings_inside_profiles_dir_rejected() {
        let config = AppConfig::new("/tmp/p", "/tmp/p/settings.json");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
