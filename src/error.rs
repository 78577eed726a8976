//! Error types for ccswitch.

use thiserror::Error;

/// Result type alias for ccswitch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a container failed its integrity checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFailure {
    /// CRC-32 over metadata and payload blocks does not match the header.
    #[error("checksum mismatch: header says {expected:#010x}, content hashes to {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The container ends before the lengths in its header say it should.
    #[error("container truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },

    /// A header field disagrees with the checksummed metadata.
    #[error("header field '{0}' does not match container metadata")]
    HeaderMismatch(&'static str),
}

/// Errors that can occur in ccswitch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not a ccswitch container.
    #[error("Invalid container format: {reason}")]
    Format { reason: String },

    /// Structurally valid container written by a newer format version.
    #[error("Unsupported container version {found} (this build reads version {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Container failed integrity verification.
    #[error("Integrity check failed: {0}")]
    Integrity(IntegrityFailure),

    /// Container is encrypted and no password was supplied.
    #[error("Container is encrypted: a password is required")]
    PasswordRequired,

    /// AEAD tag verification failed.
    #[error("Decryption failed: wrong password or corrupted data")]
    Authentication,

    /// Malformed compression stream.
    #[error("Decompression failed: {0}")]
    Decode(String),

    /// Imported profile content failed validation.
    #[error("Invalid content for profile '{name}': {reason}")]
    ProfileContent { name: String, reason: String },

    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Key derivation error.
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Export of all profiles requested on an empty store.
    #[error("No profiles to export")]
    NoProfiles,

    /// Export of the active profile requested with none active.
    #[error("No profile is currently active")]
    NoCurrentProfile,

    /// Profile not found in the store.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile already exists in the store.
    #[error("Profile already exists: {0}")]
    ProfileExists(String),

    /// Profile name cannot be used as a store key.
    #[error("Invalid profile name: {0:?}")]
    InvalidProfileName(String),

    /// Two records in one payload share a name.
    #[error("Duplicate profile in payload: {0}")]
    DuplicateProfile(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`Error::Format`] with a reason.
    pub fn format(reason: impl Into<String>) -> Self {
        Error::Format {
            reason: reason.into(),
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Format { .. } => 2,
            Error::UnsupportedVersion { .. } => 3,
            Error::Integrity(_) => 4,
            Error::PasswordRequired => 5,
            Error::Authentication => 6,
            _ => 1,
        }
    }
}

impl From<IntegrityFailure> for Error {
    fn from(failure: IntegrityFailure) -> Self {
        Error::Integrity(failure)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_message_does_not_blame_password_alone() {
        let msg = Error::Authentication.to_string();
        assert!(msg.contains("wrong password or corrupted data"));
    }

    #[test]
    fn test_exit_codes_are_distinct_for_container_failures() {
        let codes = [
            Error::format("x").exit_code(),
            Error::UnsupportedVersion {
                found: 9,
                supported: 1,
            }
            .exit_code(),
            Error::Integrity(IntegrityFailure::HeaderMismatch("flags")).exit_code(),
            Error::PasswordRequired.exit_code(),
            Error::Authentication.exit_code(),
        ];

        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(Error::NoProfiles.exit_code(), 1);
    }
}
