//! PBKDF2-HMAC-SHA256 key derivation for password-based encryption.

use crate::config::pbkdf2_params;
use crate::error::{Error, Result};
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// A derived 256-bit key, wiped from memory on drop.
pub type DerivedKey = Zeroizing<[u8; pbkdf2_params::KEY_LENGTH]>;

/// Key derivation using PBKDF2 with a per-container salt.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    salt: [u8; pbkdf2_params::SALT_LENGTH],
    iterations: u32,
}

impl KeyDerivation {
    /// Create a KDF with a fresh random salt.
    pub fn new() -> Self {
        Self::from_salt(generate_salt())
    }

    /// Create a KDF from an existing salt (for decryption).
    pub fn from_salt(salt: [u8; pbkdf2_params::SALT_LENGTH]) -> Self {
        Self {
            salt,
            iterations: pbkdf2_params::ITERATIONS,
        }
    }

    /// Use an iteration count recorded by the container writer.
    pub fn with_iterations(mut self, iterations: u32) -> Result<Self> {
        if !(pbkdf2_params::MIN_ITERATIONS..=pbkdf2_params::MAX_ITERATIONS).contains(&iterations) {
            return Err(Error::KeyDerivation(format!(
                "iteration count {} outside accepted range {}..={}",
                iterations,
                pbkdf2_params::MIN_ITERATIONS,
                pbkdf2_params::MAX_ITERATIONS
            )));
        }
        self.iterations = iterations;
        Ok(self)
    }

    /// Get the salt for storage.
    pub fn salt(&self) -> &[u8; pbkdf2_params::SALT_LENGTH] {
        &self.salt
    }

    /// Iteration count this KDF will run.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derive a 256-bit key from a password.
    pub fn derive_key(&self, password: &str) -> DerivedKey {
        let mut key = Zeroizing::new([0u8; pbkdf2_params::KEY_LENGTH]);
        pbkdf2::pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            &self.salt,
            self.iterations,
            &mut key[..],
        );
        key
    }
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> [u8; pbkdf2_params::SALT_LENGTH] {
    let mut salt = [0u8; pbkdf2_params::SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
