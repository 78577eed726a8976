//! AES-256-GCM authenticated encryption under a password-derived key.

use crate::config::{pbkdf2_params, NONCE_LENGTH};
use crate::crypto::kdf::{generate_salt, KeyDerivation};
use crate::error::{Error, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use tracing::debug;

/// Authentication tag size (128 bits).
const TAG_SIZE: usize = 16;

/// Salt, nonce and ciphertext needed to decrypt a payload.
///
/// On the wire each field carries its own 4-byte little-endian length prefix:
///
/// ```text
/// saltLen(4) salt  nonceLen(4) nonce  ciphertextLen(4) ciphertext||tag
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    /// Salt for key derivation.
    pub salt: [u8; pbkdf2_params::SALT_LENGTH],
    /// AES-GCM nonce.
    pub nonce: [u8; NONCE_LENGTH],
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl EncryptionEnvelope {
    /// Serialize with explicit per-field length prefixes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.salt.len() + self.nonce.len() + self.ciphertext.len());
        for field in [&self.salt[..], &self.nonce[..], &self.ciphertext[..]] {
            out.extend_from_slice(&(field.len() as u32).to_le_bytes());
            out.extend_from_slice(field);
        }
        out
    }

    /// Parse the length-prefixed layout produced by [`EncryptionEnvelope::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut rest = data;
        let salt = take_field(&mut rest, "salt")?;
        let nonce = take_field(&mut rest, "nonce")?;
        let ciphertext = take_field(&mut rest, "ciphertext")?;

        if !rest.is_empty() {
            return Err(Error::format(format!(
                "{} trailing bytes after encryption envelope",
                rest.len()
            )));
        }

        let salt: [u8; pbkdf2_params::SALT_LENGTH] = salt.try_into().map_err(|_| {
            Error::format(format!(
                "salt must be {} bytes, found {}",
                pbkdf2_params::SALT_LENGTH,
                salt.len()
            ))
        })?;
        let nonce: [u8; NONCE_LENGTH] = nonce.try_into().map_err(|_| {
            Error::format(format!(
                "nonce must be {} bytes, found {}",
                NONCE_LENGTH,
                nonce.len()
            ))
        })?;

        Ok(Self {
            salt,
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

fn take_field<'a>(rest: &mut &'a [u8], field: &str) -> Result<&'a [u8]> {
    if rest.len() < 4 {
        return Err(Error::format(format!("missing length prefix for {}", field)));
    }
    let (prefix, tail) = rest.split_at(4);
    let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if tail.len() < len {
        return Err(Error::format(format!(
            "{} length {} exceeds remaining {} bytes",
            field,
            len,
            tail.len()
        )));
    }
    let (value, tail) = tail.split_at(len);
    *rest = tail;
    Ok(value)
}

/// Generate a random 12-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LENGTH] {
    let mut nonce = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Password-based AEAD. Holds no key material between calls.
#[derive(Debug, Clone)]
pub struct PasswordCipher {
    iterations: u32,
}

impl PasswordCipher {
    /// Cipher using the standard PBKDF2 iteration count.
    pub fn new() -> Self {
        Self {
            iterations: pbkdf2_params::ITERATIONS,
        }
    }

    /// Cipher deriving keys with a container-recorded iteration count.
    pub fn with_iterations(iterations: u32) -> Result<Self> {
        KeyDerivation::from_salt([0u8; pbkdf2_params::SALT_LENGTH]).with_iterations(iterations)?;
        Ok(Self { iterations })
    }

    /// Iteration count used for key derivation.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    fn kdf(&self, salt: [u8; pbkdf2_params::SALT_LENGTH]) -> Result<KeyDerivation> {
        KeyDerivation::from_salt(salt).with_iterations(self.iterations)
    }

    /// Build an AEAD instance keyed from `password`. The derived key is wiped on return
    /// and the instance wipes its key schedule on drop.
    fn keyed(&self, salt: [u8; pbkdf2_params::SALT_LENGTH], password: &str) -> Result<Aes256Gcm> {
        let key = self.kdf(salt)?.derive_key(password);
        Aes256Gcm::new_from_slice(&key[..]).map_err(|e| Error::Encryption(e.to_string()))
    }

    /// Encrypt under a key derived from `password` with a fresh salt and nonce.
    pub fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<EncryptionEnvelope> {
        let salt = generate_salt();
        let nonce = generate_nonce();
        let cipher = self.keyed(salt, password)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| Error::Encryption(e.to_string()));
        drop(cipher);
        let ciphertext = ciphertext?;

        debug!(
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "payload encrypted"
        );

        Ok(EncryptionEnvelope {
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Re-derive the key from the envelope's salt and authenticate+decrypt.
    pub fn decrypt(&self, envelope: &EncryptionEnvelope, password: &str) -> Result<Vec<u8>> {
        if envelope.ciphertext.len() < TAG_SIZE {
            return Err(Error::Authentication);
        }

        let cipher = self.keyed(envelope.salt, password)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
            .map_err(|_| Error::Authentication);
        drop(cipher);
        plaintext
    }
}

impl Default for PasswordCipher {
    fn default() -> Self {
        Self::new()
    }
}
