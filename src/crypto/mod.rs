//! Cryptographic operations for ccswitch containers.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - PBKDF2-HMAC-SHA256 password-based key derivation

mod cipher;
mod kdf;

pub use cipher::{generate_nonce, EncryptionEnvelope, PasswordCipher};
pub use kdf::{generate_salt, DerivedKey, KeyDerivation};
