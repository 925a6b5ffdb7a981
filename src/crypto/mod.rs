//! Cryptographic primitives for PassLocal.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption with detached tags (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - The zeroizing `MasterKey` wrapper (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_master_key, ...};
pub use encryption::{decrypt, encrypt, Sealed, NONCE_LEN, TAG_LEN};
pub use kdf::{
    derive_master_key, derive_master_key_with_params, generate_salt, Argon2Params, SALT_LEN,
};
pub use keys::{MasterKey, KEY_LEN};
