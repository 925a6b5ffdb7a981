//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce; callers
//! never supply one, so a nonce is never reused under the same key.  The
//! 16-byte authentication tag is kept detached from the ciphertext so the
//! file format can store it as its own trailer.
//!
//! Associated data (the vault header's KDF section) is authenticated but
//! not encrypted, binding the ciphertext to the salt and cost parameters
//! it was written with.

use aes_gcm::aead::{AeadInPlace, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce, Tag};
use zeroize::Zeroizing;

use super::keys::MasterKey;
use crate::errors::{PassLocalError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Output of a single `encrypt` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` under `key`, authenticating `aad` alongside it.
pub fn encrypt(key: &MasterKey, plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| PassLocalError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    // Encrypt in place on a copy so the plaintext buffer stays the caller's.
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(&nonce, aad, &mut buffer)
        .map_err(|e| PassLocalError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&nonce);
    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(Sealed {
        nonce: nonce_bytes,
        ciphertext: buffer,
        tag: tag_bytes,
    })
}

/// Decrypt data produced by `encrypt`.
///
/// Any failure (wrong key, modified nonce/ciphertext/tag/aad) returns
/// `AuthenticationFailed`; no partial plaintext is ever returned.
pub fn decrypt(
    key: &MasterKey,
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return Err(PassLocalError::AuthenticationFailed);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| PassLocalError::AuthenticationFailed)?;

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            aad,
            buffer.as_mut_slice(),
            Tag::from_slice(tag),
        )
        .map_err(|_| PassLocalError::AuthenticationFailed)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tampered_aad_fails() {
        let key = MasterKey::new([3u8; 32]);
        let sealed = encrypt(&key, b"payload", b"header-a").unwrap();
        let err = decrypt(&key, &sealed.nonce, &sealed.ciphertext, &sealed.tag, b"header-b")
            .unwrap_err();
        assert!(matches!(err, PassLocalError::AuthenticationFailed));
    }

    #[test]
    fn short_tag_is_authentication_failure() {
        let key = MasterKey::new([3u8; 32]);
        let sealed = encrypt(&key, b"payload", b"").unwrap();
        let err = decrypt(&key, &sealed.nonce, &sealed.ciphertext, &sealed.tag[..8], b"")
            .unwrap_err();
        assert!(matches!(err, PassLocalError::AuthenticationFailed));
    }

    #[test]
    fn ciphertext_excludes_tag() {
        let key = MasterKey::new([9u8; 32]);
        let sealed = encrypt(&key, b"twelve bytes", b"").unwrap();
        assert_eq!(sealed.ciphertext.len(), 12);
    }
}
