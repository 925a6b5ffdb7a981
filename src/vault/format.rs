//! Binary vault file format and crash-safe persistence.
//!
//! A vault file has this layout:
//!
//! ```text
//! [PLVT: 4 bytes][format: 1 byte][header_len: 4 bytes LE][header JSON][ciphertext][tag: 16 bytes]
//! ```
//!
//! - **Magic** (`PLVT`): identifies the file as a PassLocal vault.
//! - **Format**: binary format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the ciphertext begins.
//! - **Header JSON**: serialized `VaultHeader` (KDF params, salt, nonce).
//! - **Ciphertext**: the AES-256-GCM encrypted vault document.
//! - **Tag**: the 16-byte GCM authentication tag.
//!
//! Nothing outside the ciphertext identifies folders or secrets.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crypto::kdf::{Argon2Params, SALT_LEN};
use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::errors::{PassLocalError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PLVT";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

/// Upper bound on the header JSON; real headers are a few hundred bytes.
const MAX_HEADER_LEN: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// VaultHeader
// ---------------------------------------------------------------------------

/// Key derivation algorithms a header can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfAlgorithm {
    /// Argon2id, version 0x13.
    Argon2id,
}

impl KdfAlgorithm {
    fn id(self) -> u8 {
        match self {
            KdfAlgorithm::Argon2id => 1,
        }
    }
}

/// KDF cost parameters stored next to the salt, so a vault is always
/// re-opened with the exact settings it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<Argon2Params> for KdfParams {
    fn from(p: Argon2Params) -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            memory_kib: p.memory_kib,
            iterations: p.iterations,
            parallelism: p.parallelism,
        }
    }
}

impl KdfParams {
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.memory_kib,
            iterations: self.iterations,
            parallelism: self.parallelism,
        }
    }
}

/// Metadata stored at the beginning of a vault file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultHeader {
    pub kdf: KdfParams,

    /// The Argon2id salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// The AES-GCM nonce of the ciphertext that follows (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    /// When this vault was first created.
    pub created_at: DateTime<Utc>,
}

impl VaultHeader {
    /// Bytes authenticated by the AEAD alongside the ciphertext.
    ///
    /// Covers the magic, format version, KDF params and salt.  The nonce
    /// is left out: it is an input to GCM and already authenticated by it.
    pub fn associated_data(&self) -> Vec<u8> {
        let mut aad = Vec::with_capacity(PREFIX_LEN + 13 + self.salt.len());
        aad.extend_from_slice(MAGIC);
        aad.push(FORMAT_VERSION);
        aad.push(self.kdf.algorithm.id());
        aad.extend_from_slice(&self.kdf.memory_kib.to_le_bytes());
        aad.extend_from_slice(&self.kdf.iterations.to_le_bytes());
        aad.extend_from_slice(&self.kdf.parallelism.to_le_bytes());
        aad.extend_from_slice(&self.salt);
        aad
    }

    /// Structural checks that make a header usable for key derivation.
    fn validate(&self) -> Result<()> {
        if self.salt.len() != SALT_LEN {
            return Err(PassLocalError::Corrupt(format!(
                "salt must be {SALT_LEN} bytes (got {})",
                self.salt.len()
            )));
        }
        if self.nonce.len() != NONCE_LEN {
            return Err(PassLocalError::Corrupt(format!(
                "nonce must be {NONCE_LEN} bytes (got {})",
                self.nonce.len()
            )));
        }
        self.kdf
            .argon2_params()
            .validate()
            .map_err(|e| PassLocalError::Corrupt(format!("KDF parameters out of range: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Header and encrypted body read from disk.
#[derive(Debug, Clone)]
pub struct RawVault {
    pub header: VaultHeader,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Whether something occupies the vault path.
///
/// Only `NotFound` counts as absent.  Anything else (a directory at the
/// path, a permission error) is reported as present so that setup never
/// writes over it and unlock surfaces the real error.
pub fn vault_exists(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(_) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot stat vault path");
            true
        }
    }
}

/// Read only the header of the vault at `path`.
pub fn read_header(path: &Path) -> Result<VaultHeader> {
    read_vault(path).map(|raw| raw.header)
}

/// Read and parse a vault file.
///
/// A missing file is `VaultNotFound` (the setup flow); a present file
/// that does not parse is `Corrupt` and is never treated as missing.
pub fn read_vault(path: &Path) -> Result<RawVault> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PassLocalError::VaultNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    debug!(path = %path.display(), bytes = data.len(), "read vault file");
    parse_vault(&data)
}

/// Parse the bytes of a vault file.
pub fn parse_vault(data: &[u8]) -> Result<RawVault> {
    if data.len() < PREFIX_LEN + TAG_LEN {
        return Err(PassLocalError::Corrupt(
            "file too small to be a valid vault".into(),
        ));
    }

    // --- Parse the fixed-size prefix ---

    if &data[0..4] != MAGIC {
        return Err(PassLocalError::Corrupt("missing PLVT magic bytes".into()));
    }

    let version = data[4];
    if version != FORMAT_VERSION {
        return Err(PassLocalError::Corrupt(format!(
            "unsupported file format {version}, expected {FORMAT_VERSION}"
        )));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&data[5..PREFIX_LEN]);
    let header_len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|_| PassLocalError::Corrupt("header length exceeds address space".into()))?;

    if header_len == 0 || header_len > MAX_HEADER_LEN {
        return Err(PassLocalError::Corrupt(format!(
            "implausible header length {header_len}"
        )));
    }

    let header_end = PREFIX_LEN + header_len;
    if header_end + TAG_LEN > data.len() {
        return Err(PassLocalError::Corrupt(
            "header length exceeds file size".into(),
        ));
    }

    // --- Header, ciphertext and tag ---

    let header: VaultHeader = serde_json::from_slice(&data[PREFIX_LEN..header_end])
        .map_err(|e| PassLocalError::Corrupt(format!("header JSON: {e}")))?;
    header.validate()?;

    let tag_start = data.len() - TAG_LEN;
    Ok(RawVault {
        header,
        ciphertext: data[header_end..tag_start].to_vec(),
        tag: data[tag_start..].to_vec(),
    })
}

/// Assemble the on-disk bytes for a header and encrypted body.
pub fn serialize_vault(header: &VaultHeader, ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
    if tag.len() != TAG_LEN {
        return Err(PassLocalError::SerializationError(format!(
            "tag must be {TAG_LEN} bytes (got {})",
            tag.len()
        )));
    }

    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| PassLocalError::SerializationError(format!("header: {e}")))?;
    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        PassLocalError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;

    let total = PREFIX_LEN + header_bytes.len() + ciphertext.len() + TAG_LEN;
    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(FORMAT_VERSION); // 1 byte
    buf.extend_from_slice(&header_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&header_bytes); // header JSON
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(tag); // 16 bytes
    Ok(buf)
}

/// Write a vault file to disk **atomically**.
pub fn write_vault(path: &Path, header: &VaultHeader, ciphertext: &[u8], tag: &[u8]) -> Result<()> {
    let buf = serialize_vault(header, ciphertext, tag)?;
    write_atomic(path, &buf)
}

/// Path of the temporary file used while writing `path`.
///
/// It lives in the same directory so the final rename never crosses
/// a filesystem boundary.
pub fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// Replace `path` with `bytes` so that readers see either the old file
/// or the new one, never a mix.
///
/// 1. Write to a temp file in the same directory and fsync it.
/// 2. Rename the temp file over the target path.
/// 3. fsync the directory so the rename itself is durable (Unix).
///
/// On failure the temp file is removed and the target is untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&parent)?;

    let tmp_path = temp_path(path);
    let result = write_and_rename(&tmp_path, path, bytes);
    if let Err(ref e) = result {
        warn!(path = %path.display(), error = %e, "vault write failed, previous file kept");
        let _ = fs::remove_file(&tmp_path);
        return result;
    }

    sync_dir(&parent);
    debug!(path = %path.display(), bytes = bytes.len(), "vault file written");
    Ok(())
}

fn write_and_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(tmp_path)?;

    // Owner-only before any secret bytes land in it.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp_path, path)?;
    Ok(())
}

/// Create the vault directory (owner-only on Unix) if it is missing.
fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    // Best effort: the data is already renamed into place.
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn header() -> VaultHeader {
        VaultHeader {
            kdf: KdfParams::from(Argon2Params::default()),
            salt: vec![1u8; SALT_LEN],
            nonce: vec![2u8; NONCE_LEN],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_vault(&dir.path().join("vault.enc")).unwrap_err();
        assert!(matches!(err, PassLocalError::VaultNotFound(_)));
    }

    #[test]
    fn directory_at_vault_path_is_not_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.enc");
        assert!(!vault_exists(&path));

        fs::create_dir(&path).unwrap();
        assert!(vault_exists(&path));
        assert!(matches!(read_vault(&path), Err(PassLocalError::Io(_))));
    }

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.enc");
        let h = header();
        write_vault(&path, &h, b"ciphertext", &[9u8; TAG_LEN]).unwrap();

        let raw = read_vault(&path).unwrap();
        assert_eq!(raw.header, h);
        assert_eq!(raw.ciphertext, b"ciphertext");
        assert_eq!(raw.tag, vec![9u8; TAG_LEN]);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vault.enc");
        write_vault(&path, &header(), b"", &[0u8; TAG_LEN]).unwrap();
        assert!(vault_exists(&path));
    }

    #[test]
    fn bad_magic_is_corrupt() {
        let mut bytes = serialize_vault(&header(), b"ct", &[0u8; TAG_LEN]).unwrap();
        bytes[0] = b'X';
        assert!(matches!(parse_vault(&bytes), Err(PassLocalError::Corrupt(_))));
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let bytes = serialize_vault(&header(), b"ct", &[0u8; TAG_LEN]).unwrap();
        assert!(matches!(
            parse_vault(&bytes[..20]),
            Err(PassLocalError::Corrupt(_))
        ));
        assert!(matches!(parse_vault(b""), Err(PassLocalError::Corrupt(_))));
    }

    #[test]
    fn wrong_salt_length_is_corrupt() {
        let mut h = header();
        h.salt = vec![0u8; 4];
        let bytes = serialize_vault(&h, b"ct", &[0u8; TAG_LEN]).unwrap();
        assert!(matches!(parse_vault(&bytes), Err(PassLocalError::Corrupt(_))));
    }

    #[test]
    fn header_json_carries_no_plaintext_markers() {
        let bytes = serialize_vault(&header(), b"ct", &[0u8; TAG_LEN]).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("argon2id"));
        assert!(!text.contains("folders"));
        assert!(!text.contains("secrets"));
    }

    #[test]
    fn associated_data_tracks_kdf_params() {
        let a = header();
        let mut b = a.clone();
        b.kdf.iterations += 1;
        assert_ne!(a.associated_data(), b.associated_data());

        // Nonce changes alone do not change the associated data.
        let mut c = a.clone();
        c.nonce = vec![7u8; NONCE_LEN];
        assert_eq!(a.associated_data(), c.associated_data());
    }
}
