//! Plaintext encoding of the vault document.
//!
//! The payload that gets encrypted is a UTF-8 JSON document:
//!
//! ```text
//! {"version": 1, "folders": [...], "secrets": [...]}
//! ```
//!
//! `decode` reads the `version` tag first and refuses versions newer
//! than this build understands instead of guessing at their layout.

use serde::Deserialize;
use serde_json::error::Category;
use tracing::debug;
use zeroize::Zeroizing;

use super::model::{Vault, CURRENT_SCHEMA_VERSION};
use super::store::VaultStore;
use crate::errors::{PassLocalError, Result};

/// Just enough of the document to learn its version.
#[derive(Deserialize)]
struct VersionProbe {
    version: Option<u32>,
}

/// Serialize a vault to its plaintext payload.
///
/// The buffer is wiped on drop since it holds every secret value.
pub fn encode(vault: &Vault) -> Result<Zeroizing<Vec<u8>>> {
    let bytes = serde_json::to_vec(vault)
        .map_err(|e| PassLocalError::SerializationError(format!("vault: {e}")))?;
    debug!(
        folders = vault.folders.len(),
        secrets = vault.secrets.len(),
        bytes = bytes.len(),
        "encoded vault"
    );
    Ok(Zeroizing::new(bytes))
}

/// Parse a plaintext payload back into a `Vault`.
///
/// The result is migrated to the current schema version and checked
/// against the model invariants; a payload that violates them is
/// reported as corrupt.
pub fn decode(bytes: &[u8]) -> Result<Vault> {
    // serde_json errors can quote input; keep them out of the message.
    let probe: VersionProbe = serde_json::from_slice(bytes).map_err(|e| {
        PassLocalError::Corrupt(format!("payload is not a vault document ({})", category(&e)))
    })?;

    let version = match probe.version {
        None | Some(0) => {
            return Err(PassLocalError::Corrupt("payload has no schema version".into()));
        }
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            return Err(PassLocalError::UnsupportedVersion(v));
        }
        Some(v) => v,
    };

    let vault: Vault = serde_json::from_slice(bytes).map_err(|e| {
        PassLocalError::Corrupt(format!(
            "vault document v{version} is malformed at line {} column {}",
            e.line(),
            e.column()
        ))
    })?;

    let vault = migrate(vault)?;
    VaultStore::check(&vault).map_err(|e| PassLocalError::Corrupt(e.to_string()))?;
    Ok(vault)
}

/// Bring an older document up to `CURRENT_SCHEMA_VERSION`.
///
/// Version 1 is the only layout so far; the version number itself is
/// only raised here, never lowered.
fn migrate(vault: Vault) -> Result<Vault> {
    match vault.version {
        CURRENT_SCHEMA_VERSION => Ok(vault),
        other => Err(PassLocalError::UnsupportedVersion(other)),
    }
}

fn category(e: &serde_json::Error) -> &'static str {
    match e.classify() {
        Category::Io => "io",
        Category::Syntax => "syntax error",
        Category::Data => "unexpected data",
        Category::Eof => "truncated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::model::FolderIcon;

    #[test]
    fn rejects_future_versions() {
        let doc = br#"{"version": 99, "folders": [], "secrets": []}"#;
        assert!(matches!(
            decode(doc),
            Err(PassLocalError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn rejects_missing_version() {
        let doc = br#"{"folders": [], "secrets": []}"#;
        assert!(matches!(decode(doc), Err(PassLocalError::Corrupt(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode(b"\x00\x01garbage"), Err(PassLocalError::Corrupt(_))));
    }

    #[test]
    fn rejects_dangling_folder_reference() {
        let doc = br#"{
            "version": 1,
            "folders": [{"id": "f1", "name": "Personal", "icon": "person", "order": 0}],
            "secrets": [{
                "id": "s1", "name": "n", "key": "", "value": "v", "folder_id": "nope",
                "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
            }]
        }"#;
        assert!(matches!(decode(doc), Err(PassLocalError::Corrupt(_))));
    }

    #[test]
    fn corrupt_message_does_not_echo_payload() {
        let doc = br#"{"version": 1, "folders": [], "secrets": [{"value": "hunter2"}]}"#;
        let err = decode(doc).unwrap_err();
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn unknown_icon_in_payload_decodes_to_default() {
        let doc = br#"{"version":1,"folders":[{"id":"f","name":"F","icon":"comet","order":3}],"secrets":[]}"#;
        let vault = decode(doc).unwrap();
        assert_eq!(vault.folders[0].icon, FolderIcon::Folder);
        assert_eq!(vault.folders[0].order, 3);
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let store = VaultStore::with_default_folder("Personal", FolderIcon::Person);
        let bytes = encode(store.vault()).unwrap();
        assert_eq!(&decode(&bytes).unwrap(), store.vault());
    }
}
