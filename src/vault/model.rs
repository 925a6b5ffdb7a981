//! Folder, Secret and Vault types — the plaintext data model.
//!
//! These types only exist in memory while a session is unlocked; on disk
//! they are always inside the encrypted payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Current schema version of the plaintext vault document.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// The fixed set of folder icons.
///
/// Serialized as lowercase tags.  Any tag this build does not know
/// decodes to `Folder`, so vaults written by newer builds still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FolderIcon {
    #[default]
    Folder,
    Person,
    Briefcase,
    Star,
    Heart,
    Key,
}

impl FolderIcon {
    pub const ALL: [FolderIcon; 6] = [
        FolderIcon::Folder,
        FolderIcon::Person,
        FolderIcon::Briefcase,
        FolderIcon::Star,
        FolderIcon::Heart,
        FolderIcon::Key,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FolderIcon::Folder => "folder",
            FolderIcon::Person => "person",
            FolderIcon::Briefcase => "briefcase",
            FolderIcon::Star => "star",
            FolderIcon::Heart => "heart",
            FolderIcon::Key => "key",
        }
    }

    /// Parse a tag, falling back to `Folder` for anything unknown.
    pub fn from_tag(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|icon| icon.as_str().eq_ignore_ascii_case(tag.trim()))
            .unwrap_or_default()
    }
}

impl From<String> for FolderIcon {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<FolderIcon> for String {
    fn from(icon: FolderIcon) -> Self {
        icon.as_str().to_string()
    }
}

impl fmt::Display for FolderIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A folder groups secrets for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: FolderIcon,
    /// Display order; not required to be unique.
    pub order: i32,
}

/// A single named credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub id: String,
    pub name: String,

    /// Optional short label such as an environment variable name.
    #[serde(default)]
    pub key: String,

    /// The protected payload.  Wiped when the secret is dropped and
    /// redacted from `Debug` output.
    pub value: String,

    pub folder_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &self.key)
            .field("value", &"[REDACTED]")
            .field("folder_id", &self.folder_id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// The aggregate root: every folder and secret of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub version: u32,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

impl Vault {
    /// An empty vault at the current schema version.  Callers normally
    /// want `VaultStore::with_default_folder` instead.
    pub fn empty() -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            folders: Vec::new(),
            secrets: Vec::new(),
        }
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn secret(&self, id: &str) -> Option<&Secret> {
        self.secrets.iter().find(|s| s.id == id)
    }

    /// Secrets in a folder, in collection order.
    pub fn secrets_in<'a>(&'a self, folder_id: &'a str) -> impl Iterator<Item = &'a Secret> + 'a {
        self.secrets.iter().filter(move |s| s.folder_id == folder_id)
    }

    /// Folders sorted by `order`, stable for equal orders.
    pub fn sorted_folders(&self) -> Vec<&Folder> {
        let mut folders: Vec<&Folder> = self.folders.iter().collect();
        folders.sort_by_key(|f| f.order);
        folders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_tags_round_trip() {
        for icon in FolderIcon::ALL {
            assert_eq!(FolderIcon::from_tag(icon.as_str()), icon);
        }
    }

    #[test]
    fn unknown_icon_falls_back_to_folder() {
        assert_eq!(FolderIcon::from_tag("rocket"), FolderIcon::Folder);
        assert_eq!(FolderIcon::from_tag(""), FolderIcon::Folder);

        let folder: Folder =
            serde_json::from_str(r#"{"id":"a","name":"A","icon":"rocket","order":0}"#).unwrap();
        assert_eq!(folder.icon, FolderIcon::Folder);
    }

    #[test]
    fn icon_parsing_ignores_case() {
        assert_eq!(FolderIcon::from_tag("Briefcase"), FolderIcon::Briefcase);
    }

    #[test]
    fn secret_debug_redacts_value() {
        let now = Utc::now();
        let secret = Secret {
            id: "s1".into(),
            name: "API Key".into(),
            key: "API_KEY".into(),
            value: "s3cr3t".into(),
            folder_id: "f1".into(),
            created_at: now,
            updated_at: now,
        };
        let shown = format!("{secret:?}");
        assert!(!shown.contains("s3cr3t"));
        assert!(shown.contains("REDACTED"));
    }
}
