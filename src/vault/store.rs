//! In-memory vault model with invariant enforcement.
//!
//! `VaultStore` owns the decrypted `Vault` while a session is unlocked
//! and implements every folder/secret mutation.  It performs no I/O:
//! the session runs each mutation against a clone of the store, checks
//! the result with `validate`, persists it, and only then swaps it in.
//!
//! Folder deletion policy: secrets of the deleted folder move to the
//! remaining folder with the lowest `order` (ties go to the folder that
//! comes first in the collection).  Remaining folders are then
//! renumbered `0..n` keeping their relative order.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use super::model::{Folder, FolderIcon, Secret, Vault, CURRENT_SCHEMA_VERSION};
use crate::errors::{PassLocalError, Result};

/// The in-memory vault handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStore {
    vault: Vault,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Wrap an existing vault, rejecting it if it breaks an invariant.
    pub fn new(vault: Vault) -> Result<Self> {
        Self::check(&vault)?;
        Ok(Self { vault })
    }

    /// A fresh vault holding exactly one folder and no secrets.
    pub fn with_default_folder(name: &str, icon: FolderIcon) -> Self {
        let mut vault = Vault::empty();
        vault.folders.push(Folder {
            id: new_id(),
            name: name.to_string(),
            icon,
            order: 0,
        });
        Self { vault }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn into_vault(self) -> Vault {
        self.vault
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.vault.folder(id)
    }

    pub fn secret(&self, id: &str) -> Option<&Secret> {
        self.vault.secret(id)
    }

    pub fn folder_count(&self) -> usize {
        self.vault.folders.len()
    }

    pub fn secret_count(&self) -> usize {
        self.vault.secrets.len()
    }

    // ------------------------------------------------------------------
    // Folder operations
    // ------------------------------------------------------------------

    /// Add a folder after all existing ones.
    pub fn add_folder(&mut self, name: &str, icon: FolderIcon) -> Result<Folder> {
        validate_name("folder", name)?;

        let order = self
            .vault
            .folders
            .iter()
            .map(|f| f.order)
            .max()
            .map_or(0, |max| max.saturating_add(1));

        let folder = Folder {
            id: new_id(),
            name: name.to_string(),
            icon,
            order,
        };
        self.vault.folders.push(folder.clone());
        Ok(folder)
    }

    /// Rename and/or re-icon a folder.
    pub fn update_folder(&mut self, id: &str, name: &str, icon: FolderIcon) -> Result<Folder> {
        validate_name("folder", name)?;

        let folder = self
            .vault
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| PassLocalError::FolderNotFound(id.to_string()))?;

        folder.name = name.to_string();
        folder.icon = icon;
        Ok(folder.clone())
    }

    /// Delete a folder, moving its secrets to the lowest-order remaining
    /// folder.  Returns how many secrets were moved.
    pub fn delete_folder(&mut self, id: &str) -> Result<usize> {
        if self.folder(id).is_none() {
            return Err(PassLocalError::FolderNotFound(id.to_string()));
        }
        if self.vault.folders.len() <= 1 {
            return Err(PassLocalError::LastFolder);
        }

        let target = self
            .vault
            .sorted_folders()
            .into_iter()
            .find(|f| f.id != id)
            .map(|f| f.id.clone())
            .ok_or(PassLocalError::LastFolder)?;

        let mut moved = 0;
        for secret in self.vault.secrets.iter_mut().filter(|s| s.folder_id == id) {
            secret.folder_id = target.clone();
            moved += 1;
        }

        self.vault.folders.retain(|f| f.id != id);
        self.renumber_folders();
        Ok(moved)
    }

    /// Set the display order to the order of `ids`, which must list every
    /// folder exactly once.
    pub fn reorder_folders(&mut self, ids: &[String]) -> Result<()> {
        if ids.len() != self.vault.folders.len() {
            return Err(PassLocalError::InvalidInput(format!(
                "reorder must list all {} folders (got {})",
                self.vault.folders.len(),
                ids.len()
            )));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if self.folder(id).is_none() {
                return Err(PassLocalError::FolderNotFound(id.clone()));
            }
            if !seen.insert(id.as_str()) {
                return Err(PassLocalError::InvalidInput(format!(
                    "folder '{id}' listed more than once"
                )));
            }
        }

        for folder in &mut self.vault.folders {
            if let Some(pos) = ids.iter().position(|id| *id == folder.id) {
                folder.order = order_from_index(pos);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Add a secret to an existing folder.
    pub fn add_secret(&mut self, name: &str, key: &str, value: &str, folder_id: &str) -> Result<Secret> {
        validate_name("secret", name)?;
        self.require_folder(folder_id)?;

        let now = Utc::now();
        let secret = Secret {
            id: new_id(),
            name: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            folder_id: folder_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.vault.secrets.push(secret.clone());
        Ok(secret)
    }

    /// Replace every client-editable field of a secret.
    ///
    /// `created_at` is preserved; `updated_at` is set to now.
    pub fn update_secret(
        &mut self,
        id: &str,
        name: &str,
        key: &str,
        value: &str,
        folder_id: &str,
    ) -> Result<Secret> {
        validate_name("secret", name)?;
        if self.secret(id).is_none() {
            return Err(PassLocalError::SecretNotFound(id.to_string()));
        }
        self.require_folder(folder_id)?;

        let secret = self
            .vault
            .secrets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PassLocalError::SecretNotFound(id.to_string()))?;

        secret.name = name.to_string();
        secret.key = key.to_string();
        secret.value = value.to_string();
        secret.folder_id = folder_id.to_string();
        secret.updated_at = Utc::now().max(secret.created_at);
        Ok(secret.clone())
    }

    /// Remove a secret.
    pub fn delete_secret(&mut self, id: &str) -> Result<()> {
        let before = self.vault.secrets.len();
        self.vault.secrets.retain(|s| s.id != id);
        if self.vault.secrets.len() == before {
            return Err(PassLocalError::SecretNotFound(id.to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check every model invariant on this store's vault.
    pub fn validate(&self) -> Result<()> {
        Self::check(&self.vault)
    }

    /// Check every model invariant:
    /// unique ids, non-blank names, no dangling folder references,
    /// at least one folder whenever secrets exist, a known version.
    pub fn check(vault: &Vault) -> Result<()> {
        if vault.version == 0 || vault.version > CURRENT_SCHEMA_VERSION {
            return Err(PassLocalError::UnsupportedVersion(vault.version));
        }

        let mut folder_ids = HashSet::with_capacity(vault.folders.len());
        for folder in &vault.folders {
            validate_name("folder", &folder.name)?;
            if !folder_ids.insert(folder.id.as_str()) {
                return Err(PassLocalError::InvalidInput(format!(
                    "duplicate folder id '{}'",
                    folder.id
                )));
            }
        }

        if !vault.secrets.is_empty() && vault.folders.is_empty() {
            return Err(PassLocalError::InvalidInput(
                "secrets exist but there are no folders".into(),
            ));
        }

        let mut secret_ids = HashSet::with_capacity(vault.secrets.len());
        for secret in &vault.secrets {
            validate_name("secret", &secret.name)?;
            if !secret_ids.insert(secret.id.as_str()) {
                return Err(PassLocalError::InvalidInput(format!(
                    "duplicate secret id '{}'",
                    secret.id
                )));
            }
            if !folder_ids.contains(secret.folder_id.as_str()) {
                return Err(PassLocalError::InvalidFolder(secret.folder_id.clone()));
            }
        }
        Ok(())
    }

    fn require_folder(&self, folder_id: &str) -> Result<()> {
        if self.folder(folder_id).is_none() {
            return Err(PassLocalError::InvalidFolder(folder_id.to_string()));
        }
        Ok(())
    }

    fn renumber_folders(&mut self) {
        let mut ranked: Vec<(i32, usize)> = self
            .vault
            .folders
            .iter()
            .enumerate()
            .map(|(i, f)| (f.order, i))
            .collect();
        ranked.sort();
        for (rank, (_, index)) in ranked.into_iter().enumerate() {
            self.vault.folders[index].order = order_from_index(rank);
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn order_from_index(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// Names are display strings: anything goes except blank.
fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PassLocalError::InvalidInput(format!(
            "{what} name cannot be empty"
        )));
    }
    Ok(())
}
