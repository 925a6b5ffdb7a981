//! Vault session management — the lock/unlock state machine.
//!
//! A `Session` is created once per process for one vault file and passed
//! by reference to whatever dispatches user commands.  It owns the
//! derived master key and the decrypted `VaultStore` while unlocked, and
//! nothing at all while locked.
//!
//! ```text
//! Uninitialized --setup--> Unlocked --lock--> Locked --unlock--> Unlocked
//! ```
//!
//! Mutations (including `setup`, `unlock` and `lock`) hold the write lock
//! for their whole duration, file write included.  `get_vault` and
//! `status` take the read lock.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::crypto::{self, derive_master_key_with_params, generate_salt, Argon2Params, MasterKey};
use crate::errors::{PassLocalError, Result};
use crate::vault::format::{self, KdfParams, VaultHeader};
use crate::vault::{codec, Folder, FolderIcon, Secret, Vault, VaultStore};

/// Answer to "is there a vault, and is it open?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VaultStatus {
    pub exists: bool,
    pub unlocked: bool,
}

/// The three lifecycle states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultState {
    /// No vault file yet: the setup flow applies.
    Uninitialized,
    /// A vault file exists but no key is in memory.
    Locked,
    /// Key derived and vault decoded.
    Unlocked,
}

/// Settings a session needs beyond the vault path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// KDF cost for new vaults and password changes.  Existing vaults
    /// always open with the params stored in their header.
    pub argon2_params: Argon2Params,
    pub default_folder_name: String,
    pub default_folder_icon: FolderIcon,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            argon2_params: Argon2Params::default(),
            default_folder_name: "Personal".to_string(),
            default_folder_icon: FolderIcon::Person,
        }
    }
}

/// Everything held in memory while unlocked.
struct UnlockedVault {
    /// Zeroized on drop.
    key: MasterKey,
    /// Salt, KDF params and creation time reused by every write.
    header: VaultHeader,
    store: VaultStore,
}

enum SessionState {
    Locked,
    Unlocked(Box<UnlockedVault>),
}

/// The single owner of the vault while the process runs.
pub struct Session {
    path: PathBuf,
    options: SessionOptions,
    state: RwLock<SessionState>,
}

impl Session {
    /// Create a locked session for the vault file at `path`.
    ///
    /// Nothing is read from disk until `setup` or `unlock`.
    pub fn new(path: impl Into<PathBuf>, options: SessionOptions) -> Self {
        Self {
            path: path.into(),
            options,
            state: RwLock::new(SessionState::Locked),
        }
    }

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether the vault file exists and whether it is unlocked.
    ///
    /// A poisoned session reports `unlocked: false`, since every vault
    /// operation on it fails; use `try_status` to see the poisoning.
    pub fn status(&self) -> VaultStatus {
        VaultStatus {
            exists: format::vault_exists(&self.path),
            unlocked: self.is_unlocked(),
        }
    }

    /// Like `status`, but a poisoned session is `SessionPoisoned`.
    pub fn try_status(&self) -> Result<VaultStatus> {
        let unlocked = matches!(*self.read_state()?, SessionState::Unlocked(_));
        Ok(VaultStatus {
            exists: format::vault_exists(&self.path),
            unlocked,
        })
    }

    /// The current lifecycle state.
    pub fn state(&self) -> VaultState {
        if self.is_unlocked() {
            VaultState::Unlocked
        } else if format::vault_exists(&self.path) {
            VaultState::Locked
        } else {
            VaultState::Uninitialized
        }
    }

    fn is_unlocked(&self) -> bool {
        match self.state.read() {
            Ok(state) => matches!(*state, SessionState::Unlocked(_)),
            Err(_) => {
                warn!(path = %self.path.display(), "session lock poisoned, reporting locked");
                false
            }
        }
    }

    /// A snapshot of the decrypted vault.
    pub fn get_vault(&self) -> Result<Vault> {
        self.with_vault(Vault::clone)
    }

    /// Run `f` against the decrypted vault without copying it.
    pub fn with_vault<R>(&self, f: impl FnOnce(&Vault) -> R) -> Result<R> {
        let state = self.read_state()?;
        match &*state {
            SessionState::Unlocked(unlocked) => Ok(f(unlocked.store.vault())),
            SessionState::Locked => Err(PassLocalError::NotUnlocked),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a new vault protected by `password` and unlock it.
    ///
    /// The new vault holds a single default folder and no secrets.
    pub fn setup(&self, password: &[u8]) -> Result<Vault> {
        let mut state = self.write_state()?;
        if format::vault_exists(&self.path) {
            return Err(PassLocalError::VaultAlreadyExists(self.path.clone()));
        }

        let salt = generate_salt();
        let params = self.options.argon2_params;
        let key = derive_master_key_with_params(password, &salt, &params)?;

        let header = VaultHeader {
            kdf: KdfParams::from(params),
            salt: salt.to_vec(),
            nonce: Vec::new(),
            created_at: Utc::now(),
        };
        let store = VaultStore::with_default_folder(
            &self.options.default_folder_name,
            self.options.default_folder_icon,
        );

        persist(&self.path, &key, &header, store.vault())?;
        info!(path = %self.path.display(), "vault created");

        let vault = store.vault().clone();
        *state = SessionState::Unlocked(Box::new(UnlockedVault { key, header, store }));
        Ok(vault)
    }

    /// Derive the key from `password`, decrypt the vault file and unlock.
    ///
    /// On failure the session keeps its previous state.  Calling this
    /// while already unlocked re-verifies against the file.
    pub fn unlock(&self, password: &[u8]) -> Result<Vault> {
        let mut state = self.write_state()?;

        let unlocked = match open_vault(&self.path, password) {
            Ok(unlocked) => unlocked,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unlock rejected");
                return Err(e);
            }
        };

        info!(
            path = %self.path.display(),
            folders = unlocked.store.folder_count(),
            secrets = unlocked.store.secret_count(),
            "vault unlocked"
        );
        let vault = unlocked.store.vault().clone();
        *state = SessionState::Unlocked(Box::new(unlocked));
        Ok(vault)
    }

    /// Drop the key and the decrypted vault.  Locking a locked session is
    /// a no-op.
    pub fn lock(&self) -> Result<()> {
        let mut state = self.write_state()?;
        if matches!(*state, SessionState::Unlocked(_)) {
            // Dropping the box zeroizes the key and every secret value.
            *state = SessionState::Locked;
            info!(path = %self.path.display(), "vault locked");
        }
        Ok(())
    }

    /// Re-encrypt the vault under a new password and a fresh salt.
    ///
    /// `current` must match the password the session was unlocked with.
    /// The in-memory key is swapped only after the new file is written.
    pub fn change_password(&self, current: &[u8], new: &[u8]) -> Result<()> {
        let mut state = self.write_state()?;
        let unlocked = unlocked_mut(&mut state)?;

        let check = derive_master_key_with_params(
            current,
            &unlocked.header.salt,
            &unlocked.header.kdf.argon2_params(),
        )?;
        if !bool::from(check.as_bytes()[..].ct_eq(&unlocked.key.as_bytes()[..])) {
            warn!(path = %self.path.display(), "password change rejected");
            return Err(PassLocalError::AuthenticationFailed);
        }
        drop(check);

        let salt = generate_salt();
        let params = self.options.argon2_params;
        let key = derive_master_key_with_params(new, &salt, &params)?;
        let header = VaultHeader {
            kdf: KdfParams::from(params),
            salt: salt.to_vec(),
            nonce: Vec::new(),
            created_at: unlocked.header.created_at,
        };

        persist(&self.path, &key, &header, unlocked.store.vault())?;
        unlocked.key = key;
        unlocked.header = header;
        info!(path = %self.path.display(), "master password changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Folder operations
    // ------------------------------------------------------------------

    pub fn add_folder(&self, name: &str, icon: FolderIcon) -> Result<Folder> {
        self.mutate("add_folder", |store| store.add_folder(name, icon))
    }

    pub fn update_folder(&self, id: &str, name: &str, icon: FolderIcon) -> Result<Folder> {
        self.mutate("update_folder", |store| store.update_folder(id, name, icon))
    }

    /// Delete a folder; its secrets move to the lowest-order remaining
    /// folder.
    pub fn delete_folder(&self, id: &str) -> Result<()> {
        self.mutate("delete_folder", |store| {
            let moved = store.delete_folder(id)?;
            debug!(folder = id, moved, "folder deleted");
            Ok(())
        })
    }

    pub fn reorder_folders(&self, ids: &[String]) -> Result<()> {
        self.mutate("reorder_folders", |store| store.reorder_folders(ids))
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    pub fn add_secret(&self, name: &str, key: &str, value: &str, folder_id: &str) -> Result<Secret> {
        self.mutate("add_secret", |store| store.add_secret(name, key, value, folder_id))
    }

    pub fn update_secret(
        &self,
        id: &str,
        name: &str,
        key: &str,
        value: &str,
        folder_id: &str,
    ) -> Result<Secret> {
        self.mutate("update_secret", |store| {
            store.update_secret(id, name, key, value, folder_id)
        })
    }

    pub fn delete_secret(&self, id: &str) -> Result<()> {
        self.mutate("delete_secret", |store| store.delete_secret(id))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Apply `f` to a draft of the store, validate and persist the draft,
    /// then commit it.  Any failure leaves memory and disk as they were.
    fn mutate<T>(&self, op: &'static str, f: impl FnOnce(&mut VaultStore) -> Result<T>) -> Result<T> {
        let mut state = self.write_state()?;
        let unlocked = unlocked_mut(&mut state)?;

        let mut draft = unlocked.store.clone();
        let out = f(&mut draft)?;
        draft.validate()?;

        persist(&self.path, &unlocked.key, &unlocked.header, draft.vault())?;
        unlocked.store = draft;

        info!(
            op,
            folders = unlocked.store.folder_count(),
            secrets = unlocked.store.secret_count(),
            "vault updated"
        );
        Ok(out)
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, SessionState>> {
        self.state.read().map_err(|_| PassLocalError::SessionPoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, SessionState>> {
        self.state.write().map_err(|_| PassLocalError::SessionPoisoned)
    }
}

fn unlocked_mut<'a>(state: &'a mut SessionState) -> Result<&'a mut UnlockedVault> {
    match state {
        SessionState::Unlocked(unlocked) => Ok(&mut **unlocked),
        SessionState::Locked => Err(PassLocalError::NotUnlocked),
    }
}

/// Read, authenticate and decode the vault at `path`.
///
/// Every early return drops the derived key, which zeroizes it.
fn open_vault(path: &Path, password: &[u8]) -> Result<UnlockedVault> {
    let raw = format::read_vault(path)?;
    let header = raw.header;

    let key = derive_master_key_with_params(password, &header.salt, &header.kdf.argon2_params())?;
    let plaintext = crypto::decrypt(
        &key,
        &header.nonce,
        &raw.ciphertext,
        &raw.tag,
        &header.associated_data(),
    )?;
    let store = VaultStore::new(codec::decode(&plaintext)?)?;

    Ok(UnlockedVault { key, header, store })
}

/// Encode, encrypt under a fresh nonce, and atomically write `vault`.
fn persist(path: &Path, key: &MasterKey, template: &VaultHeader, vault: &Vault) -> Result<()> {
    let plaintext = codec::encode(vault)?;

    let mut header = template.clone();
    let sealed = crypto::encrypt(key, &plaintext, &header.associated_data())?;
    header.nonce = sealed.nonce.to_vec();

    format::write_vault(path, &header, &sealed.ciphertext, &sealed.tag)
}
