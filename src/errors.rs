use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in PassLocal.
///
/// Messages never carry secret values, passwords or key bytes.
#[derive(Debug, Error)]
pub enum PassLocalError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrong password and tampered data are deliberately the same error.
    #[error("Authentication failed — wrong password or corrupted vault")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault file errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Vault unreadable: {0}")]
    Corrupt(String),

    #[error("Vault schema version {0} is newer than this build supports")]
    UnsupportedVersion(u32),

    // --- Session errors ---
    #[error("Vault is locked")]
    NotUnlocked,

    #[error("Session state is unavailable after a panic in another thread")]
    SessionPoisoned,

    // --- Model errors ---
    #[error("Folder '{0}' not found")]
    FolderNotFound(String),

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Folder '{0}' does not exist — secrets must belong to an existing folder")]
    InvalidFolder(String),

    #[error("Cannot delete the last folder")]
    LastFolder,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for PassLocal results.
pub type Result<T> = std::result::Result<T, PassLocalError>;
