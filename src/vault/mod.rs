//! Vault module — the data model, its plaintext codec, and the
//! encrypted file format.
//!
//! This module provides:
//! - `Folder`, `Secret`, `Vault` and `FolderIcon` (`model`)
//! - Plaintext encoding of a `Vault` (`codec`)
//! - Binary vault file format with atomic writes (`format`)
//! - The in-memory `VaultStore` with invariant enforcement (`store`)

pub mod codec;
pub mod format;
pub mod model;
pub mod store;

// Re-export the most commonly used items.
pub use format::{KdfAlgorithm, KdfParams, RawVault, VaultHeader};
pub use model::{Folder, FolderIcon, Secret, Vault, CURRENT_SCHEMA_VERSION};
pub use store::VaultStore;
