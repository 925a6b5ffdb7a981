//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::settings::{default_vault_dir, Settings};
use crate::errors::{PassLocalError, Result};
use crate::session::Session;
use crate::vault::{Folder, FolderIcon, Secret, Vault};

/// PassLocal CLI: local encrypted secret vault.
#[derive(Parser)]
#[command(
    name = "passlocal",
    about = "Local encrypted secret vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: ~/.passlocal)
    #[arg(long, env = "PASSLOCAL_DIR", global = true)]
    pub vault_dir: Option<PathBuf>,

    /// Log vault operations to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Show whether a vault exists
    Status,

    /// Create a new vault protected by a master password
    Init,

    /// List folders and secrets (values are never shown)
    List,

    /// Manage folders
    Folder {
        #[command(subcommand)]
        action: FolderAction,
    },

    /// Manage secrets
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Change the master password
    Passwd,
}

/// Folder subcommands.
#[derive(clap::Subcommand)]
pub enum FolderAction {
    /// Add a folder
    Add {
        /// Folder name
        name: String,
        /// Icon: folder, person, briefcase, star, heart, key
        #[arg(short, long, default_value = "folder", value_parser = parse_icon)]
        icon: FolderIcon,
    },

    /// Rename a folder or change its icon
    Update {
        /// Folder id or name
        folder: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New icon
        #[arg(short, long, value_parser = parse_icon)]
        icon: Option<FolderIcon>,
    },

    /// Delete a folder (its secrets move to the remaining folder with the lowest order)
    Delete {
        /// Folder id or name
        folder: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Set the display order of all folders
    Reorder {
        /// Every folder id or name, in the new order
        #[arg(required = true)]
        folders: Vec<String>,
    },
}

/// Secret subcommands.
#[derive(clap::Subcommand)]
pub enum SecretAction {
    /// Add a secret
    Add {
        /// Display name
        name: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
        /// Short label, e.g. an environment variable name
        #[arg(short, long, default_value = "")]
        key: String,
        /// Folder id or name (default: first folder)
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Print a secret's value
    Get {
        /// Secret id or name
        secret: String,
        /// Copy to the clipboard instead of printing
        #[arg(short, long)]
        copy: bool,
    },

    /// Change a secret
    Update {
        /// Secret id or name
        secret: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New key label
        #[arg(short, long)]
        key: Option<String>,
        /// Move to this folder (id or name)
        #[arg(short, long)]
        folder: Option<String>,
        /// Prompt for a new value
        #[arg(long)]
        value: bool,
    },

    /// Delete a secret
    Delete {
        /// Secret id or name
        secret: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Clap value parser for icon tags.  Stricter than decoding: a typo on the
/// command line is an error, not a silent fallback.
pub fn parse_icon(tag: &str) -> std::result::Result<FolderIcon, String> {
    FolderIcon::ALL
        .into_iter()
        .find(|icon| icon.as_str().eq_ignore_ascii_case(tag))
        .ok_or_else(|| {
            let names: Vec<&str> = FolderIcon::ALL.iter().map(|i| i.as_str()).collect();
            format!("unknown icon '{tag}' (expected one of: {})", names.join(", "))
        })
}

/// Resolve the vault directory: `--vault-dir`, `PASSLOCAL_DIR`, or
/// `~/.passlocal`.
pub fn vault_dir(cli: &Cli) -> PathBuf {
    cli.vault_dir.clone().unwrap_or_else(default_vault_dir)
}

/// Build a locked session from the CLI arguments and `config.toml`.
pub fn open_session(cli: &Cli) -> Result<Session> {
    let dir = vault_dir(cli);
    let settings = Settings::load(&dir)?;
    Ok(Session::new(settings.vault_path(&dir), settings.session_options()))
}

/// Build a session and unlock it with the master password.
pub fn unlock_session(cli: &Cli) -> Result<Session> {
    let session = open_session(cli)?;
    if !session.status().exists {
        return Err(PassLocalError::VaultNotFound(session.path().to_path_buf()));
    }
    let password = prompt_password()?;
    session.unlock(password.as_bytes())?;
    Ok(session)
}

/// Get the master password, trying in order:
/// 1. `PASSLOCAL_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    prompt_password_with("Enter master password")
}

fn prompt_password_with(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("PASSLOCAL_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| PassLocalError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation.
///
/// `env_var` lets scripts supply it non-interactively.  No strength
/// policy is applied; only an empty password is refused.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let password = dialoguer::Password::new()
        .with_prompt("Choose master password")
        .with_confirmation("Confirm master password", "Passwords do not match")
        .interact()
        .map_err(|e| match e {
            dialoguer::Error::IO(io) if io.kind() == std::io::ErrorKind::Interrupted => {
                PassLocalError::UserCancelled
            }
            other => PassLocalError::CommandFailed(format!("password prompt: {other}")),
        })?;

    if password.is_empty() {
        return Err(PassLocalError::InvalidInput(
            "master password cannot be empty".into(),
        ));
    }
    Ok(Zeroizing::new(password))
}

/// Find a folder by exact id, or else by a name that matches exactly one
/// folder (case-insensitive).
pub fn resolve_folder<'a>(vault: &'a Vault, ident: &str) -> Result<&'a Folder> {
    if let Some(folder) = vault.folder(ident) {
        return Ok(folder);
    }
    let mut matches = vault
        .folders
        .iter()
        .filter(|f| f.name.eq_ignore_ascii_case(ident));
    match (matches.next(), matches.next()) {
        (Some(folder), None) => Ok(folder),
        (Some(_), Some(_)) => Err(PassLocalError::InvalidInput(format!(
            "several folders are named '{ident}' — use the folder id"
        ))),
        _ => Err(PassLocalError::FolderNotFound(ident.to_string())),
    }
}

/// Find a secret by exact id, or else by a unique name.
pub fn resolve_secret<'a>(vault: &'a Vault, ident: &str) -> Result<&'a Secret> {
    if let Some(secret) = vault.secret(ident) {
        return Ok(secret);
    }
    let mut matches = vault
        .secrets
        .iter()
        .filter(|s| s.name.eq_ignore_ascii_case(ident));
    match (matches.next(), matches.next()) {
        (Some(secret), None) => Ok(secret),
        (Some(_), Some(_)) => Err(PassLocalError::InvalidInput(format!(
            "several secrets are named '{ident}' — use the secret id"
        ))),
        _ => Err(PassLocalError::SecretNotFound(ident.to_string())),
    }
}

/// Ask a yes/no question, defaulting to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| PassLocalError::CommandFailed(format!("confirm prompt: {e}")))
}
