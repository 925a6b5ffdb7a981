//! `passlocal passwd` — change the master password.
//!
//! The vault is re-encrypted under a key derived from the new password
//! and a fresh salt, then written atomically.

use crate::cli::output;
use crate::cli::{open_session, prompt_new_password, prompt_password, Cli};
use crate::errors::{PassLocalError, Result};

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = open_session(cli)?;
    if !session.status().exists {
        return Err(PassLocalError::VaultNotFound(session.path().to_path_buf()));
    }

    output::info("Enter your current master password.");
    let current = prompt_password()?;
    session.unlock(current.as_bytes())?;

    output::info("Choose your new master password.");
    let new_password = prompt_new_password("PASSLOCAL_NEW_PASSWORD")?;

    session.change_password(current.as_bytes(), new_password.as_bytes())?;
    let secrets = session.with_vault(|v| v.secrets.len())?;
    session.lock()?;

    output::success(&format!(
        "Master password changed ({secrets} secrets re-encrypted)"
    ));
    Ok(())
}
