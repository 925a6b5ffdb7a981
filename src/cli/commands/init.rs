//! `passlocal init` — create a new vault.

use crate::cli::output;
use crate::cli::{open_session, prompt_new_password, Cli};
use crate::errors::{PassLocalError, Result};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = open_session(cli)?;

    // Refuse before prompting so an existing vault is never at risk.
    if session.status().exists {
        return Err(PassLocalError::VaultAlreadyExists(
            session.path().to_path_buf(),
        ));
    }

    let password = prompt_new_password("PASSLOCAL_PASSWORD")?;
    let vault = session.setup(password.as_bytes())?;

    output::success(&format!(
        "Vault created at {} with folder '{}'",
        session.path().display(),
        vault.folders.first().map_or("", |f| f.name.as_str())
    ));
    output::warning("Your master password is never stored. If you forget it, your secrets cannot be recovered.");
    output::tip("Run `passlocal secret add <NAME>` to add a secret.");
    output::tip("Run `passlocal folder add <NAME>` to add a folder.");

    Ok(())
}
