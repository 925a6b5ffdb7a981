//! `passlocal status` — report whether a vault exists.
//!
//! Never asks for the password, so it always reports "locked" for an
//! existing vault: each CLI invocation starts a fresh session.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;
use crate::session::VaultState;

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = open_session(cli)?;

    match session.state() {
        VaultState::Uninitialized => {
            output::info(&format!("No vault at {}", session.path().display()));
            output::tip("Run `passlocal init` to create one.");
        }
        VaultState::Locked | VaultState::Unlocked => {
            output::success(&format!("Vault found at {}", session.path().display()));
        }
    }

    Ok(())
}
