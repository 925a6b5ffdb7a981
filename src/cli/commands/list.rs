//! `passlocal list` — display folders and secret metadata.

use crate::cli::output;
use crate::cli::{unlock_session, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = unlock_session(cli)?;

    session.with_vault(|vault| {
        output::info(&format!(
            "{} folder(s), {} secret(s)",
            vault.folders.len(),
            vault.secrets.len()
        ));
        output::print_folders_table(vault);
        output::print_secrets_table(vault);
    })?;

    session.lock()
}
