//! `passlocal folder ...` — add, update, delete and reorder folders.

use crate::cli::output;
use crate::cli::{confirm, resolve_folder, unlock_session, Cli, FolderAction};
use crate::errors::Result;

/// Execute a `folder` subcommand.
pub fn execute(cli: &Cli, action: &FolderAction) -> Result<()> {
    let session = unlock_session(cli)?;

    match action {
        FolderAction::Add { name, icon } => {
            let folder = session.add_folder(name, *icon)?;
            output::success(&format!("Folder '{}' added ({})", folder.name, folder.id));
        }

        FolderAction::Update { folder, name, icon } => {
            let current = session.with_vault(|v| resolve_folder(v, folder).cloned())??;
            let updated = session.update_folder(
                &current.id,
                name.as_deref().unwrap_or(&current.name),
                icon.unwrap_or(current.icon),
            )?;
            output::success(&format!("Folder '{}' updated", updated.name));
        }

        FolderAction::Delete { folder, force } => {
            let (target, count) = session.with_vault(|v| {
                resolve_folder(v, folder).map(|f| (f.clone(), v.secrets_in(&f.id).count()))
            })??;

            if !force {
                let prompt = if count == 0 {
                    format!("Delete folder '{}'?", target.name)
                } else {
                    format!(
                        "Delete folder '{}'? Its {count} secret(s) will move to the remaining folder with the lowest order.",
                        target.name
                    )
                };
                if !confirm(&prompt)? {
                    output::info("Cancelled.");
                    return session.lock();
                }
            }

            session.delete_folder(&target.id)?;
            output::success(&format!("Deleted folder '{}'", target.name));
        }

        FolderAction::Reorder { folders } => {
            let ids = session.with_vault(|v| {
                folders
                    .iter()
                    .map(|ident| resolve_folder(v, ident).map(|f| f.id.clone()))
                    .collect::<Result<Vec<String>>>()
            })??;
            session.reorder_folders(&ids)?;
            output::success("Folders reordered");
        }
    }

    session.lock()
}
