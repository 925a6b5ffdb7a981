//! `passlocal secret ...` — add, read, update and delete secrets.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{confirm, resolve_folder, resolve_secret, unlock_session, Cli, SecretAction};
use crate::errors::{PassLocalError, Result};
use crate::session::Session;

/// Execute a `secret` subcommand.
pub fn execute(cli: &Cli, action: &SecretAction) -> Result<()> {
    match action {
        SecretAction::Add {
            name,
            value,
            key,
            folder,
        } => {
            let value = read_value(name, value.as_deref())?;
            let session = unlock_session(cli)?;
            let folder_id = folder_id_or_first(&session, folder.as_deref())?;
            let secret = session.add_secret(name, key, &value, &folder_id)?;
            output::success(&format!("Secret '{}' added ({})", secret.name, secret.id));
            session.lock()
        }

        SecretAction::Get { secret, copy } => {
            let session = unlock_session(cli)?;
            let value = session
                .with_vault(|v| resolve_secret(v, secret).map(|s| Zeroizing::new(s.value.clone())))??;
            session.lock()?;

            if *copy {
                copy_to_clipboard(&value)?;
                output::success("Copied to clipboard");
            } else {
                println!("{}", value.as_str());
            }
            Ok(())
        }

        SecretAction::Update {
            secret,
            name,
            key,
            folder,
            value,
        } => {
            let session = unlock_session(cli)?;
            let current = session.with_vault(|v| resolve_secret(v, secret).cloned())??;

            let folder_id = match folder {
                Some(ident) => session.with_vault(|v| resolve_folder(v, ident).map(|f| f.id.clone()))??,
                None => current.folder_id.clone(),
            };
            let new_value = if *value {
                read_value(&current.name, None)?
            } else {
                Zeroizing::new(current.value.clone())
            };

            let updated = session.update_secret(
                &current.id,
                name.as_deref().unwrap_or(&current.name),
                key.as_deref().unwrap_or(&current.key),
                &new_value,
                &folder_id,
            )?;
            output::success(&format!("Secret '{}' updated", updated.name));
            session.lock()
        }

        SecretAction::Delete { secret, force } => {
            let session = unlock_session(cli)?;
            let target = session.with_vault(|v| resolve_secret(v, secret).map(|s| (s.id.clone(), s.name.clone())))??;

            if !force && !confirm(&format!("Delete secret '{}'?", target.1))? {
                output::info("Cancelled.");
                return session.lock();
            }

            session.delete_secret(&target.0)?;
            output::success(&format!("Deleted secret '{}'", target.1));
            session.lock()
        }
    }
}

/// Resolve `--folder`, defaulting to the first folder in display order.
fn folder_id_or_first(session: &Session, ident: Option<&str>) -> Result<String> {
    session.with_vault(|v| match ident {
        Some(ident) => resolve_folder(v, ident).map(|f| f.id.clone()),
        None => v
            .sorted_folders()
            .first()
            .map(|f| f.id.clone())
            .ok_or_else(|| PassLocalError::FolderNotFound("(none)".into())),
    })?
}

/// Get a secret value from one of three sources: the command line, piped
/// stdin, or a hidden interactive prompt.
fn read_value(name: &str, inline: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = inline {
        output::warning("Value provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(trimmed);
        return Ok(buf);
    }

    let value = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {name}"))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| PassLocalError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

fn copy_to_clipboard(value: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| PassLocalError::CommandFailed(format!("clipboard unavailable: {e}")))?;
    clipboard
        .set_text(value.to_string())
        .map_err(|e| PassLocalError::CommandFailed(format!("clipboard write failed: {e}")))
}
