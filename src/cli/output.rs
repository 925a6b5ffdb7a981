//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::Vault;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print folders in display order with their secret counts.
pub fn print_folders_table(vault: &Vault) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Folder", "Icon", "Secrets", "Id"]);

    for folder in vault.sorted_folders() {
        table.add_row(vec![
            folder.name.clone(),
            folder.icon.to_string(),
            vault.secrets_in(&folder.id).count().to_string(),
            folder.id.clone(),
        ]);
    }

    println!("{table}");
}

/// Print secret metadata grouped by folder.  Values are never printed.
pub fn print_secrets_table(vault: &Vault) {
    if vault.secrets.is_empty() {
        info("No secrets in this vault yet.");
        tip("Run `passlocal secret add <NAME>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Folder", "Name", "Key", "Updated", "Id"]);

    for folder in vault.sorted_folders() {
        let mut secrets: Vec<_> = vault.secrets_in(&folder.id).collect();
        secrets.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        for s in secrets {
            table.add_row(vec![
                folder.name.clone(),
                s.name.clone(),
                s.key.clone(),
                s.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                s.id.clone(),
            ]);
        }
    }

    println!("{table}");
}
