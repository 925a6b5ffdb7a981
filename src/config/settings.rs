use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{PassLocalError, Result};
use crate::session::SessionOptions;
use crate::vault::FolderIcon;

/// Vault-level configuration, loaded from `<vault_dir>/config.toml`.
///
/// Every field has a sensible default so PassLocal works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// File name of the encrypted vault inside the vault directory.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// Argon2 memory cost in KiB for new vaults (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count for new vaults (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree for new vaults (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Name of the folder a new vault starts with.
    #[serde(default = "default_folder_name")]
    pub default_folder_name: String,

    /// Icon tag of that folder; unknown tags fall back to `folder`.
    #[serde(default = "default_folder_icon")]
    pub default_folder_icon: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> String {
    "vault.enc".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_folder_name() -> String {
    "Personal".to_string()
}

fn default_folder_icon() -> String {
    "person".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            default_folder_name: default_folder_name(),
            default_folder_icon: default_folder_icon(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the vault directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<vault_dir>/config.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(vault_dir: &Path) -> Result<Self> {
        let config_path = vault_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PassLocalError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.vault_file.trim().is_empty() || settings.vault_file.contains(['/', '\\']) {
            return Err(PassLocalError::ConfigError(format!(
                "vault_file '{}' must be a plain file name",
                settings.vault_file
            )));
        }
        settings.argon2_params().validate().map_err(|e| {
            PassLocalError::ConfigError(format!("{}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Build the full path to the vault file.
    ///
    /// Example: `~/.passlocal/vault.enc`
    pub fn vault_path(&self, vault_dir: &Path) -> PathBuf {
        vault_dir.join(&self.vault_file)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Options for a `Session` built from these settings.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            argon2_params: self.argon2_params(),
            default_folder_name: self.default_folder_name.clone(),
            default_folder_icon: FolderIcon::from_tag(&self.default_folder_icon),
        }
    }
}

/// The vault directory used when none is given: `~/.passlocal`.
pub fn default_vault_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".passlocal")
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_file, "vault.enc");
        assert_eq!(s.argon2_memory_kib, 65_536);
        assert_eq!(s.argon2_iterations, 3);
        assert_eq!(s.argon2_parallelism, 4);
        assert_eq!(s.default_folder_name, "Personal");
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_file, "vault.enc");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_file = "secrets.enc"
argon2_memory_kib = 131072
argon2_iterations = 5
argon2_parallelism = 8
default_folder_name = "Main"
default_folder_icon = "key"
"#;
        fs::write(tmp.path().join("config.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_file, "secrets.enc");
        assert_eq!(settings.argon2_memory_kib, 131_072);
        assert_eq!(settings.argon2_iterations, 5);
        assert_eq!(settings.argon2_parallelism, 8);

        let options = settings.session_options();
        assert_eq!(options.default_folder_name, "Main");
        assert_eq!(options.default_folder_icon, FolderIcon::Key);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "argon2_iterations = 2\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.argon2_iterations, 2);
        assert_eq!(settings.vault_file, "vault.enc");
        assert_eq!(settings.argon2_memory_kib, 65_536);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_weak_kdf_settings() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "argon2_memory_kib = 16\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(PassLocalError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_vault_file_with_path() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "vault_file = \"../x.enc\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn vault_path_builds_correct_path() {
        let s = Settings::default();
        let path = s.vault_path(Path::new("/home/user/.passlocal"));
        assert_eq!(path, PathBuf::from("/home/user/.passlocal/vault.enc"));
    }

    #[test]
    fn unknown_default_icon_falls_back() {
        let s = Settings {
            default_folder_icon: "rocket".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.session_options().default_folder_icon, FolderIcon::Folder);
    }
}
