//! Configuration loaded from `<vault_dir>/config.toml`.

pub mod settings;

pub use settings::Settings;
