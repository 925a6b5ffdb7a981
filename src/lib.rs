pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod session;
pub mod vault;

pub use errors::{PassLocalError, Result};
pub use session::{Session, SessionOptions, VaultState, VaultStatus};
