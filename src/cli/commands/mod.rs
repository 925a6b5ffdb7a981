//! One module per subcommand.  Each exposes an `execute` function.

pub mod folder;
pub mod init;
pub mod list;
pub mod passwd;
pub mod secret;
pub mod status;
