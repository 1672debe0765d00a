//! Capability interfaces for running saplikey and touching license files.
//!
//! The [`Backend`] and [`FileSystem`] traits are everything the facade needs
//! from the host, allowing for:
//! - Real execution via `su` and the local file system
//! - Recording fakes for testing the reconciliation logic

pub mod local;
pub mod su;

use crate::error::Result;
use crate::types::{CommandOutput, UserIds};
use std::path::Path;
use std::time::Duration;

/// Runs programs as another OS user.
pub trait Backend: Send + Sync {
    /// Run `program` with `args` as `user`, waiting at most `timeout`.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::code`].
    fn run_as(
        &self,
        user: &str,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput>;

    /// Value of an environment variable in `user`'s login environment.
    ///
    /// Returns an empty string when the variable is unset.
    fn env_as(&self, user: &str, var: &str) -> Result<String>;
}

/// File access needed to read license files and hand them to `<sid>adm`.
pub trait FileSystem: Send + Sync {
    /// Read a whole file as text.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Name of the user owning a file.
    fn owner(&self, path: &Path) -> Result<String>;

    /// Change owner and group of a file.
    fn chown(&self, path: &Path, ids: UserIds) -> Result<()>;

    /// Look up the uid and primary gid of a user.
    fn lookup_user(&self, name: &str) -> Result<UserIds>;
}

/// Get the default backend (`su` on the local host).
pub fn default_backend() -> su::SuBackend {
    su::SuBackend::new()
}

/// Get the default file system (the local one).
pub fn default_file_system() -> local::LocalFileSystem {
    local::LocalFileSystem
}
