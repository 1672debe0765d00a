//! # saplikey
//!
//! Rust library wrapping the SAP `saplikey` license-management tool.
//!
//! This crate provides functionality for:
//! - Running `saplikey` as the instance user (`<sid>adm`) with a timeout
//! - Parsing `-get` and `-show` output and SAP license files into records
//! - Installing, deleting and requesting temporary licenses
//!
//! It never looks at the license key material itself, only at the metadata
//! fields reported by the tool.
//!
//! ## Example
//!
//! ```no_run
//! use saplikey::Client;
//!
//! let client = Client::new();
//!
//! let info = client.info("S4H").expect("saplikey -get failed");
//! println!("Hardware key: {:?}", info.hardware_key());
//!
//! for license in client.show("S4H").expect("saplikey -show failed") {
//!     println!("{license} ({:?})", license.validity);
//! }
//! ```
//!
//! ## Testing
//!
//! All host access goes through the [`backend::Backend`] and
//! [`backend::FileSystem`] traits; use [`Client::with_backend`] to plug in
//! fakes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod parser;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use parser::{parse_info, parse_license_file, parse_show};
pub use types::{
    CommandOutput, DeleteScope, LicenseRecord, SYSTEM_ONLY_FIELDS, Settings, SystemInfo, UserIds,
    sidadm,
};

use backend::{Backend, FileSystem};
use std::path::Path;

/// High-level client for saplikey operations.
///
/// Every method runs one saplikey command as `<sid>adm` against the
/// instance's default profile. Non-zero exits are logged together with the
/// captured stderr and returned as [`Error::CommandFailed`]; nothing is
/// retried.
pub struct Client {
    backend: Box<dyn Backend>,
    fs: Box<dyn FileSystem>,
    settings: Settings,
}

impl Client {
    /// Create a client using `su` and the local file system.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create a client with custom settings and the default backends.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            backend: Box::new(backend::default_backend()),
            fs: Box::new(backend::default_file_system()),
            settings,
        }
    }

    /// Create a client with custom backends (useful for testing).
    pub fn with_backend(
        backend: Box<dyn Backend>,
        fs: Box<dyn FileSystem>,
        settings: Settings,
    ) -> Self {
        Self {
            backend,
            fs,
            settings,
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// File system used for license files.
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    // =========================================================================
    // Tool resolution
    // =========================================================================

    /// Path of the saplikey executable as seen by `user`.
    ///
    /// Fails with [`Error::Configuration`] when the kernel directory variable
    /// is empty or not a path.
    pub fn tool_path(&self, user: &str) -> Result<String> {
        let var = &self.settings.library_var;
        let dir = self.backend.env_as(user, var).map_err(|e| match e {
            Error::Configuration { .. } => e,
            other => Error::Configuration {
                message: format!("cannot retrieve ${var} for user {user}: {other}"),
            },
        })?;

        let dir = dir.trim();
        if dir.is_empty() || !dir.contains('/') {
            return Err(Error::Configuration {
                message: format!("cannot retrieve ${var} for user {user}"),
            });
        }

        Ok(format!("{}/{}", dir.trim_end_matches('/'), self.settings.tool_name))
    }

    /// Run one saplikey function for an instance and return its stdout.
    fn run(&self, sid: &str, function: &[&str]) -> Result<String> {
        let sid = sid.to_uppercase();
        let user = sidadm(&sid);
        let tool = self.tool_path(&user)?;
        log::debug!("Running with user {user} and using executable {tool}");

        let mut args = vec![format!("pf={}", self.settings.profile_path(&sid))];
        args.extend(function.iter().map(|a| a.to_string()));
        let command = format!("{tool} {}", args.join(" "));
        log::trace!("Executing '{command}'");

        let output = self
            .backend
            .run_as(&user, &tool, &args, self.settings.timeout)?;
        log::debug!("Output of '{command}': {output:?}");

        if !output.is_success() {
            let stderr = output.stderr.trim().to_string();
            log::error!("{command} failed:\n{stderr}");
            return Err(Error::CommandFailed {
                command,
                code: output.code,
                stderr,
            });
        }

        Ok(output.stdout)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// System license information (`saplikey -get`).
    pub fn info(&self, sid: &str) -> Result<SystemInfo> {
        let stdout = self.run(sid, &["-get"])?;
        Ok(parser::parse_info(&stdout))
    }

    /// All installed licenses (`saplikey -show`).
    pub fn show(&self, sid: &str) -> Result<Vec<LicenseRecord>> {
        let stdout = self.run(sid, &["-show"])?;
        Ok(parser::parse_show(&stdout))
    }

    /// Parse a license file from disk.
    pub fn read_license_file(&self, path: &Path) -> Result<Vec<LicenseRecord>> {
        log::debug!("Reading license file {}", path.display());
        let content = self.fs.read_to_string(path)?;
        Ok(parser::parse_license_file(&content))
    }

    // =========================================================================
    // Changes
    // =========================================================================

    /// Install all licenses of a license file (`saplikey -install`).
    ///
    /// The file must be readable by `<sid>adm`.
    pub fn install(&self, sid: &str, path: &Path) -> Result<()> {
        let file = path.to_string_lossy();
        self.run(sid, &["-install", &file])?;
        Ok(())
    }

    /// Delete licenses (`saplikey -delete <owner> <hwkey> <product>`).
    ///
    /// Hardware key and product are glob patterns expanded by saplikey.
    pub fn delete(&self, sid: &str, scope: &DeleteScope) -> Result<()> {
        self.run(
            sid,
            &["-delete", &scope.owner, &scope.hardware_key, &scope.product],
        )?;
        Ok(())
    }

    /// Install a temporary license (`saplikey -temp <product>`).
    ///
    /// saplikey only grants one if the instance held a valid license before.
    pub fn temp(&self, sid: &str, product: &str) -> Result<()> {
        self.run(sid, &["-temp", product])?;
        Ok(())
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
