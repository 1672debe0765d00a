// Declarative commands (apply, status, present, absent)
pub mod declarative;

// Direct saplikey commands
pub mod license;

use anyhow::Result;
use saplikey::Client;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::config::LikeyConfig;

/// Load the config selected on the command line
pub(crate) fn load_config(ctx: &Context) -> Result<LikeyConfig> {
    LikeyConfig::load(ctx.config.as_deref())
}

/// Client using the configured settings
pub(crate) fn client(config: &LikeyConfig) -> Client {
    Client::with_settings(config.settings.to_settings())
}

/// License file path as `<sid>adm` must see it (relative paths would
/// resolve in its home directory)
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
