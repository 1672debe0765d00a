//! Parsers for saplikey output and license files.
//!
//! None of the parsers fail: malformed lines are skipped and unterminated
//! blocks end at end of input.

mod info;
mod license_file;
mod show;

pub use info::parse_info;
pub use license_file::parse_license_file;
pub use show::parse_show;

use regex::Regex;
use std::sync::LazyLock;

static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new("_+").unwrap());

/// Collapse runs of underscores into one.
fn collapse_underscores(key: &str) -> String {
    UNDERSCORES.replace_all(key, "_").into_owned()
}
