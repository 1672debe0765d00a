//! Parser for `saplikey -get` output.
//!
//! ```text
//! saplikey: Version 753
//! Hardware Key        : Z0123456789
//! Installation No.    : 0020000000
//! System No.          : 000000000800000000
//! Software Products   : NetWeaver_HDB
//! ```

use super::collapse_underscores;
use crate::types::SystemInfo;

/// Parse the key/value summary printed by `saplikey -get`.
///
/// Lines without a colon are ignored. Only the first word of each value is
/// kept.
pub fn parse_info(text: &str) -> SystemInfo {
    let mut info = SystemInfo::new();

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = normalize_key(key);
        if key.is_empty() {
            continue;
        }

        let value = value.trim().split(' ').next().unwrap_or_default();
        info.insert(key, value);
    }

    info
}

/// `"Installation No. "` -> `"installation_no"`
fn normalize_key(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();

    collapse_underscores(&cleaned).trim_matches('_').to_string()
}
