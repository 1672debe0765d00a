//! Parser for `saplikey -show` output.
//!
//! Each license is printed as a header line ending in `License Key:`, a
//! separator line, then `key : value` lines up to a blank line:
//!
//! ```text
//! 1. License Key:
//! ---------------
//! system               : S4H
//! hardware key         : Z0123456789
//! software product     : NetWeaver_HDB
//! validity             : valid
//!
//! ```

use super::collapse_underscores;
use crate::types::LicenseRecord;

const BLOCK_MARKER: &str = "License Key:";

/// Parse all license blocks printed by `saplikey -show`, in document order.
pub fn parse_show(text: &str) -> Vec<LicenseRecord> {
    let lines: Vec<&str> = text.lines().collect();
    let mut licenses = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if !lines[i].trim_end().ends_with(BLOCK_MARKER) {
            i += 1;
            continue;
        }

        // Skip the header and the separator below it
        i += 2;
        let mut record = LicenseRecord::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            if let Some((key, value)) = lines[i].split_once(':') {
                record.set(&normalize_key(key), value.trim());
            }
            i += 1;
        }
        licenses.push(record);
    }

    licenses
}

/// `"hardware key   "` -> `"hardware_key"`
fn normalize_key(raw: &str) -> String {
    collapse_underscores(&raw.trim().to_lowercase().replace(' ', "_"))
}
