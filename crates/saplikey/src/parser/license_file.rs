//! Parser for SAP license files as delivered by SAP.
//!
//! ```text
//! ----- Begin SAP License -----
//! SAPSYSTEM=S4H
//! HARDWARE-KEY=Z0123456789
//! INSTNO=0020000000
//! BEGIN=20220720
//! EXPIRATION=99991231
//! LKEY=MIIBO...
//! SWPRODUCTNAME=NetWeaver_HDB
//! SWPRODUCTLIMIT=2147483647
//! SYSTEM-NR=000000000800000000
//! ```
//!
//! Keys are renamed to the field names used by `saplikey -show`. The key
//! material itself (`LKEY`) is never kept.

use crate::types::LicenseRecord;

const BLOCK_MARKER: &str = "Begin SAP License";

/// Map a license file key to its record field.
fn field_name(key: &str) -> Option<&'static str> {
    match key {
        "SAPSYSTEM" => Some("system"),
        "HARDWARE-KEY" => Some("hardware_key"),
        "INSTNO" => Some("installation_number"),
        "BEGIN" => Some("begin_of_validity"),
        "EXPIRATION" => Some("end_of_validity"),
        "SWPRODUCTNAME" => Some("software_product"),
        "SWPRODUCTLIMIT" => Some("software_product_limit"),
        "SYSTEM-NR" => Some("system_number"),
        _ => None,
    }
}

/// Parse every license block of a license file, in file order.
pub fn parse_license_file(text: &str) -> Vec<LicenseRecord> {
    let lines: Vec<&str> = text.lines().collect();
    let mut licenses = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if !lines[i].contains(BLOCK_MARKER) {
            i += 1;
            continue;
        }

        i += 1;
        let mut record = LicenseRecord::new();
        while i < lines.len() && !lines[i].contains(BLOCK_MARKER) {
            let Some((key, value)) = lines[i].split_once('=') else {
                break;
            };
            if let Some(field) = field_name(key.trim()) {
                record.set(field, value.trim());
            }
            i += 1;
        }
        licenses.push(record);
    }

    licenses
}
