//! Core types for SAP license key management.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Fields reported by `saplikey -show` that never appear in a license file.
pub const SYSTEM_ONLY_FIELDS: &[&str] = &["validity", "type_of_license_key", "last_successful_check"];

/// Product name prefix of maintenance licenses.
pub const MAINTENANCE_PREFIX: &str = "Maintenance_";

/// One license key entry.
///
/// Records parsed from `saplikey -show` carry the system-only fields
/// (`validity`, `type_of_license_key`, `last_successful_check`); records
/// parsed from a license file never do. Keys the tool emits that have no
/// named field are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// SID the license was issued for (the license owner)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Hardware key the license is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_key: Option<String>,
    /// Licensed product, e.g. `NetWeaver_HDB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_product: Option<String>,
    /// Product limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_product_limit: Option<String>,
    /// Installation number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_number: Option<String>,
    /// First valid day (`YYYYMMDD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_of_validity: Option<String>,
    /// Last valid day (`YYYYMMDD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_validity: Option<String>,
    /// System number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_number: Option<String>,
    /// Validity as judged by the tool (`valid` or something else)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<String>,
    /// Permanent, temporary, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_of_license_key: Option<String>,
    /// Date of the last successful license check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_check: Option<String>,
    /// Any other field the tool reported
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl LicenseRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        let slot = match key {
            "system" => &mut self.system,
            "hardware_key" => &mut self.hardware_key,
            "software_product" => &mut self.software_product,
            "software_product_limit" => &mut self.software_product_limit,
            "installation_number" => &mut self.installation_number,
            "begin_of_validity" => &mut self.begin_of_validity,
            "end_of_validity" => &mut self.end_of_validity,
            "system_number" => &mut self.system_number,
            "validity" => &mut self.validity,
            "type_of_license_key" => &mut self.type_of_license_key,
            "last_successful_check" => &mut self.last_successful_check,
            _ => return None,
        };
        Some(slot)
    }

    /// Set a field by its normalized key name.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.slot(key) {
            Some(slot) => *slot = Some(value),
            None => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Builder form of [`LicenseRecord::set`].
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Read a field by its normalized key name.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "system" => &self.system,
            "hardware_key" => &self.hardware_key,
            "software_product" => &self.software_product,
            "software_product_limit" => &self.software_product_limit,
            "installation_number" => &self.installation_number,
            "begin_of_validity" => &self.begin_of_validity,
            "end_of_validity" => &self.end_of_validity,
            "system_number" => &self.system_number,
            "validity" => &self.validity,
            "type_of_license_key" => &self.type_of_license_key,
            "last_successful_check" => &self.last_successful_check,
            _ => return self.extra.get(key).map(String::as_str),
        };
        value.as_deref()
    }

    /// Clear a field by its normalized key name.
    pub fn remove(&mut self, key: &str) {
        match self.slot(key) {
            Some(slot) => *slot = None,
            None => {
                self.extra.remove(key);
            }
        }
    }

    /// Copy of this record with the given fields cleared.
    pub fn without<S: AsRef<str>>(&self, fields: &[S]) -> Self {
        let mut stripped = self.clone();
        for field in fields {
            stripped.remove(field.as_ref());
        }
        stripped
    }

    /// Whether this (desired) record is the same license as an observed one.
    ///
    /// `ignored` fields are stripped from the observed record first, so the
    /// system-only metadata of a live record does not cause a mismatch.
    pub fn matches_installed<S: AsRef<str>>(&self, observed: &LicenseRecord, ignored: &[S]) -> bool {
        *self == observed.without(ignored)
    }

    /// Whether this is a maintenance license.
    pub fn is_maintenance(&self) -> bool {
        self.software_product
            .as_deref()
            .is_some_and(|p| p.starts_with(MAINTENANCE_PREFIX))
    }

    /// Whether the tool reports this license as valid.
    pub fn is_valid(&self) -> bool {
        self.validity.as_deref() == Some("valid")
    }

    /// Whether this license is owned by the given SID.
    pub fn is_owned_by(&self, sid: &str) -> bool {
        self.system.as_deref() == Some(sid)
    }

    /// Parsed expiry date, if present and well-formed.
    pub fn expires_on(&self) -> Option<NaiveDate> {
        let raw = self.end_of_validity.as_deref()?;
        NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").ok()
    }
}

impl fmt::Display for LicenseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}",
            self.system.as_deref().unwrap_or("?"),
            self.hardware_key.as_deref().unwrap_or("?"),
            self.software_product.as_deref().unwrap_or("?")
        )
    }
}

/// Summary information reported by `saplikey -get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemInfo(BTreeMap<String, String>);

impl SystemInfo {
    /// Create an empty info mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a normalized key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a normalized key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Hardware key of the host the instance runs on.
    pub fn hardware_key(&self) -> Option<&str> {
        self.get("hardware_key")
    }

    /// Product list used when requesting a temporary license.
    pub fn software_products(&self) -> Option<&str> {
        self.get("software_products")
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no entries were parsed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Which licenses a `-delete` call targets.
///
/// Hardware key and product are glob patterns expanded by saplikey itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteScope {
    /// SID the licenses were issued for
    pub owner: String,
    /// Hardware key pattern
    pub hardware_key: String,
    /// Product pattern
    pub product: String,
}

impl DeleteScope {
    /// All licenses of an owner (`<owner> * *`).
    pub fn all(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            hardware_key: "*".to_string(),
            product: "*".to_string(),
        }
    }

    /// Exactly the given license.
    ///
    /// `None` when the record lacks its owner, hardware key or product,
    /// since no scope would target that record alone.
    pub fn record(record: &LicenseRecord) -> Option<Self> {
        Some(Self {
            owner: record.system.clone()?,
            hardware_key: record.hardware_key.clone()?,
            product: record.software_product.clone()?,
        })
    }

    /// Restrict to a hardware key pattern.
    pub fn with_hardware_key(mut self, pattern: impl Into<String>) -> Self {
        self.hardware_key = pattern.into();
        self
    }

    /// Restrict to a product pattern.
    pub fn with_product(mut self, pattern: impl Into<String>) -> Self {
        self.product = pattern.into();
        self
    }
}

impl fmt::Display for DeleteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.owner, self.hardware_key, self.product)
    }
}

/// Captured output of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (`None` when killed by a signal)
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command that exited with code 0.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a command that exited with the given code.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with code 0.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Numeric ids of an OS user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIds {
    /// User id
    pub uid: u32,
    /// Primary group id
    pub gid: u32,
}

/// Settings for locating and running saplikey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Timeout for every saplikey invocation
    pub timeout: Duration,
    /// Profile path, `{SID}` is replaced by the upper-case SID
    pub profile_template: String,
    /// Executable name inside the kernel directory
    pub tool_name: String,
    /// Environment variable holding the kernel directory
    pub library_var: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            profile_template: "/sapmnt/{SID}/profile/DEFAULT.PFL".to_string(),
            tool_name: "saplikey".to_string(),
            library_var: "DIR_LIBRARY".to_string(),
        }
    }
}

impl Settings {
    /// Profile path for a SID.
    pub fn profile_path(&self, sid: &str) -> String {
        self.profile_template.replace("{SID}", &sid.to_uppercase())
    }
}

/// OS user that owns an instance (`<sid>adm`).
pub fn sidadm(sid: &str) -> String {
    format!("{}adm", sid.to_lowercase())
}
