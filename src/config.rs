//! Declarative configuration (`config.toml`)
//!
//! ```toml
//! [settings]
//! timeout_secs = 60
//!
//! [[present]]
//! sid = "S4H"
//! file = "/sapmnt/S4H/licenses/S4H.txt"
//!
//! [[absent]]
//! sid = "M70"
//! remove_all = false
//! ```

use anyhow::{Context, Result, bail};
use saplikey::{SYSTEM_ONLY_FIELDS, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LikeyConfig {
    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub present: Vec<PresentConfig>,

    #[serde(default)]
    pub absent: Vec<AbsentConfig>,

    /// Directory of the loaded config file; relative license files
    /// resolve against it
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// How saplikey is located and run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub timeout_secs: u64,
    /// Profile path, `{SID}` is replaced by the SID
    pub profile_template: String,
    pub tool_name: String,
    /// Environment variable of `<sid>adm` holding the kernel directory
    pub library_var: String,
    /// Fields ignored when comparing installed licenses with a license file
    pub ignored_fields: Vec<String>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            profile_template: defaults.profile_template,
            tool_name: defaults.tool_name,
            library_var: defaults.library_var,
            ignored_fields: SYSTEM_ONLY_FIELDS.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

impl SettingsConfig {
    pub fn to_settings(&self) -> Settings {
        Settings {
            timeout: Duration::from_secs(self.timeout_secs),
            profile_template: self.profile_template.clone(),
            tool_name: self.tool_name.clone(),
            library_var: self.library_var.clone(),
        }
    }
}

/// A `[[present]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentConfig {
    pub sid: String,

    /// License file; without one a valid or temporary license is ensured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default = "default_true")]
    pub remove_other_sid: bool,

    #[serde(default = "default_true")]
    pub remove_other_hwkey: bool,
}

impl PresentConfig {
    /// License file with `~` and variables expanded, made absolute.
    ///
    /// saplikey runs as `<sid>adm` in its home directory, so a relative
    /// path is joined to `base_dir` (or the working directory).
    pub fn file_path(&self, base_dir: Option<&Path>) -> Option<PathBuf> {
        let path = paths::expand(self.file.as_deref()?);
        if path.is_absolute() {
            return Some(path);
        }
        Some(match base_dir {
            Some(dir) => dir.join(path),
            None => std::path::absolute(&path).unwrap_or(path),
        })
    }
}

/// An `[[absent]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsentConfig {
    pub sid: String,

    #[serde(default = "default_true")]
    pub remove_all: bool,
}

fn default_true() -> bool {
    true
}

impl LikeyConfig {
    /// Load the config from `path`, or from the config directory.
    ///
    /// A missing default config yields the default settings without any
    /// states; an explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (paths::config_file()?, false),
        };

        if !path.exists() {
            if explicit {
                bail!("Config file not found: {}", path.display());
            }
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.base_dir = std::path::absolute(&path)?.parent().map(Path::to_path_buf);
        log::debug!(
            "Loaded {} present and {} absent states from {}",
            config.present.len(),
            config.absent.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format in likey config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.settings.timeout_secs == 0 {
            bail!("settings.timeout_secs must be greater than zero");
        }
        if !self.settings.profile_template.contains("{SID}") {
            bail!("settings.profile_template must contain {{SID}}");
        }
        let sids = self
            .present
            .iter()
            .map(|p| p.sid.as_str())
            .chain(self.absent.iter().map(|a| a.sid.as_str()));
        for sid in sids {
            if sid.is_empty() || !sid.chars().all(|c| c.is_ascii_alphanumeric()) {
                bail!("Invalid SID '{sid}': expected letters and digits only");
            }
        }
        Ok(())
    }

    /// Whether any state is declared
    pub fn is_empty(&self) -> bool {
        self.present.is_empty() && self.absent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LikeyConfig::parse("").unwrap();
        assert!(config.is_empty());
        let settings = config.settings.to_settings();
        assert_eq!(settings, Settings::default());
        assert_eq!(config.settings.ignored_fields, SYSTEM_ONLY_FIELDS);
    }

    #[test]
    fn test_parse_states() {
        let config = LikeyConfig::parse(
            r#"
[settings]
timeout_secs = 60
ignored_fields = ["validity", "type_of_license_key", "last_successful_check", "license_check_status"]

[[present]]
sid = "S4H"
file = "/tmp/S4H.txt"
remove_other_hwkey = false

[[present]]
sid = "BW4"

[[absent]]
sid = "M70"
remove_all = false
"#,
        )
        .unwrap();

        assert_eq!(config.settings.to_settings().timeout, Duration::from_secs(60));
        assert_eq!(config.settings.ignored_fields.len(), 4);
        assert_eq!(config.settings.tool_name, "saplikey");

        assert!(!config.is_empty());
        assert_eq!(config.present.len(), 2);
        assert_eq!(config.present[0].file_path(None), Some(PathBuf::from("/tmp/S4H.txt")));
        assert!(config.present[0].remove_other_sid);
        assert!(!config.present[0].remove_other_hwkey);
        assert_eq!(config.present[1].file, None);
        assert!(config.present[1].remove_other_hwkey);

        assert!(!config.absent[0].remove_all);
    }

    #[test]
    fn test_invalid_values() {
        assert!(LikeyConfig::parse("[settings]\ntimeout_secs = 0\n").is_err());
        assert!(LikeyConfig::parse("[settings]\nprofile_template = \"/sapmnt/x\"\n").is_err());
        assert!(LikeyConfig::parse("[[present]]\nsid = \"S4H; rm\"\n").is_err());
        assert!(LikeyConfig::parse("[[absent]]\nremove_all = true\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[absent]]\nsid = \"S4H\"\n").unwrap();

        let config = LikeyConfig::load(Some(&path)).unwrap();
        assert_eq!(config.absent.len(), 1);
        assert!(config.absent[0].remove_all);
    }

    #[test]
    fn test_relative_file_resolves_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[present]]\nsid = \"S4H\"\nfile = \"licenses/S4H.txt\"\n").unwrap();

        let config = LikeyConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_dir.as_deref(), Some(dir.path()));
        assert_eq!(
            config.present[0].file_path(config.base_dir.as_deref()),
            Some(dir.path().join("licenses/S4H.txt"))
        );
    }

    #[test]
    fn test_relative_file_without_config_dir_is_absolute() {
        let config = LikeyConfig::parse("[[present]]\nsid = \"S4H\"\nfile = \"S4H.txt\"\n").unwrap();
        let path = config.present[0].file_path(None).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("S4H.txt"));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let err = LikeyConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
