//! In-memory SAP host used by the resource tests.
//!
//! One [`FakeHost`] answers both the saplikey commands and the file system
//! calls, so an install can read the license file that was registered with
//! [`FakeHost::with_file`].

use saplikey::backend::{Backend, FileSystem};
use saplikey::{Client, CommandOutput, Error, LicenseRecord, Settings, UserIds};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const SID: &str = "S4H";
pub(crate) const HWKEY: &str = "Z0123456789";
pub(crate) const PRODUCT: &str = "NetWeaver_HDB";

#[derive(Default)]
struct Host {
    hardware_key: Option<String>,
    software_products: Option<String>,
    installed: Vec<LicenseRecord>,
    calls: Vec<Vec<String>>,
    failing: Option<&'static str>,
    files: BTreeMap<PathBuf, String>,
    owners: BTreeMap<PathBuf, String>,
    users: BTreeMap<String, UserIds>,
    chowns: Vec<(PathBuf, UserIds)>,
}

#[derive(Clone)]
pub(crate) struct FakeHost(Arc<Mutex<Host>>);

impl FakeHost {
    /// Host running `S4H` on hardware key `Z0123456789`.
    pub fn new() -> Self {
        let mut host = Host {
            hardware_key: Some(HWKEY.to_string()),
            software_products: Some(PRODUCT.to_string()),
            ..Host::default()
        };
        host.users
            .insert("s4hadm".to_string(), UserIds { uid: 1001, gid: 1001 });
        Self(Arc::new(Mutex::new(host)))
    }

    pub fn without_hardware_key(self) -> Self {
        self.0.lock().unwrap().hardware_key = None;
        self
    }

    pub fn without_software_products(self) -> Self {
        self.0.lock().unwrap().software_products = None;
        self
    }

    pub fn with_license(self, record: LicenseRecord) -> Self {
        self.0.lock().unwrap().installed.push(record);
        self
    }

    pub fn with_file(self, path: &str, content: &str, owner: &str) -> Self {
        {
            let mut host = self.0.lock().unwrap();
            host.files.insert(PathBuf::from(path), content.to_string());
            host.owners.insert(PathBuf::from(path), owner.to_string());
        }
        self
    }

    /// Make every call of a saplikey function (e.g. `-delete`) exit non-zero.
    pub fn failing(self, function: &'static str) -> Self {
        self.0.lock().unwrap().failing = Some(function);
        self
    }

    pub fn client(&self) -> Client {
        Client::with_backend(
            Box::new(self.clone()),
            Box::new(self.clone()),
            Settings::default(),
        )
    }

    /// saplikey invocations without the profile argument.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.0.lock().unwrap().calls.clone()
    }

    /// Invocations that change the license store.
    pub fn mutating_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call[0].as_str(), "-delete" | "-install" | "-temp"))
            .collect()
    }

    pub fn installed(&self) -> Vec<LicenseRecord> {
        self.0.lock().unwrap().installed.clone()
    }

    pub fn chowns(&self) -> Vec<(PathBuf, UserIds)> {
        self.0.lock().unwrap().chowns.clone()
    }
}

/// A license as `saplikey -show` reports it.
pub(crate) fn license(system: &str, hardware_key: &str, product: &str, validity: &str) -> LicenseRecord {
    LicenseRecord::new()
        .with("system", system)
        .with("hardware_key", hardware_key)
        .with("software_product", product)
        .with("validity", validity)
        .with("type_of_license_key", "permanent")
        .with("last_successful_check", "20260101")
}

/// License file text for `(system, hardware_key, product)` entries.
pub(crate) fn license_file(entries: &[(&str, &str, &str)]) -> String {
    let mut out = String::new();
    for (system, hardware_key, product) in entries {
        out.push_str("----- Begin SAP License -----\n");
        out.push_str(&format!("SAPSYSTEM={system}\n"));
        out.push_str(&format!("HARDWARE-KEY={hardware_key}\n"));
        out.push_str(&format!("SWPRODUCTNAME={product}\n"));
        out.push_str("LKEY=MIIBOwYJKoZIhvcNAQcCoIIBLDCCASgCAQExCzAJBgUrDgMC\n");
    }
    out
}

fn glob_match(pattern: &str, value: Option<&str>) -> bool {
    let value = value.unwrap_or_default();
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => value == pattern,
    }
}

impl Host {
    fn render_info(&self) -> String {
        let mut out = String::from("saplikey: Version 753\n\n");
        if let Some(hardware_key) = &self.hardware_key {
            out.push_str(&format!("Hardware Key        : {hardware_key}\n"));
        }
        out.push_str("Installation No.    : 0020000000\n");
        if let Some(products) = &self.software_products {
            out.push_str(&format!("Software Products   : {products}\n"));
        }
        out
    }

    fn render_show(&self) -> String {
        let mut out = String::from("saplikey: Version 753\n\n");
        for (i, record) in self.installed.iter().enumerate() {
            out.push_str(&format!("{}. License Key:\n---------------\n", i + 1));
            let fields = serde_json::to_value(record).unwrap();
            for (key, value) in fields.as_object().unwrap() {
                let key = key.replace('_', " ");
                out.push_str(&format!("{key:<28}: {}\n", value.as_str().unwrap()));
            }
            out.push('\n');
        }
        out
    }

    fn install(&mut self, sid: &str, path: &Path) -> CommandOutput {
        let Some(content) = self.files.get(path) else {
            return CommandOutput::failure(2, format!("cannot open {}", path.display()));
        };
        if self.owners.get(path).map(String::as_str) != Some(saplikey::sidadm(sid).as_str()) {
            return CommandOutput::failure(2, format!("permission denied: {}", path.display()));
        }
        for record in saplikey::parse_license_file(content) {
            let record = record
                .with("validity", "valid")
                .with("type_of_license_key", "permanent")
                .with("last_successful_check", "20260101");
            self.installed.push(record);
        }
        CommandOutput::success("")
    }
}

impl Backend for FakeHost {
    fn run_as(
        &self,
        user: &str,
        _program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> saplikey::Result<CommandOutput> {
        let mut host = self.0.lock().unwrap();
        let call: Vec<String> = args[1..].to_vec();
        host.calls.push(call.clone());

        if host.failing == Some(call[0].as_str()) {
            return Ok(CommandOutput::failure(1, "simulated failure"));
        }

        let sid = user.trim_end_matches("adm").to_uppercase();
        let output = match call[0].as_str() {
            "-get" => CommandOutput::success(host.render_info()),
            "-show" => CommandOutput::success(host.render_show()),
            "-install" => host.install(&sid, Path::new(&call[1])),
            "-delete" => {
                host.installed.retain(|r| {
                    !(r.system.as_deref() == Some(call[1].as_str())
                        && glob_match(&call[2], r.hardware_key.as_deref())
                        && glob_match(&call[3], r.software_product.as_deref()))
                });
                CommandOutput::success("")
            }
            "-temp" => {
                let record = license(
                    &sid,
                    host.hardware_key.as_deref().unwrap_or_default(),
                    &call[1],
                    "valid",
                )
                .with("type_of_license_key", "temporary");
                host.installed.push(record);
                CommandOutput::success("")
            }
            other => CommandOutput::failure(1, format!("unknown function {other}")),
        };
        Ok(output)
    }

    fn env_as(&self, user: &str, _var: &str) -> saplikey::Result<String> {
        let sid = user.trim_end_matches("adm").to_uppercase();
        Ok(format!("/usr/sap/{sid}/SYS/exe/run"))
    }
}

impl FileSystem for FakeHost {
    fn read_to_string(&self, path: &Path) -> saplikey::Result<String> {
        self.0.lock().unwrap().files.get(path).cloned().ok_or_else(|| Error::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    }

    fn owner(&self, path: &Path) -> saplikey::Result<String> {
        self.0
            .lock()
            .unwrap()
            .owners
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Other(format!("no owner for {}", path.display())))
    }

    fn chown(&self, path: &Path, ids: UserIds) -> saplikey::Result<()> {
        let mut host = self.0.lock().unwrap();
        let name = host
            .users
            .iter()
            .find(|(_, user)| **user == ids)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| ids.uid.to_string());
        host.owners.insert(path.to_path_buf(), name);
        host.chowns.push((path.to_path_buf(), ids));
        Ok(())
    }

    fn lookup_user(&self, name: &str) -> saplikey::Result<UserIds> {
        self.0
            .lock()
            .unwrap()
            .users
            .get(name)
            .copied()
            .ok_or_else(|| Error::Other(format!("no such user: {name}")))
    }
}
