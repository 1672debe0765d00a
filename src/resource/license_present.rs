//! License present resource
//!
//! Converges an instance towards either the licenses of a license file or,
//! without a file, towards holding at least one valid license (falling back
//! to a temporary one).

use anyhow::Result;
use saplikey::{DeleteScope, LicenseRecord, SYSTEM_ONLY_FIELDS, sidadm};
use std::path::{Path, PathBuf};

use super::{ApplyContext, Resource, StateResult, escalate, remove_license};

/// Licenses that must be installed on an instance
#[derive(Debug, Clone)]
pub struct LicensePresent {
    pub sid: String,
    pub filename: Option<PathBuf>,
    pub remove_other_sid: bool,
    pub remove_other_hwkey: bool,
    pub ignored_fields: Vec<String>,
}

impl LicensePresent {
    pub fn new(sid: &str) -> Self {
        Self {
            sid: sid.to_uppercase(),
            filename: None,
            remove_other_sid: true,
            remove_other_hwkey: true,
            ignored_fields: SYSTEM_ONLY_FIELDS.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.filename = Some(path.into());
        self
    }

    pub fn remove_other_sid(mut self, remove: bool) -> Self {
        self.remove_other_sid = remove;
        self
    }

    pub fn remove_other_hwkey(mut self, remove: bool) -> Self {
        self.remove_other_hwkey = remove;
        self
    }

    /// Fields stripped from installed licenses before comparing them with
    /// the license file.
    pub fn with_ignored_fields(mut self, fields: Vec<String>) -> Self {
        self.ignored_fields = fields;
        self
    }

    /// Remove every license failing `keep`, in observed order.
    ///
    /// Returns the kept licenses, or `None` once a removal failed.
    fn prune(
        &self,
        ctx: &ApplyContext,
        licenses: Vec<LicenseRecord>,
        keep: impl Fn(&LicenseRecord) -> bool,
        ret: &mut StateResult,
    ) -> Result<Option<Vec<LicenseRecord>>> {
        let mut kept = Vec::with_capacity(licenses.len());
        for license in licenses {
            if keep(&license) {
                kept.push(license);
                continue;
            }
            log::debug!("Removing license {license} from {}", self.sid);
            if !remove_license(ctx, &self.sid, &license, ret)? {
                return Ok(None);
            }
        }
        Ok(Some(kept))
    }

    fn converge(&self, ctx: &ApplyContext, ret: &mut StateResult) -> Result<()> {
        let sid = self.sid.as_str();

        log::debug!("Retrieving system info for {sid}");
        let info = match escalate(ctx.client.info(sid))? {
            Ok(info) => info,
            Err(e) => {
                ret.fail(format!("Could not retrieve system info for {sid}: {e}"));
                return Ok(());
            }
        };

        log::debug!("Retrieving installed licenses for {sid}");
        let mut remaining = match escalate(ctx.client.show(sid))? {
            Ok(licenses) => licenses,
            Err(e) => {
                ret.fail(format!("Could not retrieve licenses of {sid}: {e}"));
                return Ok(());
            }
        };

        if self.remove_other_sid {
            log::debug!("Removing licenses not assigned to {sid}");
            match self.prune(ctx, remaining, |l| l.is_owned_by(sid), ret)? {
                Some(kept) => remaining = kept,
                None => return Ok(()),
            }
        }

        if self.remove_other_hwkey {
            let Some(hardware_key) = info.hardware_key() else {
                ret.fail(format!("Could not determine the hardware key of {sid}"));
                return Ok(());
            };
            log::debug!("Removing licenses not assigned to hardware key {hardware_key}");
            let keep = |l: &LicenseRecord| l.hardware_key.as_deref() == Some(hardware_key);
            match self.prune(ctx, remaining, keep, ret)? {
                Some(kept) => remaining = kept,
                None => return Ok(()),
            }
        }

        match &self.filename {
            Some(path) => self.ensure_file(ctx, path, &remaining, ret),
            None => self.ensure_valid(ctx, info.software_products(), &remaining, ret),
        }
    }

    /// Install the license file unless every license in it is installed.
    ///
    /// The `<sid> * *` delete before installing is skipped when none of the
    /// remaining licenses belongs to the SID, as it would remove nothing.
    fn ensure_file(
        &self,
        ctx: &ApplyContext,
        path: &Path,
        installed: &[LicenseRecord],
        ret: &mut StateResult,
    ) -> Result<()> {
        let sid = self.sid.as_str();
        let file = path.display();

        log::debug!("Reading license file {file}");
        let desired = match escalate(ctx.client.read_license_file(path))? {
            Ok(licenses) => licenses,
            Err(e) => {
                ret.fail(format!("Could not read license file {file}: {e}"));
                return Ok(());
            }
        };
        if desired.is_empty() {
            ret.fail(format!("License file {file} contains no licenses"));
            return Ok(());
        }

        let all_installed = desired.iter().all(|wanted| {
            installed
                .iter()
                .any(|have| wanted.matches_installed(have, &self.ignored_fields))
        });
        if all_installed {
            log::debug!("All licenses are already installed correctly");
            ret.comment = "All licenses are already installed correctly".to_string();
            return Ok(());
        }

        let owned: Vec<&LicenseRecord> = installed.iter().filter(|l| l.is_owned_by(sid)).collect();
        if !owned.is_empty() {
            log::debug!("Not all licenses are installed, removing all licenses for {sid}");
            if ctx.dry_run {
                for license in &owned {
                    ret.changes
                        .old
                        .push(format!("SAP system license {license} would be removed"));
                }
            } else {
                if let Err(e) = escalate(ctx.client.delete(sid, &DeleteScope::all(sid)))? {
                    ret.fail(format!("Could not remove licenses of system {sid}: {e}"));
                    return Ok(());
                }
                for license in &owned {
                    ret.changes.old.push(format!("SAP system license {license}"));
                }
            }
        }

        if !self.ensure_readable(ctx, path, ret)? {
            return Ok(());
        }

        log::debug!("Installing licenses from {file}");
        if ctx.dry_run {
            for license in &desired {
                ret.changes
                    .new
                    .push(format!("SAP system license {license} would be installed"));
            }
            ret.comment = "Licenses would be installed".to_string();
            return Ok(());
        }

        if let Err(e) = escalate(ctx.client.install(sid, path))? {
            ret.fail(format!("Could not install licenses from {file} on {sid}: {e}"));
            return Ok(());
        }
        for license in &desired {
            ret.changes.new.push(format!("SAP system license {license}"));
        }
        ret.comment = "Installed licenses".to_string();
        Ok(())
    }

    /// Make `<sid>adm` the owner of the license file.
    fn ensure_readable(&self, ctx: &ApplyContext, path: &Path, ret: &mut StateResult) -> Result<bool> {
        let fs = ctx.client.fs();
        let user = sidadm(&self.sid);
        let file = path.display();

        let owner = match escalate(fs.owner(path))? {
            Ok(owner) => owner,
            Err(e) => {
                ret.fail(format!("Could not determine the owner of {file}: {e}"));
                return Ok(false);
            }
        };
        if owner == user {
            return Ok(true);
        }

        log::debug!("Ensuring that {user} owns {file}");
        let ids = match escalate(fs.lookup_user(&user))? {
            Ok(ids) => ids,
            Err(e) => {
                ret.fail(format!("Could not look up user {user}: {e}"));
                return Ok(false);
            }
        };

        if ctx.dry_run {
            ret.changes.new.push(format!(
                "Would change owner of {file} to uid {} / gid {}",
                ids.uid, ids.gid
            ));
            return Ok(true);
        }

        if let Err(e) = escalate(fs.chown(path, ids))? {
            ret.fail(format!("Could not change the owner of {file} to {user}: {e}"));
            return Ok(false);
        }
        ret.changes.new.push(format!(
            "Changed owner of {file} to uid {} / gid {}",
            ids.uid, ids.gid
        ));
        Ok(true)
    }

    /// Keep a valid non-maintenance license or add a temporary one.
    ///
    /// Before adding the temporary license, `<sid> * *` is deleted only when
    /// a remaining license belongs to the SID.
    fn ensure_valid(
        &self,
        ctx: &ApplyContext,
        products: Option<&str>,
        installed: &[LicenseRecord],
        ret: &mut StateResult,
    ) -> Result<()> {
        let sid = self.sid.as_str();

        log::debug!("No license file defined, checking for a valid license");
        if installed.iter().any(|l| !l.is_maintenance() && l.is_valid()) {
            ret.comment = format!("System {sid} already has a valid license");
            return Ok(());
        }

        let Some(products) = products else {
            ret.fail(format!("Could not determine the software products of {sid}"));
            return Ok(());
        };

        if installed.iter().any(|l| l.is_owned_by(sid)) {
            log::debug!("No valid license found, removing all licenses of {sid}");
            if ctx.dry_run {
                ret.changes
                    .old
                    .push(format!("SAP system {sid} license would be deleted"));
            } else {
                if let Err(e) = escalate(ctx.client.delete(sid, &DeleteScope::all(sid)))? {
                    ret.fail(format!("Could not remove licenses of system {sid}: {e}"));
                    return Ok(());
                }
                ret.changes.old.push(format!("SAP system {sid} license"));
            }
        }

        log::debug!("Adding temporary license for {products}");
        if ctx.dry_run {
            ret.changes.new.push(format!(
                "SAP system {sid} temporary license for {products} would be added"
            ));
            ret.comment = "Temporary license would be added".to_string();
            return Ok(());
        }

        if let Err(e) = escalate(ctx.client.temp(sid, products))? {
            ret.fail(format!(
                "Could not add temporary license for system {sid} for {products}: {e}"
            ));
            return Ok(());
        }
        ret.changes
            .new
            .push(format!("SAP system {sid} temporary license for {products}"));
        ret.comment = "Added temporary license".to_string();
        Ok(())
    }
}

impl Resource for LicensePresent {
    fn id(&self) -> String {
        format!("present:{}", self.sid)
    }

    fn description(&self) -> String {
        match &self.filename {
            Some(path) => format!("Install licenses from {} on {}", path.display(), self.sid),
            None => format!("Ensure {} holds a valid license", self.sid),
        }
    }

    fn resource_type(&self) -> &'static str {
        "license_present"
    }

    fn sid(&self) -> &str {
        &self.sid
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<StateResult> {
        let mut ret = StateResult::new(&self.sid);
        self.converge(ctx, &mut ret)?;
        Ok(ret.finish(ctx.dry_run))
    }
}
