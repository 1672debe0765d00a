//! License absent resource

use anyhow::Result;

use super::{ApplyContext, Resource, StateResult, escalate, remove_license};

/// Licenses that must not be installed on an instance
#[derive(Debug, Clone)]
pub struct LicenseAbsent {
    pub sid: String,
    /// Also remove licenses issued for other SIDs
    pub remove_all: bool,
}

impl LicenseAbsent {
    pub fn new(sid: &str) -> Self {
        Self {
            sid: sid.to_uppercase(),
            remove_all: true,
        }
    }

    pub fn remove_all(mut self, remove_all: bool) -> Self {
        self.remove_all = remove_all;
        self
    }
}

impl Resource for LicenseAbsent {
    fn id(&self) -> String {
        format!("absent:{}", self.sid)
    }

    fn description(&self) -> String {
        if self.remove_all {
            format!("Remove all licenses from {}", self.sid)
        } else {
            format!("Remove licenses of {} from {}", self.sid, self.sid)
        }
    }

    fn resource_type(&self) -> &'static str {
        "license_absent"
    }

    fn sid(&self) -> &str {
        &self.sid
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<StateResult> {
        let mut ret = StateResult::new(&self.sid);

        let installed = match escalate(ctx.client.show(&self.sid))? {
            Ok(licenses) => licenses,
            Err(e) => {
                ret.fail(format!("Could not retrieve licenses of {}: {e}", self.sid));
                return Ok(ret.finish(ctx.dry_run));
            }
        };

        for license in installed
            .iter()
            .filter(|l| self.remove_all || l.is_owned_by(&self.sid))
        {
            log::debug!("Removing license {license} from {}", self.sid);
            if !remove_license(ctx, &self.sid, license, &mut ret)? {
                break;
            }
        }

        Ok(ret.finish(ctx.dry_run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{FakeHost, HWKEY, PRODUCT, SID, license};
    use crate::resource::{NO_CHANGES, Outcome, Status};
    use saplikey::LicenseRecord;

    fn host() -> FakeHost {
        FakeHost::new()
            .with_license(license(SID, HWKEY, PRODUCT, "valid"))
            .with_license(license("M70", HWKEY, PRODUCT, "valid"))
            .with_license(license(SID, HWKEY, "Maintenance_HDB", "valid"))
    }

    fn apply(host: &FakeHost, state: &LicenseAbsent, dry_run: bool) -> StateResult {
        let client = host.client();
        state.apply(&ApplyContext::new(&client, dry_run)).unwrap()
    }

    #[test]
    fn test_remove_all() {
        let host = host();
        let ret = apply(&host, &LicenseAbsent::new(SID), false);

        assert!(ret.success);
        assert_eq!(ret.outcome, Outcome::Applied);
        assert_eq!(ret.changes.old.len(), 3);
        assert!(host.installed().is_empty());

        let again = apply(&host, &LicenseAbsent::new(SID), false);
        assert_eq!(again.comment, NO_CHANGES);
        assert_eq!(again.outcome, Outcome::NoOp);
    }

    #[test]
    fn test_only_own_licenses() {
        let host = host();
        let ret = apply(&host, &LicenseAbsent::new(SID).remove_all(false), false);

        assert!(ret.success);
        for call in host.mutating_calls() {
            assert_eq!(call[0], "-delete");
            assert_eq!(call[1], SID);
        }
        assert_eq!(host.mutating_calls().len(), 2);
        assert_eq!(host.installed(), vec![license("M70", HWKEY, PRODUCT, "valid")]);
    }

    #[test]
    fn test_dry_run() {
        let host = host();
        let ret = apply(&host, &LicenseAbsent::new(SID), true);

        assert!(host.mutating_calls().is_empty());
        assert_eq!(ret.status(), Status::WouldChange);
        assert_eq!(
            ret.changes.old[1],
            "SAP system license M70 / Z0123456789 / NetWeaver_HDB would be removed"
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let host = host().failing("-delete");
        let ret = apply(&host, &LicenseAbsent::new(SID), false);

        assert!(!ret.success);
        assert_eq!(host.mutating_calls().len(), 1);
        assert!(ret.comment.contains("S4H / Z0123456789 / NetWeaver_HDB"));
    }

    #[test]
    fn test_incomplete_license_is_never_deleted() {
        let mut orphan = license(SID, HWKEY, PRODUCT, "valid");
        orphan.system = None;
        let host = FakeHost::new()
            .with_license(orphan)
            .with_license(license(SID, HWKEY, PRODUCT, "valid"));
        let ret = apply(&host, &LicenseAbsent::new(SID), false);

        assert!(!ret.success);
        assert!(ret.comment.starts_with("Refusing to remove license ? / Z0123456789"));
        assert!(host.mutating_calls().is_empty());
    }

    #[test]
    fn test_empty_trailing_block_is_never_deleted() {
        let host = FakeHost::new()
            .with_license(license(SID, HWKEY, PRODUCT, "valid"))
            .with_license(LicenseRecord::new());
        let ret = apply(&host, &LicenseAbsent::new(SID), false);

        assert!(!ret.success);
        assert_eq!(ret.changes.old, vec!["SAP system license S4H / Z0123456789 / NetWeaver_HDB"]);
        assert_eq!(host.mutating_calls(), vec![vec!["-delete", SID, HWKEY, PRODUCT]]);
    }

    #[test]
    fn test_show_failure() {
        let host = host().failing("-show");
        let ret = apply(&host, &LicenseAbsent::new(SID), false);
        assert!(!ret.success);
        assert!(ret.comment.starts_with("Could not retrieve licenses of S4H"));
    }
}
