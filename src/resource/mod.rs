//! Resource trait and types for declarative license management
//!
//! Every license state in likey is modeled as a Resource with:
//! - An apply function that converges observed → desired state
//! - Dry-run support that only reports what would change
//! - A [`StateResult`] describing removed and installed licenses

use anyhow::Result;
use saplikey::{Client, DeleteScope, LicenseRecord};
use std::fmt;

pub mod license_absent;
pub mod license_present;

#[cfg(test)]
pub(crate) mod testing;

pub use license_absent::LicenseAbsent;
pub use license_present::LicensePresent;

/// Comment of a result without changes.
pub const NO_CHANGES: &str = "No changes required";

/// What an apply run did to the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Changes were made
    Applied,
    /// Changes are pending (dry run)
    WouldApply,
    /// Nothing needed to change
    NoOp,
}

/// Tri-state summary of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged (or nothing to do)
    Ok,
    /// A step failed
    Failed,
    /// Dry run found pending changes
    WouldChange,
}

/// Removed and installed licenses, in the order they were handled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub old: Vec<String>,
    pub new: Vec<String>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }
}

/// Outcome of one convergence attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateResult {
    pub name: String,
    pub changes: Changes,
    pub comment: String,
    pub success: bool,
    pub outcome: Outcome,
}

impl StateResult {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            changes: Changes::default(),
            comment: String::new(),
            success: true,
            outcome: Outcome::NoOp,
        }
    }

    /// Mark as failed; the first failure wins.
    pub fn fail(&mut self, comment: impl Into<String>) {
        if self.success {
            self.success = false;
            self.comment = comment.into();
        }
    }

    /// Settle outcome and comment once all steps ran (or one failed).
    pub fn finish(mut self, dry_run: bool) -> Self {
        if self.changes.is_empty() {
            self.outcome = Outcome::NoOp;
            if self.success {
                self.comment = if self.comment.is_empty() {
                    NO_CHANGES.to_string()
                } else {
                    format!("{NO_CHANGES} ({})", self.comment)
                };
            }
            return self;
        }

        self.outcome = if dry_run {
            Outcome::WouldApply
        } else {
            Outcome::Applied
        };
        if self.comment.is_empty() {
            self.comment = if dry_run {
                "Licenses would be changed".to_string()
            } else {
                "Licenses changed".to_string()
            };
        }
        self
    }

    pub fn status(&self) -> Status {
        match (self.success, self.outcome) {
            (false, _) => Status::Failed,
            (true, Outcome::WouldApply) => Status::WouldChange,
            (true, _) => Status::Ok,
        }
    }
}

/// Context passed to apply operations
pub struct ApplyContext<'a> {
    pub dry_run: bool,
    pub client: &'a Client,
}

impl<'a> ApplyContext<'a> {
    pub fn new(client: &'a Client, dry_run: bool) -> Self {
        Self { dry_run, client }
    }
}

/// Core trait for all license states
pub trait Resource: fmt::Debug {
    /// Unique identifier (e.g., "present:S4H")
    fn id(&self) -> String;

    /// Human-readable description
    fn description(&self) -> String;

    /// Resource type category ("license_present", "license_absent")
    fn resource_type(&self) -> &'static str;

    /// SID this state manages
    fn sid(&self) -> &str;

    /// Converge the instance to the desired state.
    ///
    /// Failed steps are reported in the returned result; `Err` is reserved
    /// for an unusable environment and aborts the whole run.
    fn apply(&self, ctx: &ApplyContext) -> Result<StateResult>;
}

/// Split a saplikey result into fatal (returned as `Err`) and step failures.
pub(crate) fn escalate<T>(result: saplikey::Result<T>) -> Result<saplikey::Result<T>> {
    match result {
        Err(e) if e.is_fatal() => Err(e.into()),
        other => Ok(other),
    }
}

/// Delete exactly one license, or record that it would be deleted.
///
/// A record missing its owner, hardware key or product is never deleted.
/// Returns `false` after recording the failure in `ret`.
pub(crate) fn remove_license(
    ctx: &ApplyContext,
    sid: &str,
    license: &LicenseRecord,
    ret: &mut StateResult,
) -> Result<bool> {
    let Some(scope) = DeleteScope::record(license) else {
        ret.fail(format!(
            "Refusing to remove license {license}: owner, hardware key or product is missing"
        ));
        return Ok(false);
    };

    if ctx.dry_run {
        ret.changes
            .old
            .push(format!("SAP system license {license} would be removed"));
        return Ok(true);
    }

    match escalate(ctx.client.delete(sid, &scope))? {
        Ok(()) => {
            ret.changes.old.push(format!("SAP system license {license}"));
            Ok(true)
        }
        Err(e) => {
            ret.fail(format!("Could not remove license {license}: {e}"));
            Ok(false)
        }
    }
}
