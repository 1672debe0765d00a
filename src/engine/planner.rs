//! Execution planner - config to license states

use crate::config::LikeyConfig;
use crate::resource::{LicenseAbsent, LicensePresent, Resource};

/// Build the states declared in `config`, in config order (`present`
/// entries first), keeping those matching `target`.
pub fn build_plan(config: &LikeyConfig, target: Option<&str>) -> Vec<Box<dyn Resource>> {
    let (resource_type, sid) = target.map_or((None, None), parse_target);
    let ignored = &config.settings.ignored_fields;

    let present = config.present.iter().map(|p| {
        let mut state = LicensePresent::new(&p.sid)
            .remove_other_sid(p.remove_other_sid)
            .remove_other_hwkey(p.remove_other_hwkey)
            .with_ignored_fields(ignored.clone());
        if let Some(path) = p.file_path(config.base_dir.as_deref()) {
            state = state.with_file(path);
        }
        Box::new(state) as Box<dyn Resource>
    });
    let absent = config.absent.iter().map(|a| {
        Box::new(LicenseAbsent::new(&a.sid).remove_all(a.remove_all)) as Box<dyn Resource>
    });

    present
        .chain(absent)
        .filter(|r| matches_filter(r.as_ref(), resource_type.as_deref(), sid.as_deref()))
        .collect()
}

/// Parse a target string like "present.S4H" into (state kind, SID)
///
/// A single word is a kind when it names one (`present`, `absent`),
/// otherwise a SID.
pub fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = target.split('.').collect();
    match parts.as_slice() {
        [kind] if is_kind(kind) => (Some((*kind).to_string()), None),
        [sid] => (None, Some((*sid).to_string())),
        [kind, sid] => (Some((*kind).to_string()), Some((*sid).to_string())),
        _ => (None, Some(target.to_string())),
    }
}

fn is_kind(word: &str) -> bool {
    matches!(word, "present" | "absent")
}

/// Check if a state matches the filter
pub fn matches_filter(resource: &dyn Resource, kind: Option<&str>, sid: Option<&str>) -> bool {
    if let Some(kind) = kind
        && resource.resource_type() != format!("license_{kind}")
    {
        return false;
    }

    if let Some(sid) = sid
        && !resource.sid().eq_ignore_ascii_case(sid)
    {
        return false;
    }

    true
}
