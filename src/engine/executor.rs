//! Execution engine - sequential convergence of license states

use anyhow::{Context as AnyhowContext, Result};
use saplikey::Client;

use crate::resource::{ApplyContext, Resource, StateResult, Status};

use super::differ::{display_result, display_summary};

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Print states without changes as well
    pub verbose: bool,
}

/// Summary of execution results
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub applied: usize,
    pub would_apply: usize,
    pub no_op: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    pub fn from_results(results: &[StateResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match (result.status(), result.changes.is_empty()) {
                (Status::Failed, _) => summary.failed += 1,
                (Status::WouldChange, _) => summary.would_apply += 1,
                (Status::Ok, true) => summary.no_op += 1,
                (Status::Ok, false) => summary.applied += 1,
            }
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Converge every state in order.
///
/// `on_result` sees each result as soon as its state is done. A fatal
/// error aborts the run; states after it are not attempted.
pub fn run(
    resources: &[Box<dyn Resource>],
    ctx: &ApplyContext,
    mut on_result: impl FnMut(&dyn Resource, &StateResult),
) -> Result<Vec<StateResult>> {
    let mut results = Vec::with_capacity(resources.len());
    for resource in resources {
        log::info!("Applying {}", resource.id());
        let result = resource
            .apply(ctx)
            .with_context(|| format!("Failed to apply {}", resource.id()))?;
        log::debug!("{}: {:?} {}", result.name, result.outcome, result.comment);
        on_result(resource.as_ref(), &result);
        results.push(result);
    }
    Ok(results)
}

/// Execute the plan with UI output
pub fn execute(
    resources: &[Box<dyn Resource>],
    client: &Client,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    let ctx = ApplyContext::new(client, opts.dry_run);
    let results = run(resources, &ctx, |resource, result| {
        if opts.verbose || result.status() != Status::Ok || !result.changes.is_empty() {
            display_result(resource, result);
        }
    })?;

    let summary = ExecuteSummary::from_results(&results);
    display_summary(&summary, opts.dry_run);
    Ok(summary)
}
