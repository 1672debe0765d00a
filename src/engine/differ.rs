//! Result display - what changed (or would change) per state

use colored::Colorize;

use super::executor::ExecuteSummary;
use crate::resource::{Resource, StateResult, Status};

/// Status symbol of a result
pub fn symbol(status: Status) -> colored::ColoredString {
    match status {
        Status::Ok => "✓".green(),
        Status::WouldChange => "~".yellow(),
        Status::Failed => "✗".red(),
    }
}

/// Print one state result with its changes
pub fn display_result(resource: &dyn Resource, result: &StateResult) {
    let status = result.status();
    println!();
    println!(
        "  {} {} {}",
        symbol(status),
        resource.id().bold(),
        resource.description().dimmed()
    );

    for removed in &result.changes.old {
        println!("      {} {}", "-".red(), removed);
    }
    for added in &result.changes.new {
        println!("      {} {}", "+".green(), added);
    }

    let comment = match status {
        Status::Failed => result.comment.red(),
        Status::WouldChange => result.comment.yellow(),
        Status::Ok => result.comment.dimmed(),
    };
    println!("      {comment}");
}

/// Print the totals of a run
pub fn display_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if !summary.is_success() {
        println!("  {} Licenses converged with errors", "⚠".yellow().bold());
    } else if dry_run && summary.would_apply > 0 {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else {
        println!("  {} Licenses converged", "✓".green().bold());
    }

    if summary.applied > 0 {
        println!("    • {} states changed", summary.applied);
    }
    if summary.would_apply > 0 {
        println!("    • {} states would change", summary.would_apply);
    }
    if summary.no_op > 0 {
        println!("    • {} states already converged", summary.no_op);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "states".red());
    }
}
