//! Declarative commands
//!
//! - `apply` - Converge all configured license states
//! - `status` - Preview what apply would change
//! - `present` / `absent` - Converge one state given on the command line

use anyhow::{Result, bail};

use super::{absolute, client, load_config};
use crate::Context;
use crate::cli::{AbsentArgs, PresentArgs};
use crate::engine::{self, ExecuteOptions, ExecuteSummary};
use crate::resource::{LicenseAbsent, LicensePresent, Resource};
use crate::ui;

pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool) -> Result<()> {
    run_configured(ctx, target, dry_run, ctx.verbose > 0)
}

pub fn status(ctx: &Context, target: Option<&str>) -> Result<()> {
    run_configured(ctx, target, true, true)
}

pub fn present(ctx: &Context, args: &PresentArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let mut state = LicensePresent::new(&args.sid)
        .remove_other_sid(!args.keep_other_sid)
        .remove_other_hwkey(!args.keep_other_hwkey)
        .with_ignored_fields(config.settings.ignored_fields.clone());
    if let Some(file) = &args.file {
        state = state.with_file(absolute(file)?);
    }

    let plan: Vec<Box<dyn Resource>> = vec![Box::new(state)];
    let summary = engine::execute(&plan, &client(&config), &options(args.dry_run, true))?;
    check(&summary)
}

pub fn absent(ctx: &Context, args: &AbsentArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let state = LicenseAbsent::new(&args.sid).remove_all(!args.only_own);

    let plan: Vec<Box<dyn Resource>> = vec![Box::new(state)];
    let summary = engine::execute(&plan, &client(&config), &options(args.dry_run, true))?;
    check(&summary)
}

fn run_configured(ctx: &Context, target: Option<&str>, dry_run: bool, verbose: bool) -> Result<()> {
    let config = load_config(ctx)?;
    if config.is_empty() {
        ui::warn("No license states declared in config");
        return Ok(());
    }

    let plan = engine::build_plan(&config, target);
    if plan.is_empty() {
        ui::warn(&format!("No license states match '{}'", target.unwrap_or_default()));
        return Ok(());
    }

    log::info!("Converging {} license states (dry run: {dry_run})", plan.len());
    let summary = engine::execute(&plan, &client(&config), &options(dry_run, verbose))?;
    check(&summary)
}

fn options(dry_run: bool, verbose: bool) -> ExecuteOptions {
    ExecuteOptions { dry_run, verbose }
}

fn check(summary: &ExecuteSummary) -> Result<()> {
    if !summary.is_success() {
        bail!("{} license state(s) failed", summary.failed);
    }
    Ok(())
}
