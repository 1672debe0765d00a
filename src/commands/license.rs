//! Direct saplikey commands: inspect, install, delete, temp

use anyhow::{Context as AnyhowContext, Result};
use chrono::Local;
use colored::Colorize;
use saplikey::{DeleteScope, LicenseRecord, SystemInfo};
use serde::Serialize;
use std::path::Path;

use super::{absolute, client, load_config};
use crate::Context;
use crate::cli::{DeleteArgs, SidArgs};
use crate::ui;

pub fn info(ctx: &Context, args: &SidArgs) -> Result<()> {
    let client = client(&load_config(ctx)?);
    let info = client
        .info(&args.sid)
        .with_context(|| format!("Could not retrieve system info for {}", args.sid))?;

    if args.json {
        return print_json(&info);
    }
    print_info(&args.sid.to_uppercase(), &info);
    Ok(())
}

pub fn show(ctx: &Context, args: &SidArgs) -> Result<()> {
    let client = client(&load_config(ctx)?);
    let licenses = client
        .show(&args.sid)
        .with_context(|| format!("Could not retrieve licenses of {}", args.sid))?;

    if args.json {
        return print_json(&licenses);
    }
    print_licenses(&format!("Licenses of {}", args.sid.to_uppercase()), &licenses);
    Ok(())
}

pub fn read(ctx: &Context, file: &Path, json: bool) -> Result<()> {
    let client = client(&load_config(ctx)?);
    let licenses = client.read_license_file(file)?;

    if json {
        return print_json(&licenses);
    }
    print_licenses(&format!("Licenses in {}", file.display()), &licenses);
    Ok(())
}

pub fn install(ctx: &Context, sid: &str, file: &Path) -> Result<()> {
    let client = client(&load_config(ctx)?);
    let file = absolute(file)?;
    client
        .install(sid, &file)
        .with_context(|| format!("Could not install {} on {sid}", file.display()))?;
    if !ctx.quiet {
        ui::success(&format!("Installed licenses from {}", file.display()));
    }
    Ok(())
}

pub fn delete(ctx: &Context, args: &DeleteArgs) -> Result<()> {
    let client = client(&load_config(ctx)?);
    let owner = args.owner.as_deref().unwrap_or(&args.sid).to_uppercase();
    let scope = DeleteScope::all(owner)
        .with_hardware_key(&args.hwkey)
        .with_product(&args.product);

    client
        .delete(&args.sid, &scope)
        .with_context(|| format!("Could not delete licenses {scope}"))?;
    if !ctx.quiet {
        ui::success(&format!("Deleted licenses {scope}"));
    }
    Ok(())
}

pub fn temp(ctx: &Context, sid: &str, product: &str) -> Result<()> {
    let client = client(&load_config(ctx)?);
    client
        .temp(sid, product)
        .with_context(|| format!("Could not add temporary license for {product} on {sid}"))?;
    if !ctx.quiet {
        ui::success(&format!("Added temporary license for {product}"));
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_info(sid: &str, info: &SystemInfo) {
    ui::header(&format!("System {sid}"));
    if info.is_empty() {
        ui::dim("saplikey reported no system information");
        return;
    }
    for (key, value) in info.iter() {
        ui::kv(key, value);
    }
}

fn print_licenses(title: &str, licenses: &[LicenseRecord]) {
    ui::header(title);
    if licenses.is_empty() {
        ui::info("No licenses found");
        return;
    }

    let today = Local::now().date_naive();
    for license in licenses {
        let marker = match license.validity.as_deref() {
            Some("valid") => "✓".green(),
            Some(_) => "✗".red(),
            None => "•".dimmed(),
        };
        println!();
        println!("{} {}", marker, license.to_string().bold());
        if let Some(kind) = &license.type_of_license_key {
            ui::kv("type", kind);
        }
        if let Some(validity) = &license.validity {
            ui::kv("validity", validity);
        }
        if let Some(instno) = &license.installation_number {
            ui::kv("installation number", instno);
        }
        if license.end_of_validity.is_some() {
            ui::kv("expiry", &ui::format_expiry(license.expires_on(), today));
        }
        if license.is_maintenance() {
            ui::dim("maintenance license");
        }
    }
}
