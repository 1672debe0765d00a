mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Info(args) => commands::license::info(&ctx, &args),
        Command::Show(args) => commands::license::show(&ctx, &args),
        Command::Read { file, json } => commands::license::read(&ctx, &file, json),
        Command::Install { sid, file } => commands::license::install(&ctx, &sid, &file),
        Command::Delete(args) => commands::license::delete(&ctx, &args),
        Command::Temp { sid, product } => commands::license::temp(&ctx, &sid, &product),
        Command::Present(args) => commands::declarative::present(&ctx, &args),
        Command::Absent(args) => commands::declarative::absent(&ctx, &args),
        Command::Apply(args) => {
            commands::declarative::apply(&ctx, args.target.as_deref(), args.dry_run)
        }
        Command::Status(args) => commands::declarative::status(&ctx, args.target.as_deref()),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "likey", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result
        && let Some(err) = e.chain().find_map(|c| c.downcast_ref::<saplikey::Error>())
    {
        let category = err.category();
        ui::warn(&format!("{}: {}", category.description(), category.advice()));
    }
    result
}
