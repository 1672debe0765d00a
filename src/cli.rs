use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "likey")]
#[command(version)]
#[command(about = "Declarative SAP license key management via saplikey", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/config.toml)
    #[arg(short, long, global = true, env = "LIKEY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show system license information (saplikey -get)
    Info(SidArgs),

    /// List installed licenses (saplikey -show)
    Show(SidArgs),

    /// Parse a license file without installing it
    Read {
        /// License file
        file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Install all licenses of a license file
    Install {
        /// SID of the SAP system
        sid: String,

        /// License file (must be readable by <sid>adm)
        file: PathBuf,
    },

    /// Delete licenses
    Delete(DeleteArgs),

    /// Install a temporary license
    Temp {
        /// SID of the SAP system
        sid: String,

        /// Software product, e.g. NetWeaver_HDB
        product: String,
    },

    /// Ensure licenses are installed
    Present(PresentArgs),

    /// Ensure licenses are removed
    Absent(AbsentArgs),

    /// Converge all states declared in the config
    Apply(ApplyArgs),

    /// Show what apply would change
    Status(StatusArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct SidArgs {
    /// SID of the SAP system
    pub sid: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// SID of the SAP system
    pub sid: String,

    /// SID the licenses were issued for (defaults to SID)
    #[arg(long)]
    pub owner: Option<String>,

    /// Hardware key pattern
    #[arg(long, default_value = "*")]
    pub hwkey: String,

    /// Product pattern
    #[arg(long, default_value = "*")]
    pub product: String,
}

#[derive(Parser)]
pub struct PresentArgs {
    /// SID of the SAP system
    pub sid: String,

    /// License file; without it a temporary license is installed unless a
    /// valid one exists
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Keep licenses issued for other SIDs
    #[arg(long)]
    pub keep_other_sid: bool,

    /// Keep licenses bound to other hardware keys
    #[arg(long)]
    pub keep_other_hwkey: bool,

    /// Dry run - show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct AbsentArgs {
    /// SID of the SAP system
    pub sid: String,

    /// Only remove licenses issued for SID
    #[arg(long)]
    pub only_own: bool,

    /// Dry run - show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only apply states matching: present, absent, a SID, or present.S4H
    pub target: Option<String>,

    /// Dry run - show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Only check states matching: present, absent, a SID, or present.S4H
    pub target: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_present() {
        let cli = Cli::try_parse_from([
            "likey", "-vv", "present", "S4H", "--file", "/tmp/S4H.txt", "--keep-other-sid", "-n",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Present(args) = cli.command else {
            panic!("expected present");
        };
        assert_eq!(args.sid, "S4H");
        assert_eq!(args.file, Some(PathBuf::from("/tmp/S4H.txt")));
        assert!(args.keep_other_sid);
        assert!(!args.keep_other_hwkey);
        assert!(args.dry_run);
    }

    #[test]
    fn test_delete_defaults_to_wildcards() {
        let cli = Cli::try_parse_from(["likey", "delete", "S4H"]).unwrap();
        let Command::Delete(args) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(args.owner, None);
        assert_eq!(args.hwkey, "*");
        assert_eq!(args.product, "*");
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["likey", "apply", "present", "-c", "/etc/likey.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/likey.toml")));
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.target.as_deref(), Some("present"));
        assert!(!args.dry_run);
    }
}
