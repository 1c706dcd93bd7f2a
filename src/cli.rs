use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "terraurl")]
#[command(author = "TerraURL Contributors")]
#[command(version)]
#[command(about = "Keep local files in sync with the content at remote URLs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Desired-state file
    #[arg(
        short,
        long,
        global = true,
        env = "TERRAURL_CONFIG",
        default_value = "terraurl.toml"
    )]
    pub config: PathBuf,

    /// State file (default: terraurl.state.json next to the config)
    #[arg(short, long, global = true, env = "TERRAURL_STATE")]
    pub state: Option<PathBuf>,

    /// Give up on network operations after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Refresh state and show what apply would change
    Plan(PlanArgs),

    /// Make local files match the configuration
    Apply(ApplyArgs),

    /// Update recorded state from reality without changing files
    Refresh,

    /// Remove every managed file
    Destroy(DestroyArgs),

    /// Show recorded state
    Show(ShowArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Only plan the named resource
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only apply the named resource
    #[arg(short, long)]
    pub target: Option<String>,

    /// Dry run - show what would be done
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of resources applied concurrently
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Only destroy the named resource
    #[arg(short, long)]
    pub target: Option<String>,

    /// Dry run - show what would be removed
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Only show the named resource
    pub name: Option<String>,

    /// Print raw JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "terraurl", "-c", "site.toml", "apply", "--dry-run", "-y", "-j", "2",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        match cli.command {
            Command::Apply(args) => {
                assert!(args.dry_run);
                assert!(args.yes);
                assert_eq!(args.jobs, 2);
                assert!(args.target.is_none());
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["terraurl", "plan", "-vv", "--timeout", "30", "-s", "x.json"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.state, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn test_show_args() {
        let cli = Cli::try_parse_from(["terraurl", "show", "tool", "--json"]).unwrap();
        match cli.command {
            Command::Show(args) => {
                assert_eq!(args.name.as_deref(), Some("tool"));
                assert!(args.json);
            }
            _ => panic!("expected show"),
        }
    }
}
