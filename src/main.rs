mod cli;
mod commands;
mod config;
mod engine;
mod progress;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use declarative::CancelToken;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Desired-state file
    pub config_path: PathBuf,
    /// State file
    pub state_path: PathBuf,
    /// Overrides the provider's timeout
    pub timeout: Option<Duration>,
    /// Cancelled on Ctrl-C
    pub cancel: CancelToken,
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

    let state_path = cli
        .state
        .clone()
        .unwrap_or_else(|| config::default_state_path(&cli.config));

    let ctx = Context {
        quiet: cli.quiet,
        config_path: cli.config,
        state_path,
        timeout: cli.timeout.map(Duration::from_secs),
        cancel: interrupt_token(),
    };

    match cli.command {
        Command::Plan(args) => commands::lifecycle::plan(&ctx, args),
        Command::Apply(args) => commands::lifecycle::apply(&ctx, args),
        Command::Refresh => commands::lifecycle::refresh(&ctx),
        Command::Destroy(args) => commands::lifecycle::destroy(&ctx, args),
        Command::Show(args) => commands::lifecycle::show(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "terraurl", &mut io::stdout());
            Ok(())
        }
    }
}

/// Token cancelled by the first Ctrl-C; a second one exits right away
fn interrupt_token() -> CancelToken {
    let token = CancelToken::new();
    let handler = token.clone();
    let installed = ctrlc::set_handler(move || {
        if handler.is_cancelled() {
            std::process::exit(130);
        }
        eprintln!("Interrupted, stopping running transfers (Ctrl-C again to quit)");
        handler.cancel();
    });
    if let Err(e) = installed {
        log::warn!("Could not install Ctrl-C handler: {}", e);
    }
    token
}
