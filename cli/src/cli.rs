//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Validate the Guest Proxy Agent VM extension install on this machine
#[derive(Parser)]
#[command(
    name = "extcheck",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Config file (default: ~/.extcheck/config.yaml)
    #[arg(long, global = true, env = "EXTCHECK_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log verbosity on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full install validation flow
    Validate(commands::validate::ValidateArgs),

    /// Find the installed extension directory
    Locate,

    /// Wait for the extension handler status
    Status,

    /// Make sure a helper package is installed
    EnsurePackage(commands::ensure_package::EnsurePackageArgs),

    /// Wait for the companion process to run
    CheckProcess(commands::check_process::CheckProcessArgs),

    /// Remove the extension and stage a replacement package
    Reinstall(commands::reinstall::ReinstallArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Log filter for `-v` flags; `RUST_LOG` takes precedence.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            config,
            verbose: _,
            command,
        } = self;
        let app = AppContext::new(
            &AppFlags {
                no_color,
                quiet,
                json,
                config,
            },
            cancel,
        );
        match command {
            Command::Validate(args) => commands::validate::run(&app, args).await,
            Command::Locate => commands::locate::run(&app).await,
            Command::Status => commands::status::run(&app).await,
            Command::EnsurePackage(args) => commands::ensure_package::run(&app, args).await,
            Command::CheckProcess(args) => commands::check_process::run(&app, args).await,
            Command::Reinstall(args) => commands::reinstall::run(&app, args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
