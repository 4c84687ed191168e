//! fpw CLI - password-gated shell access to folders.
//!
//! `fpw set` protects a folder, `fpw enter` opens a shell inside it after
//! checking the password (or reusing a recent session), `fpw remove`
//! lifts the protection and `fpw list` shows what is protected.

mod shell;
mod terminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fpw_common::FolderPath;
use fpw_gate::{AccessController, GateConfig, PasswordChange, PasswordPrompt, Protection};
use shell::ShellSignals;
use terminal::TerminalPrompt;

#[derive(Parser, Debug)]
#[command(name = "fpw")]
#[command(about = "fpw - Password-gated shell access to folders")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding credentials and sessions (default: ~/.config/fpw).
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set or change the password of a folder.
    Set {
        /// Folder to protect.
        folder: PathBuf,
    },

    /// Unlock a folder and start a shell inside it.
    Enter {
        /// Protected folder.
        folder: PathBuf,
    },

    /// Remove the password from a folder.
    Remove {
        /// Protected folder.
        folder: PathBuf,
    },

    /// List protected folders and their session status.
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", error_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Refusals are printed as they are; tool failures get the full context chain.
fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<fpw_common::Error>() {
        Some(e) if e.is_denial() => e.to_string(),
        _ => format!("Error: {:#}", err),
    }
}

/// Exit code for a command line that did not parse.
///
/// Help and version output are successes; everything else is a usage error.
fn usage_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match cli.config_dir {
        Some(dir) => GateConfig::new(dir),
        None => GateConfig::from_default_dir()?,
    };

    match cli.command {
        Commands::Set { folder } => cmd_set(config, &folder),
        Commands::Enter { folder } => cmd_enter(config, &folder).await,
        Commands::Remove { folder } => cmd_remove(config, &folder),
        Commands::List => cmd_list(config),
    }
}

/// Set or change a folder password.
fn cmd_set(config: GateConfig, path: &Path) -> Result<ExitCode> {
    let folder = FolderPath::resolve(path)?;
    let mut controller = AccessController::open(config)?;

    match controller.set_password(&folder, &mut TerminalPrompt)? {
        PasswordChange::Created => println!("Password set for '{}'.", folder),
        PasswordChange::Changed => println!("Password changed for '{}'.", folder),
    }

    Ok(ExitCode::SUCCESS)
}

/// Unlock a folder and run a shell in it.
async fn cmd_enter(config: GateConfig, path: &Path) -> Result<ExitCode> {
    let folder = FolderPath::resolve(path)?;

    // Listen before a session can exist so no signal leaves it behind.
    let mut signals = ShellSignals::new()?;
    let code = enter_folder(
        config,
        &folder,
        &shell::shell_program(),
        &mut TerminalPrompt,
        &mut signals,
    )
    .await?;

    Ok(ExitCode::from(code))
}

/// Authenticate, run `program` in the folder and tear the session down.
async fn enter_folder(
    config: GateConfig,
    folder: &FolderPath,
    program: &str,
    prompt: &mut dyn PasswordPrompt,
    signals: &mut ShellSignals,
) -> Result<u8> {
    let mut controller = AccessController::open(config)?;

    let guard = controller.enter(folder, prompt)?;
    if guard.reused_session() {
        println!("Existing session used.");
    }
    println!("Access granted: {}", guard.folder());

    let status = shell::run_shell(program, guard.folder(), signals).await;

    // Tear down before reporting anything about the shell.
    guard.close()?;
    let code = status?;
    info!("Left {} with exit code {}", folder, code);

    Ok(code)
}

/// Remove a folder password.
fn cmd_remove(config: GateConfig, path: &Path) -> Result<ExitCode> {
    let folder = FolderPath::resolve(path)?;
    let mut controller = AccessController::open(config)?;

    controller.remove_password(&folder, &mut TerminalPrompt)?;
    println!("Protection removed from '{}'.", folder);

    Ok(ExitCode::SUCCESS)
}

/// List protected folders.
fn cmd_list(config: GateConfig) -> Result<ExitCode> {
    let controller = AccessController::open(config)?;
    let statuses = controller.list();

    if statuses.is_empty() {
        println!("No protected folders.");
    } else {
        println!("Protected folders:");
        for status in statuses {
            match status.protection {
                Protection::Locked => println!("  [locked]  {}", status.folder),
                Protection::ActiveSession { idle_seconds } => println!(
                    "  [active]  {} (idle {})",
                    status.folder,
                    format_idle(idle_seconds)
                ),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Human-readable idle time, e.g. `12m 05s`.
fn format_idle(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m {:02}s", minutes, secs)
    }
}
