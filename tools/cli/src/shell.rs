//! Protected shell process.
//!
//! The shell runs in the folder with its path exported. While it runs,
//! terminal interrupts are left to the shell; termination and hangup
//! signals sent to fpw stop the shell so the session can be torn down.

use std::process::ExitStatus;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use fpw_common::FolderPath;

/// Environment variable carrying the protected folder's path.
pub const FOLDER_ENV: &str = "FPW_FOLDER";

/// Shell used when `$SHELL` is unset.
const FALLBACK_SHELL: &str = "/bin/sh";

/// The user's login shell.
pub fn shell_program() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|shell| !shell.is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}

/// Prompt string marking the protected context.
pub fn prompt_for(folder: &FolderPath) -> String {
    format!("[fpw:{}] \\w \\$ ", folder.name())
}

/// Build the shell command for a folder.
pub fn shell_command(program: &str, folder: &FolderPath) -> Command {
    let mut command = Command::new(program);
    command
        .current_dir(folder.to_path_buf())
        .env(FOLDER_ENV, folder.as_str())
        .env("PS1", prompt_for(folder))
        .kill_on_drop(true);
    command
}

/// Run `program` in the folder and wait for it to exit.
///
/// `signals` must be listening before any session exists, so a signal
/// arriving between unlock and spawn is handled here instead of killing
/// the gate.
///
/// # Returns
/// The process exit code to report: the shell's own code, or
/// `128 + signal` if the shell was killed by a signal.
pub async fn run_shell(
    program: &str,
    folder: &FolderPath,
    signals: &mut ShellSignals,
) -> Result<u8> {
    info!("Starting {} in {}", program, folder);
    let mut child = shell_command(program, folder)
        .spawn()
        .with_context(|| format!("Failed to start shell '{}'", program))?;

    let status = signals.wait(&mut child).await?;
    debug!("Shell exited with {}", status);
    Ok(exit_code(status))
}

/// Signal listeners held while a session is open.
///
/// Interrupts are absorbed; terminate and hangup stop the shell.
#[cfg(unix)]
pub struct ShellSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShellSignals {
    /// Start listening. From here on the signals no longer terminate fpw.
    pub fn new() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("Failed to listen for SIGINT")?,
            terminate: signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?,
            hangup: signal(SignalKind::hangup()).context("Failed to listen for SIGHUP")?,
        })
    }

    async fn wait(&mut self, child: &mut Child) -> Result<ExitStatus> {
        loop {
            tokio::select! {
                status = child.wait() => {
                    return status.context("Failed to wait for shell");
                }
                _ = self.interrupt.recv() => {
                    debug!("Interrupt received, shell keeps running");
                }
                _ = self.terminate.recv() => {
                    warn!("Terminate received, stopping shell");
                    child.start_kill().context("Failed to stop shell")?;
                }
                _ = self.hangup.recv() => {
                    warn!("Hangup received, stopping shell");
                    child.start_kill().context("Failed to stop shell")?;
                }
            }
        }
    }
}

/// Signal listeners held while a session is open.
#[cfg(not(unix))]
pub struct ShellSignals;

#[cfg(not(unix))]
impl ShellSignals {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn wait(&mut self, child: &mut Child) -> Result<ExitStatus> {
        loop {
            tokio::select! {
                status = child.wait() => {
                    return status.context("Failed to wait for shell");
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("Interrupt received, shell keeps running");
                }
            }
        }
    }
}

/// Map a shell's exit status to fpw's exit code.
fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return (code & 0xff) as u8;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return (128 + signal).min(255) as u8;
        }
    }

    1
}
