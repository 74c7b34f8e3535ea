//! Hand a file to the OS default viewer
//!
//! Last-resort path: when every silent strategy failed, the operator
//! triggers the physical print from their PDF viewer. "Opened" is the
//! strongest guarantee available here.

use crate::error::{PrintError, PrintResult};
use std::path::Path;
use tokio::process::Command;
use tracing::{info, instrument};

/// Open `path` with the platform's default handler
///
/// The viewer process is not awaited; success means the launch was
/// handed off to the OS.
#[instrument(fields(path = %path.display()))]
pub async fn open_with_default_handler(path: &Path) -> PrintResult<()> {
    let mut cmd = launch_command(path);

    cmd.spawn()
        .map_err(|e| PrintError::Spooler(format!("viewer launch failed: {}", e)))?;

    info!("file handed to OS default viewer");
    Ok(())
}

#[cfg(target_os = "windows")]
fn launch_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    // Empty quoted title keeps `start` from eating the path argument
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn launch_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launch_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}
