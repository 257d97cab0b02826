//! Windows launch strategy: batch script started through PowerShell

use std::os::windows::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::core::error::DispatchError;

const CREATE_NO_WINDOW: u32 = 0x08000000;
const POWERSHELL: &str = "powershell.exe";

/// Write a `.bat` script and hand it to `Start-Process`, which opens it in
/// its own console window and returns immediately.
pub fn launch_script(path: &Path, contents: &str) -> Result<(), DispatchError> {
    std::fs::write(path, contents).map_err(|source| DispatchError::ScriptCreate {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote launch script {}", path.display());

    // Single quotes are literal in PowerShell; embedded ones are doubled
    let quoted = path.display().to_string().replace('\'', "''");
    let status = Command::new(POWERSHELL)
        .args([
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            &format!("Start-Process -FilePath '{}'", quoted),
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .creation_flags(CREATE_NO_WINDOW)
        .status();

    super::check_launcher(POWERSHELL, status)?;
    info!("Launched {}", path.display());
    Ok(())
}
