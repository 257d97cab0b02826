//! macOS launch strategy: executable shell script opened in Terminal.app

use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::core::error::DispatchError;

const OPEN: &str = "/usr/bin/open";
const SCRIPT_MODE: u32 = 0o744;

/// Write an executable script and open it in a new Terminal window.
pub fn launch_script(path: &Path, contents: &str) -> Result<(), DispatchError> {
    std::fs::write(path, contents).map_err(|source| DispatchError::ScriptCreate {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(SCRIPT_MODE)).map_err(
        |source| DispatchError::Permissions {
            path: path.to_path_buf(),
            source,
        },
    )?;
    debug!("Wrote launch script {}", path.display());

    let mut cmd = Command::new(OPEN);
    cmd.args(["-F", "-a", "Terminal.app"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // Detach from our session so the terminal outlives the tray
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    // `open` returns as soon as Terminal has accepted the document
    super::check_launcher(OPEN, cmd.status())?;
    info!("Launched {}", path.display());
    Ok(())
}
