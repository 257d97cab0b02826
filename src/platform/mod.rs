//! Platform-specific launching of detached start/stop scripts

#[cfg(windows)]
pub mod windows;

#[cfg(target_os = "macos")]
pub mod macos;

use std::path::Path;

use crate::core::error::DispatchError;

/// Extension of generated launch scripts on this platform
#[cfg(windows)]
pub const SCRIPT_EXTENSION: &str = "bat";
#[cfg(not(windows))]
pub const SCRIPT_EXTENSION: &str = "sh";

/// Whether this platform has a launch strategy at all
pub const fn launch_supported() -> bool {
    cfg!(any(windows, target_os = "macos"))
}

/// Write `contents` to `path` and launch it detached from this process.
///
/// Returns once the launcher has handed the script off; the script itself is
/// not waited on. Unsupported platforms succeed without doing anything.
pub fn launch_script(path: &Path, contents: &str) -> Result<(), DispatchError> {
    #[cfg(windows)]
    {
        windows::launch_script(path, contents)
    }
    #[cfg(target_os = "macos")]
    {
        macos::launch_script(path, contents)
    }
    #[cfg(not(any(windows, target_os = "macos")))]
    {
        tracing::debug!(
            "No launch strategy on this platform, skipping {} ({} bytes)",
            path.display(),
            contents.len()
        );
        Ok(())
    }
}

/// Map a finished launcher process to a dispatch result
#[cfg(any(windows, target_os = "macos"))]
fn check_launcher(
    program: &str,
    status: std::io::Result<std::process::ExitStatus>,
) -> Result<(), DispatchError> {
    let status = status.map_err(|source| DispatchError::Launch {
        program: program.to_string(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(DispatchError::LauncherFailed {
            program: program.to_string(),
            status: status.to_string(),
        })
    }
}
