//! Dispatching start/stop actions to the control binary

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

use super::error::DispatchError;
use super::profile::{ProfileAction, ProfileId};
use crate::platform;

/// Triggers a start/stop of a profile as a detached process. May block
/// while the process is being launched, never until the action finishes.
pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&self, profile: &ProfileId, action: ProfileAction) -> Result<(), DispatchError>;
}

/// Launches `<control-binary> <verb> --profile <id>` through a generated script
pub struct ScriptDispatcher {
    control_binary: PathBuf,
    script_dir: PathBuf,
}

impl ScriptDispatcher {
    pub fn new(control_binary: PathBuf, script_dir: PathBuf) -> Self {
        if !platform::launch_supported() {
            warn!("Start/stop actions are not supported on this platform and will do nothing");
        }
        Self {
            control_binary,
            script_dir,
        }
    }

    /// Unique script path for one dispatch, so concurrent dispatches never
    /// overwrite each other's script
    pub fn script_path(&self, profile: &ProfileId, action: ProfileAction) -> PathBuf {
        let suffix = Uuid::new_v4().simple().to_string();
        self.script_dir.join(format!(
            "{}_{}_{}_{}.{}",
            crate::APP_NAME.to_lowercase(),
            file_safe(profile.as_str()),
            action.verb(),
            &suffix[..12],
            platform::SCRIPT_EXTENSION
        ))
    }

    fn script_contents(&self, profile: &ProfileId, action: ProfileAction) -> String {
        if cfg!(windows) {
            batch_script(&self.control_binary, profile, action)
        } else {
            shell_script(&self.control_binary, profile, action)
        }
    }
}

impl ActionDispatcher for ScriptDispatcher {
    fn dispatch(&self, profile: &ProfileId, action: ProfileAction) -> Result<(), DispatchError> {
        let path = self.script_path(profile, action);
        let contents = self.script_contents(profile, action);
        platform::launch_script(&path, &contents)?;
        info!("Dispatched {} for profile '{}'", action, profile);
        Ok(())
    }
}

/// Batch script body for Windows. The script deletes itself when done.
pub fn batch_script(control_binary: &Path, profile: &ProfileId, action: ProfileAction) -> String {
    format!(
        "@echo off\r\n\"{}\" {} --profile \"{}\"\r\n(goto) 2>nul & del \"%~f0\"\r\n",
        control_binary.display(),
        action.verb(),
        profile
    )
}

/// POSIX shell script body. The script deletes itself when done.
pub fn shell_script(control_binary: &Path, profile: &ProfileId, action: ProfileAction) -> String {
    format!(
        "#!/bin/sh\n{} {} --profile {}\nrm -f -- \"$0\"\n",
        shell_quote(&control_binary.display().to_string()),
        action.verb(),
        shell_quote(profile.as_str())
    )
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
