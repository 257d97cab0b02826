//! Status probing through the control binary

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, trace};

use super::error::ProbeError;
use super::profile::{ProfileId, ProfileState};

/// Queries the live state of a profile. Implementations may block.
pub trait StatusProbe: Send + Sync {
    /// Raw human-readable status text for `profile`
    fn probe(&self, profile: &ProfileId) -> Result<String, ProbeError>;

    /// Probe and map the output to a state; failures map to `Unknown`
    fn state(&self, profile: &ProfileId) -> ProfileState {
        probed_state(self.probe(profile))
    }
}

/// Map a probe result to the state to paint
pub fn probed_state(result: Result<String, ProbeError>) -> ProfileState {
    match result {
        Ok(output) => ProfileState::from_status_output(&output),
        Err(e) => {
            debug!("Status probe failed: {}", e);
            ProfileState::Unknown
        }
    }
}

/// Runs `<control-binary> status --profile <id>` and captures stdout
pub struct ControlStatusProbe {
    control_binary: PathBuf,
}

impl ControlStatusProbe {
    pub fn new(control_binary: PathBuf) -> Self {
        Self { control_binary }
    }
}

impl StatusProbe for ControlStatusProbe {
    fn probe(&self, profile: &ProfileId) -> Result<String, ProbeError> {
        let mut cmd = Command::new(&self.control_binary);
        cmd.args(["status", "--profile", profile.as_str()])
            .stdin(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
        }

        // The exit status is ignored; only the text is meaningful
        let output = cmd.output().map_err(|source| ProbeError::Launch {
            profile: profile.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!("Status of '{}': {:?}", profile, stdout.trim());
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_launch_error() {
        let probe = ControlStatusProbe::new(PathBuf::from("/nonexistent/profiletray-ctl"));
        let err = probe.probe(&ProfileId::from("dev")).unwrap_err();
        assert!(matches!(err, ProbeError::Launch { .. }));
        assert_eq!(probe.state(&ProfileId::from("dev")), ProfileState::Unknown);
    }

    #[cfg(unix)]
    #[test]
    fn parses_status_from_control_binary_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("ctl");
        std::fs::write(
            &bin,
            "#!/bin/sh\nif [ \"$3\" = \"dev\" ]; then echo 'Minishift:  Running'; else echo 'Does Not Exist'; fi\n",
        )
        .unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let probe = ControlStatusProbe::new(bin);
        assert_eq!(probe.state(&ProfileId::from("dev")), ProfileState::Running);
        assert_eq!(
            probe.state(&ProfileId::from("test")),
            ProfileState::DoesNotExist
        );
    }
}
