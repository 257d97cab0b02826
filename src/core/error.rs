//! Error types for the profile source, status probe and action dispatcher

use std::path::PathBuf;

use thiserror::Error;

use super::profile::{ProfileAction, ProfileId};

/// Failure to enumerate profiles
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read profiles directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to query a profile's status
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run status command for profile '{profile}': {source}")]
    Launch {
        profile: ProfileId,
        #[source]
        source: std::io::Error,
    },

    #[error("status probe for profile '{0}' did not complete")]
    Aborted(ProfileId),
}

/// Failure to launch a start/stop action
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to write script {}: {source}", path.display())]
    ScriptCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set permissions on script {}: {source}", path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {status}")]
    LauncherFailed { program: String, status: String },

    #[error("{action} of profile '{profile}' did not complete")]
    Aborted {
        profile: ProfileId,
        action: ProfileAction,
    },
}
