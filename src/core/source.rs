//! Profile enumeration

use std::path::PathBuf;

use tracing::trace;

use super::error::SourceError;
use super::profile::ProfileId;

/// Source of the currently known profile identifiers
pub trait ProfileSource: Send + Sync {
    /// List profiles in display order. Must be cheap and side-effect free.
    fn profile_list(&self) -> Result<Vec<ProfileId>, SourceError>;
}

/// Lists the default profile followed by each subdirectory of a profiles directory
pub struct DirectoryProfileSource {
    profiles_dir: PathBuf,
    default_profile: Option<ProfileId>,
}

impl DirectoryProfileSource {
    pub fn new(profiles_dir: PathBuf, default_profile: Option<ProfileId>) -> Self {
        Self {
            profiles_dir,
            default_profile,
        }
    }
}

impl ProfileSource for DirectoryProfileSource {
    fn profile_list(&self) -> Result<Vec<ProfileId>, SourceError> {
        let mut profiles: Vec<ProfileId> = self.default_profile.iter().cloned().collect();

        if !self.profiles_dir.is_dir() {
            return Ok(profiles);
        }

        let read_err = |source| SourceError::ReadDir {
            path: self.profiles_dir.clone(),
            source,
        };

        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.profiles_dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.file_type().map_err(read_err)?.is_dir() {
                continue;
            }
            // Profile names come from directory names; skip anything not UTF-8
            if let Ok(name) = entry.file_name().into_string() {
                found.push(ProfileId::new(name));
            }
        }
        found.sort();

        for profile in found {
            if !profiles.contains(&profile) {
                profiles.push(profile);
            }
        }

        trace!("Listed {} profiles", profiles.len());
        Ok(profiles)
    }
}
