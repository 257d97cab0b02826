//! Profile identity, lifecycle state and user actions

use serde::{Deserialize, Serialize};

/// Unique, case-sensitive identifier for a profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Menu title for the profile: first letter of every word upper-cased
    pub fn title(&self) -> String {
        let mut title = String::with_capacity(self.0.len());
        let mut word_start = true;
        for c in self.0.chars() {
            if word_start && c.is_alphanumeric() {
                title.extend(c.to_uppercase());
                word_start = false;
            } else {
                title.push(c);
                word_start = c.is_whitespace() || c == '-' || c == '_';
            }
        }
        title
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ProfileId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Lifecycle state of a profile as reported by the control binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProfileState {
    /// Not probed yet, or the probe could not be run
    #[default]
    Unknown,
    Running,
    Stopped,
    /// The control binary knows nothing about the profile
    DoesNotExist,
}

impl ProfileState {
    /// Map the human-readable `status` output to a state.
    ///
    /// `"Running"` wins over `"Stopped"`; output containing neither means the
    /// profile has no backing environment.
    pub fn from_status_output(output: &str) -> Self {
        if output.contains("Running") {
            Self::Running
        } else if output.contains("Stopped") {
            Self::Stopped
        } else {
            Self::DoesNotExist
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::DoesNotExist => "Does Not Exist",
        }
    }

    pub fn all() -> &'static [ProfileState] {
        &[
            ProfileState::Unknown,
            ProfileState::Running,
            ProfileState::Stopped,
            ProfileState::DoesNotExist,
        ]
    }
}

/// User-initiated action on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileAction {
    Start,
    Stop,
}

impl ProfileAction {
    /// Subcommand passed to the control binary
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
        }
    }

    /// State painted once the action has been launched
    pub fn target_state(&self) -> ProfileState {
        match self {
            Self::Start => ProfileState::Running,
            Self::Stop => ProfileState::Stopped,
        }
    }

    pub fn all() -> &'static [ProfileAction] {
        &[ProfileAction::Start, ProfileAction::Stop]
    }
}

impl std::fmt::Display for ProfileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}
