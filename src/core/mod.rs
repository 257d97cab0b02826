//! Core module - Profile roster registry, reconciliation loops and action dispatch

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod handler;
pub mod menu;
pub mod probe;
pub mod profile;
pub mod registry;
pub mod settings;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{ActionDispatcher, ScriptDispatcher};
pub use engine::Engine;
pub use menu::{click_channel, ClickSender, ClickSignal, MenuEntry, MenuToolkit};
pub use probe::{ControlStatusProbe, StatusProbe};
pub use profile::{ProfileAction, ProfileId, ProfileState};
pub use registry::MenuRegistry;
pub use settings::{PollIntervals, Settings};
pub use source::{DirectoryProfileSource, ProfileSource};
