//! In-memory collaborators for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::error::{DispatchError, ProbeError, SourceError};
use super::menu::{click_channel, ClickSender, ClickSignal, MenuToolkit};
use super::profile::{ProfileAction, ProfileId, ProfileState};
use super::{ActionDispatcher, ProfileSource, StatusProbe};

pub fn ids(names: &[&str]) -> Vec<ProfileId> {
    names.iter().map(|n| ProfileId::from(*n)).collect()
}

#[derive(Debug)]
pub struct FakeSubmenu {
    profile: ProfileId,
}

#[derive(Debug)]
pub struct FakeItem {
    profile: ProfileId,
    action: ProfileAction,
}

/// Records every toolkit call instead of drawing anything
#[derive(Default)]
pub struct FakeToolkit {
    created: AtomicUsize,
    released: AtomicUsize,
    icons: Mutex<HashMap<ProfileId, ProfileState>>,
    hidden: Mutex<Vec<ProfileId>>,
    routes: Mutex<HashMap<(ProfileId, ProfileAction), ClickSender>>,
}

impl FakeToolkit {
    pub fn submenus_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Icon currently shown by the visible submenu of `profile`
    pub fn icon(&self, profile: &ProfileId) -> Option<ProfileState> {
        self.icons.lock().unwrap().get(profile).copied()
    }

    pub fn hidden(&self) -> Vec<ProfileId> {
        self.hidden.lock().unwrap().clone()
    }

    /// Simulate a user click; `false` if the item has no live subscriber
    pub fn click(&self, profile: &ProfileId, action: ProfileAction) -> bool {
        self.routes
            .lock()
            .unwrap()
            .get(&(profile.clone(), action))
            .is_some_and(|sender| sender.click())
    }
}

impl MenuToolkit for FakeToolkit {
    type Submenu = FakeSubmenu;
    type Item = FakeItem;

    fn add_submenu(&self, profile: &ProfileId) -> FakeSubmenu {
        self.created.fetch_add(1, Ordering::SeqCst);
        FakeSubmenu {
            profile: profile.clone(),
        }
    }

    fn add_item(&self, parent: &FakeSubmenu, action: ProfileAction) -> FakeItem {
        FakeItem {
            profile: parent.profile.clone(),
            action,
        }
    }

    fn hide(&self, submenu: &FakeSubmenu) {
        self.icons.lock().unwrap().remove(&submenu.profile);
        self.hidden.lock().unwrap().push(submenu.profile.clone());
    }

    fn set_icon(&self, submenu: &FakeSubmenu, state: ProfileState) {
        self.icons
            .lock()
            .unwrap()
            .insert(submenu.profile.clone(), state);
    }

    fn click_signal(&self, item: &FakeItem) -> ClickSignal {
        let (sender, signal) = click_channel();
        self.routes
            .lock()
            .unwrap()
            .insert((item.profile.clone(), item.action), sender);
        signal
    }

    fn release(&self, item: FakeItem) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.routes
            .lock()
            .unwrap()
            .remove(&(item.profile, item.action));
    }
}

/// Profile list that tests can swap at any time
#[derive(Default)]
pub struct FakeSource {
    profiles: Mutex<Option<Vec<ProfileId>>>,
}

impl FakeSource {
    pub fn new(names: &[&str]) -> Self {
        let source = Self::default();
        source.set(names);
        source
    }

    pub fn set(&self, names: &[&str]) {
        *self.profiles.lock().unwrap() = Some(ids(names));
    }

    /// Make every following listing fail
    pub fn fail(&self) {
        *self.profiles.lock().unwrap() = None;
    }
}

impl ProfileSource for FakeSource {
    fn profile_list(&self) -> Result<Vec<ProfileId>, SourceError> {
        self.profiles
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::ReadDir {
                path: "fake".into(),
                source: std::io::Error::other("listing failed"),
            })
    }
}

/// Canned status output per profile; unknown profiles fail to launch
#[derive(Default)]
pub struct FakeProbe {
    outputs: Mutex<HashMap<ProfileId, String>>,
    panics: AtomicBool,
}

impl FakeProbe {
    /// Make every following probe panic
    pub fn panic_on_probe(&self) {
        self.panics.store(true, Ordering::SeqCst);
    }

    pub fn set(&self, profile: &str, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(ProfileId::from(profile), output.to_string());
    }
}

impl StatusProbe for FakeProbe {
    fn probe(&self, profile: &ProfileId) -> Result<String, ProbeError> {
        if self.panics.load(Ordering::SeqCst) {
            panic!("status probe for '{}' crashed", profile);
        }
        self.outputs
            .lock()
            .unwrap()
            .get(profile)
            .cloned()
            .ok_or_else(|| ProbeError::Launch {
                profile: profile.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

/// Records dispatches and succeeds unless told to fail or panic
#[derive(Default)]
pub struct FakeDispatcher {
    fail: AtomicBool,
    panics: AtomicBool,
    calls: Mutex<Vec<(ProfileId, ProfileAction)>>,
}

impl FakeDispatcher {
    pub fn failing() -> Self {
        let dispatcher = Self::default();
        dispatcher.fail.store(true, Ordering::SeqCst);
        dispatcher
    }

    pub fn panicking() -> Self {
        let dispatcher = Self::default();
        dispatcher.panics.store(true, Ordering::SeqCst);
        dispatcher
    }

    pub fn calls(&self) -> Vec<(ProfileId, ProfileAction)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ActionDispatcher for FakeDispatcher {
    fn dispatch(&self, profile: &ProfileId, action: ProfileAction) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push((profile.clone(), action));
        if self.panics.load(Ordering::SeqCst) {
            panic!("{} of '{}' crashed", action, profile);
        }
        if self.fail.load(Ordering::SeqCst) {
            Err(DispatchError::Launch {
                program: "fake".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        } else {
            Ok(())
        }
    }
}
