//! Menu registry - The shared, lock-protected record of what the menu shows

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace};

use super::menu::{ClickSignal, MenuEntry, MenuToolkit};
use super::profile::{ProfileAction, ProfileId, ProfileState};

/// Start/stop item handles of one profile
struct ActionHandles<I> {
    start: I,
    stop: I,
}

impl<I> ActionHandles<I> {
    fn get(&self, action: ProfileAction) -> &I {
        match action {
            ProfileAction::Start => &self.start,
            ProfileAction::Stop => &self.stop,
        }
    }
}

/// Profile id -> menu entry mapping shared by all loops and handlers.
///
/// Locks are always taken in the order `entries` then `actions`, and never
/// held across an await point or blocking probe/dispatch work.
pub struct MenuRegistry<T: MenuToolkit> {
    toolkit: T,
    entries: Mutex<HashMap<ProfileId, T::Submenu>>,
    actions: Mutex<HashMap<ProfileId, ActionHandles<T::Item>>>,
}

/// Lock a map, recovering the data if another task panicked while holding it
fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: MenuToolkit> MenuRegistry<T> {
    pub fn new(toolkit: T) -> Self {
        Self {
            toolkit,
            entries: Mutex::new(HashMap::new()),
            actions: Mutex::new(HashMap::new()),
        }
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    /// Insert an entry built by `factory` unless `id` is already present.
    ///
    /// The factory runs under the lock, so two racing upserts can never both
    /// create visual entries. Returns whether an insertion happened.
    pub fn upsert<F>(&self, id: &ProfileId, factory: F) -> bool
    where
        F: FnOnce(&T, &ProfileId) -> MenuEntry<T>,
    {
        let mut entries = lock(&self.entries);
        if entries.contains_key(id) {
            trace!("Profile '{}' already in menu", id);
            return false;
        }

        let entry = factory(&self.toolkit, id);
        entries.insert(id.clone(), entry.submenu);
        lock(&self.actions).insert(
            id.clone(),
            ActionHandles {
                start: entry.start,
                stop: entry.stop,
            },
        );

        info!("Added profile '{}' to menu", id);
        true
    }

    /// Insert the standard `Start`/`Stop` entry for `id`
    pub fn upsert_default(&self, id: &ProfileId) -> bool {
        self.upsert(id, MenuEntry::build)
    }

    /// Hide and delete the entry for `id` along with its action routing.
    /// Returns whether anything was removed.
    pub fn remove(&self, id: &ProfileId) -> bool {
        let mut entries = lock(&self.entries);
        let Some(submenu) = entries.remove(id) else {
            return false;
        };
        self.toolkit.hide(&submenu);

        if let Some(handles) = lock(&self.actions).remove(id) {
            self.toolkit.release(handles.start);
            self.toolkit.release(handles.stop);
        }

        info!("Removed profile '{}' from menu", id);
        true
    }

    /// Point-in-time copy of the ids currently shown, in sorted order
    pub fn snapshot_ids(&self) -> Vec<ProfileId> {
        let mut ids: Vec<ProfileId> = lock(&self.entries).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Show `state` on the entry for `id`. Absent ids are ignored, since the
    /// profile may have been pruned concurrently.
    pub fn paint(&self, id: &ProfileId, state: ProfileState) -> bool {
        let entries = lock(&self.entries);
        match entries.get(id) {
            Some(submenu) => {
                self.toolkit.set_icon(submenu, state);
                trace!("Painted '{}' as {:?}", id, state);
                true
            }
            None => {
                debug!("Skipping paint of '{}': no longer in menu", id);
                false
            }
        }
    }

    /// Subscribe to clicks on the `action` item of `id`
    pub fn click_signal(&self, id: &ProfileId, action: ProfileAction) -> Option<ClickSignal> {
        let actions = lock(&self.actions);
        actions
            .get(id)
            .map(|handles| self.toolkit.click_signal(handles.get(action)))
    }

    pub fn contains(&self, id: &ProfileId) -> bool {
        lock(&self.entries).contains_key(id)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids that currently have action handles
    #[cfg(test)]
    pub(crate) fn action_ids(&self) -> Vec<ProfileId> {
        let mut ids: Vec<ProfileId> = lock(&self.actions).keys().cloned().collect();
        ids.sort();
        ids
    }
}
