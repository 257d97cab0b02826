//! Boundary to the menu toolkit and per-item click signals

use tokio::sync::mpsc;

use super::profile::{ProfileAction, ProfileId, ProfileState};

/// Create a connected click sender/signal pair
pub fn click_channel() -> (ClickSender, ClickSignal) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ClickSender(tx), ClickSignal(rx))
}

/// Toolkit side of a click signal
#[derive(Debug, Clone)]
pub struct ClickSender(mpsc::UnboundedSender<()>);

impl ClickSender {
    /// Deliver a click; returns `false` once nobody is listening anymore
    pub fn click(&self) -> bool {
        self.0.send(()).is_ok()
    }
}

/// Handler side of a click signal
#[derive(Debug)]
pub struct ClickSignal(mpsc::UnboundedReceiver<()>);

impl ClickSignal {
    /// Wait for the next click. Returns `false` once the item has been
    /// released by the toolkit and no further clicks can arrive.
    pub async fn clicked(&mut self) -> bool {
        self.0.recv().await.is_some()
    }
}

/// Menu primitives consumed by the registry.
///
/// Handles are plain values that may move between threads; every call must
/// return promptly since callers may hold a registry lock.
pub trait MenuToolkit: Send + Sync + 'static {
    type Submenu: Send + 'static;
    type Item: Send + 'static;

    /// Append a submenu for `profile` to the top-level menu
    fn add_submenu(&self, profile: &ProfileId) -> Self::Submenu;

    /// Append an actionable item to `parent`
    fn add_item(&self, parent: &Self::Submenu, action: ProfileAction) -> Self::Item;

    /// Hide a submenu and everything below it
    fn hide(&self, submenu: &Self::Submenu);

    /// Show the icon for `state` on a submenu
    fn set_icon(&self, submenu: &Self::Submenu, state: ProfileState);

    /// Subscribe to clicks on an item, replacing any previous subscription
    fn click_signal(&self, item: &Self::Item) -> ClickSignal;

    /// Drop routing for an item that is no longer shown; its signal closes
    fn release(&self, item: Self::Item);
}

/// Visual handles for one profile, built by a registry factory
pub struct MenuEntry<T: MenuToolkit> {
    pub submenu: T::Submenu,
    pub start: T::Item,
    pub stop: T::Item,
}

impl<T: MenuToolkit> MenuEntry<T> {
    /// Standard entry: submenu with `Start` and `Stop`, showing `Unknown`
    pub fn build(toolkit: &T, profile: &ProfileId) -> Self {
        let submenu = toolkit.add_submenu(profile);
        let start = toolkit.add_item(&submenu, ProfileAction::Start);
        let stop = toolkit.add_item(&submenu, ProfileAction::Stop);
        toolkit.set_icon(&submenu, ProfileState::Unknown);
        Self {
            submenu,
            start,
            stop,
        }
    }
}
