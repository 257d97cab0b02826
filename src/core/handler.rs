//! Action handlers - One task per profile and action, turning clicks into dispatches

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::dispatch::ActionDispatcher;
use super::error::DispatchError;
use super::menu::{ClickSignal, MenuToolkit};
use super::profile::{ProfileAction, ProfileId};
use super::registry::MenuRegistry;

/// Waits for clicks on one item and dispatches its action
pub struct ActionHandler<T: MenuToolkit> {
    profile: ProfileId,
    action: ProfileAction,
    signal: ClickSignal,
    registry: Arc<MenuRegistry<T>>,
    dispatcher: Arc<dyn ActionDispatcher>,
}

impl<T: MenuToolkit> ActionHandler<T> {
    pub fn new(
        profile: ProfileId,
        action: ProfileAction,
        signal: ClickSignal,
        registry: Arc<MenuRegistry<T>>,
        dispatcher: Arc<dyn ActionDispatcher>,
    ) -> Self {
        Self {
            profile,
            action,
            signal,
            registry,
            dispatcher,
        }
    }

    /// Handle clicks until the item is released.
    ///
    /// A pruned profile's handler simply stops receiving clicks; there is no
    /// other way for it to end.
    pub async fn run(mut self) {
        debug!("Waiting for {} clicks on '{}'", self.action, self.profile);
        while self.signal.clicked().await {
            self.handle_click().await;
        }
        debug!(
            "{} handler for '{}' finished: item released",
            self.action, self.profile
        );
    }

    /// Dispatch the action and, if it launched, paint its target state.
    /// Returns whether the dispatch succeeded.
    pub async fn handle_click(&self) -> bool {
        info!("{} requested for profile '{}'", self.action, self.profile);
        match self.dispatch().await {
            Ok(()) => {
                self.registry
                    .paint(&self.profile, self.action.target_state());
                true
            }
            Err(e) => {
                warn!(
                    "Failed to {} profile '{}': {}",
                    self.action, self.profile, e
                );
                false
            }
        }
    }

    async fn dispatch(&self) -> Result<(), DispatchError> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let profile = self.profile.clone();
        let action = self.action;
        tokio::task::spawn_blocking(move || dispatcher.dispatch(&profile, action))
            .await
            .unwrap_or_else(|_| {
                Err(DispatchError::Aborted {
                    profile: self.profile.clone(),
                    action,
                })
            })
    }
}
