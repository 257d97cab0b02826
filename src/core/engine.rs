//! Synchronization engine - Bootstrap and the discovery, pruning and status refresh loops

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::dispatch::ActionDispatcher;
use super::error::ProbeError;
use super::handler::ActionHandler;
use super::menu::MenuToolkit;
use super::probe::{probed_state, StatusProbe};
use super::profile::{ProfileAction, ProfileId, ProfileState};
use super::registry::MenuRegistry;
use super::settings::PollIntervals;
use super::source::ProfileSource;

/// Keeps the menu registry in step with the profile source and live status.
///
/// Cloning is cheap; every clone drives the same registry.
pub struct Engine<T: MenuToolkit> {
    registry: Arc<MenuRegistry<T>>,
    source: Arc<dyn ProfileSource>,
    probe: Arc<dyn StatusProbe>,
    dispatcher: Arc<dyn ActionDispatcher>,
    intervals: PollIntervals,
}

/// Join handles of the three reconciliation loops
pub struct LoopHandles {
    pub discovery: JoinHandle<()>,
    pub prune: JoinHandle<()>,
    pub refresh: JoinHandle<()>,
}

impl<T: MenuToolkit> Engine<T> {
    pub fn new(
        registry: Arc<MenuRegistry<T>>,
        source: Arc<dyn ProfileSource>,
        probe: Arc<dyn StatusProbe>,
        dispatcher: Arc<dyn ActionDispatcher>,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            registry,
            source,
            probe,
            dispatcher,
            intervals,
        }
    }

    pub fn registry(&self) -> &Arc<MenuRegistry<T>> {
        &self.registry
    }

    /// Seed the menu from the profile source and start all loops.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> LoopHandles {
        let seeded = self.discovery_cycle();
        info!(
            "Bootstrapped {} profiles (discovery {:?}, prune {:?}, refresh {:?})",
            seeded, self.intervals.discovery, self.intervals.prune, self.intervals.refresh
        );

        LoopHandles {
            discovery: tokio::spawn(self.clone().run_discovery()),
            prune: tokio::spawn(self.clone().run_prune()),
            refresh: tokio::spawn(self.clone().run_refresh()),
        }
    }

    /// Add every listed profile that is not yet in the menu and spawn its
    /// action handlers. Returns the number of profiles added.
    pub fn discovery_cycle(&self) -> usize {
        let profiles = match self.source.profile_list() {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!("Skipping discovery: {}", e);
                return 0;
            }
        };

        let mut added = 0;
        for profile in profiles {
            if self.registry.upsert_default(&profile) {
                self.spawn_action_handlers(&profile);
                added += 1;
            }
        }
        trace!("Discovery added {} profiles", added);
        added
    }

    /// Remove every profile in the menu that the source no longer lists.
    /// Returns the number of profiles removed.
    pub fn prune_cycle(&self) -> usize {
        let current: HashSet<ProfileId> = match self.source.profile_list() {
            Ok(profiles) => profiles.into_iter().collect(),
            Err(e) => {
                warn!("Skipping prune: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for id in self.registry.snapshot_ids() {
            if !current.contains(&id) && self.registry.remove(&id) {
                removed += 1;
            }
        }
        trace!("Prune removed {} profiles", removed);
        removed
    }

    /// Probe every profile in the menu and paint its state. Returns the
    /// number of entries painted.
    pub async fn refresh_cycle(&self) -> usize {
        let mut painted = 0;
        for profile in self.registry.snapshot_ids() {
            let state = self.probe_state(&profile).await;
            if self.registry.paint(&profile, state) {
                painted += 1;
            }
        }
        trace!("Refresh painted {} profiles", painted);
        painted
    }

    async fn probe_state(&self, profile: &ProfileId) -> ProfileState {
        let probe = Arc::clone(&self.probe);
        let target = profile.clone();
        let result = tokio::task::spawn_blocking(move || probe.probe(&target))
            .await
            .unwrap_or_else(|e| {
                warn!("Status probe task for '{}' failed: {}", profile, e);
                Err(ProbeError::Aborted(profile.clone()))
            });
        probed_state(result)
    }

    /// Spawn the start and stop handlers for a freshly added profile
    fn spawn_action_handlers(&self, profile: &ProfileId) {
        for &action in ProfileAction::all() {
            // Pruned between upsert and here: nothing left to handle
            let Some(signal) = self.registry.click_signal(profile, action) else {
                debug!("Profile '{}' vanished before its handlers started", profile);
                return;
            };
            let handler = ActionHandler::new(
                profile.clone(),
                action,
                signal,
                Arc::clone(&self.registry),
                Arc::clone(&self.dispatcher),
            );
            tokio::spawn(handler.run());
        }
    }

    async fn run_discovery(self) {
        loop {
            tokio::time::sleep(self.intervals.discovery).await;
            self.discovery_cycle();
        }
    }

    async fn run_prune(self) {
        loop {
            tokio::time::sleep(self.intervals.prune).await;
            self.prune_cycle();
        }
    }

    async fn run_refresh(self) {
        loop {
            tokio::time::sleep(self.intervals.refresh).await;
            self.refresh_cycle().await;
        }
    }
}

impl<T: MenuToolkit> Clone for Engine<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            source: Arc::clone(&self.source),
            probe: Arc::clone(&self.probe),
            dispatcher: Arc::clone(&self.dispatcher),
            intervals: self.intervals,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::testing::{ids, FakeDispatcher, FakeProbe, FakeSource, FakeToolkit};

    struct Fixture {
        engine: Engine<FakeToolkit>,
        source: Arc<FakeSource>,
        probe: Arc<FakeProbe>,
        dispatcher: Arc<FakeDispatcher>,
    }

    impl Fixture {
        fn new(names: &[&str]) -> Self {
            Self::with_dispatcher(names, FakeDispatcher::default())
        }

        fn with_dispatcher(names: &[&str], dispatcher: FakeDispatcher) -> Self {
            let source = Arc::new(FakeSource::new(names));
            let probe = Arc::new(FakeProbe::default());
            let dispatcher = Arc::new(dispatcher);
            let engine = Engine::new(
                Arc::new(MenuRegistry::new(FakeToolkit::default())),
                Arc::clone(&source) as Arc<dyn ProfileSource>,
                Arc::clone(&probe) as Arc<dyn StatusProbe>,
                Arc::clone(&dispatcher) as Arc<dyn ActionDispatcher>,
                PollIntervals::default(),
            );
            Self {
                engine,
                source,
                probe,
                dispatcher,
            }
        }

        fn registry(&self) -> &MenuRegistry<FakeToolkit> {
            self.engine.registry()
        }

        fn icon(&self, name: &str) -> Option<ProfileState> {
            self.registry().toolkit().icon(&ProfileId::from(name))
        }
    }

    #[tokio::test]
    async fn discovery_adds_each_profile_once() {
        let fx = Fixture::new(&["dev", "test"]);

        assert_eq!(fx.engine.discovery_cycle(), 2);
        assert_eq!(fx.engine.discovery_cycle(), 0);
        assert_eq!(fx.registry().snapshot_ids(), ids(&["dev", "test"]));
        assert_eq!(fx.registry().toolkit().submenus_created(), 2);
    }

    #[tokio::test]
    async fn discovery_never_removes() {
        let fx = Fixture::new(&["dev"]);
        fx.engine.discovery_cycle();
        fx.source.set(&[]);

        assert_eq!(fx.engine.discovery_cycle(), 0);
        assert_eq!(fx.registry().snapshot_ids(), ids(&["dev"]));
    }

    #[tokio::test]
    async fn prune_removes_vanished_profiles() {
        let fx = Fixture::new(&["dev", "test"]);
        fx.engine.discovery_cycle();
        fx.source.set(&["test"]);

        assert_eq!(fx.engine.prune_cycle(), 1);
        assert_eq!(fx.registry().snapshot_ids(), ids(&["test"]));
        assert_eq!(fx.registry().toolkit().hidden(), ids(&["dev"]));
        assert_eq!(fx.engine.prune_cycle(), 0);
    }

    #[tokio::test]
    async fn failed_listing_skips_the_cycle() {
        let fx = Fixture::new(&["dev"]);
        fx.engine.discovery_cycle();
        fx.source.fail();

        assert_eq!(fx.engine.prune_cycle(), 0);
        assert_eq!(fx.engine.discovery_cycle(), 0);
        assert_eq!(fx.registry().snapshot_ids(), ids(&["dev"]));
    }

    #[tokio::test]
    async fn roster_follows_source_through_discovery_and_prune() {
        let fx = Fixture::new(&["dev"]);
        fx.engine.discovery_cycle();
        assert_eq!(fx.registry().snapshot_ids(), ids(&["dev"]));
        assert_eq!(fx.icon("dev"), Some(ProfileState::Unknown));

        fx.source.set(&["dev", "test"]);
        fx.engine.discovery_cycle();
        assert_eq!(fx.registry().snapshot_ids(), ids(&["dev", "test"]));

        fx.source.set(&["test"]);
        fx.engine.prune_cycle();
        assert_eq!(fx.registry().snapshot_ids(), ids(&["test"]));
    }

    #[tokio::test]
    async fn refresh_paints_probed_states() {
        let fx = Fixture::new(&["dev", "test", "stage"]);
        fx.engine.discovery_cycle();
        fx.probe.set("dev", "Minishift:  Running");
        fx.probe.set("test", "Minishift:  Stopped");
        // "stage" has no canned output: the probe fails to launch

        assert_eq!(fx.engine.refresh_cycle().await, 3);
        assert_eq!(fx.icon("dev"), Some(ProfileState::Running));
        assert_eq!(fx.icon("test"), Some(ProfileState::Stopped));
        assert_eq!(fx.icon("stage"), Some(ProfileState::Unknown));

        fx.probe.set("dev", "Does Not Exist");
        fx.engine.refresh_cycle().await;
        assert_eq!(fx.icon("dev"), Some(ProfileState::DoesNotExist));
    }

    #[tokio::test]
    async fn crashed_probe_paints_unknown() {
        let fx = Fixture::new(&["dev"]);
        fx.engine.discovery_cycle();
        fx.registry().paint(&ProfileId::from("dev"), ProfileState::Running);
        fx.probe.panic_on_probe();

        assert_eq!(fx.engine.refresh_cycle().await, 1);
        assert_eq!(fx.icon("dev"), Some(ProfileState::Unknown));
    }

    #[tokio::test]
    async fn discovered_profiles_get_working_handlers() {
        let fx = Fixture::new(&["dev"]);
        fx.engine.discovery_cycle();
        let dev = ProfileId::from("dev");

        assert!(fx.registry().toolkit().click(&dev, ProfileAction::Start));
        tokio::time::timeout(Duration::from_secs(5), async {
            while fx.icon("dev") != Some(ProfileState::Running) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(fx.dispatcher.calls(), vec![(dev, ProfileAction::Start)]);
    }

    #[tokio::test]
    async fn failed_click_dispatch_keeps_icon() {
        let fx = Fixture::with_dispatcher(&["dev"], FakeDispatcher::failing());
        fx.engine.discovery_cycle();
        let dev = ProfileId::from("dev");
        fx.registry().paint(&dev, ProfileState::Stopped);

        assert!(fx.registry().toolkit().click(&dev, ProfileAction::Start));
        tokio::time::timeout(Duration::from_secs(5), async {
            while fx.dispatcher.calls().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fx.icon("dev"), Some(ProfileState::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn loops_run_on_their_own_intervals() {
        let fx = Fixture::new(&["dev"]);
        let handles = fx.engine.start();
        assert_eq!(fx.registry().snapshot_ids(), ids(&["dev"]));

        fx.source.set(&["test"]);
        // Prune fires at 30s, discovery only at 40s
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(fx.registry().is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fx.registry().snapshot_ids(), ids(&["test"]));

        handles.discovery.abort();
        handles.prune.abort();
        handles.refresh.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_discovery_and_prune_keep_maps_consistent() {
        let fx = Fixture::new(&["a", "b", "c", "d"]);
        let mut tasks = Vec::new();

        for round in 0..64 {
            let engine = fx.engine.clone();
            let source = Arc::clone(&fx.source);
            tasks.push(tokio::spawn(async move {
                if round % 3 == 0 {
                    let names: &[&str] = if round % 2 == 0 {
                        &["a", "b"]
                    } else {
                        &["c", "d", "e"]
                    };
                    source.set(names);
                }
                if round % 2 == 0 {
                    engine.discovery_cycle();
                } else {
                    engine.prune_cycle();
                }
                tokio::task::yield_now().await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let registry = fx.registry();
        let entries = registry.snapshot_ids();
        assert_eq!(entries, registry.action_ids());
        assert!(entries.len() <= 5);

        // One more settled round converges on the final source listing
        fx.engine.discovery_cycle();
        fx.engine.prune_cycle();
        let listed: HashSet<ProfileId> =
            fx.source.profile_list().unwrap().into_iter().collect();
        let shown: HashSet<ProfileId> = registry.snapshot_ids().into_iter().collect();
        assert_eq!(shown, listed);
        assert_eq!(registry.snapshot_ids(), registry.action_ids());
    }
}
