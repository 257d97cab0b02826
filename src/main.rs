//! ProfileTray - Start, stop and watch named profiles from the system tray
//!
//! A persistent tray menu lists every known profile with its live status.
//! Background loops keep the list and the status icons in step with the
//! profile directory and the control binary.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
#![allow(dead_code)] // Registry and engine accessors are part of the public API

mod core;
mod platform;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use single_instance::SingleInstance;
use tao::event_loop::EventLoopBuilder;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::{
    ActionDispatcher, ControlStatusProbe, DirectoryProfileSource, Engine, MenuRegistry,
    ProfileId, ProfileSource, ScriptDispatcher, Settings, StatusProbe,
};
use crate::ui::{TrayCommand, TrayMenu, TrayToolkit};

/// Application name constant
pub const APP_NAME: &str = "ProfileTray";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let (settings, load_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    // Initialize logging
    init_logging(settings.debug_logging);

    info!("{} v{} starting...", APP_NAME, APP_VERSION);
    if let Some(e) = load_error {
        warn!("{:#}; using default settings", e);
    }

    // Write defaults on first run so there is a file to edit
    if !Settings::settings_path().exists() {
        if let Err(e) = settings.save() {
            warn!("Failed to write default settings: {}", e);
        }
    }

    // Ensure only one tray is running
    let instance = SingleInstance::new(APP_NAME).context("Failed to create single instance lock")?;
    if !instance.is_single() {
        error!("Another instance of {} is already running!", APP_NAME);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("profiletray-sync")
        .build()
        .context("Failed to start async runtime")?;

    // The menu must be created on the main thread, before the loop runs
    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_menu = TrayMenu::new();
    let toolkit = TrayToolkit::new(event_loop.create_proxy());
    toolkit.install_menu_handler(tray_menu.exit_id().clone());

    let source: Arc<dyn ProfileSource> = Arc::new(DirectoryProfileSource::new(
        settings.get_profiles_directory(),
        settings.default_profile.clone().map(ProfileId::new),
    ));
    let probe: Arc<dyn StatusProbe> =
        Arc::new(ControlStatusProbe::new(settings.control_binary.clone()));
    let dispatcher: Arc<dyn ActionDispatcher> = Arc::new(ScriptDispatcher::new(
        settings.control_binary.clone(),
        settings.get_script_directory(),
    ));

    let engine = Engine::new(
        Arc::new(MenuRegistry::new(toolkit)),
        source,
        probe,
        dispatcher,
        settings.poll_intervals(),
    );
    {
        let _guard = runtime.enter();
        engine.start();
    }
    info!("Synchronization loops running");

    // Keeps the runtime alive for the rest of the process; Exit ends it
    let _runtime = runtime;
    ui::tray::run(event_loop, tray_menu)
}

/// Initialize the logging system
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "profiletray=debug,tao=warn,tray_icon=warn"
    } else {
        "profiletray=info,tao=warn,tray_icon=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
