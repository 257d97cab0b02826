//! System tray surface: a `MenuToolkit` backed by `tray-icon` and a `tao` event loop
//!
//! Menu objects are owned by the UI thread. The toolkit hands out plain
//! `MenuId` handles and forwards every mutation to that thread as a
//! `TrayCommand` user event. Menu clicks are routed by id straight to the
//! click channel of the item's action handler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopProxy};
use tracing::{debug, error, info, warn};
use tray_icon::menu::{
    IconMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem, Submenu,
};
use tray_icon::{TrayIcon, TrayIconBuilder};
use uuid::Uuid;

use super::icons::{self, StatusIcons};
use crate::core::{
    click_channel, ClickSender, ClickSignal, MenuToolkit, ProfileAction, ProfileId, ProfileState,
};

const EXIT: &str = "Exit";

/// Menu mutations executed on the UI thread
#[derive(Debug)]
pub enum TrayCommand {
    AddSubmenu { id: MenuId, title: String },
    AddItem { parent: MenuId, id: MenuId, label: &'static str },
    Hide { id: MenuId },
    SetStatus { id: MenuId, state: ProfileState },
    Exit,
}

/// Handle to a profile submenu
#[derive(Debug)]
pub struct TraySubmenu {
    id: MenuId,
}

/// Handle to a start/stop item
#[derive(Debug)]
pub struct TrayItem {
    id: MenuId,
}

fn new_menu_id() -> MenuId {
    MenuId::new(Uuid::new_v4().to_string())
}

/// Menu id -> click sender, shared with the menu event handler
#[derive(Default)]
pub struct ClickRoutes {
    routes: Mutex<HashMap<MenuId, ClickSender>>,
}

impl ClickRoutes {
    pub fn insert(&self, id: MenuId, sender: ClickSender) {
        self.lock().insert(id, sender);
    }

    pub fn remove(&self, id: &MenuId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Deliver a click to the item's handler; `false` if nobody listens
    pub fn route(&self, id: &MenuId) -> bool {
        self.lock().get(id).is_some_and(ClickSender::click)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MenuId, ClickSender>> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `MenuToolkit` implementation that drives the tray menu
pub struct TrayToolkit {
    proxy: Mutex<EventLoopProxy<TrayCommand>>,
    routes: Arc<ClickRoutes>,
}

impl TrayToolkit {
    pub fn new(proxy: EventLoopProxy<TrayCommand>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
            routes: Arc::new(ClickRoutes::default()),
        }
    }

    /// Forward menu clicks to action handlers and `Exit` to the event loop
    pub fn install_menu_handler(&self, exit_id: MenuId) {
        let routes = Arc::clone(&self.routes);
        let proxy = Mutex::new(self.proxy().clone());
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            if event.id == exit_id {
                let proxy = proxy.lock().unwrap_or_else(PoisonError::into_inner);
                if proxy.send_event(TrayCommand::Exit).is_err() {
                    warn!("Tray event loop already closed");
                }
            } else if !routes.route(&event.id) {
                debug!("Click on unrouted menu item {:?}", event.id);
            }
        }));
    }

    fn proxy(&self) -> std::sync::MutexGuard<'_, EventLoopProxy<TrayCommand>> {
        self.proxy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, command: TrayCommand) {
        if let Err(e) = self.proxy().send_event(command) {
            debug!("Tray event loop closed, dropping command: {}", e);
        }
    }
}

impl MenuToolkit for TrayToolkit {
    type Submenu = TraySubmenu;
    type Item = TrayItem;

    fn add_submenu(&self, profile: &ProfileId) -> TraySubmenu {
        let id = new_menu_id();
        self.send(TrayCommand::AddSubmenu {
            id: id.clone(),
            title: profile.title(),
        });
        TraySubmenu { id }
    }

    fn add_item(&self, parent: &TraySubmenu, action: ProfileAction) -> TrayItem {
        let id = new_menu_id();
        self.send(TrayCommand::AddItem {
            parent: parent.id.clone(),
            id: id.clone(),
            label: action.label(),
        });
        TrayItem { id }
    }

    fn hide(&self, submenu: &TraySubmenu) {
        self.send(TrayCommand::Hide {
            id: submenu.id.clone(),
        });
    }

    fn set_icon(&self, submenu: &TraySubmenu, state: ProfileState) {
        self.send(TrayCommand::SetStatus {
            id: submenu.id.clone(),
            state,
        });
    }

    fn click_signal(&self, item: &TrayItem) -> ClickSignal {
        let (sender, signal) = click_channel();
        self.routes.insert(item.id.clone(), sender);
        signal
    }

    fn release(&self, item: TrayItem) {
        self.routes.remove(&item.id);
    }
}

/// A profile submenu as shown: status row first, then the actions
struct ProfileSubmenu {
    submenu: Submenu,
    status: IconMenuItem,
    items: Vec<MenuItem>,
}

/// UI-thread owner of the tray icon and its menu
pub struct TrayMenu {
    menu: Menu,
    exit_id: MenuId,
    submenus: HashMap<MenuId, ProfileSubmenu>,
    icons: StatusIcons,
    tray: Option<TrayIcon>,
}

impl TrayMenu {
    /// Build the static part of the menu: `Exit` and a separator
    pub fn new() -> Self {
        let menu = Menu::new();
        let exit = MenuItem::new(EXIT, true, None);
        let exit_id = exit.id().clone();
        if let Err(e) = menu.append_items(&[&exit, &PredefinedMenuItem::separator()]) {
            error!("Failed to build tray menu: {}", e);
        }

        Self {
            menu,
            exit_id,
            submenus: HashMap::new(),
            icons: StatusIcons::new(),
            tray: None,
        }
    }

    pub fn exit_id(&self) -> &MenuId {
        &self.exit_id
    }

    /// Create the tray icon; only valid once the event loop has started
    fn show(&mut self) {
        let mut builder = TrayIconBuilder::new()
            .with_menu(Box::new(self.menu.clone()))
            .with_tooltip(crate::APP_NAME);
        if let Some(icon) = icons::tray_icon() {
            builder = builder.with_icon(icon);
        }

        match builder.build() {
            Ok(tray) => {
                info!("Tray icon ready");
                self.tray = Some(tray);
            }
            Err(e) => error!("Failed to create tray icon: {}", e),
        }
    }

    fn apply(&mut self, command: TrayCommand) {
        match command {
            TrayCommand::AddSubmenu { id, title } => self.add_submenu(id, &title),
            TrayCommand::AddItem { parent, id, label } => self.add_item(&parent, id, label),
            TrayCommand::Hide { id } => self.hide(&id),
            TrayCommand::SetStatus { id, state } => self.set_status(&id, state),
            TrayCommand::Exit => {}
        }
    }

    fn add_submenu(&mut self, id: MenuId, title: &str) {
        let submenu = Submenu::with_id(id.clone(), title, true);
        let status = IconMenuItem::new(
            ProfileState::Unknown.label(),
            false,
            self.icons.get(ProfileState::Unknown),
            None,
        );
        if let Err(e) = submenu
            .append_items(&[&status, &PredefinedMenuItem::separator()])
            .and_then(|_| self.menu.append(&submenu))
        {
            warn!("Failed to add submenu '{}': {}", title, e);
            return;
        }

        self.submenus.insert(
            id,
            ProfileSubmenu {
                submenu,
                status,
                items: Vec::new(),
            },
        );
    }

    fn add_item(&mut self, parent: &MenuId, id: MenuId, label: &str) {
        let Some(entry) = self.submenus.get_mut(parent) else {
            debug!("Submenu {:?} gone before item '{}' was added", parent, label);
            return;
        };
        let item = MenuItem::with_id(id, label, true, None);
        match entry.submenu.append(&item) {
            Ok(()) => entry.items.push(item),
            Err(e) => warn!("Failed to add menu item '{}': {}", label, e),
        }
    }

    fn hide(&mut self, id: &MenuId) {
        if let Some(entry) = self.submenus.remove(id) {
            if let Err(e) = self.menu.remove(&entry.submenu) {
                warn!("Failed to remove submenu '{}': {}", entry.submenu.text(), e);
            }
        }
    }

    fn set_status(&mut self, id: &MenuId, state: ProfileState) {
        if let Some(entry) = self.submenus.get(id) {
            entry.status.set_text(state.label());
            entry.status.set_icon(self.icons.get(state));
        }
    }
}

/// Run the tray until `Exit` is clicked. Never returns.
pub fn run(event_loop: EventLoop<TrayCommand>, mut tray_menu: TrayMenu) -> ! {
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => tray_menu.show(),
            Event::UserEvent(TrayCommand::Exit) => {
                info!("Exit requested, shutting down");
                tray_menu.tray.take();
                *control_flow = ControlFlow::Exit;
            }
            Event::UserEvent(command) => tray_menu.apply(command),
            _ => {}
        }
    })
}
