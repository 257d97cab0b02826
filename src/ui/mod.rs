//! User interface - The system tray menu

pub mod icons;
pub mod tray;

pub use tray::{TrayCommand, TrayMenu, TrayToolkit};
