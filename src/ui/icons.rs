//! Generated status and tray icons

use image::{Rgba, RgbaImage};
use tracing::warn;

use crate::core::ProfileState;

/// Edge length of menu status icons
pub const STATUS_ICON_SIZE: u32 = 16;
/// Edge length of the tray icon
pub const TRAY_ICON_SIZE: u32 = 32;

/// Fill colour of a state's status dot
pub fn status_color(state: ProfileState) -> Rgba<u8> {
    match state {
        ProfileState::Running => Rgba([34, 197, 94, 255]),       // Green
        ProfileState::Stopped => Rgba([239, 68, 68, 255]),       // Red
        ProfileState::DoesNotExist => Rgba([156, 163, 175, 255]), // Gray
        ProfileState::Unknown => Rgba([107, 114, 128, 255]),     // Dark gray
    }
}

/// Filled, anti-aliased circle centred in a `size` x `size` image
fn circle(size: u32, color: impl Fn(f32) -> Rgba<u8>) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);
    let center = size as f32 / 2.0;
    let radius = center - 1.0;

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let dist = (dx * dx + dy * dy).sqrt();

            if dist < radius {
                img.put_pixel(x, y, color(dist / radius));
            } else if dist < radius + 1.0 {
                // Anti-aliased edge
                let Rgba([r, g, b, _]) = color(1.0);
                let alpha = ((radius + 1.0 - dist) * 255.0) as u8;
                img.put_pixel(x, y, Rgba([r, g, b, alpha]));
            }
        }
    }
    img
}

/// Status dot for a profile state
pub fn status_image(state: ProfileState) -> RgbaImage {
    let fill = status_color(state);
    circle(STATUS_ICON_SIZE, move |_| fill)
}

/// Tray icon: blue gradient disc
pub fn tray_image() -> RgbaImage {
    circle(TRAY_ICON_SIZE, |t| {
        // Primary blue color: #3B82F6 -> #1E40AF
        Rgba([
            (59.0 - t * 29.0) as u8,
            (130.0 - t * 66.0) as u8,
            (246.0 - t * 71.0) as u8,
            255,
        ])
    })
}

/// Menu icons for every state, converted once up front
pub struct StatusIcons {
    icons: Vec<(ProfileState, tray_icon::menu::Icon)>,
}

impl StatusIcons {
    pub fn new() -> Self {
        let icons = ProfileState::all()
            .iter()
            .filter_map(|&state| {
                let img = status_image(state);
                let (width, height) = img.dimensions();
                match tray_icon::menu::Icon::from_rgba(img.into_raw(), width, height) {
                    Ok(icon) => Some((state, icon)),
                    Err(e) => {
                        warn!("Failed to build {:?} status icon: {}", state, e);
                        None
                    }
                }
            })
            .collect();
        Self { icons }
    }

    pub fn get(&self, state: ProfileState) -> Option<tray_icon::menu::Icon> {
        self.icons
            .iter()
            .find(|(s, _)| *s == state)
            .map(|(_, icon)| icon.clone())
    }
}

/// Icon shown in the system tray itself
pub fn tray_icon() -> Option<tray_icon::Icon> {
    let img = tray_image();
    let (width, height) = img.dimensions();
    match tray_icon::Icon::from_rgba(img.into_raw(), width, height) {
        Ok(icon) => Some(icon),
        Err(e) => {
            warn!("Failed to build tray icon: {}", e);
            None
        }
    }
}
