mod banners;
mod dev_panel;
mod help_panel;
mod hud_panel;
mod menu_panel;

pub use banners::{glow_alpha, show_extinction_panel, show_fade_overlay, show_screen_glow};
pub use dev_panel::{apply_dev_actions, show_dev_panel};
pub use help_panel::show_help_panel;
pub use hud_panel::{show_family_portrait, show_hud, show_migration_panel, show_welcome};
pub use menu_panel::{show_loading, show_main_menu};

use bevy::prelude::*;
use bevy_egui::egui::Color32;

pub(crate) fn to_color32(color: Color) -> Color32 {
    let c = color.to_srgba();
    Color32::from_rgb(
        (c.red.clamp(0.0, 1.0) * 255.0) as u8,
        (c.green.clamp(0.0, 1.0) * 255.0) as u8,
        (c.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}
