use bevy_egui::egui;

use crate::settings::GameSettings;

pub fn show_help_panel(ctx: &mut egui::Context, settings: &GameSettings) {
    if settings.show_help {
        egui::Window::new("Help").show(ctx, |ui| {
            ui.label("Left Mouse: Select token / move to a highlighted tile");
            ui.label("Right Mouse: Pan Camera (drag)");
            ui.label("WASD/Arrows: Pan Camera");
            ui.label("Mouse Wheel: Zoom");
            ui.label("Space: End Turn");
            ui.label("Q: Toggle Hazard Queue");
            ui.label("H: Toggle Help");
            ui.label("F3: Toggle Dev Panel");
            ui.separator();
            ui.label("Green tiles suit your species, yellow ones end your move,");
            ui.label("red ones cost population. Orange outlines mark hazards.");
        });
    }
}
