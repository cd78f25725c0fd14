use bevy::app::AppExit;
use bevy::prelude::*;
use bevy_egui::egui::{self, Align2, Color32, FontId, RichText};

use crate::scene::{AppState, SceneError, SceneTransition};

pub fn show_main_menu(
    ctx: &mut egui::Context,
    transition: &mut SceneTransition,
    scene_error: &SceneError,
    exit: &mut EventWriter<AppExit>,
) {
    egui::Area::new("main_menu".into())
        .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("Prehistoria").font(FontId::proportional(56.0)));
                ui.add_space(24.0);
                if let Some(err) = &scene_error.0 {
                    ui.label(RichText::new(format!("Could not start: {err}")).color(Color32::from_rgb(235, 90, 80)));
                    ui.add_space(8.0);
                }
                let start = ui.add_sized([180.0, 36.0], egui::Button::new("Start"));
                if start.clicked() {
                    transition.request(AppState::Loading);
                }
                let quit = ui.add_sized([180.0, 36.0], egui::Button::new("Quit"));
                if quit.clicked() {
                    exit.send(AppExit::Success);
                }
            });
        });
}

pub fn show_loading(ctx: &mut egui::Context) {
    egui::Area::new("loading".into())
        .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Shaping the land...").font(FontId::proportional(28.0)));
            });
        });
}
