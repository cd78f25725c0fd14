use bevy_egui::egui::{self, Align2, Color32, FontId, LayerId, Order, RichText, Stroke};

use crate::scene::{AppState, SceneTransition};

/// Opacity of the red edge glow when the active lineage is down to its last member.
pub const LOW_POPULATION_GLOW: f32 = 70.0 / 255.0;

pub fn glow_alpha(population: u32, pulse: f32) -> f32 {
    let base = if population == 1 { LOW_POPULATION_GLOW } else { 0.0 };
    (base + pulse.clamp(0.0, 1.0) * 0.6).min(1.0)
}

pub fn show_extinction_panel(ctx: &mut egui::Context, lost: &str, transition: &mut SceneTransition) {
    egui::Window::new("Extinction")
        .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(
                RichText::new(format!("{lost} has died out."))
                    .font(FontId::proportional(28.0))
                    .color(Color32::from_rgb(235, 90, 80)),
            );
            ui.add_space(12.0);
            if ui.button("Return to main menu").clicked() {
                transition.request(AppState::MainMenu);
            }
        });
}

pub fn show_screen_glow(ctx: &mut egui::Context, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let rect = ctx.screen_rect();
    let painter = ctx.layer_painter(LayerId::new(Order::Background, "screen_glow".into()));
    let a = (alpha * 255.0) as u8;
    for i in 0..6u8 {
        let inset = i as f32 * 6.0;
        let fade = a / (i + 1);
        painter.rect_stroke(
            rect.shrink(inset),
            0.0,
            Stroke::new(6.0, Color32::from_rgba_unmultiplied(220, 30, 20, fade)),
        );
    }
}

pub fn show_fade_overlay(ctx: &mut egui::Context, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let rect = ctx.screen_rect();
    let painter = ctx.layer_painter(LayerId::new(Order::Tooltip, "scene_fade".into()));
    painter.rect_filled(rect, 0.0, Color32::from_black_alpha((alpha.clamp(0.0, 1.0) * 255.0) as u8));
}
