use bevy::prelude::*;
use bevy_egui::egui::{self, Align2, Color32, RichText};

use crate::events::{AdvanceTurnRequested, EvolveRequested, StartGameRequested, ToggleHazardQueue};
use crate::game::TurnState;
use crate::migration::{MigrationManager, MigrationWheel};
use crate::player::Player;
use crate::settings::GameSettings;
use crate::ui::data_slot::DataSlot;

const WHEEL_GLOW: Color32 = Color32::from_rgb(250, 230, 120);

pub fn show_welcome(
    ctx: &mut egui::Context,
    players: &[(Entity, &Player)],
    start: &mut EventWriter<StartGameRequested>,
) {
    egui::Window::new("Welcome")
        .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Guide your lineages across a young continent.");
            ui.label("Each turn, move across tiles your species thrives on, gather");
            ui.label("evolution points and survive what the land throws at you.");
            ui.separator();
            for (_, player) in players {
                ui.label(format!("{} starts at {}", player.name(), player.coord));
            }
            ui.separator();
            if ui.button("Continue").clicked() {
                start.send(StartGameRequested);
            }
        });
}

pub fn show_hud(
    ctx: &mut egui::Context,
    turn: &TurnState,
    active: Option<&Player>,
    moving: bool,
    advance: &mut EventWriter<AdvanceTurnRequested>,
    toggle_hazards: &mut EventWriter<ToggleHazardQueue>,
    settings: &mut GameSettings,
) {
    egui::TopBottomPanel::top("hud").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("Turn {}", turn.turn)).strong());
            ui.separator();
            if let Some(player) = active {
                ui.label(RichText::new(player.name()).color(super::to_color32(player.color())));
                ui.separator();
                ui.label(format!(
                    "Movement {}/{}",
                    player.remaining_movement, player.movement_points
                ));
            }
            if moving {
                ui.separator();
                ui.label(RichText::new("moving...").italics());
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Help [H]").clicked() {
                    settings.show_help = !settings.show_help;
                }
                if ui.button("Hazards [Q]").clicked() {
                    toggle_hazards.send(ToggleHazardQueue);
                }
                if ui.button("End turn [Space]").clicked() {
                    advance.send(AdvanceTurnRequested);
                }
            });
        });
    });
}

pub fn show_family_portrait(
    ctx: &mut egui::Context,
    players: &[(Entity, &Player)],
    turn: &TurnState,
    settings: &GameSettings,
    evolve: &mut EventWriter<EvolveRequested>,
) {
    egui::Window::new("Family")
        .anchor(Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .resizable(false)
        .show(ctx, |ui| {
            for (entity, player) in players {
                let is_active = turn.is_active(*entity);
                ui.add(
                    DataSlot::new(*player)
                        .selected(turn.selected == Some(*entity))
                        .glow(is_active.then(|| super::to_color32(player.color()))),
                );
                if !is_active {
                    continue;
                }
                let next = player.species.evolves_to.as_deref();
                let affordable = player.evolution_points >= settings.evolution_cost;
                let label = match next {
                    Some(_) => format!("Evolve ({} EP)", settings.evolution_cost),
                    None => "Fully evolved".to_string(),
                };
                if ui
                    .add_enabled(next.is_some() && affordable && !turn.paused, egui::Button::new(label))
                    .clicked()
                {
                    evolve.send(EvolveRequested { player: *entity });
                }
                ui.add_space(6.0);
            }
        });
}

pub fn show_migration_panel(ctx: &mut egui::Context, manager: &MigrationManager, wheel: &MigrationWheel) {
    egui::Window::new("Migration")
        .anchor(Align2::RIGHT_TOP, egui::vec2(-12.0, 40.0))
        .resizable(false)
        .show(ctx, |ui| {
            let highlighted = wheel.highlighted();
            for event in manager.events() {
                let lit = highlighted == Some(event.event_id.as_str());
                ui.add(
                    DataSlot::new(event)
                        .min_width(160.0)
                        .glow(lit.then_some(WHEEL_GLOW))
                        .selected(lit && wheel.is_settled()),
                );
            }
            if wheel.is_settled() {
                if let Some(active) = manager.active() {
                    ui.separator();
                    ui.label(RichText::new(&active.description).italics());
                }
            }
        });
}
