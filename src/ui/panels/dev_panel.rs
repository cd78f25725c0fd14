use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::egui;

use crate::content::MigrationEventDef;
use crate::events::{
    AddResourceRequested, EvolveRequested, GrantEvolutionPoints, HazardTrigger, RequestHazardEvent,
};
use crate::hex::HexCoord;
use crate::player::Player;

/// Buttons the dev panel pressed this frame.
#[derive(Default, Debug, PartialEq, Eq)]
pub struct DevActions {
    pub trigger_hazard: bool,
    pub add_stone: bool,
    pub grant_point: bool,
    pub evolve: bool,
    /// Migration events whose enabled flag was flipped: (id, enabled).
    pub toggled_events: Vec<(String, bool)>,
}

pub fn show_dev_panel(
    ctx: &mut egui::Context,
    diagnostics: &DiagnosticsStore,
    active: Option<&Player>,
    migration_events: &[MigrationEventDef],
) -> DevActions {
    let mut actions = DevActions::default();
    egui::Window::new("Dev").show(ctx, |ui| {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT) {
            if let Some(value) = entity_count.value() {
                ui.label(format!("Entities: {}", value));
            }
        }
        ui.separator();
        egui::CollapsingHeader::new("Migration events").show(ui, |ui| {
            for event in migration_events {
                let mut enabled = event.enabled;
                if ui.checkbox(&mut enabled, event.display_name()).changed() {
                    actions.toggled_events.push((event.event_id.clone(), enabled));
                }
            }
        });
        ui.separator();
        let Some(player) = active else {
            ui.label("No active player");
            return;
        };
        ui.label(format!("{} at {}", player.name(), player.coord));
        actions.trigger_hazard = ui.button("Trigger hazard").clicked();
        actions.add_stone = ui.button("Add stone to tile").clicked();
        actions.grant_point = ui.button("+1 evolution point").clicked();
        actions.evolve = ui.button("Evolve").clicked();
    });
    actions
}

/// Sends the requests the panel asked for.
pub fn apply_dev_actions(
    actions: &DevActions,
    entity: Entity,
    coord: HexCoord,
    hazards: &mut EventWriter<RequestHazardEvent>,
    resources: &mut EventWriter<AddResourceRequested>,
    points: &mut EventWriter<GrantEvolutionPoints>,
    evolve: &mut EventWriter<EvolveRequested>,
) {
    if actions.trigger_hazard {
        hazards.send(RequestHazardEvent {
            trigger: HazardTrigger::Debug,
        });
    }
    if actions.add_stone {
        resources.send(AddResourceRequested { coord, kind: "stone" });
    }
    if actions.grant_point {
        points.send(GrantEvolutionPoints {
            player: entity,
            amount: 1,
        });
    }
    if actions.evolve {
        evolve.send(EvolveRequested { player: entity });
    }
}
