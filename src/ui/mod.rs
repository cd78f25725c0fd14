//! egui presentation: menus, HUD, hazard trays and screen overlays.
//! Panels read game resources and answer with events; the hazard trays are
//! the exception and drive `HazardView` directly.

pub mod data_slot;
mod hazard_view;
mod panels;

use std::collections::HashMap;

use bevy::app::AppExit;
use bevy::diagnostic::DiagnosticsStore;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin};

use crate::events::{
    AddResourceRequested, AdvanceTurnRequested, EvolveRequested, GrantEvolutionPoints, PlayerExtinct,
    PlayerPopulationChanged, RequestHazardEvent, StartGameRequested, ToggleHazardQueue,
};
use crate::game::TurnState;
use crate::hazard::{HazardManager, HazardView};
use crate::migration::{MigrationManager, MigrationWheel};
use crate::movement::MovementState;
use crate::player::Player;
use crate::scene::{AppState, SceneError, SceneTransition};
use crate::settings::GameSettings;
use crate::world::WorldMap;

const DAMAGE_PULSE_SECS: f32 = 0.8;

#[derive(Resource, Default, Debug)]
struct UiState {
    extinct: Option<String>,
}

#[derive(Resource, Default, Debug)]
struct GlowState {
    last_population: HashMap<Entity, u32>,
    pulse: f32,
}

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<UiState>()
            .init_resource::<GlowState>()
            .add_systems(Update, menu_ui.run_if(in_state(AppState::MainMenu)))
            .add_systems(Update, loading_ui.run_if(in_state(AppState::Loading)))
            .add_systems(
                Update,
                (
                    track_extinctions,
                    track_population_glow,
                    game_ui,
                    hazard_ui,
                    dev_ui.run_if(|settings: Res<GameSettings>| settings.show_dev_panel),
                    extinction_ui,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(Update, (help_ui, overlay_ui).chain())
            .add_systems(OnExit(AppState::InGame), |mut ui: ResMut<UiState>, mut glow: ResMut<GlowState>| {
                *ui = UiState::default();
                *glow = GlowState::default();
            });
    }
}

fn menu_ui(
    mut contexts: EguiContexts,
    mut transition: ResMut<SceneTransition>,
    scene_error: Res<SceneError>,
    mut exit: EventWriter<AppExit>,
) {
    panels::show_main_menu(contexts.ctx_mut(), &mut transition, &scene_error, &mut exit);
}

fn loading_ui(mut contexts: EguiContexts) {
    panels::show_loading(contexts.ctx_mut());
}

fn ordered_players<'a>(turn: &TurnState, players: &'a Query<(Entity, &Player)>) -> Vec<(Entity, &'a Player)> {
    turn.order.iter().filter_map(|e| players.get(*e).ok()).collect()
}

#[allow(clippy::too_many_arguments)]
fn game_ui(
    mut contexts: EguiContexts,
    turn: Option<Res<TurnState>>,
    players: Query<(Entity, &Player)>,
    movement: Res<MovementState>,
    migration: Option<Res<MigrationManager>>,
    wheel: Option<Res<MigrationWheel>>,
    mut settings: ResMut<GameSettings>,
    mut start: EventWriter<StartGameRequested>,
    mut advance: EventWriter<AdvanceTurnRequested>,
    mut toggle_hazards: EventWriter<ToggleHazardQueue>,
    mut evolve: EventWriter<EvolveRequested>,
) {
    let Some(turn) = turn else {
        return;
    };
    let ctx = contexts.ctx_mut();
    let roster = ordered_players(&turn, &players);
    if !turn.started {
        panels::show_welcome(ctx, &roster, &mut start);
        return;
    }
    let active = turn.active().and_then(|e| players.get(e).ok()).map(|(_, p)| p);
    panels::show_hud(
        ctx,
        &turn,
        active,
        movement.moving,
        &mut advance,
        &mut toggle_hazards,
        &mut settings,
    );
    panels::show_family_portrait(ctx, &roster, &turn, &settings, &mut evolve);
    if let (Some(migration), Some(wheel)) = (migration, wheel) {
        panels::show_migration_panel(ctx, &migration, &wheel);
    }
}

fn hazard_ui(
    mut contexts: EguiContexts,
    manager: Option<ResMut<HazardManager>>,
    view: Option<ResMut<HazardView>>,
    turn: Option<Res<TurnState>>,
    players: Query<&Player>,
    world: Option<Res<WorldMap>>,
) {
    let (Some(mut manager), Some(mut view)) = (manager, view) else {
        return;
    };
    let player = turn.and_then(|t| t.active()).and_then(|e| players.get(e).ok());
    let tile = player.zip(world.as_deref()).and_then(|(p, w)| w.get(p.coord));
    let ctx = contexts.ctx_mut();
    hazard_view::show_hazard_trays(ctx, &mut manager, &mut view, player, tile);
    if let Some(banner) = &view.banner {
        hazard_view::show_result_banner(ctx, banner);
    }
}

#[allow(clippy::too_many_arguments)]
fn dev_ui(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
    turn: Option<Res<TurnState>>,
    players: Query<&Player>,
    mut migration: Option<ResMut<MigrationManager>>,
    mut hazards: EventWriter<RequestHazardEvent>,
    mut resources: EventWriter<AddResourceRequested>,
    mut points: EventWriter<GrantEvolutionPoints>,
    mut evolve: EventWriter<EvolveRequested>,
) {
    let active = turn.and_then(|t| t.active());
    let player = active.and_then(|e| players.get(e).ok());
    let events = migration.as_deref().map_or(&[][..], MigrationManager::events);
    let actions = panels::show_dev_panel(contexts.ctx_mut(), &diagnostics, player, events);
    if let Some(manager) = migration.as_deref_mut() {
        for (id, enabled) in &actions.toggled_events {
            manager.enable_event(id, *enabled);
        }
    }
    let (Some(entity), Some(player)) = (active, player) else {
        return;
    };
    panels::apply_dev_actions(
        &actions,
        entity,
        player.coord,
        &mut hazards,
        &mut resources,
        &mut points,
        &mut evolve,
    );
}

fn track_extinctions(mut extinct: EventReader<PlayerExtinct>, players: Query<&Player>, mut ui: ResMut<UiState>) {
    for ev in extinct.read() {
        if let Ok(player) = players.get(ev.player) {
            ui.extinct = Some(player.name());
        }
    }
}

fn extinction_ui(mut contexts: EguiContexts, ui: Res<UiState>, mut transition: ResMut<SceneTransition>) {
    if let Some(lost) = &ui.extinct {
        panels::show_extinction_panel(contexts.ctx_mut(), lost, &mut transition);
    }
}

fn track_population_glow(
    time: Res<Time>,
    mut changes: EventReader<PlayerPopulationChanged>,
    mut glow: ResMut<GlowState>,
) {
    glow.pulse = (glow.pulse - time.delta_seconds() / DAMAGE_PULSE_SECS).max(0.0);
    for ev in changes.read() {
        let previous = glow.last_population.insert(ev.player, ev.current);
        if previous.is_some_and(|p| ev.current < p) || (previous.is_none() && ev.current < ev.max) {
            glow.pulse = 1.0;
        }
    }
}

fn help_ui(mut contexts: EguiContexts, settings: Res<GameSettings>) {
    panels::show_help_panel(contexts.ctx_mut(), &settings);
}

fn overlay_ui(
    mut contexts: EguiContexts,
    transition: Res<SceneTransition>,
    glow: Res<GlowState>,
    turn: Option<Res<TurnState>>,
    players: Query<&Player>,
    state: Res<State<AppState>>,
) {
    let ctx = contexts.ctx_mut();
    if *state.get() == AppState::InGame {
        let population = turn
            .and_then(|t| t.active())
            .and_then(|e| players.get(e).ok())
            .map_or(0, |p| p.current_population);
        panels::show_screen_glow(ctx, panels::glow_alpha(population, glow.pulse));
    }
    panels::show_fade_overlay(ctx, transition.overlay_alpha());
}
