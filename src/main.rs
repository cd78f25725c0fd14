mod collectibles;
mod content;
mod events;
mod game;
mod hazard;
mod hex;
mod input;
mod migration;
mod movement;
mod player;
mod render;
mod scene;
mod settings;
mod ui;
mod world;

use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use collectibles::CollectiblePlugin;
use events::GameEventsPlugin;
use game::GamePlugin;
use hazard::HazardPlugin;
use input::InputPlugin;
use migration::MigrationPlugin;
use movement::MovementPlugin;
use render::RenderPlugin;
use scene::ScenePlugin;
use ui::UiPlugin;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.05, 0.08, 0.12)))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Prehistoria".into(),
                        resolution: (1400., 900.).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    level: Level::INFO,
                    filter: "wgpu=error,naga=warn,prehistoria=debug".into(),
                    ..default()
                }),
        )
        .add_plugins((ScenePlugin, GameEventsPlugin, GamePlugin, MovementPlugin, HazardPlugin))
        .add_plugins((MigrationPlugin, CollectiblePlugin, RenderPlugin, InputPlugin, UiPlugin))
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2dBundle {
            transform: Transform::from_xyz(0.0, 0.0, 999.0),
            ..default()
        },
        MainCamera,
    ));
}

#[derive(Component)]
pub struct MainCamera;
