//! Meshes for the map, tokens and collectibles, plus the gizmo layer
//! (rivers, hover, path preview, collectible arrow).

use bevy::color::Mix;
use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};

use crate::collectibles::{Collectible, NearestCollectible};
use crate::game::TurnState;
use crate::hex::HexCoord;
use crate::input::HoveredHex;
use crate::movement::{MovementOverlay, OverlayMark, Travel};
use crate::player::Player;
use crate::scene::AppState;
use crate::settings::GameSettings;
use crate::world::WorldMap;

const TILE_Z: f32 = 0.0;
const COLLECTIBLE_Z: f32 = 5.0;
const TOKEN_Z: f32 = 10.0;
const OVERLAY_MIX: f32 = 0.55;
const HAZARD_OUTLINE: Color = Color::srgb(1.0, 0.45, 0.1);
const RIVER_COLOR: Color = Color::srgb(0.35, 0.6, 0.95);

#[derive(Component)]
pub struct TileSprite {
    pub coord: HexCoord,
    base: Color,
}

#[derive(Component)]
struct CollectibleBob {
    phase: f32,
}

pub struct RenderPlugin;
impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_tile_meshes)
            .add_systems(
                Update,
                (
                    recolor_overlay.run_if(resource_changed::<MovementOverlay>),
                    attach_token_meshes,
                    snap_tokens,
                    attach_collectible_meshes,
                    bob_collectibles,
                    draw_rivers,
                    draw_overlay_outlines,
                    draw_path_preview,
                    draw_collectible_arrow,
                )
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

/// Tile color with the movement overlay applied.
pub fn overlay_color(base: Color, mark: Option<&OverlayMark>) -> Color {
    let Some(mark) = mark else {
        return base;
    };
    let base: LinearRgba = base.into();
    let tint: LinearRgba = mark.primary.color().into();
    base.mix(&tint, OVERLAY_MIX).into()
}

fn hexagon(size: f32) -> RegularPolygon {
    RegularPolygon::new(size, 6)
}

fn spawn_tile_meshes(
    mut commands: Commands,
    world: Res<WorldMap>,
    settings: Res<GameSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let mesh = Mesh2dHandle(meshes.add(hexagon(settings.hex_size * 0.97)));
    for tile in world.tiles.values() {
        let base = tile.terrain.color();
        commands.spawn((
            MaterialMesh2dBundle {
                mesh: mesh.clone(),
                material: materials.add(ColorMaterial::from(base)),
                transform: Transform::from_translation(tile.coord.to_world(settings.hex_size).extend(TILE_Z)),
                ..default()
            },
            TileSprite { coord: tile.coord, base },
            StateScoped(AppState::InGame),
        ));
    }
    debug!("spawned {} tile meshes", world.tiles.len());
}

fn recolor_overlay(
    overlay: Res<MovementOverlay>,
    tiles: Query<(&TileSprite, &Handle<ColorMaterial>)>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (tile, handle) in &tiles {
        let mark = overlay.visible.then(|| overlay.marks.get(&tile.coord)).flatten();
        if let Some(material) = materials.get_mut(handle) {
            material.color = overlay_color(tile.base, mark);
        }
    }
}

fn attach_token_meshes(
    mut commands: Commands,
    settings: Res<GameSettings>,
    added: Query<(Entity, &Player), Added<Player>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (entity, player) in &added {
        commands.entity(entity).insert((
            Mesh2dHandle(meshes.add(Circle::new(settings.hex_size * 0.45))),
            materials.add(ColorMaterial::from(player.color())),
        ));
    }
}

/// Tokens that are not travelling sit exactly on their tile.
fn snap_tokens(
    settings: Res<GameSettings>,
    mut tokens: Query<(&Player, &mut Transform), (Changed<Player>, Without<Travel>)>,
) {
    for (player, mut t) in &mut tokens {
        let pos = player.coord.to_world(settings.hex_size);
        t.translation = pos.extend(TOKEN_Z);
    }
}

fn attach_collectible_meshes(
    mut commands: Commands,
    settings: Res<GameSettings>,
    added: Query<(Entity, &Collectible), Added<Collectible>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (entity, collectible) in &added {
        let pos = collectible.coord.to_world(settings.hex_size);
        commands.entity(entity).insert((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(meshes.add(Rhombus::new(settings.hex_size * 0.4, settings.hex_size * 0.6))),
                material: materials.add(ColorMaterial::from(Color::srgb(0.95, 0.85, 0.35))),
                transform: Transform::from_translation(pos.extend(COLLECTIBLE_Z)),
                ..default()
            },
            CollectibleBob {
                phase: (collectible.coord.q + collectible.coord.r) as f32 * 0.7,
            },
        ));
    }
}

fn bob_collectibles(
    time: Res<Time>,
    settings: Res<GameSettings>,
    mut q: Query<(&Collectible, &CollectibleBob, &mut Transform)>,
) {
    let t = time.elapsed_seconds();
    for (collectible, bob, mut transform) in &mut q {
        let base = collectible.coord.to_world(settings.hex_size);
        transform.translation.y = base.y + (t * 2.0 + bob.phase).sin() * settings.hex_size * 0.08;
    }
}

fn draw_rivers(mut gizmos: Gizmos, world: Res<WorldMap>, settings: Res<GameSettings>) {
    for river in &world.rivers {
        gizmos.linestrip_2d(river.iter().map(|c| c.to_world(settings.hex_size)), RIVER_COLOR);
    }
}

fn draw_overlay_outlines(
    mut gizmos: Gizmos,
    overlay: Res<MovementOverlay>,
    hovered: Res<HoveredHex>,
    turn: Option<Res<TurnState>>,
    players: Query<&Player>,
    settings: Res<GameSettings>,
) {
    let shape = hexagon(settings.hex_size * 0.92);
    if overlay.visible {
        for (coord, _) in overlay.marks.iter().filter(|(_, m)| m.hazard) {
            gizmos.primitive_2d(&shape, coord.to_world(settings.hex_size), 0.0, HAZARD_OUTLINE);
        }
    }
    if let Some(coord) = hovered.0 {
        gizmos.primitive_2d(&shape, coord.to_world(settings.hex_size), 0.0, Color::WHITE);
    }
    let selected = turn
        .as_ref()
        .and_then(|t| t.selected)
        .and_then(|e| players.get(e).ok());
    if let Some(player) = selected {
        gizmos.circle_2d(
            player.coord.to_world(settings.hex_size),
            settings.hex_size * 0.6,
            Color::srgb(1.0, 1.0, 0.6),
        );
    }
}

fn draw_path_preview(mut gizmos: Gizmos, overlay: Res<MovementOverlay>, settings: Res<GameSettings>) {
    let Some(preview) = overlay.preview.as_ref().filter(|_| overlay.visible) else {
        return;
    };
    let color = if preview.glide {
        Color::srgb(0.6, 0.85, 1.0)
    } else {
        Color::WHITE
    };
    gizmos.linestrip_2d(preview.path.iter().map(|c| c.to_world(settings.hex_size)), color);
    if let Some(end) = preview.path.last() {
        gizmos.circle_2d(end.to_world(settings.hex_size), settings.hex_size * 0.2, color);
    }
}

fn draw_collectible_arrow(mut gizmos: Gizmos, nearest: Res<NearestCollectible>, settings: Res<GameSettings>) {
    let Some(indicator) = nearest.0 else {
        return;
    };
    if indicator.anchor == indicator.target {
        return;
    }
    let origin = indicator.anchor.to_world(settings.hex_size);
    let dir = Vec2::from_angle(indicator.angle);
    gizmos.arrow_2d(
        origin + dir * settings.hex_size * 0.7,
        origin + dir * settings.hex_size * 1.5,
        Color::srgb(0.95, 0.85, 0.35),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Interaction;

    #[test]
    fn test_unmarked_tile_keeps_terrain_color() {
        let base = Color::srgb(0.2, 0.4, 0.1);
        assert_eq!(overlay_color(base, None), base);
    }

    #[test]
    fn test_marked_tile_moves_toward_interaction_color() {
        let base = Color::BLACK;
        let mark = OverlayMark {
            primary: Interaction::Good,
            hazard: false,
        };
        let tinted: LinearRgba = overlay_color(base, Some(&mark)).into();
        let good: LinearRgba = Interaction::Good.color().into();
        assert!(tinted.green > 0.0);
        assert!(tinted.green < good.green);
    }
}
