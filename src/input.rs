use crate::events::{AdvanceTurnRequested, CenterCameraOnTile, HexClicked, ToggleHazardQueue};
use crate::hex::HexCoord;
use crate::scene::AppState;
use crate::settings::GameSettings;
use crate::world::WorldMap;
use crate::MainCamera;
use bevy::input::mouse::{MouseButtonInput, MouseMotion, MouseWheel};
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

/// Mouse travel, in pixels, below which a press-release counts as a click.
const CLICK_SLOP: f32 = 6.0;
const CAMERA_FOLLOW_RATE: f32 = 4.0;
const KEY_PAN_SPEED: f32 = 600.0;

#[derive(Resource)]
pub struct Keybinds {
    pub advance_turn: KeyCode,
    pub toggle_hazards: KeyCode,
    pub dev_panel: KeyCode,
    pub help: KeyCode,
    pub up: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            advance_turn: KeyCode::Space,
            toggle_hazards: KeyCode::KeyQ,
            dev_panel: KeyCode::F3,
            help: KeyCode::KeyH,
            up: KeyCode::KeyW,
            down: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
        }
    }
}

/// The map tile under the cursor, if the cursor is on the map and not on a panel.
#[derive(Resource, Default, Debug)]
pub struct HoveredHex(pub Option<HexCoord>);

/// Where the camera is gliding to after a `CenterCameraOnTile`.
#[derive(Resource, Default)]
struct CameraTarget(Option<Vec2>);

#[derive(Resource, Default)]
struct ClickState {
    pressed_at: Option<Vec2>,
}

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>()
            .init_resource::<HoveredHex>()
            .init_resource::<CameraTarget>()
            .init_resource::<ClickState>()
            .add_systems(Update, (help_toggle, dev_panel_toggle))
            .add_systems(
                Update,
                (
                    camera_controls,
                    center_camera,
                    track_hovered_hex,
                    hex_clicks,
                    advance_turn_key,
                    hazard_queue_key,
                )
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(OnExit(AppState::InGame), |mut hovered: ResMut<HoveredHex>| {
                hovered.0 = None;
            });
    }
}

fn pointer_over_ui(contexts: &mut EguiContexts) -> bool {
    let ctx = contexts.ctx_mut();
    ctx.is_pointer_over_area() || ctx.wants_pointer_input()
}

fn camera_controls(
    mut scroll_evr: EventReader<MouseWheel>,
    mut q_cam: Query<(&mut Transform, &Camera, &GlobalTransform), With<MainCamera>>,
    windows: Query<&Window>,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut motion: EventReader<MouseMotion>,
    mut target: ResMut<CameraTarget>,
    mut contexts: EguiContexts,
    time: Res<Time>,
) {
    let Ok((mut t, cam, g_transform)) = q_cam.get_single_mut() else {
        return;
    };
    let Ok(win) = windows.get_single() else {
        return;
    };
    let over_ui = pointer_over_ui(&mut contexts);

    // Zoom to cursor
    if let Some(cursor_world_pos) = win
        .cursor_position()
        .and_then(|c| cam.viewport_to_world_2d(g_transform, c))
    {
        for ev in scroll_evr.read() {
            if over_ui {
                continue;
            }
            let zoom = 1.0 - ev.y * 0.05;
            let new_scale = (t.scale * zoom).clamp(Vec3::splat(0.3), Vec3::splat(4.0));
            let actual_zoom = new_scale.x / t.scale.x;

            if (actual_zoom - 1.0).abs() > 1e-4 {
                t.translation.x = cursor_world_pos.x + (t.translation.x - cursor_world_pos.x) * actual_zoom;
                t.translation.y = cursor_world_pos.y + (t.translation.y - cursor_world_pos.y) * actual_zoom;
                t.scale = new_scale;
            }
        }
    }

    // Panning
    if buttons.pressed(MouseButton::Right) {
        for m in motion.read() {
            t.translation.x -= m.delta.x * t.scale.x;
            t.translation.y += m.delta.y * t.scale.y;
            target.0 = None;
        }
    }

    let mut dir = Vec2::ZERO;
    if keys.pressed(keybinds.up) || keys.pressed(KeyCode::ArrowUp) {
        dir.y += 1.0;
    }
    if keys.pressed(keybinds.down) || keys.pressed(KeyCode::ArrowDown) {
        dir.y -= 1.0;
    }
    if keys.pressed(keybinds.left) || keys.pressed(KeyCode::ArrowLeft) {
        dir.x -= 1.0;
    }
    if keys.pressed(keybinds.right) || keys.pressed(KeyCode::ArrowRight) {
        dir.x += 1.0;
    }
    if dir != Vec2::ZERO {
        let step = dir.normalize() * KEY_PAN_SPEED * t.scale.x * time.delta_seconds();
        t.translation += step.extend(0.0);
        target.0 = None;
    }

    t.translation.z = 999.0;
}

fn center_camera(
    mut requests: EventReader<CenterCameraOnTile>,
    mut target: ResMut<CameraTarget>,
    mut q_cam: Query<&mut Transform, With<MainCamera>>,
    settings: Res<GameSettings>,
    time: Res<Time>,
) {
    if let Some(req) = requests.read().last() {
        target.0 = Some(req.coord.to_world(settings.hex_size));
    }
    let (Some(goal), Ok(mut t)) = (target.0, q_cam.get_single_mut()) else {
        return;
    };
    let lerp_factor = (1.0 - (-CAMERA_FOLLOW_RATE * time.delta_seconds()).exp()).clamp(0.0, 1.0);
    let new_pos = t.translation.truncate().lerp(goal, lerp_factor);
    t.translation.x = new_pos.x;
    t.translation.y = new_pos.y;
    if new_pos.distance(goal) < 0.5 {
        target.0 = None;
    }
}

fn track_hovered_hex(
    windows: Query<&Window>,
    q_cam: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    world: Res<WorldMap>,
    settings: Res<GameSettings>,
    mut contexts: EguiContexts,
    mut hovered: ResMut<HoveredHex>,
) {
    let over_ui = pointer_over_ui(&mut contexts);
    let coord = windows
        .get_single()
        .ok()
        .and_then(|w| w.cursor_position())
        .zip(q_cam.get_single().ok())
        .and_then(|(cursor, (cam, gt))| cam.viewport_to_world_2d(gt, cursor))
        .map(|pos| HexCoord::from_world(pos, settings.hex_size))
        .filter(|c| !over_ui && world.get(*c).is_some());
    if hovered.0 != coord {
        hovered.0 = coord;
    }
}

fn hex_clicks(
    mut mousebtn_evr: EventReader<MouseButtonInput>,
    windows: Query<&Window>,
    hovered: Res<HoveredHex>,
    mut click: ResMut<ClickState>,
    mut contexts: EguiContexts,
    mut clicked: EventWriter<HexClicked>,
) {
    let cursor = windows.get_single().ok().and_then(|w| w.cursor_position());
    let over_ui = pointer_over_ui(&mut contexts);
    for ev in mousebtn_evr.read() {
        if ev.button != MouseButton::Left {
            continue;
        }
        match ev.state {
            ButtonState::Pressed if !over_ui => click.pressed_at = cursor,
            ButtonState::Pressed => click.pressed_at = None,
            ButtonState::Released => {
                let start = click.pressed_at.take();
                let still = start.zip(cursor).is_some_and(|(a, b)| a.distance(b) <= CLICK_SLOP);
                if let (true, Some(coord)) = (still, hovered.0) {
                    clicked.send(HexClicked { coord });
                }
            }
        }
    }
}

fn advance_turn_key(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut advance: EventWriter<AdvanceTurnRequested>,
) {
    if keys.just_pressed(keybinds.advance_turn) {
        advance.send(AdvanceTurnRequested);
    }
}

fn hazard_queue_key(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut toggle: EventWriter<ToggleHazardQueue>,
) {
    if keys.just_pressed(keybinds.toggle_hazards) {
        toggle.send(ToggleHazardQueue);
    }
}

fn help_toggle(mut settings: ResMut<GameSettings>, keys: Res<ButtonInput<KeyCode>>, keybinds: Res<Keybinds>) {
    if keys.just_pressed(keybinds.help) {
        settings.show_help = !settings.show_help;
    }
}

fn dev_panel_toggle(mut settings: ResMut<GameSettings>, keys: Res<ButtonInput<KeyCode>>, keybinds: Res<Keybinds>) {
    if keys.just_pressed(keybinds.dev_panel) {
        settings.show_dev_panel = !settings.show_dev_panel;
    }
}
