//! Turn movement: which tiles the active player can reach, how they get
//! there, and the token travel that follows a move order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use bevy::prelude::*;

use crate::content::{Interaction, MigrationEventDef, MovementProfile};
use crate::events::{
    ActivePlayerChanged, MigrationEventSelected, PlayerEvolved, PlayerLandedOnTile, RequestPlayerMove,
};
use crate::game::{TurnSet, TurnState};
use crate::hex::HexCoord;
use crate::input::HoveredHex;
use crate::migration::MigrationManager;
use crate::player::Player;
use crate::scene::AppState;
use crate::settings::GameSettings;
use crate::world::{Terrain, Tile, WorldMap};

pub const TRAVEL_HEXES_PER_SECOND: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveMode {
    Ground,
    Glide,
}

/// Step rules for one search. `launch` is set when a glide starts from
/// high ground, which lifts the downhill restriction for the whole glide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRules {
    pub mode: MoveMode,
    pub launch: bool,
}

impl MoveRules {
    pub fn ground() -> Self {
        Self {
            mode: MoveMode::Ground,
            launch: false,
        }
    }

    pub fn glide(launch: bool) -> Self {
        Self {
            mode: MoveMode::Glide,
            launch,
        }
    }

    /// Whether `player` may step onto `to`, either to stop there
    /// (`is_destination`) or to pass through on the way somewhere else.
    pub fn allows(&self, player: &Player, from: Option<&Tile>, to: &Tile, is_destination: bool) -> bool {
        let enterable = to.passable || (to.is_lake && player.has_profile(MovementProfile::Lacustrine));
        if !enterable {
            return false;
        }
        let interaction = player.interaction_for_tile(to);
        match self.mode {
            MoveMode::Glide => {
                if to.is_mountain || to.terrain == Terrain::Mountains {
                    return false;
                }
                if is_destination {
                    return !to.terrain.is_high_ground() && interaction.is_some();
                }
                self.launch || from.is_some_and(|f| to.topographic_scale <= f.topographic_scale)
            }
            MoveMode::Ground => match interaction {
                None => false,
                Some(_) if is_destination => true,
                Some(i) => i == Interaction::Good,
            },
        }
    }
}

/// Dijkstra bounded by `max_cost`. Landing and traversal are tracked
/// apart: a tile can be a fine place to stop but impossible to walk through.
/// The start tile is included at cost 0.
pub fn reachable_costs(
    world: &WorldMap,
    player: &Player,
    start: HexCoord,
    max_cost: u32,
    rules: MoveRules,
) -> HashMap<HexCoord, u32> {
    let mut landing = HashMap::from([(start, 0)]);
    let mut traverse = HashMap::from([(start, 0)]);
    let mut frontier = BinaryHeap::new();
    frontier.push(Reverse((0u32, start)));

    while let Some(Reverse((cost, current))) = frontier.pop() {
        if traverse.get(&current).is_some_and(|&best| cost > best) {
            continue;
        }
        let next_cost = cost + 1;
        if next_cost > max_cost {
            continue;
        }
        let Some(from) = world.get(current) else {
            continue;
        };
        for next in world.neighbors(current) {
            if rules.allows(player, Some(from), next, true)
                && landing.get(&next.coord).map_or(true, |&c| next_cost < c)
            {
                landing.insert(next.coord, next_cost);
            }
            if rules.allows(player, Some(from), next, false)
                && traverse.get(&next.coord).map_or(true, |&c| next_cost < c)
            {
                traverse.insert(next.coord, next_cost);
                frontier.push(Reverse((next_cost, next.coord)));
            }
        }
    }
    landing
}

/// A* from `start` to `end`; the last step is checked as a landing.
pub fn find_path(
    world: &WorldMap,
    player: &Player,
    start: HexCoord,
    end: HexCoord,
    rules: MoveRules,
) -> Option<Vec<HexCoord>> {
    if start == end {
        return Some(vec![start]);
    }
    let mut frontier = BinaryHeap::new();
    let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut cost_so_far = HashMap::from([(start, 0u32)]);
    frontier.push(Reverse((0u32, start)));

    while let Some(Reverse((_, current))) = frontier.pop() {
        if current == end {
            break;
        }
        let Some(from) = world.get(current) else {
            continue;
        };
        let cost = cost_so_far.get(&current).copied().unwrap_or(0);
        for next in world.neighbors(current) {
            let is_final_step = next.coord == end;
            if !rules.allows(player, Some(from), next, is_final_step) {
                continue;
            }
            let new_cost = cost + 1;
            if cost_so_far.get(&next.coord).map_or(true, |&c| new_cost < c) {
                cost_so_far.insert(next.coord, new_cost);
                came_from.insert(next.coord, current);
                frontier.push(Reverse((new_cost + next.coord.distance(end), next.coord)));
            }
        }
    }

    if !came_from.contains_key(&end) {
        return None;
    }
    let mut path = vec![end];
    let mut current = end;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    Some(path)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileContext {
    pub interaction: Option<Interaction>,
    pub valid_destination: bool,
    /// The cheaper way to reach this tile is a glide.
    pub glide: bool,
    pub cost: u32,
}

/// Everything the active player can reach with the movement left this turn.
pub fn build_turn_context(world: &WorldMap, player: &Player) -> HashMap<HexCoord, TileContext> {
    let mut context = HashMap::new();
    let Some(start) = world.get(player.coord) else {
        return context;
    };
    let budget = player.remaining_movement;
    let launch = start.terrain.is_high_ground();
    let ground = reachable_costs(world, player, player.coord, budget, MoveRules::ground());
    let glide = if player.has_profile(MovementProfile::Glide) {
        reachable_costs(world, player, player.coord, budget, MoveRules::glide(launch))
    } else {
        HashMap::new()
    };

    for &coord in ground.keys().chain(glide.keys()) {
        if context.contains_key(&coord) {
            continue;
        }
        let Some(tile) = world.get(coord) else {
            continue;
        };
        let (glides, cost) = match (ground.get(&coord), glide.get(&coord)) {
            (Some(&g), Some(&a)) => (a <= g, g.min(a)),
            (None, Some(&a)) => (true, a),
            (Some(&g), None) => (false, g),
            (None, None) => continue,
        };
        let rules = if glides { MoveRules::glide(launch) } else { MoveRules::ground() };
        context.insert(
            coord,
            TileContext {
                interaction: player.interaction_for_tile(tile),
                valid_destination: coord != player.coord && rules.allows(player, None, tile, true),
                glide: glides,
                cost,
            },
        );
    }
    context
}

#[derive(Resource, Default)]
pub struct TurnContext {
    pub player: Option<Entity>,
    pub tiles: HashMap<HexCoord, TileContext>,
}

impl TurnContext {
    pub fn is_valid_destination(&self, coord: HexCoord) -> bool {
        self.tiles.get(&coord).is_some_and(|c| c.valid_destination)
    }

    pub fn clear(&mut self) {
        self.player = None;
        self.tiles.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayMark {
    pub primary: Interaction,
    pub hazard: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPreview {
    pub path: Vec<HexCoord>,
    pub glide: bool,
}

/// Tile highlights for the active player's options.
#[derive(Resource, Default)]
pub struct MovementOverlay {
    pub visible: bool,
    pub marks: HashMap<HexCoord, OverlayMark>,
    pub preview: Option<PathPreview>,
    preview_target: Option<HexCoord>,
}

impl MovementOverlay {
    pub fn show(&mut self, world: &WorldMap, context: &TurnContext, migration: Option<&MigrationEventDef>) {
        self.marks = context
            .tiles
            .iter()
            .filter(|(_, c)| c.valid_destination)
            .filter_map(|(coord, c)| {
                let tile = world.get(*coord)?;
                Some((
                    *coord,
                    OverlayMark {
                        primary: c.interaction?,
                        hazard: migration.is_some_and(|m| m.triggers_on(tile)),
                    },
                ))
            })
            .collect();
        self.visible = true;
        self.preview = None;
        self.preview_target = None;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.marks.clear();
        self.preview = None;
        self.preview_target = None;
    }
}

#[derive(Resource, Default)]
pub struct MovementState {
    pub moving: bool,
    pub migration: Option<MigrationEventDef>,
}

/// A token walking its path, one hex segment at a time.
#[derive(Component, Debug)]
pub struct Travel {
    pub waypoints: Vec<HexCoord>,
    pub segment: usize,
    pub t: f32,
}

impl Travel {
    pub fn destination(&self) -> Option<HexCoord> {
        self.waypoints.last().copied()
    }

    pub fn path_cost(&self) -> u32 {
        self.waypoints.len().saturating_sub(1) as u32
    }
}

pub struct MovementPlugin;
impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TurnContext>()
            .init_resource::<MovementOverlay>()
            .init_resource::<MovementState>()
            .add_systems(OnExit(AppState::InGame), reset_movement)
            .add_systems(Update, travel_tokens.in_set(TurnSet::Intent))
            .add_systems(
                Update,
                (clear_on_active_change, handle_move_requests)
                    .chain()
                    .in_set(TurnSet::Resolve),
            )
            .add_systems(
                Update,
                (start_turn_movement, refresh_after_landing, update_path_preview)
                    .chain()
                    .in_set(TurnSet::Refresh),
            );
    }
}

fn rebuild(
    world: &WorldMap,
    entity: Entity,
    player: &Player,
    context: &mut TurnContext,
    overlay: &mut MovementOverlay,
    state: &MovementState,
) {
    context.tiles = build_turn_context(world, player);
    context.player = Some(entity);
    overlay.show(world, context, state.migration.as_ref());
    debug!(
        "{} has {} movement left, {} destinations",
        player.name(),
        player.remaining_movement,
        overlay.marks.len()
    );
}

fn reset_movement(
    mut context: ResMut<TurnContext>,
    mut overlay: ResMut<MovementOverlay>,
    mut state: ResMut<MovementState>,
) {
    context.clear();
    overlay.hide();
    *state = MovementState::default();
}

fn clear_on_active_change(
    mut events: EventReader<ActivePlayerChanged>,
    mut context: ResMut<TurnContext>,
    mut overlay: ResMut<MovementOverlay>,
) {
    if events.read().last().is_some() {
        context.clear();
        overlay.hide();
    }
}

fn start_turn_movement(
    mut events: EventReader<MigrationEventSelected>,
    world: Res<WorldMap>,
    migrations: Res<MigrationManager>,
    mut players: Query<&mut Player>,
    mut context: ResMut<TurnContext>,
    mut overlay: ResMut<MovementOverlay>,
    mut state: ResMut<MovementState>,
) {
    for ev in events.read() {
        let Ok(mut player) = players.get_mut(ev.player) else {
            continue;
        };
        state.migration = ev.event_id.as_deref().and_then(|id| migrations.event(id)).cloned();
        let start_penalty = world
            .get(player.coord)
            .and_then(|t| player.interaction_for_tile(t))
            .is_some_and(|i| i != Interaction::Good);
        player.remaining_movement = player.movement_points.saturating_sub(u32::from(start_penalty));
        rebuild(&world, ev.player, &player, &mut context, &mut overlay, &state);
    }
}

/// Landing and evolving both change what the active player can reach.
fn refresh_after_landing(
    mut landed: EventReader<PlayerLandedOnTile>,
    mut evolved: EventReader<PlayerEvolved>,
    world: Res<WorldMap>,
    turn: Res<TurnState>,
    players: Query<&Player>,
    mut context: ResMut<TurnContext>,
    mut overlay: ResMut<MovementOverlay>,
    state: Res<MovementState>,
) {
    let touched: Vec<Entity> = landed
        .read()
        .map(|ev| ev.player)
        .chain(evolved.read().map(|ev| ev.player))
        .collect();
    let Some(active) = turn.active().filter(|e| touched.contains(e)) else {
        return;
    };
    if state.moving || !turn.started {
        return;
    }
    if let Ok(player) = players.get(active) {
        rebuild(&world, active, player, &mut context, &mut overlay, &state);
    }
}

fn handle_move_requests(
    mut commands: Commands,
    mut requests: EventReader<RequestPlayerMove>,
    world: Res<WorldMap>,
    context: Res<TurnContext>,
    players: Query<&Player>,
    mut overlay: ResMut<MovementOverlay>,
    mut state: ResMut<MovementState>,
) {
    for req in requests.read() {
        if state.moving {
            debug!("move to {} ignored, a token is already moving", req.destination);
            continue;
        }
        let Some(target) = context.tiles.get(&req.destination).filter(|c| c.valid_destination) else {
            debug!("{} is not a valid destination", req.destination);
            continue;
        };
        let Ok(player) = players.get(req.player) else {
            continue;
        };
        let launch = target.glide && world.get(player.coord).is_some_and(|t| t.terrain.is_high_ground());
        let rules = if target.glide { MoveRules::glide(launch) } else { MoveRules::ground() };
        let Some(path) = find_path(&world, player, player.coord, req.destination, rules) else {
            warn!("no path from {} to {} for {}", player.coord, req.destination, player.name());
            continue;
        };
        info!("{} moves {} -> {} ({} steps)", player.name(), player.coord, req.destination, path.len() - 1);
        overlay.hide();
        state.moving = true;
        commands.entity(req.player).insert(Travel {
            waypoints: path,
            segment: 0,
            t: 0.0,
        });
    }
}

fn travel_tokens(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<GameSettings>,
    mut tokens: Query<(Entity, &mut Player, &mut Travel, &mut Transform)>,
    mut state: ResMut<MovementState>,
    mut landed: EventWriter<PlayerLandedOnTile>,
) {
    for (entity, mut player, mut travel, mut transform) in &mut tokens {
        travel.t += time.delta_seconds() * TRAVEL_HEXES_PER_SECOND;
        while travel.t >= 1.0 && travel.segment + 1 < travel.waypoints.len() {
            travel.t -= 1.0;
            travel.segment += 1;
        }

        if travel.segment + 1 >= travel.waypoints.len() {
            let Some(destination) = travel.destination() else {
                commands.entity(entity).remove::<Travel>();
                state.moving = false;
                continue;
            };
            let z = transform.translation.z;
            transform.translation = destination.to_world(settings.hex_size).extend(z);
            player.coord = destination;
            state.moving = false;
            landed.send(PlayerLandedOnTile {
                player: entity,
                coord: destination,
                path_cost: travel.path_cost(),
            });
            commands.entity(entity).remove::<Travel>();
            continue;
        }

        let from = travel.waypoints[travel.segment].to_world(settings.hex_size);
        let to = travel.waypoints[travel.segment + 1].to_world(settings.hex_size);
        let z = transform.translation.z;
        transform.translation = from.lerp(to, travel.t.min(1.0)).extend(z);
    }
}

fn update_path_preview(
    hovered: Res<HoveredHex>,
    world: Res<WorldMap>,
    context: Res<TurnContext>,
    state: Res<MovementState>,
    players: Query<&Player>,
    mut overlay: ResMut<MovementOverlay>,
) {
    if !overlay.visible || state.moving {
        return;
    }
    let target = hovered.0.filter(|c| context.is_valid_destination(*c));
    if target == overlay.preview_target {
        return;
    }
    overlay.preview_target = target;
    overlay.preview = None;
    let (Some(target), Some(player)) = (target, context.player.and_then(|e| players.get(e).ok())) else {
        return;
    };
    let Some(tile_context) = context.tiles.get(&target) else {
        return;
    };
    let launch = tile_context.glide && world.get(player.coord).is_some_and(|t| t.terrain.is_high_ground());
    let rules = if tile_context.glide { MoveRules::glide(launch) } else { MoveRules::ground() };
    overlay.preview = find_path(&world, player, player.coord, target, rules).map(|path| PathPreview {
        path,
        glide: tile_context.glide,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GameContent;

    fn player_at(species_id: &str, coord: HexCoord, movement: u32) -> Player {
        let content = GameContent::builtin().unwrap();
        let species = content.species.get(species_id).unwrap().clone();
        Player {
            id: 1,
            lineage: species.lineage.clone(),
            species_id: species_id.to_string(),
            max_population: species.max_population,
            current_population: species.max_population,
            movement_points: movement,
            remaining_movement: movement,
            evolution_points: 0,
            coord,
            species,
        }
    }

    #[test]
    fn test_ground_stops_on_medium_but_not_through_it() {
        let world = WorldMap::from_rows(&["..w..", "~~~~~"]);
        let frog = player_at("frog_tadpole", HexCoord::new(0, 0), 4);
        let costs = reachable_costs(&world, &frog, frog.coord, 4, MoveRules::ground());
        assert_eq!(costs.get(&HexCoord::new(2, 0)), Some(&2));
        assert!(!costs.contains_key(&HexCoord::new(3, 0)));
    }

    #[test]
    fn test_ground_path_avoids_medium_tiles() {
        let world = WorldMap::from_rows(&["..w..", ".....", "~~~~~"]);
        let frog = player_at("frog_tadpole", HexCoord::new(0, 0), 6);
        let path = find_path(&world, &frog, frog.coord, HexCoord::new(4, 0), MoveRules::ground()).unwrap();
        assert_eq!(path.first(), Some(&HexCoord::new(0, 0)));
        assert_eq!(path.last(), Some(&HexCoord::new(4, 0)));
        for step in &path[1..path.len() - 1] {
            assert_eq!(world.get(*step).unwrap().terrain, Terrain::Plains);
        }
        for pair in path.windows(2) {
            assert_eq!(pair[0].distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_costs_stay_within_budget() {
        let world = WorldMap::from_rows(&["......", "......", "......"]);
        let frog = player_at("frog_tadpole", HexCoord::new(0, 1), 2);
        let costs = reachable_costs(&world, &frog, frog.coord, 2, MoveRules::ground());
        assert!(costs.values().all(|&c| c <= 2));
        assert!(!costs.contains_key(&HexCoord::new(5, 1)));
        for (coord, cost) in &costs {
            assert_eq!(frog.coord.distance(*coord), *cost);
        }
    }

    #[test]
    fn test_lacustrine_enters_lakes() {
        let world = WorldMap::from_rows(&[".l.", "~~~"]);
        let frog = player_at("frog_tadpole", HexCoord::new(0, 0), 3);
        let costs = reachable_costs(&world, &frog, frog.coord, 3, MoveRules::ground());
        assert_eq!(costs.get(&HexCoord::new(1, 0)), Some(&1));
        assert_eq!(costs.get(&HexCoord::new(2, 0)), Some(&2));

        let bird = player_at("bird_hatchling", HexCoord::new(0, 0), 3);
        let costs = reachable_costs(&world, &bird, bird.coord, 3, MoveRules::ground());
        assert!(!costs.contains_key(&HexCoord::new(1, 0)));
    }

    #[test]
    fn test_glider_cannot_land_on_high_ground() {
        let world = WorldMap::from_rows(&["hm.h.", "~~~~~"]);
        let bird = player_at("bird_hatchling", HexCoord::new(0, 0), 3);
        let highlands = world.get(HexCoord::new(3, 0)).unwrap();
        assert!(!MoveRules::glide(true).allows(&bird, None, highlands, true));
        assert!(MoveRules::ground().allows(&bird, None, highlands, true));

        let context = build_turn_context(&world, &bird);
        // marsh is bad for birds, so only a glide gets past it
        let plains = context.get(&HexCoord::new(2, 0)).unwrap();
        assert!(plains.glide);
        assert!(plains.valid_destination);
        assert_eq!(plains.cost, 2);
        assert!(!context.contains_key(&HexCoord::new(3, 0)));
        assert!(!context[&bird.coord].valid_destination);
    }

    #[test]
    fn test_glide_needs_downhill_without_launch() {
        let mut world = WorldMap::from_rows(&["...", "~~~"]);
        for (q, scale) in [(0, 0.2), (1, 0.5), (2, 0.1)] {
            world.get_mut(HexCoord::new(q, 0)).unwrap().topographic_scale = scale;
        }
        let bird = player_at("bird_hatchling", HexCoord::new(0, 0), 3);
        let from = world.get(HexCoord::new(0, 0)).unwrap();
        let up = world.get(HexCoord::new(1, 0)).unwrap();
        assert!(!MoveRules::glide(false).allows(&bird, Some(from), up, false));
        assert!(MoveRules::glide(true).allows(&bird, Some(from), up, false));
        assert!(MoveRules::glide(false).allows(&bird, Some(up), from, false));
    }

    #[test]
    fn test_unreachable_target_has_no_path() {
        let world = WorldMap::from_rows(&[".M.", "~~~"]);
        let frog = player_at("frog_tadpole", HexCoord::new(0, 0), 3);
        assert_eq!(find_path(&world, &frog, frog.coord, HexCoord::new(2, 0), MoveRules::ground()), None);
    }

    #[test]
    fn test_overlay_marks_hazard_tiles() {
        let world = WorldMap::from_rows(&[".m.", "~~~"]);
        let frog = player_at("frog_tadpole", HexCoord::new(0, 0), 2);
        let content = GameContent::builtin().unwrap();
        let marsh_event = content
            .migration_events
            .iter()
            .find(|e| e.event_id == "marsh_hazard")
            .unwrap();
        let context = TurnContext {
            player: None,
            tiles: build_turn_context(&world, &frog),
        };
        let mut overlay = MovementOverlay::default();
        overlay.show(&world, &context, Some(marsh_event));
        assert!(overlay.visible);
        assert!(overlay.marks[&HexCoord::new(1, 0)].hazard);
        assert!(!overlay.marks[&HexCoord::new(2, 0)].hazard);
        assert!(!overlay.marks.contains_key(&frog.coord));
    }
}
