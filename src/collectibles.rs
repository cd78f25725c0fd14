use std::collections::BTreeSet;

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::events::{CollectibleCollected, HazardTrigger, PlayerLandedOnTile, RequestHazardEvent};
use crate::game::{TurnSet, TurnState};
use crate::hex::HexCoord;
use crate::player::Player;
use crate::scene::{setup_game_scene, AppState};
use crate::settings::{GameRng, GameSettings};
use crate::world::WorldMap;

pub const EVOLUTION_POINTS_PER_COLLECTIBLE: u32 = 1;

#[derive(Component, Debug, Clone, Copy)]
pub struct Collectible {
    pub coord: HexCoord,
}

/// One site in each of half the regions nobody starts in.
pub fn choose_collectible_sites(world: &WorldMap, starts: &[HexCoord], rng: &mut impl Rng) -> Vec<HexCoord> {
    let start_regions: BTreeSet<u32> = starts.iter().filter_map(|c| world.region_of(*c)).collect();
    let spawnable: Vec<u32> = world
        .regions
        .keys()
        .copied()
        .filter(|r| !start_regions.contains(r))
        .collect();
    let picked: Vec<u32> = spawnable.choose_multiple(rng, spawnable.len() / 2).copied().collect();

    let mut sites = Vec::new();
    for region in picked {
        let Some(coords) = world.regions.get(&region) else {
            continue;
        };
        let passable: Vec<HexCoord> = coords
            .iter()
            .copied()
            .filter(|c| world.get(*c).is_some_and(|t| t.passable))
            .collect();
        match passable.choose(rng) {
            Some(c) => sites.push(*c),
            None => debug!("region {region} has no passable tile for a collectible"),
        }
    }
    sites
}

/// Closest site by hex distance; ties go to the lowest coordinate.
pub fn nearest_site(from: HexCoord, sites: impl IntoIterator<Item = HexCoord>) -> Option<HexCoord> {
    sites.into_iter().min_by_key(|c| (from.distance(*c), *c))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollectibleIndicator {
    pub anchor: HexCoord,
    pub target: HexCoord,
    /// Radians, world space, counter-clockwise from +x.
    pub angle: f32,
}

#[derive(Resource, Default, Debug)]
pub struct NearestCollectible(pub Option<CollectibleIndicator>);

pub struct CollectiblePlugin;
impl Plugin for CollectiblePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NearestCollectible>()
            .add_systems(OnEnter(AppState::InGame), seed_collectibles.after(setup_game_scene))
            .add_systems(OnExit(AppState::InGame), |mut nearest: ResMut<NearestCollectible>| {
                nearest.0 = None;
            })
            .add_systems(Update, collect_on_landing.in_set(TurnSet::Resolve))
            .add_systems(Update, update_indicator.in_set(TurnSet::Refresh));
    }
}

fn seed_collectibles(
    mut commands: Commands,
    world: Res<WorldMap>,
    players: Query<&Player>,
    mut rng: ResMut<GameRng>,
) {
    let starts: Vec<HexCoord> = players.iter().map(|p| p.coord).collect();
    let sites = choose_collectible_sites(&world, &starts, &mut rng.0);
    info!("seeded {} collectibles", sites.len());
    for coord in sites {
        commands.spawn((Collectible { coord }, StateScoped(AppState::InGame)));
    }
}

fn collect_on_landing(
    mut commands: Commands,
    mut landed: EventReader<PlayerLandedOnTile>,
    collectibles: Query<(Entity, &Collectible)>,
    mut players: Query<&mut Player>,
    mut collected: EventWriter<CollectibleCollected>,
    mut hazards: EventWriter<RequestHazardEvent>,
) {
    for ev in landed.read() {
        let Some((entity, _)) = collectibles.iter().find(|(_, c)| c.coord == ev.coord) else {
            continue;
        };
        let Ok(mut player) = players.get_mut(ev.player) else {
            continue;
        };
        player.gain_evolution_points(EVOLUTION_POINTS_PER_COLLECTIBLE);
        info!("{} collects at {}, {} EP", player.name(), ev.coord, player.evolution_points);
        commands.entity(entity).despawn_recursive();
        collected.send(CollectibleCollected {
            player: ev.player,
            coord: ev.coord,
        });
        hazards.send(RequestHazardEvent {
            trigger: HazardTrigger::Collectible,
        });
    }
}

fn update_indicator(
    turn: Res<TurnState>,
    settings: Res<GameSettings>,
    players: Query<&Player>,
    collectibles: Query<&Collectible>,
    mut nearest: ResMut<NearestCollectible>,
) {
    let indicator = turn
        .active()
        .and_then(|e| players.get(e).ok())
        .filter(|_| turn.started)
        .and_then(|player| {
            let target = nearest_site(player.coord, collectibles.iter().map(|c| c.coord))?;
            let delta = target.to_world(settings.hex_size) - player.coord.to_world(settings.hex_size);
            Some(CollectibleIndicator {
                anchor: player.coord,
                target,
                angle: delta.y.atan2(delta.x),
            })
        });
    if nearest.0 != indicator {
        nearest.0 = indicator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Tile;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Ten single-row regions, region id = row.
    fn striped_world() -> WorldMap {
        let rows: Vec<&str> = vec!["....."; 10];
        let mut world = WorldMap::from_rows(&rows);
        world.regions.clear();
        let tiles: Vec<Tile> = world.tiles.values().cloned().collect();
        for mut tile in tiles {
            let region = tile.coord.r as u32;
            tile.region = Some(region);
            world.regions.entry(region).or_default().push(tile.coord);
            world.tiles.insert(tile.coord, tile);
        }
        world
    }

    #[test]
    fn test_sites_skip_start_regions_and_take_half_the_rest() {
        let world = striped_world();
        let starts = [HexCoord::new(0, 0), HexCoord::new(3, 5)];
        let mut rng = StdRng::seed_from_u64(21);
        let sites = choose_collectible_sites(&world, &starts, &mut rng);
        assert_eq!(sites.len(), 4);
        let regions: BTreeSet<u32> = sites.iter().filter_map(|c| world.region_of(*c)).collect();
        assert_eq!(regions.len(), 4);
        assert!(!regions.contains(&0));
        assert!(!regions.contains(&5));
    }

    #[test]
    fn test_sites_are_passable() {
        let mut world = striped_world();
        for tile in world.tiles.values_mut() {
            if tile.coord.q != 2 {
                tile.passable = false;
            }
        }
        let mut rng = StdRng::seed_from_u64(4);
        let sites = choose_collectible_sites(&world, &[], &mut rng);
        assert_eq!(sites.len(), 5);
        assert!(sites.iter().all(|c| c.q == 2));
    }

    #[test]
    fn test_nearest_site_by_hex_distance() {
        let from = HexCoord::new(2, 2);
        let sites = [HexCoord::new(9, 9), HexCoord::new(3, 2), HexCoord::new(0, 0)];
        assert_eq!(nearest_site(from, sites), Some(HexCoord::new(3, 2)));
        assert_eq!(nearest_site(from, Vec::new()), None);
    }
}
