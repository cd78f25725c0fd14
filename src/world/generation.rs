//! Procedural continent generation.
//!
//! The map is built in passes over a shared [`WorldMap`]: regions are
//! stamped around lattice seeds, water and distance fields are measured,
//! geographic tags are applied, biomes are drafted per region, rivers are
//! carved, and finally every tile is given a terrain from a priority rulebook.
//! Every pass that draws from the rng walks coordinates in sorted order so a
//! seed always produces the same map.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use bevy::log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{biomes, rivers, Biome, Terrain, Tile, WorldMap};
use crate::hex::HexCoord;

const LATTICE_OFFSETS_EVEN: [(i32, i32); 6] = [(0, -7), (5, -3), (5, 4), (0, 7), (-6, 3), (-5, -4)];
const LATTICE_OFFSETS_ODD: [(i32, i32); 6] = [(1, -7), (6, -3), (5, 4), (-1, 7), (-5, 3), (-5, -4)];

const CONTINENTAL_SCALE_MIN: f32 = 0.2;
const WEIGHT_CONTINENTAL: f32 = 2.0;
const WEIGHT_TOPOGRAPHIC: f32 = 10.0;
const WEIGHT_COASTAL: f32 = 2.0;
const MOUNTAIN_RANGE_DISTANCE: u32 = 1;

#[derive(Clone, Debug)]
pub struct WorldParams {
    pub region_count: usize,
    pub region_radius: i32,
    pub padding: i32,
    pub mountain_percent: u32,
    pub lowlands_percent: u32,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            region_count: 14,
            region_radius: 3,
            padding: 4,
            mountain_percent: 20,
            lowlands_percent: 15,
        }
    }
}

pub fn generate_world(params: &WorldParams, rng: &mut impl Rng) -> WorldMap {
    let centers = seed_region_centers(params.region_count.max(2), rng);
    let mut map = stamp_regions(&centers, params);
    tag_ocean_and_coast(&mut map);
    measure_center_and_ocean(&mut map);
    place_mountains(&mut map, params.mountain_percent, rng);
    measure_mountains(&mut map);
    compute_elevation(&mut map);
    tag_lowlands(&mut map, params.lowlands_percent);
    tag_mountain_range(&mut map);
    tag_central_desert(&mut map);
    tag_adjacent_scrubland(&mut map);
    tag_windward_leeward(&mut map);
    biomes::assign_biomes(&mut map);
    rivers::carve_rivers(&mut map);
    fill_terrain(&mut map, rng);

    info!(
        "world generated: {}x{} tiles, {} regions, {} rivers",
        map.cols,
        map.rows,
        map.regions.len(),
        map.rivers.len()
    );
    map
}

fn lattice_offsets(r: i32) -> &'static [(i32, i32); 6] {
    if r & 1 == 1 {
        &LATTICE_OFFSETS_ODD
    } else {
        &LATTICE_OFFSETS_EVEN
    }
}

fn lattice_neighbors(p: HexCoord) -> impl Iterator<Item = HexCoord> {
    lattice_offsets(p.r)
        .iter()
        .map(move |(dq, dr)| HexCoord::new(p.q + dq, p.r + dr))
}

/// Grows a connected cluster of lattice points: the origin, one of its
/// neighbours, then points touching at least two chosen points.
fn seed_region_centers(count: usize, rng: &mut impl Rng) -> Vec<HexCoord> {
    let origin = HexCoord::new(0, 0);
    let rings = ((count + 1) / 2).max(1);

    let mut lattice: BTreeSet<HexCoord> = BTreeSet::from([origin]);
    let mut frontier = vec![origin];
    for _ in 0..rings {
        let mut next = Vec::new();
        for p in frontier {
            for n in lattice_neighbors(p) {
                if lattice.insert(n) {
                    next.push(n);
                }
            }
        }
        frontier = next;
    }

    let mut chosen: Vec<HexCoord> = vec![origin];
    let first_ring: Vec<HexCoord> = lattice_neighbors(origin).collect();
    if let Some(p) = first_ring.choose(rng) {
        chosen.push(*p);
    }

    while chosen.len() < count {
        let eligible: Vec<HexCoord> = lattice
            .iter()
            .filter(|p| !chosen.contains(p))
            .filter(|p| lattice_neighbors(**p).filter(|n| chosen.contains(n)).count() >= 2)
            .copied()
            .collect();
        let Some(pick) = eligible.choose(rng) else {
            debug!("region seeding stopped at {}/{} centers", chosen.len(), count);
            break;
        };
        chosen.push(*pick);
    }
    chosen
}

/// Stamps a disk around every center and normalizes the padded bounds to start
/// at (0, 0). The row shift is kept even so odd-r parity is preserved.
fn stamp_regions(centers: &[HexCoord], params: &WorldParams) -> WorldMap {
    let mut owner: HashMap<HexCoord, (u32, u32)> = HashMap::new();
    for (i, center) in centers.iter().enumerate() {
        let id = i as u32 + 1;
        for c in center.disk(params.region_radius) {
            let d = c.distance(*center);
            match owner.get(&c) {
                Some((_, best)) if *best <= d => {}
                _ => {
                    owner.insert(c, (id, d));
                }
            }
        }
    }

    let min_q = owner.keys().map(|c| c.q).min().unwrap_or(0) - params.padding;
    let max_q = owner.keys().map(|c| c.q).max().unwrap_or(0) + params.padding;
    let min_r = owner.keys().map(|c| c.r).min().unwrap_or(0) - params.padding;
    let max_r = owner.keys().map(|c| c.r).max().unwrap_or(0) + params.padding;
    let offset_q = -min_q;
    let mut offset_r = -min_r;
    if offset_r & 1 == 1 {
        offset_r += 1;
    }

    let mut map = WorldMap {
        cols: max_q + offset_q + 1,
        rows: max_r + offset_r + 1,
        ..Default::default()
    };
    for r in 0..map.rows {
        for q in 0..map.cols {
            let coord = HexCoord::new(q, r);
            let mut tile = Tile::new(coord);
            if let Some((id, _)) = owner.get(&HexCoord::new(q - offset_q, r - offset_r)) {
                tile.region = Some(*id);
                tile.passable = true;
                map.regions.entry(*id).or_default().push(coord);
            }
            map.tiles.insert(coord, tile);
        }
    }
    for coords in map.regions.values_mut() {
        coords.sort();
    }

    let mut adjacency: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for tile in map.land_tiles() {
        let Some(id) = tile.region else { continue };
        for n in map.neighbors(tile.coord) {
            if let Some(other) = n.region {
                if other != id {
                    adjacency.entry(id).or_default().insert(other);
                }
            }
        }
    }
    map.region_adjacency = adjacency;
    map
}

fn tag_ocean_and_coast(map: &mut WorldMap) {
    for tile in map.tiles.values_mut() {
        if !tile.is_land() {
            tile.is_ocean = true;
            tile.passable = false;
            tile.terrain = Terrain::Ocean;
        }
    }
    let coast: Vec<HexCoord> = map
        .land_tiles()
        .filter(|t| map.neighbors(t.coord).any(|n| n.is_ocean))
        .map(|t| t.coord)
        .collect();
    for c in coast {
        if let Some(t) = map.get_mut(c) {
            t.is_coast = true;
        }
    }
}

/// Multi-source breadth-first distance over the whole grid.
fn bfs_distances(map: &WorldMap, sources: &[HexCoord]) -> HashMap<HexCoord, u32> {
    let mut dist: HashMap<HexCoord, u32> = HashMap::new();
    let mut queue = VecDeque::new();
    for s in sources {
        dist.insert(*s, 0);
        queue.push_back(*s);
    }
    while let Some(c) = queue.pop_front() {
        let d = dist[&c];
        for n in c.neighbors() {
            if map.tiles.contains_key(&n) && !dist.contains_key(&n) {
                dist.insert(n, d + 1);
                queue.push_back(n);
            }
        }
    }
    dist
}

fn measure_center_and_ocean(map: &mut WorldMap) {
    let land: Vec<HexCoord> = map.land_tiles().map(|t| t.coord).collect();
    if !land.is_empty() {
        let n = land.len() as f32;
        let q = land.iter().map(|c| c.q as f32).sum::<f32>() / n;
        let r = land.iter().map(|c| c.r as f32).sum::<f32>() / n;
        map.center = HexCoord::new(q.round() as i32, r.round() as i32);
    }

    let ocean: Vec<HexCoord> = map.tiles.values().filter(|t| t.is_ocean).map(|t| t.coord).collect();
    let dist = bfs_distances(map, &ocean);
    let center = map.center;
    for tile in map.tiles.values_mut() {
        tile.dist_from_ocean = dist.get(&tile.coord).copied().unwrap_or(0);
        tile.dist_from_center = tile.coord.distance(center);
    }
}

fn sorted_land(map: &WorldMap) -> Vec<HexCoord> {
    let mut land: Vec<HexCoord> = map.land_tiles().map(|t| t.coord).collect();
    land.sort();
    land
}

/// Mountains are laid down as short ridges of inland tiles, each step
/// turning at most one direction away from the previous heading.
fn place_mountains(map: &mut WorldMap, percent: u32, rng: &mut impl Rng) {
    let land = sorted_land(map);
    if land.is_empty() {
        return;
    }
    let inland: Vec<HexCoord> = land
        .iter()
        .filter(|c| map.get(**c).is_some_and(|t| !t.is_coast))
        .copied()
        .collect();
    let wanted = ((percent as usize * land.len()) / 100).max(1);
    let target = wanted.min(inland.len() / 2);

    let mut placed = 0;
    let mut attempts = 0;
    while placed < target && attempts < target * 8 {
        attempts += 1;
        let Some(mut at) = inland.choose(rng).copied() else { break };
        let mut heading = rng.gen_range(0..6usize);
        for _ in 0..rng.gen_range(3..=6) {
            if placed >= target {
                break;
            }
            let Some(tile) = map.get_mut(at) else { break };
            if !tile.is_mountain && !tile.is_coast && tile.is_land() {
                tile.is_mountain = true;
                tile.passable = false;
                placed += 1;
            }
            heading = (heading + [5, 0, 1][rng.gen_range(0..3usize)]) % 6;
            let next = at.neighbors()[heading];
            if !map.get(next).is_some_and(|t| t.is_land() && !t.is_coast) {
                break;
            }
            at = next;
        }
    }
    debug!("{} mountains placed on {} land tiles", placed, land.len());
}

fn measure_mountains(map: &mut WorldMap) {
    let mountains: Vec<HexCoord> = map.tiles.values().filter(|t| t.is_mountain).map(|t| t.coord).collect();
    if mountains.is_empty() {
        return;
    }
    let dist = bfs_distances(map, &mountains);
    for tile in map.tiles.values_mut() {
        tile.dist_to_mountain = dist.get(&tile.coord).copied();
    }
}

fn normalized(value: u32, min: u32, max: u32) -> f32 {
    let range = max.saturating_sub(min).max(1) as f32;
    (value.saturating_sub(min)) as f32 / range
}

fn compute_elevation(map: &mut WorldMap) {
    let land: Vec<&Tile> = map.land_tiles().collect();
    if land.is_empty() {
        return;
    }
    let max_center = land.iter().map(|t| t.dist_from_center).max().unwrap_or(1).max(1) as f32;
    let mountain_dists: Vec<u32> = land.iter().filter_map(|t| t.dist_to_mountain).collect();
    let (m_min, m_max) = (
        mountain_dists.iter().copied().min().unwrap_or(0),
        mountain_dists.iter().copied().max().unwrap_or(0),
    );
    let o_min = land.iter().map(|t| t.dist_from_ocean).min().unwrap_or(0);
    let o_max = land.iter().map(|t| t.dist_from_ocean).max().unwrap_or(0);

    let total = WEIGHT_CONTINENTAL + WEIGHT_TOPOGRAPHIC + WEIGHT_COASTAL;
    let mut raw: HashMap<HexCoord, f32> = HashMap::new();
    for tile in map.tiles.values_mut().filter(|t| t.is_land()) {
        let proportional = (tile.dist_from_center as f32 / max_center).min(1.0);
        tile.continental_scale = CONTINENTAL_SCALE_MIN + (1.0 - proportional) * (1.0 - CONTINENTAL_SCALE_MIN);
        tile.topographic_scale = tile
            .dist_to_mountain
            .map(|d| 1.0 - normalized(d, m_min, m_max))
            .unwrap_or(0.0);
        tile.coastal_scale = normalized(tile.dist_from_ocean, o_min, o_max);
        raw.insert(
            tile.coord,
            (tile.continental_scale * WEIGHT_CONTINENTAL
                + tile.topographic_scale * WEIGHT_TOPOGRAPHIC
                + tile.coastal_scale * WEIGHT_COASTAL)
                / total,
        );
    }

    let lo = raw.values().copied().fold(f32::MAX, f32::min);
    let hi = raw.values().copied().fold(f32::MIN, f32::max);
    let range = if hi > lo { hi - lo } else { 1.0 };
    for (c, v) in raw {
        if let Some(t) = map.get_mut(c) {
            t.elevation = (v - lo) / range;
        }
    }
}

/// Tags the farthest-from-mountain distance tiers whose cumulative size lands
/// closest to the target share of land.
fn tag_lowlands(map: &mut WorldMap, percent: u32) {
    let land: Vec<&Tile> = map.land_tiles().collect();
    if land.is_empty() {
        return;
    }
    let target = (land.len() * percent as usize / 100) as i64;
    let mut counts: BTreeMap<u32, i64> = BTreeMap::new();
    for d in land.iter().filter_map(|t| t.dist_to_mountain) {
        *counts.entry(d).or_default() += 1;
    }

    let mut best_steps = 0;
    let mut best_delta = i64::MAX;
    let mut cumulative = 0;
    for (i, (_, n)) in counts.iter().rev().enumerate() {
        cumulative += n;
        let delta = (cumulative - target).abs();
        if delta < best_delta {
            best_delta = delta;
            best_steps = i + 1;
        }
    }
    let tiers: HashSet<u32> = counts.keys().rev().take(best_steps).copied().collect();
    for tile in map.tiles.values_mut().filter(|t| t.is_land()) {
        if tile.dist_to_mountain.is_some_and(|d| tiers.contains(&d)) {
            tile.lowlands = true;
        }
    }
}

fn tag_mountain_range(map: &mut WorldMap) {
    for tile in map.tiles.values_mut() {
        if tile.passable && !tile.is_mountain && tile.dist_to_mountain.is_some_and(|d| d <= MOUNTAIN_RANGE_DISTANCE) {
            tile.mountain_range = true;
        }
    }
}

fn tag_central_desert(map: &mut WorldMap) {
    let steps = ((map.regions.len() as f32).sqrt() as usize).max(1);
    let tiers: BTreeSet<u32> = map
        .tiles
        .values()
        .filter(|t| t.passable)
        .map(|t| t.dist_from_ocean)
        .collect();
    let desert: HashSet<u32> = tiers.iter().rev().take(steps).copied().collect();
    for tile in map.tiles.values_mut() {
        if tile.passable && desert.contains(&tile.dist_from_ocean) {
            tile.central_desert = true;
        }
    }
}

fn tag_adjacent_scrubland(map: &mut WorldMap) {
    let border: Vec<HexCoord> = map
        .tiles
        .values()
        .filter(|t| t.passable && !t.central_desert)
        .filter(|t| map.neighbors(t.coord).any(|n| n.central_desert))
        .map(|t| t.coord)
        .collect();
    for c in border {
        if let Some(t) = map.get_mut(c) {
            t.adjacent_scrubland = true;
        }
    }
}

/// A range tile farther from the centre than a same-row mountain is windward;
/// one closer to the centre is leeward. Both can hold.
fn tag_windward_leeward(map: &mut WorldMap) {
    let mut updates = Vec::new();
    for tile in map.tiles.values().filter(|t| t.mountain_range) {
        let row_mountains: Vec<u32> = map
            .neighbors(tile.coord)
            .filter(|n| n.coord.r == tile.coord.r && n.is_mountain)
            .map(|n| n.dist_from_center)
            .collect();
        if row_mountains.is_empty() {
            continue;
        }
        let windward = row_mountains.iter().any(|m| tile.dist_from_center > *m);
        let leeward = row_mountains.iter().any(|m| tile.dist_from_center < *m);
        updates.push((tile.coord, windward, leeward));
    }
    for (c, windward, leeward) in updates {
        if let Some(t) = map.get_mut(c) {
            t.windward = windward;
            t.leeward = leeward;
        }
    }
}

#[derive(Clone, Copy)]
enum Tag {
    Mountain,
    Lake,
    Ocean,
    Zone(Biome),
    Windward,
    Leeward,
    MountainRange,
    Lowlands,
}

impl Tag {
    fn holds(self, tile: &Tile) -> bool {
        match self {
            Tag::Mountain => tile.is_mountain,
            Tag::Lake => tile.is_lake,
            Tag::Ocean => tile.is_ocean,
            Tag::Zone(b) => tile.biome == Some(b),
            Tag::Windward => tile.windward,
            Tag::Leeward => tile.leeward,
            Tag::MountainRange => tile.mountain_range,
            Tag::Lowlands => tile.lowlands,
        }
    }
}

use Biome::{Arid, Floodplains, Temperate, Tropical};
use Tag::*;

/// First rule whose tags all hold wins; the terrain is drawn from its options.
const TERRAIN_RULES: &[(&[Tag], &[Terrain])] = &[
    (&[Mountain], &[Terrain::Mountains]),
    (&[Lake], &[Terrain::Lake]),
    (&[Zone(Temperate), Windward, Leeward], &[Terrain::Plains]),
    (&[Zone(Tropical), Windward, Leeward], &[Terrain::Plains]),
    (&[Zone(Floodplains), Windward, Leeward], &[Terrain::Plains]),
    (&[Zone(Arid), Windward], &[Terrain::Woodlands]),
    (&[Zone(Temperate), Windward], &[Terrain::Woodlands]),
    (&[Zone(Floodplains), Windward], &[Terrain::Woodlands]),
    (&[Zone(Tropical), Windward], &[Terrain::Woodlands]),
    (&[Zone(Arid), Leeward], &[Terrain::DesertDunes]),
    (&[Zone(Temperate), Leeward], &[Terrain::Scrublands]),
    (&[Zone(Tropical), Leeward], &[Terrain::Scrublands]),
    (&[Zone(Floodplains), Leeward], &[Terrain::Plains]),
    (&[Zone(Tropical), MountainRange], &[Terrain::Woodlands, Terrain::Highlands]),
    (&[Zone(Arid), Lowlands], &[Terrain::DesertDunes]),
    (&[Zone(Temperate), Lowlands], &[Terrain::Plains]),
    (&[Zone(Floodplains), Lowlands], &[Terrain::Marsh]),
    (&[MountainRange], &[Terrain::Scrublands, Terrain::Highlands]),
    (&[Lowlands], &[Terrain::Marsh]),
    (&[Zone(Arid)], &[Terrain::Scrublands]),
    (&[Zone(Tropical)], &[Terrain::Woodlands]),
    (&[Zone(Temperate)], &[Terrain::Scrublands]),
    (&[Zone(Floodplains)], &[Terrain::Plains]),
    (&[Ocean], &[Terrain::Ocean]),
];

fn terrain_options(tile: &Tile) -> &'static [Terrain] {
    TERRAIN_RULES
        .iter()
        .find(|(tags, _)| tags.iter().all(|tag| tag.holds(tile)))
        .map_or(&[], |(_, options)| *options)
}

fn fill_terrain(map: &mut WorldMap, rng: &mut impl Rng) {
    let mut coords: Vec<HexCoord> = map.tiles.keys().copied().collect();
    coords.sort();
    for c in coords {
        let Some(tile) = map.get_mut(c) else { continue };
        if let Some(terrain) = terrain_options(tile).choose(rng) {
            tile.terrain = *terrain;
        }
        if tile.is_land() && !tile.is_mountain && !tile.is_lake {
            tile.passable = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world(seed: u64) -> WorldMap {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_world(&WorldParams::default(), &mut rng)
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = world(7);
        let b = world(7);
        assert_eq!(a.cols, b.cols);
        assert_eq!(a.rows, b.rows);
        for (c, t) in &a.tiles {
            let other = &b.tiles[c];
            assert_eq!(t.terrain, other.terrain, "terrain differs at {c}");
            assert_eq!(t.river, other.river);
        }
    }

    #[test]
    fn test_region_count_and_membership() {
        let map = world(11);
        assert_eq!(map.regions.len(), WorldParams::default().region_count);
        for (id, coords) in &map.regions {
            for c in coords {
                assert_eq!(map.region_of(*c), Some(*id));
            }
        }
    }

    #[test]
    fn test_map_is_bordered_by_ocean() {
        let map = world(3);
        for tile in map.tiles.values() {
            let c = tile.coord;
            if c.q == 0 || c.r == 0 || c.q == map.cols - 1 || c.r == map.rows - 1 {
                assert!(tile.is_ocean, "edge tile {c} should be ocean");
                assert_eq!(tile.terrain, Terrain::Ocean);
            }
        }
    }

    #[test]
    fn test_mountains_are_impassable_and_not_coastal() {
        let map = world(5);
        let mountains: Vec<&Tile> = map.tiles.values().filter(|t| t.is_mountain).collect();
        assert!(!mountains.is_empty());
        for m in mountains {
            assert!(!m.passable);
            assert!(!m.is_coast);
            assert_eq!(m.terrain, Terrain::Mountains);
            assert_eq!(m.dist_to_mountain, Some(0));
        }
    }

    #[test]
    fn test_every_region_gets_a_biome() {
        let map = world(9);
        for id in map.regions.keys() {
            assert!(map.region_biomes.contains_key(id), "region {id} missing biome");
        }
        for tile in map.land_tiles() {
            assert!(tile.biome.is_some());
        }
    }

    #[test]
    fn test_elevation_is_normalized() {
        let map = world(13);
        for tile in map.land_tiles() {
            assert!((0.0..=1.0).contains(&tile.elevation));
            assert!((0.0..=1.0).contains(&tile.topographic_scale));
        }
    }

    #[test]
    fn test_lowlands_take_the_farthest_tier() {
        let map = world(21);
        let farthest = map.land_tiles().filter_map(|t| t.dist_to_mountain).max().unwrap();
        assert!(farthest > 0);
        for tile in map.land_tiles() {
            if tile.dist_to_mountain == Some(farthest) {
                assert!(tile.lowlands, "{} should be lowlands", tile.coord);
            }
            if tile.is_mountain {
                assert!(!tile.lowlands);
            }
        }
    }

    #[test]
    fn test_parity_preserved_by_normalization() {
        let centers = vec![HexCoord::new(0, 1)];
        let params = WorldParams {
            region_count: 1,
            padding: 2,
            ..Default::default()
        };
        let map = stamp_regions(&centers, &params);
        let land: HashSet<HexCoord> = map.land_tiles().map(|t| t.coord).collect();
        assert_eq!(land.len(), 37);
        let center = land
            .iter()
            .find(|c| c.neighbors().iter().all(|n| land.contains(n)) && c.disk(3).iter().all(|d| land.contains(d)))
            .copied();
        assert!(center.is_some_and(|c| c.r & 1 == 1));
    }

    fn tagged(biome: Biome, set: impl Fn(&mut Tile)) -> Tile {
        let mut tile = Tile::new(HexCoord::new(0, 0));
        tile.biome = Some(biome);
        set(&mut tile);
        tile
    }

    #[test]
    fn test_terrain_rules_for_tag_combinations() {
        let tropical_slope = tagged(Tropical, |t| t.windward = true);
        assert_eq!(terrain_options(&tropical_slope), &[Terrain::Woodlands]);

        let tropical = tagged(Tropical, |_| {});
        assert_eq!(terrain_options(&tropical), &[Terrain::Woodlands]);

        let temperate = tagged(Temperate, |_| {});
        assert_eq!(terrain_options(&temperate), &[Terrain::Scrublands]);

        let arid_range = tagged(Arid, |t| t.mountain_range = true);
        assert_eq!(terrain_options(&arid_range), &[Terrain::Scrublands, Terrain::Highlands]);

        let tropical_range = tagged(Tropical, |t| t.mountain_range = true);
        assert_eq!(terrain_options(&tropical_range), &[Terrain::Woodlands, Terrain::Highlands]);

        let valley = tagged(Temperate, |t| {
            t.windward = true;
            t.leeward = true;
        });
        assert_eq!(terrain_options(&valley), &[Terrain::Plains]);

        let tropical_lowlands = tagged(Tropical, |t| t.lowlands = true);
        assert_eq!(terrain_options(&tropical_lowlands), &[Terrain::Marsh]);
    }

    #[test]
    fn test_generated_land_never_uses_unlisted_terrain() {
        for seed in [3, 11] {
            let map = world(seed);
            assert!(map
                .tiles
                .values()
                .all(|t| !matches!(t.terrain, Terrain::Hills | Terrain::ForestBroadleaf)));
        }
    }
}
