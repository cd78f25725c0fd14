use std::collections::HashSet;

use bevy::log::debug;

use super::WorldMap;
use crate::hex::HexCoord;

const RIVERS_PER_HUNDRED_TILES: f32 = 5.0;
const CANDIDATES_PER_RIVER: usize = 4;
const MEANDER_THRESHOLD: f32 = 0.4;
const MAX_RIVER_STEPS: usize = 150;

/// Downhill walk from `source`. Ocean and lowland neighbours always win;
/// far enough inland the river takes the second lowest step to meander.
fn trace_river(map: &WorldMap, source: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![source];
    let mut current = source;
    for _ in 0..MAX_RIVER_STEPS {
        let Some(tile) = map.get(current) else { break };
        let mut options: Vec<(f32, HexCoord)> = map
            .neighbors(current)
            .filter(|n| !path.contains(&n.coord))
            .filter_map(|n| {
                if n.is_ocean || n.lowlands {
                    Some((-1.0, n.coord))
                } else if n.is_land() && !n.is_mountain && n.elevation <= tile.elevation {
                    Some((n.elevation, n.coord))
                } else {
                    None
                }
            })
            .collect();
        if options.is_empty() {
            break;
        }
        options.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let meander = options.len() >= 2 && options[0].0 > -1.0 && tile.coastal_scale > MEANDER_THRESHOLD;
        let next = if meander { options[1].1 } else { options[0].1 };
        path.push(next);
        current = next;
        if map.get(next).is_some_and(|t| t.is_ocean || t.lowlands) {
            break;
        }
    }
    path
}

fn effective_length(map: &WorldMap, path: &[HexCoord]) -> usize {
    let ends_in_lowlands = path
        .last()
        .and_then(|c| map.get(*c))
        .is_some_and(|t| t.lowlands);
    path.len() + usize::from(ends_in_lowlands)
}

pub(super) fn carve_rivers(map: &mut WorldMap) {
    let land_count = map.land_tiles().count();
    if land_count == 0 {
        return;
    }
    let wanted = ((land_count as f32 / 100.0 * RIVERS_PER_HUNDRED_TILES) as usize).max(1);
    let candidate_count = wanted * CANDIDATES_PER_RIVER;

    let mut by_height: Vec<(f32, HexCoord)> = map
        .land_tiles()
        .filter(|t| t.passable && !t.is_coast)
        .map(|t| (t.elevation, t.coord))
        .collect();
    by_height.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut sources = Vec::new();
    let mut occupied: HashSet<HexCoord> = HashSet::new();
    for (_, c) in by_height {
        if sources.len() >= candidate_count {
            break;
        }
        if occupied.contains(&c) {
            continue;
        }
        sources.push(c);
        occupied.insert(c);
        occupied.extend(c.neighbors());
    }

    let mut paths: Vec<Vec<HexCoord>> = sources
        .iter()
        .map(|s| trace_river(map, *s))
        .filter(|p| p.len() > 1)
        .collect();
    paths.sort_by_key(|p| effective_length(map, p));
    let keep = wanted.min(paths.len());
    let paths: Vec<Vec<HexCoord>> = paths.split_off(paths.len() - keep);

    for path in &paths {
        for c in path {
            if let Some(t) = map.get_mut(*c) {
                if !t.is_ocean {
                    t.river = true;
                }
            }
        }
        let Some(dest) = path.last().and_then(|c| map.get_mut(*c)) else {
            continue;
        };
        // Inland dead ends and coastal lowland mouths pool into lakes.
        if !dest.is_ocean && (!dest.is_coast || dest.lowlands) {
            dest.is_lake = true;
            dest.passable = false;
        }
    }
    debug!("{} rivers kept from {} candidates", paths.len(), sources.len());
    map.rivers = paths;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_river_flows_downhill_to_ocean() {
        let mut map = WorldMap::from_rows(&["~....", "~....", "~...."]);
        for tile in map.tiles.values_mut() {
            tile.elevation = tile.coord.q as f32 / 4.0;
        }
        let path = trace_river(&map, HexCoord::new(4, 1));
        assert_eq!(path.first(), Some(&HexCoord::new(4, 1)));
        let last = path.last().and_then(|c| map.get(*c)).unwrap();
        assert!(last.is_ocean);
        for pair in path.windows(2) {
            assert_eq!(pair[0].distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_river_stops_in_a_pit() {
        let mut map = WorldMap::from_rows(&["...", "...", "..."]);
        for tile in map.tiles.values_mut() {
            tile.elevation = 0.9;
        }
        if let Some(t) = map.get_mut(HexCoord::new(1, 1)) {
            t.elevation = 0.1;
        }
        let path = trace_river(&map, HexCoord::new(1, 1));
        assert_eq!(path, vec![HexCoord::new(1, 1)]);
    }

    #[test]
    fn test_inland_river_ends_in_a_lake_that_keeps_its_river() {
        let mut map = WorldMap::from_rows(&["...", "...", "..."]);
        for tile in map.tiles.values_mut() {
            tile.elevation = 0.9;
        }
        if let Some(t) = map.get_mut(HexCoord::new(1, 1)) {
            t.elevation = 0.1;
        }
        carve_rivers(&mut map);
        assert_eq!(map.rivers.len(), 1);
        let end = map.rivers[0].last().and_then(|c| map.get(*c)).unwrap();
        assert!(end.is_lake);
        assert!(!end.passable);
        assert!(end.river);
    }
}
