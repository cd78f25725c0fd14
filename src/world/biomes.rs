use std::collections::{BTreeMap, BTreeSet};

use bevy::log::debug;

use super::{Biome, WorldMap};

type Scores = BTreeMap<u32, BTreeMap<Biome, f32>>;

fn region_average(map: &WorldMap, id: u32, value: impl Fn(&super::Tile) -> f32) -> f32 {
    let Some(coords) = map.regions.get(&id) else {
        return 0.0;
    };
    let values: Vec<f32> = coords.iter().filter_map(|c| map.get(*c)).map(value).collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn desire_scores(map: &WorldMap) -> Scores {
    let center_q = map.center.q;
    let max_q_offset = map
        .land_tiles()
        .map(|t| (t.coord.q - center_q).abs())
        .max()
        .unwrap_or(1)
        .max(1) as f32;

    let mut scores: Scores = BTreeMap::new();
    for id in map.regions.keys().copied() {
        let entry = scores.entry(id).or_default();
        entry.insert(Biome::Arid, region_average(map, id, |t| t.continental_scale));
        entry.insert(
            Biome::Tropical,
            region_average(map, id, |t| (t.coord.q - center_q).abs() as f32 / max_q_offset),
        );
        entry.insert(
            Biome::Floodplains,
            1.0 - region_average(map, id, |t| t.topographic_scale),
        );
    }

    let mut temperate = BTreeMap::new();
    for id in map.regions.keys().copied() {
        let neighbors = map.region_adjacency.get(&id).cloned().unwrap_or_default();
        let total: f32 = neighbors
            .iter()
            .filter_map(|n| scores.get(n))
            .map(|s| s[&Biome::Arid] + s[&Biome::Tropical])
            .sum();
        let n = (neighbors.len() * 2) as f32;
        temperate.insert(id, if n > 0.0 { total / n } else { 0.0 });
    }
    for (id, score) in temperate {
        if let Some(entry) = scores.get_mut(&id) {
            entry.insert(Biome::Temperate, score);
        }
    }
    scores
}

/// Regions are drafted one per round. Each biome nominates its highest ranked
/// unassigned region; the nomination with the best commitment (gap between the
/// region's two best ranks) plus open-slot bonus wins the round.
fn draft(scores: &Scores) -> BTreeMap<u32, Biome> {
    let mut ranked: BTreeMap<Biome, Vec<u32>> = BTreeMap::new();
    let mut ranks: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for biome in Biome::ALL {
        let mut order: Vec<u32> = scores.keys().copied().collect();
        order.sort_by(|a, b| {
            let sa = scores[a].get(&biome).copied().unwrap_or(0.0);
            let sb = scores[b].get(&biome).copied().unwrap_or(0.0);
            sb.total_cmp(&sa)
        });
        for (i, id) in order.iter().enumerate() {
            ranks.entry(*id).or_default().push(i + 1);
        }
        ranked.insert(biome, order);
    }
    for r in ranks.values_mut() {
        r.sort_unstable();
    }

    let total = scores.len();
    let slots = total.div_ceil(Biome::ALL.len()) as i64;
    let mut assigned_counts: BTreeMap<Biome, i64> = Biome::ALL.iter().map(|b| (*b, 0)).collect();
    let mut unassigned: BTreeSet<u32> = scores.keys().copied().collect();
    let mut result = BTreeMap::new();

    while !unassigned.is_empty() {
        let mut best: Option<(i64, u32, Biome)> = None;
        for biome in Biome::ALL {
            let Some(id) = ranked[&biome].iter().find(|id| unassigned.contains(id)) else {
                continue;
            };
            let r = &ranks[id];
            let commitment = (r[1] - r[0]) as i64;
            let bonus = slots - assigned_counts[&biome];
            let score = commitment + bonus;
            if best.map_or(true, |(s, _, _)| score > s) {
                best = Some((score, *id, biome));
            }
        }
        let Some((score, id, biome)) = best else { break };
        debug!("biome draft: region {} -> {:?} (score {})", id, biome, score);
        unassigned.remove(&id);
        *assigned_counts.entry(biome).or_default() += 1;
        result.insert(id, biome);
    }
    result
}

pub(super) fn assign_biomes(map: &mut WorldMap) {
    let scores = desire_scores(map);
    let biomes = draft(&scores);
    for (id, biome) in &biomes {
        let coords = map.regions.get(id).cloned().unwrap_or_default();
        for c in coords {
            if let Some(tile) = map.get_mut(c) {
                tile.biome = Some(*biome);
            }
        }
    }
    map.region_biomes = biomes;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_scores(values: &[(u32, [f32; 4])]) -> Scores {
        values
            .iter()
            .map(|(id, s)| (*id, Biome::ALL.iter().copied().zip(s.iter().copied()).collect()))
            .collect()
    }

    #[test]
    fn test_draft_assigns_every_region() {
        let scores = flat_scores(&[
            (1, [0.9, 0.1, 0.2, 0.3]),
            (2, [0.1, 0.9, 0.2, 0.3]),
            (3, [0.2, 0.1, 0.9, 0.3]),
            (4, [0.2, 0.1, 0.3, 0.9]),
            (5, [0.8, 0.2, 0.1, 0.1]),
        ]);
        let result = draft(&scores);
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_draft_respects_clear_preferences() {
        let scores = flat_scores(&[
            (1, [0.9, 0.1, 0.1, 0.1]),
            (2, [0.1, 0.9, 0.1, 0.1]),
            (3, [0.1, 0.1, 0.9, 0.1]),
            (4, [0.1, 0.1, 0.1, 0.9]),
        ]);
        let result = draft(&scores);
        assert_eq!(result[&1], Biome::Arid);
        assert_eq!(result[&2], Biome::Tropical);
        assert_eq!(result[&3], Biome::Floodplains);
        assert_eq!(result[&4], Biome::Temperate);
    }

    #[test]
    fn test_draft_spreads_biomes() {
        let scores = flat_scores(&(1..=8).map(|id| (id, [0.9, 0.1, 0.1, 0.1])).collect::<Vec<_>>());
        let result = draft(&scores);
        for biome in Biome::ALL {
            let n = result.values().filter(|b| **b == biome).count();
            assert!(n <= 3, "{biome:?} took {n} regions");
        }
    }
}
