mod biomes;
mod generation;
mod rivers;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;

pub use generation::{generate_world, WorldParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Terrain {
    Ocean,
    Lake,
    Mountains,
    Highlands,
    Hills,
    Woodlands,
    ForestBroadleaf,
    Plains,
    Scrublands,
    DesertDunes,
    Marsh,
    /// Only used in content rules; a tile with a river keeps its own terrain.
    River,
}

impl Terrain {
    pub fn is_high_ground(self) -> bool {
        matches!(self, Terrain::Highlands | Terrain::Hills)
    }

    pub fn color(self) -> Color {
        match self {
            Terrain::Ocean => Color::srgb(0.12, 0.25, 0.45),
            Terrain::Lake => Color::srgb(0.25, 0.5, 0.7),
            Terrain::Mountains => Color::srgb(0.45, 0.42, 0.4),
            Terrain::Highlands => Color::srgb(0.55, 0.5, 0.38),
            Terrain::Hills => Color::srgb(0.5, 0.56, 0.35),
            Terrain::Woodlands => Color::srgb(0.2, 0.45, 0.22),
            Terrain::ForestBroadleaf => Color::srgb(0.14, 0.36, 0.18),
            Terrain::Plains => Color::srgb(0.55, 0.66, 0.32),
            Terrain::Scrublands => Color::srgb(0.62, 0.58, 0.36),
            Terrain::DesertDunes => Color::srgb(0.85, 0.75, 0.48),
            Terrain::Marsh => Color::srgb(0.3, 0.45, 0.38),
            Terrain::River => Color::srgb(0.3, 0.55, 0.8),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Biome {
    Arid,
    Tropical,
    Floodplains,
    Temperate,
}

impl Biome {
    pub const ALL: [Biome; 4] = [Biome::Arid, Biome::Tropical, Biome::Floodplains, Biome::Temperate];
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub coord: HexCoord,
    pub region: Option<u32>,
    pub terrain: Terrain,
    pub biome: Option<Biome>,
    pub passable: bool,
    pub is_ocean: bool,
    pub is_coast: bool,
    pub is_lake: bool,
    pub is_mountain: bool,
    pub river: bool,
    pub lowlands: bool,
    pub mountain_range: bool,
    pub central_desert: bool,
    pub adjacent_scrubland: bool,
    pub windward: bool,
    pub leeward: bool,
    pub dist_from_ocean: u32,
    pub dist_from_center: u32,
    pub dist_to_mountain: Option<u32>,
    pub continental_scale: f32,
    pub topographic_scale: f32,
    pub coastal_scale: f32,
    pub elevation: f32,
    /// Tokens placed through the debug panel.
    pub resources: Vec<String>,
}

impl Tile {
    fn new(coord: HexCoord) -> Self {
        Self {
            coord,
            region: None,
            terrain: Terrain::Ocean,
            biome: None,
            passable: false,
            is_ocean: false,
            is_coast: false,
            is_lake: false,
            is_mountain: false,
            river: false,
            lowlands: false,
            mountain_range: false,
            central_desert: false,
            adjacent_scrubland: false,
            windward: false,
            leeward: false,
            dist_from_ocean: 0,
            dist_from_center: 0,
            dist_to_mountain: None,
            continental_scale: 0.0,
            topographic_scale: 0.0,
            coastal_scale: 0.0,
            elevation: 0.0,
            resources: Vec::new(),
        }
    }

    pub fn is_land(&self) -> bool {
        self.region.is_some()
    }

    /// `River` matches any tile carrying a river.
    pub fn matches_terrain(&self, terrain: Terrain) -> bool {
        self.terrain == terrain || (terrain == Terrain::River && self.river)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        match tag {
            "is_coast" => self.is_coast,
            "river" | "has_river" => self.river,
            "lowlands" => self.lowlands,
            "mountain_range" => self.mountain_range,
            "central_desert" => self.central_desert,
            "adjacent_scrubland" => self.adjacent_scrubland,
            "windward" => self.windward,
            "leeward" => self.leeward,
            _ => false,
        }
    }
}

#[derive(Resource, Clone, Debug, Default)]
pub struct WorldMap {
    pub cols: i32,
    pub rows: i32,
    pub tiles: HashMap<HexCoord, Tile>,
    pub regions: BTreeMap<u32, Vec<HexCoord>>,
    pub region_biomes: BTreeMap<u32, Biome>,
    pub region_adjacency: BTreeMap<u32, BTreeSet<u32>>,
    pub rivers: Vec<Vec<HexCoord>>,
    pub center: HexCoord,
}

impl WorldMap {
    pub fn get(&self, coord: HexCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn get_mut(&mut self, coord: HexCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    pub fn land_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values().filter(|t| t.is_land())
    }

    /// Sorted so callers drawing from an rng stay deterministic.
    pub fn coords_in_biome(&self, biome: Biome) -> Vec<HexCoord> {
        let mut coords: Vec<HexCoord> = self
            .region_biomes
            .iter()
            .filter(|(_, b)| **b == biome)
            .filter_map(|(id, _)| self.regions.get(id))
            .flatten()
            .copied()
            .collect();
        coords.sort();
        coords
    }

    pub fn region_of(&self, coord: HexCoord) -> Option<u32> {
        self.get(coord).and_then(|t| t.region)
    }

    pub fn neighbors(&self, coord: HexCoord) -> impl Iterator<Item = &Tile> {
        coord.neighbors().into_iter().filter_map(|n| self.tiles.get(&n))
    }

    /// Builds a map from a text grid, one char per tile, odd rows shifted as usual.
    /// `.` plains, `m` marsh, `w` woodlands, `h` highlands, `s` scrublands,
    /// `M` mountains, `~` ocean, `l` lake, `r` plains with a river.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> WorldMap {
        let mut map = WorldMap {
            rows: rows.len() as i32,
            cols: rows.iter().map(|r| r.len()).max().unwrap_or(0) as i32,
            ..default()
        };
        for (r, line) in rows.iter().enumerate() {
            for (q, ch) in line.chars().enumerate() {
                let coord = HexCoord::new(q as i32, r as i32);
                let mut tile = Tile::new(coord);
                tile.region = Some(0);
                tile.passable = true;
                tile.terrain = match ch {
                    'm' => Terrain::Marsh,
                    'w' => Terrain::Woodlands,
                    'h' => Terrain::Highlands,
                    's' => Terrain::Scrublands,
                    'M' => Terrain::Mountains,
                    '~' => Terrain::Ocean,
                    'l' => Terrain::Lake,
                    _ => Terrain::Plains,
                };
                match ch {
                    'M' => {
                        tile.passable = false;
                        tile.is_mountain = true;
                    }
                    '~' => {
                        tile.passable = false;
                        tile.is_ocean = true;
                        tile.region = None;
                    }
                    'l' => {
                        tile.passable = false;
                        tile.is_lake = true;
                    }
                    'r' => tile.river = true,
                    _ => {}
                }
                if tile.region.is_some() {
                    map.regions.entry(0).or_default().push(coord);
                }
                map.tiles.insert(coord, tile);
            }
        }
        map
    }
}
