use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::content::{ContentError, Interaction, MovementProfile, SpeciesCatalog, SpeciesDef, StatKind};
use crate::hex::HexCoord;
use crate::world::{Tile, WorldMap};

/// Player tint, indexed by player id.
pub const PLAYER_COLORS: [Color; 4] = [
    Color::srgb(0.95, 0.55, 0.2),
    Color::srgb(0.35, 0.6, 0.95),
    Color::srgb(0.85, 0.35, 0.75),
    Color::srgb(0.9, 0.9, 0.35),
];

#[derive(Component, Clone, Debug)]
pub struct Player {
    pub id: u32,
    pub lineage: String,
    pub species_id: String,
    pub species: SpeciesDef,
    pub coord: HexCoord,
    pub max_population: u32,
    pub current_population: u32,
    pub movement_points: u32,
    pub remaining_movement: u32,
    pub evolution_points: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopulationChange {
    pub old: u32,
    pub new: u32,
}

impl PopulationChange {
    pub fn changed(&self) -> bool {
        self.old != self.new
    }

    pub fn extinct(&self) -> bool {
        self.changed() && self.new == 0
    }
}

impl Player {
    /// Creates the lineage's starter species on a start tile not in `occupied`.
    pub fn spawn(
        id: u32,
        lineage: &str,
        catalog: &SpeciesCatalog,
        world: &WorldMap,
        occupied: &[HexCoord],
        rng: &mut impl Rng,
    ) -> Result<Player, ContentError> {
        let (species_id, def) = catalog.starter_for_lineage(lineage)?;
        let mut player = Player {
            id,
            lineage: lineage.to_string(),
            species_id: species_id.to_string(),
            species: def.clone(),
            coord: HexCoord::default(),
            max_population: def.max_population,
            current_population: def.max_population,
            movement_points: def.base_movement,
            remaining_movement: def.base_movement,
            evolution_points: 0,
        };
        player.coord = player
            .find_start_location(world, occupied, rng)
            .ok_or_else(|| ContentError::NoStartTile(species_id.to_string()))?;
        info!(
            "player {} ({}) starts at {}",
            id, player.species.display_name, player.coord
        );
        Ok(player)
    }

    pub fn color(&self) -> Color {
        PLAYER_COLORS[self.id as usize % PLAYER_COLORS.len()]
    }

    pub fn name(&self) -> String {
        format!("Player {} ({})", self.id, self.species.display_name)
    }

    pub fn has_profile(&self, profile: MovementProfile) -> bool {
        self.species.pathfinding.profiles.contains(&profile)
    }

    pub fn stat(&self, kind: StatKind) -> i32 {
        self.species.stat(kind)
    }

    pub fn interaction_for_tile(&self, tile: &Tile) -> Option<Interaction> {
        if tile.river && self.has_profile(MovementProfile::Riverine) {
            return Some(Interaction::Good);
        }
        if tile.is_lake && self.has_profile(MovementProfile::Lacustrine) {
            return Some(Interaction::Good);
        }
        self.species.pathfinding.interactions.lookup(tile.terrain)
    }

    /// Moves to the next species of the lineage. Current population carries
    /// over; stats, max population and movement come from the new species.
    pub fn evolve(&mut self, catalog: &SpeciesCatalog) -> bool {
        let Some(next_id) = self.species.evolves_to.clone() else {
            debug!("{} is at the end of its lineage", self.species_id);
            return false;
        };
        let Some(next) = catalog.get(&next_id) else {
            warn!("{} evolves into unknown species {}", self.species_id, next_id);
            return false;
        };
        info!("player {} evolves {} -> {}", self.id, self.species_id, next_id);
        self.species_id = next_id;
        self.species = next.clone();
        self.max_population = next.max_population;
        self.movement_points = next.base_movement;
        self.remaining_movement = next.base_movement;
        true
    }

    pub fn take_population_damage(&mut self, amount: u32) -> PopulationChange {
        let old = self.current_population;
        self.current_population = old.saturating_sub(amount);
        PopulationChange {
            old,
            new: self.current_population,
        }
    }

    pub fn gain_evolution_points(&mut self, amount: u32) {
        self.evolution_points += amount;
    }

    fn start_candidates(
        &self,
        world: &WorldMap,
        coords: &[HexCoord],
        occupied: &[HexCoord],
        check_tags: bool,
    ) -> Vec<HexCoord> {
        let rules = &self.species.pathfinding.starting_location;
        coords
            .iter()
            .filter(|c| !occupied.contains(c))
            .filter_map(|c| world.get(*c))
            .filter(|t| t.passable && self.interaction_for_tile(t).is_some())
            .filter(|t| rules.preferred_terrain.contains(&t.terrain))
            .filter(|t| !check_tags || rules.optional_tags.iter().any(|tag| t.has_tag(tag)))
            .map(|t| t.coord)
            .collect()
    }

    /// Tiered search: primary biome with optional tags, secondary biome with
    /// tags, primary without, secondary without, then any biome.
    pub fn find_start_location(
        &self,
        world: &WorldMap,
        occupied: &[HexCoord],
        rng: &mut impl Rng,
    ) -> Option<HexCoord> {
        let biomes = &self.species.pathfinding.starting_location.search_biomes;
        let primary = biomes.first().map(|b| world.coords_in_biome(*b)).unwrap_or_default();
        let secondary = biomes.get(1).map(|b| world.coords_in_biome(*b)).unwrap_or_default();
        let mut everywhere: Vec<HexCoord> = world.land_tiles().map(|t| t.coord).collect();
        everywhere.sort();

        let tiers = [
            (&primary, true),
            (&secondary, true),
            (&primary, false),
            (&secondary, false),
            (&everywhere, false),
        ];
        for (tier, (coords, check_tags)) in tiers.into_iter().enumerate() {
            let matches = self.start_candidates(world, coords, occupied, check_tags);
            if let Some(c) = matches.choose(rng) {
                debug!("start tile for {} found in tier {}", self.species_id, tier + 1);
                return Some(*c);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GameContent;
    use crate::world::{Biome, Terrain};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> SpeciesCatalog {
        GameContent::builtin().unwrap().species
    }

    fn marsh_world() -> WorldMap {
        let mut world = WorldMap::from_rows(&["mmm.", "m.r.", "~~~~"]);
        world.region_biomes.insert(0, Biome::Floodplains);
        world
    }

    fn frog(world: &WorldMap) -> Player {
        let mut rng = StdRng::seed_from_u64(1);
        Player::spawn(1, "frog", &catalog(), world, &[], &mut rng).unwrap()
    }

    #[test]
    fn test_spawn_uses_starter_at_full_population() {
        let world = marsh_world();
        let p = frog(&world);
        assert_eq!(p.species_id, "frog_tadpole");
        assert_eq!(p.current_population, p.max_population);
        assert_eq!(p.remaining_movement, p.movement_points);
        assert!(world.get(p.coord).unwrap().passable);
    }

    #[test]
    fn test_start_prefers_tagged_tiles() {
        let world = marsh_world();
        let p = frog(&world);
        // the only plains tile with a river
        assert_eq!(p.coord, HexCoord::new(2, 1));
    }

    #[test]
    fn test_start_skips_occupied_tiles() {
        let world = marsh_world();
        let mut rng = StdRng::seed_from_u64(1);
        let p = Player::spawn(2, "frog", &catalog(), &world, &[HexCoord::new(2, 1)], &mut rng).unwrap();
        assert_ne!(p.coord, HexCoord::new(2, 1));
    }

    #[test]
    fn test_no_start_tile_is_an_error() {
        let world = WorldMap::from_rows(&["MMM", "~~~"]);
        let mut rng = StdRng::seed_from_u64(1);
        let err = Player::spawn(1, "frog", &catalog(), &world, &[], &mut rng).unwrap_err();
        assert!(matches!(err, ContentError::NoStartTile(_)));
    }

    #[test]
    fn test_population_damage_saturates_and_reports_extinction() {
        let world = marsh_world();
        let mut p = frog(&world);
        p.current_population = 2;
        let change = p.take_population_damage(1);
        assert!(change.changed());
        assert!(!change.extinct());
        let change = p.take_population_damage(5);
        assert_eq!(change.new, 0);
        assert!(change.extinct());
        let change = p.take_population_damage(1);
        assert!(!change.changed());
        assert!(!change.extinct());
    }

    #[test]
    fn test_evolve_keeps_population_and_stops_at_lineage_end() {
        let world = marsh_world();
        let catalog = catalog();
        let mut p = frog(&world);
        p.current_population = 2;
        assert!(p.evolve(&catalog));
        assert_eq!(p.species_id, "frog_froglet");
        assert_eq!(p.current_population, 2);
        assert_eq!(p.max_population, catalog.get("frog_froglet").unwrap().max_population);
        assert!(p.evolve(&catalog));
        assert!(!p.evolve(&catalog));
        assert_eq!(p.species_id, "frog_bullfrog");
    }

    #[test]
    fn test_riverine_makes_rivers_good() {
        let world = marsh_world();
        let p = frog(&world);
        let mut tile = world.get(HexCoord::new(1, 1)).unwrap().clone();
        tile.terrain = Terrain::DesertDunes;
        assert_eq!(p.interaction_for_tile(&tile), Some(Interaction::Bad));
        tile.river = true;
        assert_eq!(p.interaction_for_tile(&tile), Some(Interaction::Good));
    }
}
