//! Data-driven game content: species, hazard cards and migration events.
//!
//! Content lives in `assets/*.json`. The same files are embedded with
//! `include_str!()` so the game still starts with a usable catalogue when the
//! content directory is missing or broken.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::world::{Biome, Terrain, Tile};

const SPECIES_JSON: &str = include_str!("../assets/species.json");
const HAZARDS_JSON: &str = include_str!("../assets/hazards.json");
const MIGRATION_EVENTS_JSON: &str = include_str!("../assets/migration_events.json");

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("hazard card '{0}' is a Predator but has no predator_type")]
    PredatorWithoutType(String),
    #[error("hazard card '{0}' is a Rival but does not list territoriality")]
    RivalWithoutTerritoriality(String),
    #[error("species '{species}' evolves into unknown species '{target}'")]
    UnknownEvolution { species: String, target: String },
    #[error("no starter species for lineage '{0}'")]
    NoStarter(String),
    #[error("no valid starting tile for species '{0}'")]
    NoStartTile(String),
    #[error("duplicate migration event id '{0}'")]
    DuplicateMigrationEvent(String),
}

fn parse<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ContentError> {
    serde_json::from_str(text).map_err(|source| ContentError::Parse {
        path: path.to_string(),
        source,
    })
}

fn read(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    Good,
    Medium,
    Bad,
}

impl Interaction {
    pub fn color(self) -> Color {
        match self {
            Interaction::Good => Color::srgb(0.35, 0.85, 0.4),
            Interaction::Medium => Color::srgb(0.95, 0.8, 0.3),
            Interaction::Bad => Color::srgb(0.9, 0.3, 0.25),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementProfile {
    Riverine,
    Lacustrine,
    Glide,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTable {
    pub good: Vec<Terrain>,
    pub medium: Vec<Terrain>,
    pub bad: Vec<Terrain>,
}

impl InteractionTable {
    pub fn lookup(&self, terrain: Terrain) -> Option<Interaction> {
        if self.good.contains(&terrain) {
            Some(Interaction::Good)
        } else if self.medium.contains(&terrain) {
            Some(Interaction::Medium)
        } else if self.bad.contains(&terrain) {
            Some(Interaction::Bad)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingLocation {
    pub search_biomes: Vec<Biome>,
    pub preferred_terrain: Vec<Terrain>,
    pub optional_tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pathfinding {
    pub profiles: Vec<MovementProfile>,
    pub interactions: InteractionTable,
    pub starting_location: StartingLocation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub display_name: String,
    pub lineage: String,
    #[serde(default)]
    pub is_starter: bool,
    #[serde(default)]
    pub evolves_to: Option<String>,
    #[serde(default)]
    pub sprite: String,
    pub max_population: u32,
    pub base_movement: u32,
    #[serde(default)]
    pub fight: i32,
    #[serde(default)]
    pub flight: i32,
    #[serde(default)]
    pub freeze: i32,
    #[serde(default)]
    pub territoriality: i32,
    #[serde(default)]
    pub climate_resistance: i32,
    #[serde(default)]
    pub pathfinding: Pathfinding,
}

impl SpeciesDef {
    pub fn stat(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Fight => self.fight,
            StatKind::Flight => self.flight,
            StatKind::Freeze => self.freeze,
            StatKind::Territoriality => self.territoriality,
            StatKind::ClimateResistance => self.climate_resistance,
        }
    }
}

/// Species keyed by id. A `BTreeMap` keeps lineage lookups deterministic.
#[derive(Clone, Debug, Default)]
pub struct SpeciesCatalog {
    species: BTreeMap<String, SpeciesDef>,
}

impl SpeciesCatalog {
    pub fn from_json_str(path: &str, text: &str) -> Result<Self, ContentError> {
        let catalog = Self {
            species: parse(path, text)?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, ContentError> {
        Self::from_json_str(&path.display().to_string(), &read(path)?)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        for (id, def) in &self.species {
            if let Some(target) = &def.evolves_to {
                if !self.species.contains_key(target) {
                    return Err(ContentError::UnknownEvolution {
                        species: id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&SpeciesDef> {
        self.species.get(id)
    }

    pub fn starter_for_lineage(&self, lineage: &str) -> Result<(&str, &SpeciesDef), ContentError> {
        self.species
            .iter()
            .find(|(_, def)| def.lineage == lineage && def.is_starter)
            .map(|(id, def)| (id.as_str(), def))
            .ok_or_else(|| ContentError::NoStarter(lineage.to_string()))
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardType {
    Predator,
    Rival,
    Climate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredatorType {
    Apex,
    Seeker,
    Ambusher,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Fight,
    Flight,
    Freeze,
    Territoriality,
    ClimateResistance,
}

impl StatKind {
    pub const ALL: [StatKind; 5] = [
        StatKind::Fight,
        StatKind::Flight,
        StatKind::Freeze,
        StatKind::Territoriality,
        StatKind::ClimateResistance,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            StatKind::Fight => "Fight",
            StatKind::Flight => "Flight",
            StatKind::Freeze => "Freeze",
            StatKind::Territoriality => "Territoriality",
            StatKind::ClimateResistance => "Climate",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmpowermentCondition {
    #[serde(default)]
    pub terrain: Vec<Terrain>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardCard {
    pub name: String,
    pub hazard_type: HazardType,
    pub base_difficulty: i32,
    pub eligible_stats: Vec<StatKind>,
    #[serde(default)]
    pub predator_type: Option<PredatorType>,
    #[serde(default)]
    pub empowerment_condition: Option<EmpowermentCondition>,
    #[serde(default)]
    pub description: String,
}

impl HazardCard {
    pub fn validate(&self) -> Result<(), ContentError> {
        match self.hazard_type {
            HazardType::Predator if self.predator_type.is_none() => {
                Err(ContentError::PredatorWithoutType(self.name.clone()))
            }
            HazardType::Rival if !self.eligible_stats.contains(&StatKind::Territoriality) => {
                Err(ContentError::RivalWithoutTerritoriality(self.name.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Empowered when the tile matches any terrain in the card's condition.
    pub fn is_empowered_on(&self, tile: &Tile) -> bool {
        self.empowerment_condition
            .as_ref()
            .is_some_and(|c| c.terrain.iter().any(|t| tile.matches_terrain(*t)))
    }
}

pub fn parse_hazard_deck(path: &str, text: &str) -> Result<Vec<HazardCard>, ContentError> {
    let cards: Vec<HazardCard> = parse(path, text)?;
    for card in &cards {
        card.validate()?;
    }
    Ok(cards)
}

pub fn load_hazard_deck(path: &Path) -> Result<Vec<HazardCard>, ContentError> {
    parse_hazard_deck(&path.display().to_string(), &read(path)?)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "terrains", rename_all = "snake_case")]
pub enum MigrationTrigger {
    EnterTerrain(Vec<Terrain>),
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MigrationEventDef {
    pub event_id: String,
    pub description: String,
    pub trigger: MigrationTrigger,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl MigrationEventDef {
    pub fn triggers_on(&self, tile: &Tile) -> bool {
        match &self.trigger {
            MigrationTrigger::EnterTerrain(terrains) => terrains.iter().any(|t| tile.matches_terrain(*t)),
        }
    }

    pub fn display_name(&self) -> String {
        self.event_id
            .split('_')
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn parse_migration_events(path: &str, text: &str) -> Result<Vec<MigrationEventDef>, ContentError> {
    let events: Vec<MigrationEventDef> = parse(path, text)?;
    let mut seen = HashSet::new();
    for ev in &events {
        if !seen.insert(ev.event_id.as_str()) {
            return Err(ContentError::DuplicateMigrationEvent(ev.event_id.clone()));
        }
    }
    Ok(events)
}

pub fn load_migration_events(path: &Path) -> Result<Vec<MigrationEventDef>, ContentError> {
    parse_migration_events(&path.display().to_string(), &read(path)?)
}

#[derive(Resource, Clone, Debug, Default)]
pub struct GameContent {
    pub species: SpeciesCatalog,
    pub hazard_deck: Vec<HazardCard>,
    pub migration_events: Vec<MigrationEventDef>,
}

impl GameContent {
    pub fn load(dir: &Path) -> Result<Self, ContentError> {
        Ok(Self {
            species: SpeciesCatalog::load(&dir.join("species.json"))?,
            hazard_deck: load_hazard_deck(&dir.join("hazards.json"))?,
            migration_events: load_migration_events(&dir.join("migration_events.json"))?,
        })
    }

    pub fn builtin() -> Result<Self, ContentError> {
        Ok(Self {
            species: SpeciesCatalog::from_json_str("species.json", SPECIES_JSON)?,
            hazard_deck: parse_hazard_deck("hazards.json", HAZARDS_JSON)?,
            migration_events: parse_migration_events("migration_events.json", MIGRATION_EVENTS_JSON)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_content_parses() {
        let content = GameContent::builtin().unwrap();
        assert!(content.species.len() >= 4);
        assert!(!content.hazard_deck.is_empty());
        assert_eq!(content.migration_events.len(), 6);
    }

    #[test]
    fn test_starters_exist_for_default_lineages() {
        let content = GameContent::builtin().unwrap();
        for lineage in ["frog", "bird"] {
            let (_, def) = content.species.starter_for_lineage(lineage).unwrap();
            assert!(def.is_starter);
            assert_eq!(def.lineage, lineage);
        }
        assert!(matches!(
            content.species.starter_for_lineage("trilobite"),
            Err(ContentError::NoStarter(_))
        ));
    }

    #[test]
    fn test_unknown_evolution_target_rejected() {
        let json = r#"{
            "a": {"display_name": "A", "lineage": "x", "is_starter": true,
                  "evolves_to": "missing", "max_population": 3, "base_movement": 2}
        }"#;
        let err = SpeciesCatalog::from_json_str("test", json).unwrap_err();
        assert!(matches!(err, ContentError::UnknownEvolution { .. }));
    }

    #[test]
    fn test_predator_needs_type() {
        let json = r#"[{"name": "Stalker", "hazard_type": "Predator", "base_difficulty": 6,
                        "eligible_stats": ["fight", "flight"]}]"#;
        let err = parse_hazard_deck("test", json).unwrap_err();
        assert!(matches!(err, ContentError::PredatorWithoutType(name) if name == "Stalker"));
    }

    #[test]
    fn test_rival_needs_territoriality() {
        let json = r#"[{"name": "Neighbour", "hazard_type": "Rival", "base_difficulty": 5,
                        "eligible_stats": ["fight"]}]"#;
        let err = parse_hazard_deck("test", json).unwrap_err();
        assert!(matches!(err, ContentError::RivalWithoutTerritoriality(_)));
    }

    #[test]
    fn test_duplicate_migration_ids_rejected() {
        let json = r#"[
            {"event_id": "dry", "description": "", "trigger": {"type": "enter_terrain", "terrains": ["DesertDunes"]}},
            {"event_id": "dry", "description": "", "trigger": {"type": "enter_terrain", "terrains": ["Plains"]}}
        ]"#;
        let err = parse_migration_events("test", json).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateMigrationEvent(id) if id == "dry"));
    }

    #[test]
    fn test_interaction_lookup_prefers_good() {
        let table = InteractionTable {
            good: vec![Terrain::Marsh],
            medium: vec![Terrain::Marsh, Terrain::Plains],
            bad: vec![],
        };
        assert_eq!(table.lookup(Terrain::Marsh), Some(Interaction::Good));
        assert_eq!(table.lookup(Terrain::Plains), Some(Interaction::Medium));
        assert_eq!(table.lookup(Terrain::DesertDunes), None);
    }

    #[test]
    fn test_migration_display_name() {
        let content = GameContent::builtin().unwrap();
        let ev = content.migration_events.iter().find(|e| e.event_id == "desert_hazard").unwrap();
        assert_eq!(ev.display_name(), "Desert Hazard");
        assert!(ev.enabled);
    }

    #[test]
    fn test_deck_and_events_load_from_disk() {
        let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let deck = load_hazard_deck(&assets.join("hazards.json")).unwrap();
        let events = load_migration_events(&assets.join("migration_events.json")).unwrap();
        let builtin = GameContent::builtin().unwrap();
        assert_eq!(deck, builtin.hazard_deck);
        assert_eq!(events, builtin.migration_events);

        let err = load_hazard_deck(&assets.join("missing.json")).unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
    }
}
