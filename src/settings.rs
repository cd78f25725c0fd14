use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::world::WorldParams;

pub const SETTINGS_PATH: &str = "assets/settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid settings in {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Fixed seed for world generation and decks; entropy when unset.
    pub seed: Option<u64>,
    pub region_count: usize,
    /// One player per entry, in turn order.
    pub lineages: Vec<String>,
    pub evolution_cost: u32,
    pub content_dir: PathBuf,
    pub hex_size: f32,
    pub show_help: bool,
    pub show_dev_panel: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            seed: None,
            region_count: 14,
            lineages: vec!["frog".into(), "bird".into()],
            evolution_cost: 1,
            content_dir: PathBuf::from("assets"),
            hex_size: 24.0,
            show_help: true,
            show_dev_panel: false,
        }
    }
}

impl GameSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// A missing file is normal; a broken one is reported and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    pub fn world_params(&self) -> WorldParams {
        WorldParams {
            region_count: self.region_count.max(2),
            ..default()
        }
    }
}

#[derive(Resource)]
pub struct GameRng(pub StdRng);

impl GameRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}
