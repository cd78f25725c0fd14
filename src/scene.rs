//! Scene flow: main menu -> loading -> game, with a fade between each.

use std::path::Path;

use bevy::prelude::*;
use rand::Rng;

use crate::content::{ContentError, GameContent, SpeciesCatalog};
use crate::game::TurnState;
use crate::hex::HexCoord;
use crate::player::Player;
use crate::settings::{GameRng, GameSettings, SETTINGS_PATH};
use crate::world::{generate_world, WorldMap};

pub const FADE_OUT_SECS: f32 = 1.0;
pub const FADE_IN_SECS: f32 = 1.5;

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    MainMenu,
    Loading,
    InGame,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum FadePhase {
    Idle,
    Out { next: AppState, elapsed: f32 },
    In { elapsed: f32 },
}

#[derive(Resource, Debug)]
pub struct SceneTransition {
    phase: FadePhase,
    queued: Option<AppState>,
}

impl Default for SceneTransition {
    /// The game opens on a fade-in.
    fn default() -> Self {
        Self {
            phase: FadePhase::In { elapsed: 0.0 },
            queued: None,
        }
    }
}

impl SceneTransition {
    /// Refused while a fade is already running.
    pub fn request(&mut self, next: AppState) -> bool {
        if self.is_transitioning() {
            debug!("scene change to {next:?} refused, transition in progress");
            return false;
        }
        info!("scene change to {next:?}");
        self.phase = FadePhase::Out { next, elapsed: 0.0 };
        true
    }

    /// Like `request`, but waits for a running fade to finish instead of
    /// being refused.
    pub fn queue(&mut self, next: AppState) {
        if !self.request(next) {
            self.queued = Some(next);
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase != FadePhase::Idle
    }

    /// Returns the state to switch to once the screen is fully dark.
    pub fn tick(&mut self, dt: f32) -> Option<AppState> {
        match &mut self.phase {
            FadePhase::Idle => None,
            FadePhase::Out { next, elapsed } => {
                *elapsed += dt;
                if *elapsed < FADE_OUT_SECS {
                    return None;
                }
                let next = *next;
                self.phase = FadePhase::In { elapsed: 0.0 };
                Some(next)
            }
            FadePhase::In { elapsed } => {
                *elapsed += dt;
                if *elapsed >= FADE_IN_SECS {
                    self.phase = FadePhase::Idle;
                    if let Some(next) = self.queued.take() {
                        self.request(next);
                    }
                }
                None
            }
        }
    }

    /// Opacity of the black overlay, 0 to 1.
    pub fn overlay_alpha(&self) -> f32 {
        match self.phase {
            FadePhase::Idle => 0.0,
            FadePhase::Out { elapsed, .. } => (elapsed / FADE_OUT_SECS).clamp(0.0, 1.0),
            FadePhase::In { elapsed } => (1.0 - elapsed / FADE_IN_SECS).clamp(0.0, 1.0),
        }
    }
}

/// Shown on the main menu after a game could not be set up.
#[derive(Resource, Default, Debug)]
pub struct SceneError(pub Option<String>);

pub struct ScenePlugin;
impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>()
            .enable_state_scoped_entities::<AppState>()
            .init_resource::<SceneTransition>()
            .init_resource::<SceneError>()
            .add_systems(Startup, (load_settings, load_content).chain())
            .add_systems(Update, drive_transition)
            .add_systems(
                Update,
                generate_world_when_visible
                    .run_if(in_state(AppState::Loading))
                    .run_if(not(resource_exists::<WorldMap>)),
            )
            .add_systems(OnEnter(AppState::InGame), setup_game_scene)
            .add_systems(OnExit(AppState::InGame), |mut commands: Commands| {
                commands.remove_resource::<WorldMap>();
            });
    }
}

fn load_settings(mut commands: Commands) {
    let settings = GameSettings::load_or_default(Path::new(SETTINGS_PATH));
    match settings.seed {
        Some(seed) => info!("seed {seed}, lineages {:?}", settings.lineages),
        None => info!("random seed, lineages {:?}", settings.lineages),
    }
    commands.insert_resource(GameRng::new(settings.seed));
    commands.insert_resource(settings);
}

fn load_content(mut commands: Commands, settings: Res<GameSettings>) {
    let content = match GameContent::load(&settings.content_dir) {
        Ok(content) => content,
        Err(err) => {
            warn!("{err}; using built-in content");
            GameContent::builtin().unwrap_or_else(|err| {
                error!("built-in content is invalid: {err}");
                GameContent::default()
            })
        }
    };
    info!(
        "content: {} species, {} hazard cards, {} migration events",
        content.species.len(),
        content.hazard_deck.len(),
        content.migration_events.len()
    );
    commands.insert_resource(content);
}

fn drive_transition(
    time: Res<Time>,
    mut transition: ResMut<SceneTransition>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if let Some(next) = transition.tick(time.delta_seconds()) {
        next_state.set(next);
    }
}

/// Waits for the loading screen to finish fading in so it is on screen
/// while the map is built.
fn generate_world_when_visible(
    mut commands: Commands,
    settings: Res<GameSettings>,
    mut rng: ResMut<GameRng>,
    mut transition: ResMut<SceneTransition>,
) {
    if transition.is_transitioning() {
        return;
    }
    let params = settings.world_params();
    let world = generate_world(&params, &mut rng.0);
    info!(
        "world ready: {}x{}, {} land tiles, {} rivers",
        world.cols,
        world.rows,
        world.land_tiles().count(),
        world.rivers.len()
    );
    commands.insert_resource(world);
    transition.request(AppState::InGame);
}

/// One player per lineage on distinct start tiles, or the first failure.
fn place_players(
    lineages: &[String],
    catalog: &SpeciesCatalog,
    world: &WorldMap,
    rng: &mut impl Rng,
) -> Result<Vec<Player>, ContentError> {
    let mut players: Vec<Player> = Vec::new();
    for (id, lineage) in lineages.iter().enumerate() {
        let occupied: Vec<HexCoord> = players.iter().map(|p| p.coord).collect();
        players.push(Player::spawn(id as u32 + 1, lineage, catalog, world, &occupied, rng)?);
    }
    Ok(players)
}

pub fn setup_game_scene(
    mut commands: Commands,
    settings: Res<GameSettings>,
    content: Res<GameContent>,
    world: Res<WorldMap>,
    mut rng: ResMut<GameRng>,
    mut transition: ResMut<SceneTransition>,
    mut scene_error: ResMut<SceneError>,
) {
    scene_error.0 = None;
    let players = match place_players(&settings.lineages, &content.species, &world, &mut rng.0) {
        Ok(players) => players,
        Err(err) => {
            error!("cannot set up the game: {err}");
            scene_error.0 = Some(err.to_string());
            transition.queue(AppState::MainMenu);
            return;
        }
    };
    let order = players
        .into_iter()
        .map(|player| {
            let position = player.coord.to_world(settings.hex_size).extend(10.0);
            commands
                .spawn((
                    player,
                    SpatialBundle::from_transform(Transform::from_translation(position)),
                    StateScoped(AppState::InGame),
                ))
                .id()
        })
        .collect();
    commands.insert_resource(TurnState::new(order));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Biome;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn marsh_world() -> WorldMap {
        let mut world = WorldMap::from_rows(&["mmm.", "m.r.", "~~~~"]);
        world.region_biomes.insert(0, Biome::Floodplains);
        world
    }

    #[test]
    fn test_players_get_distinct_start_tiles() {
        let catalog = GameContent::builtin().unwrap().species;
        let mut rng = StdRng::seed_from_u64(4);
        let lineages = vec!["frog".to_string(), "frog".to_string()];
        let players = place_players(&lineages, &catalog, &marsh_world(), &mut rng).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, 1);
        assert_eq!(players[1].id, 2);
        assert_ne!(players[0].coord, players[1].coord);
    }

    #[test]
    fn test_one_bad_lineage_places_nobody() {
        let catalog = GameContent::builtin().unwrap().species;
        let mut rng = StdRng::seed_from_u64(4);
        let lineages = vec!["frog".to_string(), "trilobite".to_string()];
        let err = place_players(&lineages, &catalog, &marsh_world(), &mut rng).unwrap_err();
        assert!(matches!(err, ContentError::NoStarter(_)));
    }

    #[test]
    fn test_startup_fades_in_then_accepts_requests() {
        let mut t = SceneTransition::default();
        assert!(t.is_transitioning());
        assert!(!t.request(AppState::Loading));
        assert_eq!(t.tick(FADE_IN_SECS), None);
        assert!(!t.is_transitioning());
        assert!(t.request(AppState::Loading));
    }

    #[test]
    fn test_overlapping_requests_are_refused() {
        let mut t = SceneTransition {
            phase: FadePhase::Idle,
            queued: None,
        };
        assert!(t.request(AppState::Loading));
        assert!(!t.request(AppState::InGame));
        assert_eq!(t.tick(FADE_OUT_SECS * 0.5), None);
        assert!((t.overlay_alpha() - 0.5).abs() < 1e-4);
        assert_eq!(t.tick(FADE_OUT_SECS * 0.6), Some(AppState::Loading));
        assert!(!t.request(AppState::InGame));
        assert!((t.overlay_alpha() - 1.0).abs() < 1e-4);
        t.tick(FADE_IN_SECS);
        assert_eq!(t.overlay_alpha(), 0.0);
        assert!(t.request(AppState::InGame));
    }

    #[test]
    fn test_queued_change_runs_after_fade_in() {
        let mut t = SceneTransition::default();
        t.queue(AppState::MainMenu);
        assert_eq!(t.tick(FADE_IN_SECS), None);
        assert!(t.is_transitioning());
        assert_eq!(t.tick(FADE_OUT_SECS), Some(AppState::MainMenu));
    }
}
