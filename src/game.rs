//! Turn order and the rules that sit between player intent and the world:
//! who may act, what a landing costs, and how damage is applied.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::content::{GameContent, Interaction};
use crate::events::{
    ActivePlayerChanged, AddResourceRequested, AdvanceTurnRequested, ApplyConsequence,
    CenterCameraOnTile, Consequence, EvolveRequested, GrantEvolutionPoints, HexClicked, PlayerEvolved, PlayerExtinct,
    PlayerLandedOnTile, PlayerPopulationChanged, PlayerSelected, RequestPlayerMove,
    StartGameRequested, TurnStarted,
};
use crate::hazard::HazardManager;
use crate::hex::HexCoord;
use crate::movement::{MovementState, TurnContext};
use crate::player::Player;
use crate::scene::AppState;
use crate::settings::GameSettings;
use crate::world::WorldMap;

/// Frame order of the turn pipeline. Requests raised in one set are
/// handled by the later sets in the same frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TurnSet {
    Intent,
    Resolve,
    Consequence,
    Refresh,
}

#[derive(Resource, Debug, Clone)]
pub struct TurnState {
    pub turn: u32,
    pub active_index: usize,
    pub order: Vec<Entity>,
    pub paused: bool,
    pub started: bool,
    pub selected: Option<Entity>,
}

impl TurnState {
    pub fn new(order: Vec<Entity>) -> Self {
        Self {
            turn: 1,
            active_index: 0,
            order,
            paused: true,
            started: false,
            selected: None,
        }
    }

    pub fn active(&self) -> Option<Entity> {
        self.order.get(self.active_index).copied()
    }

    /// Next player in order; the turn counter goes up when the order wraps.
    pub fn advance(&mut self) -> Option<Entity> {
        if self.order.is_empty() {
            return None;
        }
        self.selected = None;
        self.active_index = (self.active_index + 1) % self.order.len();
        if self.active_index == 0 {
            self.turn += 1;
        }
        self.active()
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.active() == Some(entity)
    }
}

/// What a landing does to the rest of the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LandingOutcome {
    pub remaining_movement: u32,
    pub damage: u32,
}

pub fn landing_outcome(interaction: Option<Interaction>, remaining: u32, path_cost: u32) -> LandingOutcome {
    match interaction {
        Some(Interaction::Bad) => LandingOutcome {
            remaining_movement: 0,
            damage: 1,
        },
        Some(Interaction::Medium) => LandingOutcome {
            remaining_movement: 0,
            damage: 0,
        },
        _ => LandingOutcome {
            remaining_movement: remaining.saturating_sub(path_cost),
            damage: 0,
        },
    }
}

#[derive(SystemParam)]
struct TurnAnnouncer<'w> {
    changed: EventWriter<'w, ActivePlayerChanged>,
    started: EventWriter<'w, TurnStarted>,
    center: EventWriter<'w, CenterCameraOnTile>,
    selected: EventWriter<'w, PlayerSelected>,
}

impl TurnAnnouncer<'_> {
    fn begin_turn(&mut self, turn: &mut TurnState, player: Entity, coord: HexCoord) {
        self.changed.send(ActivePlayerChanged { player });
        self.started.send(TurnStarted { player });
        self.center.send(CenterCameraOnTile { coord });
        turn.selected = Some(player);
        self.selected.send(PlayerSelected {
            player,
            is_active: true,
        });
    }
}

pub struct GamePlugin;
impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                TurnSet::Intent,
                TurnSet::Resolve,
                TurnSet::Consequence,
                TurnSet::Refresh,
            )
                .chain()
                .run_if(in_state(AppState::InGame))
                .run_if(resource_exists::<TurnState>),
        )
        .add_systems(OnExit(AppState::InGame), |mut commands: Commands| {
            commands.remove_resource::<TurnState>();
        })
        .add_systems(
            Update,
            (
                start_game,
                advance_turn,
                handle_clicks,
                grant_evolution_points,
                handle_evolve,
                add_resource,
            )
                .chain()
                .in_set(TurnSet::Intent),
        )
        .add_systems(Update, apply_landing_consequences.in_set(TurnSet::Resolve))
        .add_systems(Update, apply_consequences.in_set(TurnSet::Consequence));
    }
}

fn start_game(
    mut requests: EventReader<StartGameRequested>,
    mut turn: ResMut<TurnState>,
    players: Query<&Player>,
    mut announcer: TurnAnnouncer,
) {
    if requests.read().last().is_none() || turn.started {
        return;
    }
    let Some(first) = turn.active() else {
        warn!("game started with no players");
        return;
    };
    let Ok(player) = players.get(first) else {
        return;
    };
    turn.started = true;
    turn.paused = false;
    info!("turn {} begins with {}", turn.turn, player.name());
    announcer.begin_turn(&mut turn, first, player.coord);
}

fn advance_turn(
    mut requests: EventReader<AdvanceTurnRequested>,
    mut turn: ResMut<TurnState>,
    hazards: Res<HazardManager>,
    movement: Res<MovementState>,
    players: Query<&Player>,
    mut announcer: TurnAnnouncer,
) {
    if requests.read().last().is_none() {
        return;
    }
    if !turn.started || turn.paused {
        debug!("advance refused: game is paused");
        return;
    }
    if hazards.in_sequence() {
        debug!("advance refused: hazard event in progress");
        return;
    }
    if movement.moving {
        debug!("advance refused: token still moving");
        return;
    }
    let Some(next) = turn.advance() else {
        return;
    };
    let Ok(player) = players.get(next) else {
        return;
    };
    info!("turn {}: {}", turn.turn, player.name());
    announcer.begin_turn(&mut turn, next, player.coord);
}

fn handle_clicks(
    mut clicks: EventReader<HexClicked>,
    mut turn: ResMut<TurnState>,
    hazards: Res<HazardManager>,
    context: Res<TurnContext>,
    players: Query<(Entity, &Player)>,
    mut selected: EventWriter<PlayerSelected>,
    mut moves: EventWriter<RequestPlayerMove>,
) {
    for click in clicks.read() {
        if turn.paused || hazards.in_sequence() {
            continue;
        }
        let active = turn.active();
        let on_tile: Vec<(Entity, &Player)> = players.iter().filter(|(_, p)| p.coord == click.coord).collect();
        let token = on_tile
            .iter()
            .find(|(e, _)| Some(*e) == active)
            .or_else(|| on_tile.first());
        if let Some(&(entity, player)) = token {
            let is_active = turn.is_active(entity);
            debug!("selected {}", player.name());
            turn.selected = Some(entity);
            selected.send(PlayerSelected {
                player: entity,
                is_active,
            });
            continue;
        }
        match active {
            Some(active) if turn.selected == Some(active) && context.is_valid_destination(click.coord) => {
                moves.send(RequestPlayerMove {
                    player: active,
                    destination: click.coord,
                });
            }
            _ => turn.selected = None,
        }
    }
}

fn grant_evolution_points(mut requests: EventReader<GrantEvolutionPoints>, mut players: Query<&mut Player>) {
    for req in requests.read() {
        if let Ok(mut player) = players.get_mut(req.player) {
            player.gain_evolution_points(req.amount);
            debug!("{} now has {} EP", player.name(), player.evolution_points);
        }
    }
}

fn handle_evolve(
    mut requests: EventReader<EvolveRequested>,
    settings: Res<GameSettings>,
    content: Res<GameContent>,
    mut players: Query<&mut Player>,
    mut evolved: EventWriter<PlayerEvolved>,
    mut population: EventWriter<PlayerPopulationChanged>,
) {
    for req in requests.read() {
        let Ok(mut player) = players.get_mut(req.player) else {
            continue;
        };
        if player.evolution_points < settings.evolution_cost {
            debug!(
                "{} needs {} EP to evolve, has {}",
                player.name(),
                settings.evolution_cost,
                player.evolution_points
            );
            continue;
        }
        if !player.evolve(&content.species) {
            continue;
        }
        player.evolution_points -= settings.evolution_cost;
        evolved.send(PlayerEvolved {
            player: req.player,
            species_id: player.species_id.clone(),
        });
        population.send(PlayerPopulationChanged {
            player: req.player,
            current: player.current_population,
            max: player.max_population,
        });
    }
}

fn add_resource(
    mut requests: EventReader<AddResourceRequested>,
    mut world: ResMut<WorldMap>,
) {
    for req in requests.read() {
        if let Some(tile) = world.get_mut(req.coord) {
            tile.resources.push(req.kind.to_string());
            info!("added {} to {}, now {:?}", req.kind, req.coord, tile.resources);
        }
    }
}

fn apply_landing_consequences(
    mut landed: EventReader<PlayerLandedOnTile>,
    world: Res<WorldMap>,
    mut players: Query<&mut Player>,
    mut consequences: EventWriter<ApplyConsequence>,
) {
    for ev in landed.read() {
        let (Ok(mut player), Some(tile)) = (players.get_mut(ev.player), world.get(ev.coord)) else {
            continue;
        };
        let interaction = player.interaction_for_tile(tile);
        let outcome = landing_outcome(interaction, player.remaining_movement, ev.path_cost);
        player.remaining_movement = outcome.remaining_movement;
        debug!(
            "{} landed on {:?} at {}, {} movement left",
            player.name(),
            tile.terrain,
            ev.coord,
            outcome.remaining_movement
        );
        if outcome.damage > 0 {
            consequences.send(ApplyConsequence {
                player: ev.player,
                consequence: Consequence::PopulationDamage(outcome.damage),
            });
        }
    }
}

/// The single place population is lost.
pub fn apply_consequences(
    mut requests: EventReader<ApplyConsequence>,
    mut turn: ResMut<TurnState>,
    mut players: Query<&mut Player>,
    mut changed: EventWriter<PlayerPopulationChanged>,
    mut extinct: EventWriter<PlayerExtinct>,
) {
    for req in requests.read() {
        let Ok(mut player) = players.get_mut(req.player) else {
            continue;
        };
        match req.consequence {
            Consequence::PopulationDamage(amount) => {
                let change = player.take_population_damage(amount);
                if !change.changed() {
                    continue;
                }
                info!("{} population {} -> {}", player.name(), change.old, change.new);
                changed.send(PlayerPopulationChanged {
                    player: req.player,
                    current: change.new,
                    max: player.max_population,
                });
                if change.extinct() {
                    warn!("{} has gone extinct", player.name());
                    turn.paused = true;
                    extinct.send(PlayerExtinct { player: req.player });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{GameEventsPlugin, HazardTrigger};

    fn entities(n: u32) -> Vec<Entity> {
        (0..n).map(Entity::from_raw).collect()
    }

    #[test]
    fn test_turn_starts_paused_on_first_player() {
        let order = entities(2);
        let turn = TurnState::new(order.clone());
        assert!(turn.paused);
        assert!(!turn.started);
        assert_eq!(turn.turn, 1);
        assert_eq!(turn.active(), Some(order[0]));
    }

    #[test]
    fn test_turn_order_wraps_and_counts() {
        let order = entities(3);
        let mut turn = TurnState::new(order.clone());
        turn.selected = Some(order[0]);
        assert_eq!(turn.advance(), Some(order[1]));
        assert_eq!(turn.selected, None);
        assert_eq!(turn.turn, 1);
        assert_eq!(turn.advance(), Some(order[2]));
        assert_eq!(turn.advance(), Some(order[0]));
        assert_eq!(turn.turn, 2);
    }

    #[test]
    fn test_empty_order_does_not_advance() {
        let mut turn = TurnState::new(Vec::new());
        assert_eq!(turn.advance(), None);
        assert_eq!(turn.turn, 1);
    }

    #[test]
    fn test_landing_outcomes() {
        assert_eq!(
            landing_outcome(Some(Interaction::Bad), 3, 1),
            LandingOutcome {
                remaining_movement: 0,
                damage: 1
            }
        );
        assert_eq!(landing_outcome(Some(Interaction::Medium), 3, 1).remaining_movement, 0);
        assert_eq!(landing_outcome(Some(Interaction::Good), 3, 2).remaining_movement, 1);
        assert_eq!(landing_outcome(None, 1, 2).remaining_movement, 0);
    }

    fn frog(id: u32, coord: HexCoord) -> Player {
        let content = GameContent::builtin().unwrap();
        let species = content.species.get("frog_tadpole").unwrap().clone();
        Player {
            id,
            lineage: species.lineage.clone(),
            species_id: "frog_tadpole".to_string(),
            coord,
            max_population: species.max_population,
            current_population: species.max_population,
            movement_points: species.base_movement,
            remaining_movement: species.base_movement,
            evolution_points: 0,
            species,
        }
    }

    fn turn_app(players: i32) -> (App, Vec<Entity>) {
        let mut app = App::new();
        app.add_plugins(GameEventsPlugin)
            .init_resource::<HazardManager>()
            .init_resource::<MovementState>()
            .add_systems(
                Update,
                (start_game, advance_turn, grant_evolution_points, apply_consequences).chain(),
            );
        let order: Vec<Entity> = (0..players)
            .map(|i| app.world_mut().spawn(frog(i as u32 + 1, HexCoord::new(i, 0))).id())
            .collect();
        app.insert_resource(TurnState::new(order.clone()));
        (app, order)
    }

    fn started_app() -> (App, Vec<Entity>) {
        let (mut app, order) = turn_app(2);
        app.world_mut().send_event(StartGameRequested);
        app.update();
        (app, order)
    }

    fn turn(app: &App) -> &TurnState {
        app.world().resource::<TurnState>()
    }

    fn request_advance(app: &mut App) {
        app.world_mut().send_event(AdvanceTurnRequested);
        app.update();
    }

    #[test]
    fn test_start_unpauses_once() {
        let (mut app, order) = started_app();
        assert!(turn(&app).started);
        assert!(!turn(&app).paused);
        assert_eq!(turn(&app).selected, Some(order[0]));

        request_advance(&mut app);
        assert_eq!(turn(&app).active_index, 1);
        app.world_mut().send_event(StartGameRequested);
        app.update();
        assert_eq!(turn(&app).active_index, 1);
        assert_eq!(turn(&app).turn, 1);
    }

    #[test]
    fn test_advance_refused_before_start() {
        let (mut app, _) = turn_app(2);
        request_advance(&mut app);
        assert_eq!(turn(&app).active_index, 0);
        assert_eq!(turn(&app).turn, 1);
    }

    #[test]
    fn test_advance_refused_while_paused() {
        let (mut app, _) = started_app();
        app.world_mut().resource_mut::<TurnState>().paused = true;
        request_advance(&mut app);
        assert_eq!(turn(&app).active_index, 0);
    }

    #[test]
    fn test_advance_refused_during_hazard_sequence() {
        let (mut app, _) = started_app();
        app.world_mut()
            .resource_mut::<HazardManager>()
            .request(HazardTrigger::Debug);
        request_advance(&mut app);
        assert_eq!(turn(&app).active_index, 0);

        app.world_mut().resource_mut::<HazardManager>().finish_sequence();
        request_advance(&mut app);
        assert_eq!(turn(&app).active_index, 1);
    }

    #[test]
    fn test_advance_refused_while_token_moves() {
        let (mut app, _) = started_app();
        app.world_mut().resource_mut::<MovementState>().moving = true;
        request_advance(&mut app);
        assert_eq!(turn(&app).active_index, 0);
    }

    #[test]
    fn test_advance_wraps_into_next_turn() {
        let (mut app, order) = started_app();
        request_advance(&mut app);
        request_advance(&mut app);
        assert_eq!(turn(&app).active(), Some(order[0]));
        assert_eq!(turn(&app).turn, 2);
    }

    #[test]
    fn test_extinction_pauses_the_game() {
        let (mut app, order) = started_app();
        app.world_mut().send_event(ApplyConsequence {
            player: order[0],
            consequence: Consequence::PopulationDamage(1000),
        });
        app.update();
        assert_eq!(app.world().get::<Player>(order[0]).unwrap().current_population, 0);
        assert!(turn(&app).paused);
        let extinct = app.world().resource::<Events<PlayerExtinct>>();
        assert_eq!(extinct.len(), 1);

        request_advance(&mut app);
        assert_eq!(turn(&app).active_index, 0);
    }

    #[test]
    fn test_granted_points_reach_the_player() {
        let (mut app, order) = started_app();
        app.world_mut().send_event(GrantEvolutionPoints {
            player: order[1],
            amount: 2,
        });
        app.update();
        assert_eq!(app.world().get::<Player>(order[1]).unwrap().evolution_points, 2);
        assert_eq!(app.world().get::<Player>(order[0]).unwrap().evolution_points, 0);
    }
}
