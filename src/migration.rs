use std::time::Duration;

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::content::{ContentError, GameContent, MigrationEventDef};
use crate::events::{HazardTrigger, MigrationEventSelected, PlayerLandedOnTile, RequestHazardEvent, TurnStarted};
use crate::game::TurnSet;
use crate::scene::AppState;
use crate::settings::GameRng;
use crate::world::{Tile, WorldMap};

pub const WHEEL_SPINS: usize = 2;
pub const WHEEL_STEP_SECS: f32 = 0.12;

/// The migration events in play and the one drawn for the current turn.
#[derive(Resource, Debug, Default)]
pub struct MigrationManager {
    events: Vec<MigrationEventDef>,
    active: Option<String>,
}

impl MigrationManager {
    pub fn new(events: Vec<MigrationEventDef>) -> Self {
        Self { events, active: None }
    }

    pub fn events(&self) -> &[MigrationEventDef] {
        &self.events
    }

    pub fn event(&self, id: &str) -> Option<&MigrationEventDef> {
        self.events.iter().find(|e| e.event_id == id)
    }

    pub fn active(&self) -> Option<&MigrationEventDef> {
        self.active.as_deref().and_then(|id| self.event(id))
    }

    pub fn add_event(&mut self, event: MigrationEventDef) -> Result<(), ContentError> {
        if self.event(&event.event_id).is_some() {
            return Err(ContentError::DuplicateMigrationEvent(event.event_id));
        }
        self.events.push(event);
        Ok(())
    }

    pub fn remove_event(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.event_id != id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        self.events.len() != before
    }

    pub fn enable_event(&mut self, id: &str, enabled: bool) -> bool {
        match self.events.iter_mut().find(|e| e.event_id == id) {
            Some(event) => {
                event.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn select_random(&self, rng: &mut impl Rng) -> Option<&MigrationEventDef> {
        let enabled: Vec<&MigrationEventDef> = self.events.iter().filter(|e| e.enabled).collect();
        enabled.choose(rng).copied()
    }

    pub fn set_new_active(&mut self, rng: &mut impl Rng) -> Option<&MigrationEventDef> {
        self.active = self.select_random(rng).map(|e| e.event_id.clone());
        self.active()
    }

    pub fn triggers_hazard(&self, tile: &Tile) -> bool {
        self.active().is_some_and(|e| e.triggers_on(tile))
    }
}

/// Two full spins over every event, then a run up to the chosen one.
pub fn spin_sequence(ids: &[String], chosen: &str) -> Vec<String> {
    let Some(index) = ids.iter().position(|id| id == chosen) else {
        return Vec::new();
    };
    let mut sequence = Vec::with_capacity(ids.len() * WHEEL_SPINS + index + 1);
    for _ in 0..WHEEL_SPINS {
        sequence.extend(ids.iter().cloned());
    }
    sequence.extend(ids[..=index].iter().cloned());
    sequence
}

/// Highlight that runs around the migration panel at turn start.
#[derive(Resource, Debug)]
pub struct MigrationWheel {
    sequence: Vec<String>,
    step: usize,
    timer: Timer,
    cycle: u32,
}

impl Default for MigrationWheel {
    fn default() -> Self {
        Self {
            sequence: Vec::new(),
            step: 0,
            timer: Timer::from_seconds(WHEEL_STEP_SECS, TimerMode::Repeating),
            cycle: 0,
        }
    }
}

impl MigrationWheel {
    /// Restarting drops whatever the previous cycle was doing.
    pub fn start(&mut self, ids: &[String], chosen: &str) {
        self.cycle += 1;
        self.sequence = spin_sequence(ids, chosen);
        self.step = 0;
        self.timer.reset();
    }

    pub fn tick(&mut self, delta: Duration) {
        if self.is_settled() {
            return;
        }
        self.timer.tick(delta);
        let steps = self.timer.times_finished_this_tick() as usize;
        self.step = (self.step + steps).min(self.sequence.len().saturating_sub(1));
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.sequence.get(self.step).map(String::as_str)
    }

    pub fn is_settled(&self) -> bool {
        self.step + 1 >= self.sequence.len()
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }
}

pub struct MigrationPlugin;
impl Plugin for MigrationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), |mut commands: Commands, content: Res<GameContent>| {
            commands.insert_resource(MigrationManager::new(content.migration_events.clone()));
            commands.insert_resource(MigrationWheel::default());
        })
        .add_systems(OnExit(AppState::InGame), |mut commands: Commands| {
            commands.remove_resource::<MigrationManager>();
            commands.remove_resource::<MigrationWheel>();
        })
        .add_systems(
            Update,
            (select_turn_event, check_landing_trigger).in_set(TurnSet::Resolve),
        )
        .add_systems(Update, spin_wheel.run_if(resource_exists::<MigrationWheel>));
    }
}

fn select_turn_event(
    mut turns: EventReader<TurnStarted>,
    mut manager: ResMut<MigrationManager>,
    mut wheel: ResMut<MigrationWheel>,
    mut rng: ResMut<GameRng>,
    mut selected: EventWriter<MigrationEventSelected>,
) {
    for turn in turns.read() {
        let event_id = manager.set_new_active(&mut rng.0).map(|e| e.event_id.clone());
        match &event_id {
            Some(id) => {
                info!("migration event for this turn: {id}");
                let ids: Vec<String> = manager.events().iter().map(|e| e.event_id.clone()).collect();
                wheel.start(&ids, id);
            }
            None => warn!("no enabled migration events"),
        }
        selected.send(MigrationEventSelected {
            player: turn.player,
            event_id,
        });
    }
}

fn check_landing_trigger(
    mut landed: EventReader<PlayerLandedOnTile>,
    manager: Res<MigrationManager>,
    world: Res<WorldMap>,
    mut hazards: EventWriter<RequestHazardEvent>,
) {
    for ev in landed.read() {
        let Some(tile) = world.get(ev.coord) else {
            continue;
        };
        if manager.triggers_hazard(tile) {
            debug!("{} triggers the migration hazard", ev.coord);
            hazards.send(RequestHazardEvent {
                trigger: HazardTrigger::MigrationEvent,
            });
        }
    }
}

fn spin_wheel(time: Res<Time>, mut wheel: ResMut<MigrationWheel>) {
    wheel.tick(time.delta());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HexCoord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn manager() -> MigrationManager {
        MigrationManager::new(GameContent::builtin().unwrap().migration_events)
    }

    #[test]
    fn test_selection_only_picks_enabled_events() {
        let mut manager = manager();
        let ids: Vec<String> = manager.events().iter().map(|e| e.event_id.clone()).collect();
        for id in &ids {
            if id != "marsh_hazard" {
                assert!(manager.enable_event(id, false));
            }
        }
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(manager.set_new_active(&mut rng).unwrap().event_id, "marsh_hazard");
        }
        manager.enable_event("marsh_hazard", false);
        assert!(manager.set_new_active(&mut rng).is_none());
        assert!(manager.active().is_none());
    }

    #[test]
    fn test_add_rejects_duplicates_and_remove_clears_active() {
        let mut manager = manager();
        let dup = manager.events()[0].clone();
        assert!(matches!(
            manager.add_event(dup),
            Err(ContentError::DuplicateMigrationEvent(_))
        ));
        let mut rng = StdRng::seed_from_u64(5);
        let active = manager.set_new_active(&mut rng).unwrap().event_id.clone();
        assert!(manager.remove_event(&active));
        assert!(manager.active().is_none());
        assert!(!manager.remove_event(&active));
    }

    #[test]
    fn test_active_event_triggers_on_its_terrain() {
        let mut manager = manager();
        for e in manager.events().to_vec() {
            manager.enable_event(&e.event_id, e.event_id == "marsh_hazard");
        }
        let mut rng = StdRng::seed_from_u64(9);
        manager.set_new_active(&mut rng);
        let world = WorldMap::from_rows(&[".m"]);
        assert!(manager.triggers_hazard(world.get(HexCoord::new(1, 0)).unwrap()));
        assert!(!manager.triggers_hazard(world.get(HexCoord::new(0, 0)).unwrap()));
    }

    #[test]
    fn test_spin_sequence_ends_on_choice() {
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let seq = spin_sequence(&ids, "b");
        assert_eq!(seq.len(), 3 * WHEEL_SPINS + 2);
        assert_eq!(seq.last().map(String::as_str), Some("b"));
        assert!(spin_sequence(&ids, "zzz").is_empty());
    }

    #[test]
    fn test_wheel_settles_and_restarts() {
        let ids: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let mut wheel = MigrationWheel::default();
        wheel.start(&ids, "a");
        assert_eq!(wheel.highlighted(), Some("a"));
        assert!(!wheel.is_settled());
        wheel.tick(Duration::from_secs_f32(WHEEL_STEP_SECS * 2.5));
        assert_eq!(wheel.highlighted(), Some("a"));
        wheel.tick(Duration::from_secs(5));
        assert!(wheel.is_settled());
        assert_eq!(wheel.highlighted(), Some("a"));

        wheel.start(&ids, "b");
        assert_eq!(wheel.cycle(), 2);
        assert!(!wheel.is_settled());
    }
}
