//! Every announcement the game makes. Producers and listeners only share
//! these types; nothing else couples the logic plugins to the views.

use bevy::prelude::*;

use crate::hex::HexCoord;

#[derive(Event, Debug, Clone, Copy)]
pub struct TurnStarted {
    pub player: Entity,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ActivePlayerChanged {
    pub player: Entity,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerSelected {
    pub player: Entity,
    pub is_active: bool,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CenterCameraOnTile {
    pub coord: HexCoord,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct HexClicked {
    pub coord: HexCoord,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct RequestPlayerMove {
    pub player: Entity,
    pub destination: HexCoord,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerLandedOnTile {
    pub player: Entity,
    pub coord: HexCoord,
    pub path_cost: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardTrigger {
    MigrationEvent,
    Collectible,
    Debug,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct RequestHazardEvent {
    pub trigger: HazardTrigger,
}

#[derive(Event, Debug, Clone)]
pub struct HazardEventConcluded {
    pub player: Entity,
    pub card_name: String,
    pub success: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consequence {
    PopulationDamage(u32),
}

/// The only way for other plugins to hurt a player.
#[derive(Event, Debug, Clone, Copy)]
pub struct ApplyConsequence {
    pub player: Entity,
    pub consequence: Consequence,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerPopulationChanged {
    pub player: Entity,
    pub current: u32,
    pub max: u32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerExtinct {
    pub player: Entity,
}

#[derive(Event, Debug, Clone)]
pub struct MigrationEventSelected {
    pub player: Entity,
    /// `None` when every migration event is disabled.
    pub event_id: Option<String>,
}

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct AdvanceTurnRequested;

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct StartGameRequested;

#[derive(Event, Debug, Clone, Copy)]
pub struct EvolveRequested {
    pub player: Entity,
}

/// Debug grant; the game logic owns the points.
#[derive(Event, Debug, Clone, Copy)]
pub struct GrantEvolutionPoints {
    pub player: Entity,
    pub amount: u32,
}

#[derive(Event, Debug, Clone)]
pub struct PlayerEvolved {
    pub player: Entity,
    pub species_id: String,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct AddResourceRequested {
    pub coord: HexCoord,
    pub kind: &'static str,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CollectibleCollected {
    pub player: Entity,
    pub coord: HexCoord,
}

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ToggleHazardQueue;

pub struct GameEventsPlugin;
impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TurnStarted>()
            .add_event::<ActivePlayerChanged>()
            .add_event::<PlayerSelected>()
            .add_event::<CenterCameraOnTile>()
            .add_event::<HexClicked>()
            .add_event::<RequestPlayerMove>()
            .add_event::<PlayerLandedOnTile>()
            .add_event::<RequestHazardEvent>()
            .add_event::<HazardEventConcluded>()
            .add_event::<ApplyConsequence>()
            .add_event::<PlayerPopulationChanged>()
            .add_event::<PlayerExtinct>()
            .add_event::<MigrationEventSelected>()
            .add_event::<AdvanceTurnRequested>()
            .add_event::<StartGameRequested>()
            .add_event::<EvolveRequested>()
            .add_event::<GrantEvolutionPoints>()
            .add_event::<PlayerEvolved>()
            .add_event::<AddResourceRequested>()
            .add_event::<CollectibleCollected>()
            .add_event::<ToggleHazardQueue>();
    }
}
