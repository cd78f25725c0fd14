//! Hazard events. `HazardManager` owns the deck and the rules,
//! `HazardView` tracks where the player is in the card -> stat -> result
//! flow. The view calls into the manager directly; everything else talks to
//! both through events.

use std::collections::VecDeque;

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::content::{
    EmpowermentCondition, GameContent, HazardCard, HazardType, PredatorType, StatKind,
};
use crate::events::{
    ActivePlayerChanged, ApplyConsequence, Consequence, HazardEventConcluded, HazardTrigger,
    RequestHazardEvent, ToggleHazardQueue,
};
use crate::game::{apply_consequences, TurnSet, TurnState};
use crate::player::Player;
use crate::scene::AppState;
use crate::settings::GameRng;
use crate::world::{Terrain, WorldMap};

pub const HAZARD_QUEUE_SIZE: usize = 3;
const EMPOWERMENT_CHANCE: f64 = 0.6;
const RESULT_BANNER_SECS: f32 = 2.5;

/// Random stand-in cards for when no deck was authored.
pub struct HazardCardFactory;

impl HazardCardFactory {
    const NAMES: [&'static str; 15] = [
        "Fluffysaurus maximus",
        "Bouncysaurus",
        "Calamitasaurus",
        "Doofusaurus",
        "Gobblesaurus",
        "Wobblydocus",
        "Scampysaurus",
        "Snifflesaurus",
        "Plumpasaurus",
        "Munchosaurus",
        "Chonkylobodon",
        "Fartosaurus",
        "Quackadactylus",
        "Honkasaurus",
        "Goofydactylus",
    ];

    const TERRAINS: [Terrain; 9] = [
        Terrain::Marsh,
        Terrain::Woodlands,
        Terrain::River,
        Terrain::Highlands,
        Terrain::Scrublands,
        Terrain::DesertDunes,
        Terrain::Plains,
        Terrain::ForestBroadleaf,
        Terrain::Hills,
    ];

    pub fn create_random_card(rng: &mut impl Rng) -> HazardCard {
        let hazard_type = *[HazardType::Predator, HazardType::Rival, HazardType::Climate]
            .choose(rng)
            .unwrap_or(&HazardType::Climate);
        let name = Self::NAMES.choose(rng).copied().unwrap_or("Hazard");
        let (eligible_stats, predator_type) = match hazard_type {
            HazardType::Predator => (
                vec![StatKind::Fight, StatKind::Flight, StatKind::Freeze],
                [PredatorType::Apex, PredatorType::Seeker, PredatorType::Ambusher]
                    .choose(rng)
                    .copied(),
            ),
            HazardType::Rival => (vec![StatKind::Territoriality], None),
            HazardType::Climate => (vec![StatKind::ClimateResistance], None),
        };
        let empowerment_condition = rng.gen_bool(EMPOWERMENT_CHANCE).then(|| {
            let count = rng.gen_range(1..=2);
            EmpowermentCondition {
                terrain: Self::TERRAINS.choose_multiple(rng, count).copied().collect(),
            }
        });
        HazardCard {
            name: name.to_string(),
            hazard_type,
            base_difficulty: rng.gen_range(5..=8),
            eligible_stats,
            predator_type,
            empowerment_condition,
            description: "A randomly generated hazard approaches!".to_string(),
        }
    }
}

/// A card in play. Names repeat across a deck, ids don't.
#[derive(Clone, Debug, PartialEq)]
pub struct DealtCard {
    pub id: u32,
    pub card: HazardCard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub stat: StatKind,
    pub stat_value: i32,
    pub roll: i32,
    pub difficulty: i32,
    pub empowered: bool,
    pub success: bool,
}

pub fn resolve_check(stat: StatKind, stat_value: i32, roll: i32, base_difficulty: i32, empowered: bool) -> CheckResult {
    let difficulty = base_difficulty + i32::from(empowered);
    CheckResult {
        stat,
        stat_value,
        roll,
        difficulty,
        empowered,
        success: stat_value + roll >= difficulty,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HazardResolution {
    pub card: DealtCard,
    pub check: CheckResult,
}

#[derive(Resource, Debug, Default)]
pub struct HazardManager {
    master_deck: Vec<HazardCard>,
    draw_pile: Vec<DealtCard>,
    discard_pile: Vec<DealtCard>,
    queue: Vec<DealtCard>,
    active: Option<u32>,
    next_id: u32,
    sequence: Option<HazardTrigger>,
    pending: VecDeque<HazardTrigger>,
}

impl HazardManager {
    pub fn new(master_deck: Vec<HazardCard>, rng: &mut impl Rng) -> Self {
        let mut manager = Self {
            master_deck,
            ..default()
        };
        manager.shuffle_deck(rng);
        manager.fill_queue(rng);
        manager
    }

    fn deal(&mut self, card: HazardCard) -> DealtCard {
        self.next_id += 1;
        DealtCard { id: self.next_id, card }
    }

    /// Fresh draw pile from the master deck, or from the factory when
    /// there is no deck. The discard pile is emptied.
    pub fn shuffle_deck(&mut self, rng: &mut impl Rng) {
        let cards: Vec<HazardCard> = if self.master_deck.is_empty() {
            let count = rng.gen_range(10..=15);
            info!("no hazard deck, generating {count} cards");
            (0..count).map(|_| HazardCardFactory::create_random_card(rng)).collect()
        } else {
            self.master_deck.clone()
        };
        self.draw_pile = cards.into_iter().map(|c| self.deal(c)).collect();
        self.draw_pile.shuffle(rng);
        self.discard_pile.clear();
        debug!("hazard draw pile holds {} cards", self.draw_pile.len());
    }

    pub fn draw_one(&mut self, rng: &mut impl Rng) -> Option<DealtCard> {
        if self.draw_pile.is_empty() {
            if self.discard_pile.is_empty() {
                debug!("all hazard piles empty, regenerating");
                self.shuffle_deck(rng);
            } else {
                debug!("reshuffling {} discarded hazards", self.discard_pile.len());
                self.draw_pile = std::mem::take(&mut self.discard_pile);
                self.draw_pile.shuffle(rng);
            }
        }
        if self.draw_pile.is_empty() {
            error!("no hazard card could be drawn");
            return None;
        }
        Some(self.draw_pile.remove(0))
    }

    pub fn fill_queue(&mut self, rng: &mut impl Rng) {
        while self.queue.len() < HAZARD_QUEUE_SIZE {
            match self.draw_one(rng) {
                Some(card) => self.queue.push(card),
                None => break,
            }
        }
    }

    pub fn queue(&self) -> &[DealtCard] {
        &self.queue
    }

    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_pile(&self) -> &[DealtCard] {
        &self.discard_pile
    }

    pub fn active_card(&self) -> Option<&DealtCard> {
        let id = self.active?;
        self.queue.iter().find(|c| c.id == id)
    }

    /// A card has been picked and is waiting for a stat.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Refused while another card is active.
    pub fn select_card(&mut self, id: u32) -> bool {
        if self.active.is_some() {
            warn!("card {id} selected while another hazard is active");
            return false;
        }
        if !self.queue.iter().any(|c| c.id == id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn deselect_card(&mut self) {
        self.active = None;
    }

    /// Settles the active card and replaces it in the queue.
    pub fn resolve(
        &mut self,
        stat: StatKind,
        stat_value: i32,
        roll: i32,
        empowered: bool,
        rng: &mut impl Rng,
    ) -> Option<HazardResolution> {
        let id = self.active.take()?;
        let index = self.queue.iter().position(|c| c.id == id)?;
        let card = self.queue.remove(index);
        let check = resolve_check(stat, stat_value, roll, card.card.base_difficulty, empowered);
        info!(
            "{}: {} {} + d6 {} vs {} -> {}",
            card.card.name,
            stat.display_name(),
            stat_value,
            roll,
            check.difficulty,
            if check.success { "success" } else { "failure" }
        );
        self.discard_pile.push(card.clone());
        self.fill_queue(rng);
        Some(HazardResolution { card, check })
    }

    /// A hazard sequence is running or waiting to run.
    pub fn in_sequence(&self) -> bool {
        self.sequence.is_some() || !self.pending.is_empty()
    }

    /// Starts a sequence, or queues the request behind the running one.
    /// Returns whether a sequence started now.
    pub fn request(&mut self, trigger: HazardTrigger) -> bool {
        if self.sequence.is_some() {
            debug!("hazard request {trigger:?} queued behind the running one");
            self.pending.push_back(trigger);
            return false;
        }
        self.sequence = Some(trigger);
        true
    }

    /// Ends the running sequence and starts the next queued one, if any.
    pub fn finish_sequence(&mut self) -> Option<HazardTrigger> {
        self.sequence = self.pending.pop_front();
        self.sequence
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HazardStage {
    #[default]
    Idle,
    AwaitingCard,
    AwaitingStat,
    Resolving,
}

#[derive(Debug)]
pub struct ResultBanner {
    pub resolution: HazardResolution,
    pub timer: Timer,
}

#[derive(Resource, Debug, Default)]
pub struct HazardView {
    pub stage: HazardStage,
    pub shown: bool,
    pending_stat: Option<StatKind>,
    pub banner: Option<ResultBanner>,
}

impl HazardView {
    pub fn start_sequence(&mut self) {
        self.stage = HazardStage::AwaitingCard;
        self.shown = true;
        self.pending_stat = None;
    }

    pub fn toggle(&mut self) {
        self.shown = !self.shown;
    }

    pub fn is_event_active(&self) -> bool {
        self.stage != HazardStage::Idle
    }

    /// Picking a card moves on to stat choice; picking the chosen card again
    /// puts it back.
    pub fn click_card(&mut self, manager: &mut HazardManager, id: u32) -> bool {
        match self.stage {
            HazardStage::AwaitingStat if manager.active_card().is_some_and(|c| c.id == id) => {
                manager.deselect_card();
                self.stage = HazardStage::AwaitingCard;
                true
            }
            HazardStage::AwaitingCard if manager.select_card(id) => {
                self.stage = HazardStage::AwaitingStat;
                true
            }
            _ => false,
        }
    }

    /// Only stats the active card lists are accepted.
    pub fn click_stat(&mut self, manager: &HazardManager, stat: StatKind) -> bool {
        if self.stage != HazardStage::AwaitingStat {
            return false;
        }
        let eligible = manager
            .active_card()
            .is_some_and(|c| c.card.eligible_stats.contains(&stat));
        if eligible {
            self.stage = HazardStage::Resolving;
            self.pending_stat = Some(stat);
        }
        eligible
    }

    pub fn end_sequence(&mut self, resolution: Option<HazardResolution>) {
        self.stage = HazardStage::Idle;
        self.shown = false;
        self.pending_stat = None;
        self.banner = resolution.map(|resolution| ResultBanner {
            resolution,
            timer: Timer::from_seconds(RESULT_BANNER_SECS, TimerMode::Once),
        });
    }
}

pub struct HazardPlugin;
impl Plugin for HazardPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), init_hazards)
            .add_systems(OnExit(AppState::InGame), |mut commands: Commands| {
                commands.remove_resource::<HazardManager>();
                commands.remove_resource::<HazardView>();
            })
            .add_systems(Update, (toggle_queue, hide_on_turn_change).in_set(TurnSet::Intent))
            .add_systems(
                Update,
                (handle_hazard_requests, resolve_chosen_stat)
                    .chain()
                    .before(apply_consequences)
                    .in_set(TurnSet::Consequence),
            )
            .add_systems(Update, tick_banner.run_if(resource_exists::<HazardView>));
    }
}

fn init_hazards(mut commands: Commands, content: Res<GameContent>, mut rng: ResMut<GameRng>) {
    let manager = HazardManager::new(content.hazard_deck.clone(), &mut rng.0);
    info!("hazard queue ready with {} cards", manager.queue().len());
    commands.insert_resource(manager);
    commands.insert_resource(HazardView::default());
}

fn toggle_queue(mut events: EventReader<ToggleHazardQueue>, mut view: ResMut<HazardView>) {
    for _ in events.read() {
        view.toggle();
    }
}

fn hide_on_turn_change(mut events: EventReader<ActivePlayerChanged>, mut view: ResMut<HazardView>) {
    if events.read().last().is_some() && !view.is_event_active() {
        view.shown = false;
    }
}

fn handle_hazard_requests(
    mut requests: EventReader<RequestHazardEvent>,
    mut manager: ResMut<HazardManager>,
    mut view: ResMut<HazardView>,
) {
    for req in requests.read() {
        info!("hazard event requested by {:?}", req.trigger);
        if manager.request(req.trigger) {
            view.start_sequence();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_chosen_stat(
    mut manager: ResMut<HazardManager>,
    mut view: ResMut<HazardView>,
    mut rng: ResMut<GameRng>,
    turn: Res<TurnState>,
    world: Res<WorldMap>,
    players: Query<&Player>,
    mut consequences: EventWriter<ApplyConsequence>,
    mut concluded: EventWriter<HazardEventConcluded>,
) {
    if view.stage != HazardStage::Resolving {
        return;
    }
    let Some(stat) = view.pending_stat else {
        return;
    };
    let Some((entity, player)) = turn.active().and_then(|e| players.get(e).ok().map(|p| (e, p))) else {
        warn!("hazard resolved with no active player");
        manager.deselect_card();
        view.end_sequence(None);
        return;
    };
    let empowered = match (manager.active_card(), world.get(player.coord)) {
        (Some(card), Some(tile)) => card.card.is_empowered_on(tile),
        _ => false,
    };
    let roll = rng.0.gen_range(1..=6);
    let resolution = manager.resolve(stat, player.stat(stat), roll, empowered, &mut rng.0);

    if let Some(resolution) = &resolution {
        if !resolution.check.success {
            consequences.send(ApplyConsequence {
                player: entity,
                consequence: Consequence::PopulationDamage(1),
            });
        }
        concluded.send(HazardEventConcluded {
            player: entity,
            card_name: resolution.card.card.name.clone(),
            success: resolution.check.success,
        });
    }
    view.end_sequence(resolution);

    if let Some(next) = manager.finish_sequence() {
        info!("starting queued hazard event from {:?}", next);
        view.start_sequence();
    }
}

fn tick_banner(time: Res<Time>, mut view: ResMut<HazardView>) {
    let finished = view
        .banner
        .as_mut()
        .is_some_and(|b| b.timer.tick(time.delta()).finished());
    if finished {
        view.banner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn deck() -> Vec<HazardCard> {
        GameContent::builtin().unwrap().hazard_deck
    }

    #[test]
    fn test_factory_cards_are_valid() {
        let mut rng = rng();
        for _ in 0..200 {
            let card = HazardCardFactory::create_random_card(&mut rng);
            assert!(card.validate().is_ok());
            assert!((5..=8).contains(&card.base_difficulty));
            if let Some(cond) = &card.empowerment_condition {
                assert!((1..=2).contains(&cond.terrain.len()));
            }
        }
    }

    #[test]
    fn test_queue_holds_three_after_construction() {
        let mut rng = rng();
        let manager = HazardManager::new(deck(), &mut rng);
        assert_eq!(manager.queue().len(), HAZARD_QUEUE_SIZE);

        let generated = HazardManager::new(Vec::new(), &mut rng);
        assert_eq!(generated.queue().len(), HAZARD_QUEUE_SIZE);
    }

    #[test]
    fn test_queue_stays_full_through_many_resolutions() {
        let mut rng = rng();
        let mut manager = HazardManager::new(deck(), &mut rng);
        for _ in 0..40 {
            let card = manager.queue()[0].clone();
            assert!(manager.select_card(card.id));
            let stat = card.card.eligible_stats[0];
            let resolution = manager.resolve(stat, 3, 3, false, &mut rng).unwrap();
            assert_eq!(resolution.card.id, card.id);
            assert_eq!(manager.queue().len(), HAZARD_QUEUE_SIZE);
            assert!(!manager.is_active());
        }
    }

    #[test]
    fn test_draw_reshuffles_discards_before_regenerating() {
        let mut rng = rng();
        let mut manager = HazardManager::new(deck(), &mut rng);
        let mut drawn = Vec::new();
        while manager.draw_pile_len() > 0 {
            drawn.push(manager.draw_one(&mut rng).unwrap());
        }
        manager.discard_pile = drawn.drain(..2).collect();
        let ids: Vec<u32> = manager.discard_pile.iter().map(|c| c.id).collect();
        let card = manager.draw_one(&mut rng).unwrap();
        assert!(ids.contains(&card.id));
        assert_eq!(manager.draw_pile_len(), 1);
        assert!(manager.discard_pile().is_empty());
    }

    #[test]
    fn test_draw_regenerates_when_everything_is_empty() {
        let mut rng = rng();
        let mut manager = HazardManager::new(Vec::new(), &mut rng);
        manager.draw_pile.clear();
        manager.discard_pile.clear();
        assert!(manager.draw_one(&mut rng).is_some());
        assert!(manager.draw_pile_len() >= 9);
    }

    #[test]
    fn test_resolution_arithmetic() {
        assert!(resolve_check(StatKind::Fight, 3, 3, 6, false).success);
        assert!(!resolve_check(StatKind::Fight, 3, 3, 6, true).success);
        let check = resolve_check(StatKind::Freeze, 2, 4, 7, true);
        assert_eq!(check.difficulty, 8);
        assert!(!check.success);
        assert!(resolve_check(StatKind::Freeze, 4, 4, 7, true).success);
    }

    #[test]
    fn test_second_selection_is_refused() {
        let mut rng = rng();
        let mut manager = HazardManager::new(deck(), &mut rng);
        let first = manager.queue()[0].id;
        let second = manager.queue()[1].id;
        assert!(manager.select_card(first));
        assert!(!manager.select_card(second));
        manager.deselect_card();
        assert!(manager.select_card(second));
    }

    #[test]
    fn test_requests_queue_behind_the_running_sequence() {
        let mut rng = rng();
        let mut manager = HazardManager::new(deck(), &mut rng);
        assert!(manager.request(HazardTrigger::MigrationEvent));
        assert!(!manager.request(HazardTrigger::Collectible));
        assert!(manager.in_sequence());
        assert_eq!(manager.finish_sequence(), Some(HazardTrigger::Collectible));
        assert_eq!(manager.finish_sequence(), None);
        assert!(!manager.in_sequence());
    }

    #[test]
    fn test_view_flow_and_deselect() {
        let mut rng = rng();
        let mut manager = HazardManager::new(deck(), &mut rng);
        let mut view = HazardView::default();
        let card = manager.queue()[0].clone();

        assert!(!view.click_card(&mut manager, card.id));
        view.start_sequence();
        assert!(view.shown);
        assert!(view.click_card(&mut manager, card.id));
        assert_eq!(view.stage, HazardStage::AwaitingStat);

        assert!(view.click_card(&mut manager, card.id));
        assert_eq!(view.stage, HazardStage::AwaitingCard);
        assert!(!manager.is_active());

        assert!(view.click_card(&mut manager, card.id));
        let ineligible = StatKind::ALL
            .into_iter()
            .find(|s| !card.card.eligible_stats.contains(s))
            .unwrap();
        assert!(!view.click_stat(&manager, ineligible));
        assert!(view.click_stat(&manager, card.card.eligible_stats[0]));
        assert_eq!(view.stage, HazardStage::Resolving);

        view.end_sequence(None);
        assert_eq!(view.stage, HazardStage::Idle);
        assert!(!view.shown);
    }
}
