// Battle phase state machine: placement, alternating turns and round advancement.

use crate::domain::PlayerId;
use crate::domain::combat::{self, WeaponResult};
use crate::domain::dice::{Dice, DicePool};
use crate::domain::errors::BattleError;
use crate::domain::hex::{Direction, MapBounds, Position, Turn};
use crate::domain::movement::{self, MovePlan};
use crate::domain::ship::{Ship, ShipClass, ShipStats, ShipStatus};
use crate::domain::tuning::MIN_ACTIVATION_FACE;
use crate::domain::victory::{self, Victory};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    Placement,
    Battle,
}

/// Ships of one project a participant still has to put on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPlacement {
    pub class: ShipClass,
    pub project_id: String,
    pub remaining: u32,
    pub stats: ShipStats,
}

/// Result of a successful end-of-turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnChange {
    pub current_player: PlayerId,
    pub round: u32,
    /// True when this end-of-turn closed the placement phase.
    pub battle_started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireEntry {
    Resolved(WeaponResult),
    Rejected { weapon_id: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    pub attacker_id: String,
    pub target_id: String,
    pub results: Vec<FireEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaponTargets {
    pub weapon_id: String,
    pub weapon_name: String,
    pub target_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Battle {
    pub phase: BattlePhase,
    /// Zero during placement, then the current battle round.
    pub round: u32,
    pub current_player: PlayerId,
    /// Participants in room order; the first one opens every battle round.
    pub players: Vec<PlayerId>,
    pub pending: HashMap<PlayerId, Vec<PendingPlacement>>,
    pub ships: Vec<Ship>,
    pub dice_pools: HashMap<PlayerId, DicePool>,
    pub bounds: MapBounds,
    pub placement_turns: u32,
    next_ship_seq: u64,
}

impl Battle {
    /// Starts the placement phase with `players[first_placer]` placing first.
    pub fn new(
        players: Vec<PlayerId>,
        pending: HashMap<PlayerId, Vec<PendingPlacement>>,
        bounds: MapBounds,
        first_placer: usize,
    ) -> Self {
        let current_player = players
            .get(first_placer)
            .or_else(|| players.first())
            .copied()
            .unwrap_or_default();

        let pending = players
            .iter()
            .map(|player| {
                let queue = pending
                    .get(player)
                    .map(|entries| {
                        entries
                            .iter()
                            .filter(|entry| entry.remaining > 0)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                (*player, queue)
            })
            .collect();

        Self {
            phase: BattlePhase::Placement,
            round: 0,
            current_player,
            players,
            pending,
            ships: Vec::new(),
            dice_pools: HashMap::new(),
            bounds,
            placement_turns: 0,
            next_ship_seq: 0,
        }
    }

    pub fn pending_for(&self, player: PlayerId) -> &[PendingPlacement] {
        self.pending.get(&player).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ship(&self, ship_id: &str) -> Option<&Ship> {
        self.ships.iter().find(|ship| ship.id == ship_id)
    }

    /// Outcome of the match, only meaningful once ships are fighting.
    pub fn victory(&self) -> Option<Victory> {
        if self.phase != BattlePhase::Battle {
            return None;
        }
        victory::evaluate(&self.players, &self.ships)
    }

    pub fn place_ship(
        &mut self,
        actor: PlayerId,
        project_id: &str,
        position: Position,
    ) -> Result<&Ship, BattleError> {
        self.require_player(actor)?;
        if self.phase != BattlePhase::Placement {
            return Err(BattleError::NotInPlacement);
        }
        self.require_turn(actor)?;
        if !self.bounds.contains(&position) {
            return Err(BattleError::OutOfBounds);
        }
        if self.ships.iter().any(|ship| ship.position == position) {
            return Err(BattleError::CellOccupied);
        }

        let facing = self.default_facing(actor);
        let queue = self.pending.entry(actor).or_default();
        let Some(slot) = queue
            .iter()
            .position(|entry| entry.project_id == project_id && entry.remaining > 0)
        else {
            return Err(BattleError::NothingToPlace);
        };

        let entry = &mut queue[slot];
        entry.remaining -= 1;
        let (class, stats) = (entry.class, entry.stats);
        if entry.remaining == 0 {
            queue.remove(slot);
        }

        self.next_ship_seq += 1;
        let ship = Ship::new(
            format!("{actor}_{project_id}_{}", self.next_ship_seq),
            actor,
            class,
            project_id.to_string(),
            position,
            facing,
            stats,
        );
        self.ships.push(ship);
        let index = self.ships.len() - 1;
        Ok(&self.ships[index])
    }

    pub fn end_turn(
        &mut self,
        actor: PlayerId,
        dice: &mut dyn Dice,
    ) -> Result<TurnChange, BattleError> {
        self.require_player(actor)?;
        self.require_turn(actor)?;
        match self.phase {
            BattlePhase::Placement => self.end_placement_turn(actor, dice),
            BattlePhase::Battle => Ok(self.end_battle_turn(actor, dice)),
        }
    }

    fn end_placement_turn(
        &mut self,
        actor: PlayerId,
        dice: &mut dyn Dice,
    ) -> Result<TurnChange, BattleError> {
        if !self.pending_for(actor).is_empty() {
            return Err(BattleError::PlacementIncomplete);
        }

        self.placement_turns += 1;
        if self.pending.values().all(Vec::is_empty) {
            self.start_battle(dice);
            return Ok(TurnChange {
                current_player: self.current_player,
                round: self.round,
                battle_started: true,
            });
        }

        self.current_player = self.other_player(actor);
        Ok(TurnChange {
            current_player: self.current_player,
            round: self.round,
            battle_started: false,
        })
    }

    fn start_battle(&mut self, dice: &mut dyn Dice) {
        self.phase = BattlePhase::Battle;
        self.round = 1;
        self.current_player = self.players.first().copied().unwrap_or(self.current_player);
        for player in self.players.clone() {
            self.dice_pools.insert(player, DicePool::roll(1, 0, dice));
        }
    }

    fn end_battle_turn(&mut self, actor: PlayerId, dice: &mut dyn Dice) -> TurnChange {
        for ship in self
            .ships
            .iter_mut()
            .filter(|ship| ship.owner == actor && ship.status == ShipStatus::Activated)
        {
            ship.status = ShipStatus::Spent;
        }

        self.current_player = self.other_player(actor);
        if self.players.first() == Some(&self.current_player) {
            self.start_round(dice);
        }

        TurnChange {
            current_player: self.current_player,
            round: self.round,
            battle_started: false,
        }
    }

    // New round: survivors refresh and every participant rolls `round` dice plus carried ones.
    fn start_round(&mut self, dice: &mut dyn Dice) {
        self.round += 1;
        for ship in &mut self.ships {
            ship.refresh();
        }
        for player in self.players.clone() {
            let carried = self
                .dice_pools
                .get(&player)
                .map(DicePool::unspent_ones)
                .unwrap_or(0);
            self.dice_pools
                .insert(player, DicePool::roll(self.round, carried, dice));
        }
    }

    /// Spends one die on a ready ship. Returns the face used.
    pub fn activate_ship(
        &mut self,
        actor: PlayerId,
        ship_id: &str,
        face: Option<u8>,
    ) -> Result<u8, BattleError> {
        let index = self.battle_turn_ship(actor, ship_id)?;
        match self.ships[index].status {
            ShipStatus::Ready => {}
            ShipStatus::Activated => return Err(BattleError::AlreadyActivated),
            ShipStatus::Spent => return Err(BattleError::ShipSpent),
            ShipStatus::Destroyed => return Err(BattleError::ShipDestroyed),
        }
        let face = self.choose_die(actor, self.ships[index].activation, face)?;
        self.commit_activation(actor, index, Some(face));
        Ok(face)
    }

    pub fn rotate_ship(
        &mut self,
        actor: PlayerId,
        ship_id: &str,
        turn: Turn,
    ) -> Result<Direction, BattleError> {
        self.require_player(actor)?;
        self.require_turn(actor)?;
        let index = self.owned_ship(actor, ship_id)?;

        if self.phase == BattlePhase::Placement {
            let ship = &mut self.ships[index];
            ship.facing = ship.facing.rotated(turn);
            return Ok(ship.facing);
        }

        let die = self.activation_needed(actor, index)?;
        if self.ships[index].current_maneuverability == 0 {
            return Err(BattleError::NoManeuver);
        }
        self.commit_activation(actor, index, die);

        let ship = &mut self.ships[index];
        if ship.free_turn {
            ship.free_turn = false;
        } else {
            ship.current_maneuverability -= 1;
        }
        ship.facing = ship.facing.rotated(turn);
        Ok(ship.facing)
    }

    pub fn move_ship(
        &mut self,
        actor: PlayerId,
        ship_id: &str,
        target: Position,
    ) -> Result<MovePlan, BattleError> {
        let index = self.battle_turn_ship(actor, ship_id)?;
        let die = self.activation_needed(actor, index)?;
        let plan = movement::plan_move(&self.ships[index], &self.ships, &self.bounds, target)
            .ok_or(BattleError::Unreachable)?;
        self.commit_activation(actor, index, die);

        let ship = &mut self.ships[index];
        ship.position = plan.destination;
        ship.facing = plan.facing;
        ship.current_speed = ship.current_speed.saturating_sub(plan.speed_cost);
        ship.current_maneuverability = ship
            .current_maneuverability
            .saturating_sub(plan.maneuver_cost);
        ship.free_turn = true;
        Ok(plan)
    }

    /// Fires the listed weapons at one target. Individual weapons that cannot fire are
    /// reported in the result list and stay unused.
    pub fn fire(
        &mut self,
        actor: PlayerId,
        attacker_id: &str,
        target_id: &str,
        weapon_ids: &[String],
        dice: &mut dyn Dice,
    ) -> Result<FireReport, BattleError> {
        let attacker = self.battle_turn_ship(actor, attacker_id)?;
        let target = self.ship_index(target_id)?;
        if self.ships[target].owner == actor {
            return Err(BattleError::FriendlyTarget);
        }
        if !self.ships[target].is_alive() {
            return Err(BattleError::TargetDestroyed);
        }
        if weapon_ids.is_empty() {
            return Err(BattleError::NoWeapons);
        }
        let die = self.activation_needed(actor, attacker)?;
        self.commit_activation(actor, attacker, die);

        let mut results = Vec::with_capacity(weapon_ids.len());
        for weapon_id in weapon_ids {
            let shooter = &self.ships[attacker];
            let checked = match shooter.weapon(weapon_id) {
                None => Err("unknown weapon"),
                Some(_) if shooter.used_weapons.contains(weapon_id) => Err("weapon already used"),
                Some(_) if !self.ships[target].is_alive() => Err("target is already destroyed"),
                Some(weapon) if !combat::in_arc(shooter, weapon, self.ships[target].position) => {
                    Err("target is outside the firing arc")
                }
                Some(weapon) => Ok(weapon.clone()),
            };
            let weapon = match checked {
                Ok(weapon) => weapon,
                Err(error) => {
                    results.push(FireEntry::Rejected {
                        weapon_id: weapon_id.clone(),
                        error: error.to_string(),
                    });
                    continue;
                }
            };

            self.ships[attacker].used_weapons.insert(weapon.id.clone());
            let result = combat::resolve_weapon(&weapon, target, &mut self.ships, dice);
            results.push(FireEntry::Resolved(result));
        }

        Ok(FireReport {
            attacker_id: attacker_id.to_string(),
            target_id: target_id.to_string(),
            results,
        })
    }

    /// Cells the ship could move to right now.
    pub fn reachable(&self, ship_id: &str) -> Result<Vec<Position>, BattleError> {
        let index = self.ship_index(ship_id)?;
        let ship = &self.ships[index];
        if !ship.is_alive() {
            return Ok(Vec::new());
        }
        Ok(movement::reachable_cells(ship, &self.ships, &self.bounds))
    }

    /// Enemy ships each unused weapon could hit from the ship's current pose.
    pub fn targets(&self, ship_id: &str) -> Result<Vec<WeaponTargets>, BattleError> {
        let index = self.ship_index(ship_id)?;
        let ship = &self.ships[index];
        Ok(ship
            .weapons
            .iter()
            .filter(|weapon| !ship.used_weapons.contains(&weapon.id))
            .map(|weapon| WeaponTargets {
                weapon_id: weapon.id.clone(),
                weapon_name: weapon.name.clone(),
                target_ids: combat::targets_in_arc(ship, weapon, &self.ships)
                    .into_iter()
                    .map(|target| target.id.clone())
                    .collect(),
            })
            .collect())
    }

    fn require_player(&self, actor: PlayerId) -> Result<(), BattleError> {
        if self.players.contains(&actor) {
            Ok(())
        } else {
            Err(BattleError::UnknownPlayer)
        }
    }

    fn require_turn(&self, actor: PlayerId) -> Result<(), BattleError> {
        if self.current_player == actor {
            Ok(())
        } else {
            Err(BattleError::NotYourTurn)
        }
    }

    fn ship_index(&self, ship_id: &str) -> Result<usize, BattleError> {
        self.ships
            .iter()
            .position(|ship| ship.id == ship_id)
            .ok_or(BattleError::ShipNotFound)
    }

    fn owned_ship(&self, actor: PlayerId, ship_id: &str) -> Result<usize, BattleError> {
        let index = self.ship_index(ship_id)?;
        if self.ships[index].owner != actor {
            return Err(BattleError::NotYourShip);
        }
        Ok(index)
    }

    // Common guard for battle-phase ship commands.
    fn battle_turn_ship(&self, actor: PlayerId, ship_id: &str) -> Result<usize, BattleError> {
        self.require_player(actor)?;
        if self.phase != BattlePhase::Battle {
            return Err(BattleError::NotInBattle);
        }
        self.require_turn(actor)?;
        self.owned_ship(actor, ship_id)
    }

    fn other_player(&self, actor: PlayerId) -> PlayerId {
        self.players
            .iter()
            .copied()
            .find(|player| *player != actor)
            .unwrap_or(actor)
    }

    fn default_facing(&self, actor: PlayerId) -> Direction {
        if self.players.first() == Some(&actor) {
            Direction::East
        } else {
            Direction::West
        }
    }

    fn choose_die(
        &self,
        actor: PlayerId,
        threshold: u8,
        requested: Option<u8>,
    ) -> Result<u8, BattleError> {
        let pool = self.dice_pools.get(&actor);
        let count = |face: u8| pool.map_or(0, |pool| pool.count(face));
        match requested {
            Some(face) if face < threshold.max(MIN_ACTIVATION_FACE) => {
                Err(BattleError::DieTooLow { face, threshold })
            }
            Some(face) if count(face) == 0 => Err(BattleError::DieUnavailable { face }),
            Some(face) => Ok(face),
            None => pool
                .and_then(|pool| pool.lowest_face_at_least(threshold))
                .ok_or(BattleError::NoSuitableDie { threshold }),
        }
    }

    // Which die (if any) a command must spend so the ship can act. Does not mutate.
    fn activation_needed(&self, actor: PlayerId, index: usize) -> Result<Option<u8>, BattleError> {
        let ship = &self.ships[index];
        match ship.status {
            ShipStatus::Activated => Ok(None),
            ShipStatus::Ready => self.choose_die(actor, ship.activation, None).map(Some),
            ShipStatus::Spent => Err(BattleError::ShipSpent),
            ShipStatus::Destroyed => Err(BattleError::ShipDestroyed),
        }
    }

    fn commit_activation(&mut self, actor: PlayerId, index: usize, face: Option<u8>) {
        let Some(face) = face else {
            return;
        };
        if let Some(pool) = self.dice_pools.get_mut(&actor) {
            pool.take(face);
        }
        self.ships[index].status = ShipStatus::Activated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::combat::ShotResult;
    use crate::domain::test_support::{ScriptedDice, ship_at};

    const A: PlayerId = 1;
    const B: PlayerId = 2;

    fn pending(class: ShipClass, project_id: &str, count: u32) -> PendingPlacement {
        PendingPlacement {
            class,
            project_id: project_id.to_string(),
            remaining: count,
            stats: class.base_stats(),
        }
    }

    fn placement(a: Vec<PendingPlacement>, b: Vec<PendingPlacement>) -> Battle {
        let queues = HashMap::from([(A, a), (B, b)]);
        Battle::new(vec![A, B], queues, MapBounds::default(), 0)
    }

    // Battle phase with the given ships and both pools set to `counts`.
    fn fighting(ships: Vec<Ship>, counts: [u32; 6]) -> Battle {
        let mut battle = placement(Vec::new(), Vec::new());
        battle
            .end_turn(A, &mut ScriptedDice::d6(&[6, 6]))
            .expect("empty fleets should start the battle");
        battle.ships = ships;
        battle.dice_pools.insert(A, DicePool::from_counts(counts));
        battle.dice_pools.insert(B, DicePool::from_counts(counts));
        battle
    }

    #[test]
    fn when_placer_still_has_ships_then_end_turn_is_rejected_until_all_are_placed() {
        let mut battle = placement(vec![pending(ShipClass::Frigate, "f", 2)], Vec::new());
        let mut dice = ScriptedDice::d6(&[3, 5]);

        battle
            .place_ship(A, "f", Position::new(-5, 0))
            .expect("first placement");
        assert_eq!(
            battle.end_turn(A, &mut dice),
            Err(BattleError::PlacementIncomplete)
        );

        battle
            .place_ship(A, "f", Position::new(-5, 1))
            .expect("second placement");
        let change = battle.end_turn(A, &mut dice).expect("turn should end");

        assert!(change.battle_started);
        assert_eq!(battle.phase, BattlePhase::Battle);
        assert_eq!(battle.round, 1);
        assert_eq!(battle.current_player, A);
        assert_eq!(battle.dice_pools[&A].total(), 1);
        assert_eq!(battle.dice_pools[&B].total(), 1);
    }

    #[test]
    fn when_other_player_still_has_ships_then_placement_turn_passes() {
        let mut battle = placement(
            vec![pending(ShipClass::Frigate, "f", 1)],
            vec![pending(ShipClass::Cruiser, "c", 1)],
        );
        let mut dice = ScriptedDice::d6(&[]);
        battle.place_ship(A, "f", Position::new(-5, 0)).expect("place");
        let change = battle.end_turn(A, &mut dice).expect("end turn");
        assert_eq!(change.current_player, B);
        assert_eq!(battle.phase, BattlePhase::Placement);
        assert_eq!(battle.placement_turns, 1);
    }

    #[test]
    fn when_placing_ships_then_defaults_come_from_the_pending_entry() {
        let mut battle = placement(
            vec![pending(ShipClass::Frigate, "f", 1)],
            vec![pending(ShipClass::Cruiser, "c", 1)],
        );
        let ship = battle
            .place_ship(A, "f", Position::new(-5, 0))
            .expect("place")
            .clone();
        assert_eq!(ship.hp, 2);
        assert_eq!(ship.facing, Direction::East);
        assert_eq!(ship.status, ShipStatus::Ready);
        assert!(battle.pending_for(A).is_empty());

        battle.end_turn(A, &mut ScriptedDice::d6(&[])).expect("pass");
        let enemy = battle
            .place_ship(B, "c", Position::new(5, 0))
            .expect("place")
            .clone();
        assert_eq!(enemy.facing, Direction::West);
        assert_eq!(enemy.hp, 4);
    }

    #[test]
    fn when_placement_is_illegal_then_nothing_changes() {
        let mut battle = placement(
            vec![pending(ShipClass::Frigate, "f", 2)],
            vec![pending(ShipClass::Cruiser, "c", 1)],
        );
        battle.place_ship(A, "f", Position::new(0, 0)).expect("place");

        assert_eq!(
            battle.place_ship(A, "f", Position::new(0, 0)).map(|_| ()),
            Err(BattleError::CellOccupied)
        );
        assert_eq!(
            battle.place_ship(A, "f", Position::new(15, 0)).map(|_| ()),
            Err(BattleError::OutOfBounds)
        );
        assert_eq!(
            battle.place_ship(A, "c", Position::new(1, 0)).map(|_| ()),
            Err(BattleError::NothingToPlace)
        );
        assert_eq!(
            battle.place_ship(B, "c", Position::new(1, 0)).map(|_| ()),
            Err(BattleError::NotYourTurn)
        );
        assert_eq!(battle.ships.len(), 1);
        assert_eq!(battle.pending_for(A)[0].remaining, 1);
    }

    #[test]
    fn when_no_die_meets_the_threshold_then_activation_is_rejected() {
        let mut battle = fighting(
            vec![ship_at("cruiser", A, ShipClass::Cruiser, 0, 0)],
            [0, 0, 1, 0, 0, 0],
        );
        assert_eq!(
            battle.activate_ship(A, "cruiser", None),
            Err(BattleError::NoSuitableDie { threshold: 4 })
        );
        assert_eq!(battle.dice_pools[&A].counts(), [0, 0, 1, 0, 0, 0]);
        assert_eq!(battle.ships[0].status, ShipStatus::Ready);
    }

    #[test]
    fn when_activating_then_the_smallest_qualifying_die_is_spent() {
        let mut battle = fighting(
            vec![ship_at("cruiser", A, ShipClass::Cruiser, 0, 0)],
            [2, 0, 1, 0, 1, 1],
        );
        assert_eq!(battle.activate_ship(A, "cruiser", None), Ok(5));
        assert_eq!(battle.dice_pools[&A].counts(), [2, 0, 1, 0, 0, 1]);
        assert_eq!(battle.ships[0].status, ShipStatus::Activated);
        assert_eq!(
            battle.activate_ship(A, "cruiser", None),
            Err(BattleError::AlreadyActivated)
        );
    }

    #[test]
    fn when_an_explicit_die_is_requested_then_it_must_qualify_and_exist() {
        let mut battle = fighting(
            vec![ship_at("frigate", A, ShipClass::Frigate, 0, 0)],
            [1, 0, 0, 1, 0, 0],
        );
        assert_eq!(
            battle.activate_ship(A, "frigate", Some(1)),
            Err(BattleError::DieTooLow {
                face: 1,
                threshold: 2
            })
        );
        assert_eq!(
            battle.activate_ship(A, "frigate", Some(6)),
            Err(BattleError::DieUnavailable { face: 6 })
        );
        assert_eq!(battle.activate_ship(A, "frigate", Some(4)), Ok(4));
    }

    #[test]
    fn when_battle_turns_end_then_players_alternate_and_rounds_advance() {
        let mut battle = fighting(
            vec![
                ship_at("a1", A, ShipClass::Frigate, 0, 0),
                ship_at("b1", B, ShipClass::Frigate, 5, 0),
            ],
            [1, 0, 0, 0, 0, 1],
        );
        battle.activate_ship(A, "a1", None).expect("activate");

        let change = battle
            .end_turn(A, &mut ScriptedDice::d6(&[]))
            .expect("end A");
        assert_eq!(change.current_player, B);
        assert_eq!(change.round, 1);
        assert_eq!(battle.ships[0].status, ShipStatus::Spent);
        assert_eq!(
            battle.end_turn(A, &mut ScriptedDice::d6(&[])),
            Err(BattleError::NotYourTurn)
        );

        let change = battle
            .end_turn(B, &mut ScriptedDice::d6(&[2, 3, 4, 5]))
            .expect("end B");
        assert_eq!(change.current_player, A);
        assert_eq!(change.round, 2);
        assert_eq!(battle.ships[0].status, ShipStatus::Ready);
        // Two new dice plus the carried one.
        assert_eq!(battle.dice_pools[&A].total(), 3);
        assert_eq!(battle.dice_pools[&A].count(1), 1);
        assert_eq!(battle.dice_pools[&A].saved_ones, 1);
        assert_eq!(battle.dice_pools[&B].total(), 3);
    }

    #[test]
    fn when_round_restarts_then_speed_and_maneuver_are_restored() {
        let mut battle = fighting(
            vec![
                ship_at("a1", A, ShipClass::Frigate, 0, 0),
                ship_at("b1", B, ShipClass::Frigate, 5, 5),
            ],
            [0, 0, 0, 0, 0, 2],
        );
        battle
            .move_ship(A, "a1", Position::new(2, 0))
            .expect("move");
        assert_eq!(battle.ships[0].current_speed, 3);
        assert!(battle.ships[0].free_turn);

        battle.end_turn(A, &mut ScriptedDice::d6(&[])).expect("end A");
        battle
            .end_turn(B, &mut ScriptedDice::d6(&[6, 6, 6, 6]))
            .expect("end B");
        let ship = &battle.ships[0];
        assert_eq!(ship.current_speed, 5);
        assert_eq!(ship.current_maneuverability, 1);
        assert!(!ship.free_turn);
    }

    #[test]
    fn when_moving_a_ready_ship_then_it_auto_activates_and_pays_costs() {
        let mut battle = fighting(
            vec![ship_at("c1", A, ShipClass::Cruiser, 0, 0)],
            [0, 0, 0, 1, 0, 0],
        );
        let plan = battle
            .move_ship(A, "c1", Position::new(0, 2))
            .expect("turned move");
        assert_eq!(plan.maneuver_cost, 1);

        let ship = &battle.ships[0];
        assert_eq!(ship.position, Position::new(0, 2));
        assert_eq!(ship.facing, Direction::SouthEast);
        assert_eq!(ship.current_speed, 1);
        assert_eq!(ship.current_maneuverability, 0);
        assert_eq!(ship.status, ShipStatus::Activated);
        assert_eq!(battle.dice_pools[&A].total(), 0);
    }

    #[test]
    fn when_move_is_unreachable_then_no_die_is_spent() {
        let mut battle = fighting(
            vec![ship_at("c1", A, ShipClass::Cruiser, 0, 0)],
            [0, 0, 0, 1, 0, 0],
        );
        assert_eq!(
            battle.move_ship(A, "c1", Position::new(-3, 0)),
            Err(BattleError::Unreachable)
        );
        assert_eq!(battle.dice_pools[&A].total(), 1);
        assert_eq!(battle.ships[0].status, ShipStatus::Ready);
    }

    #[test]
    fn when_rotating_in_battle_then_free_turn_is_used_before_maneuver() {
        let mut battle = fighting(
            vec![ship_at("f1", A, ShipClass::Frigate, 0, 0)],
            [0, 1, 0, 0, 0, 0],
        );
        battle.move_ship(A, "f1", Position::new(1, 0)).expect("move");

        let facing = battle.rotate_ship(A, "f1", Turn::Right).expect("free turn");
        assert_eq!(facing, Direction::SouthEast);
        assert_eq!(battle.ships[0].current_maneuverability, 1);

        battle.rotate_ship(A, "f1", Turn::Right).expect("paid turn");
        assert_eq!(battle.ships[0].current_maneuverability, 0);
        assert_eq!(
            battle.rotate_ship(A, "f1", Turn::Right),
            Err(BattleError::NoManeuver)
        );
    }

    #[test]
    fn when_rotating_during_placement_then_it_is_free() {
        let mut battle = placement(
            vec![pending(ShipClass::Frigate, "f", 1)],
            vec![pending(ShipClass::Frigate, "f", 1)],
        );
        let id = battle
            .place_ship(A, "f", Position::new(0, 0))
            .expect("place")
            .id
            .clone();
        assert_eq!(
            battle.rotate_ship(A, &id, Turn::Left),
            Ok(Direction::NorthEast)
        );
        assert_eq!(battle.ships[0].current_maneuverability, 1);
    }

    #[test]
    fn when_firing_then_weapons_resolve_once_and_bad_weapons_are_reported() {
        let attacker = ship_at("f1", A, ShipClass::Frigate, 0, 0);
        let target = ship_at("t1", B, ShipClass::Frigate, 2, 0);
        let mut battle = fighting(vec![attacker, target], [0, 1, 0, 0, 0, 0]);
        let weapons = vec![
            "frigate_gun_1".to_string(),
            "frigate_gun_1".to_string(),
            "laser".to_string(),
        ];
        // Frigate evasion is 6.
        let mut dice = ScriptedDice::sums(&[5]);

        let report = battle
            .fire(A, "f1", "t1", &weapons, &mut dice)
            .expect("fire");

        assert_eq!(report.results.len(), 3);
        match &report.results[0] {
            FireEntry::Resolved(result) => assert_eq!(result.result, ShotResult::Miss),
            other => panic!("expected a resolved shot, got {other:?}"),
        }
        assert!(matches!(
            &report.results[1],
            FireEntry::Rejected { error, .. } if error == "weapon already used"
        ));
        assert!(matches!(
            &report.results[2],
            FireEntry::Rejected { error, .. } if error == "unknown weapon"
        ));
        assert!(battle.ships[0].used_weapons.contains("frigate_gun_1"));
        assert_eq!(battle.ships[0].status, ShipStatus::Activated);
    }

    #[test]
    fn when_target_is_outside_the_arc_then_the_weapon_stays_unused() {
        let attacker = ship_at("f1", A, ShipClass::Frigate, 0, 0);
        let target = ship_at("t1", B, ShipClass::Frigate, -2, 0);
        let mut battle = fighting(vec![attacker, target], [0, 1, 0, 0, 0, 0]);
        let report = battle
            .fire(A, "f1", "t1", &["frigate_gun_1".to_string()], &mut ScriptedDice::sums(&[]))
            .expect("fire");
        assert!(matches!(&report.results[0], FireEntry::Rejected { .. }));
        assert!(battle.ships[0].used_weapons.is_empty());
    }

    #[test]
    fn when_firing_at_an_ally_then_the_command_is_rejected() {
        let mut battle = fighting(
            vec![
                ship_at("f1", A, ShipClass::Frigate, 0, 0),
                ship_at("f2", A, ShipClass::Frigate, 1, 0),
            ],
            [0, 1, 0, 0, 0, 0],
        );
        assert_eq!(
            battle
                .fire(A, "f1", "f2", &["frigate_gun_1".to_string()], &mut ScriptedDice::sums(&[]))
                .map(|_| ()),
            Err(BattleError::FriendlyTarget)
        );
        assert_eq!(battle.dice_pools[&A].total(), 1);
    }

    #[test]
    fn when_last_enemy_ship_is_destroyed_then_victory_is_reported() {
        let attacker = ship_at("f1", A, ShipClass::Frigate, 0, 0);
        let target = ship_at("t1", B, ShipClass::Frigate, 2, 0);
        let mut battle = fighting(vec![attacker, target], [0, 1, 0, 0, 0, 0]);
        let mut dice = ScriptedDice::sums(&[12, 12, 12]);
        battle
            .fire(A, "f1", "t1", &["frigate_gun_1".to_string()], &mut dice)
            .expect("fire");
        assert_eq!(
            battle.victory(),
            Some(Victory {
                winners: vec![A],
                losers: vec![B],
            })
        );
    }

    #[test]
    fn when_listing_targets_then_used_weapons_are_left_out() {
        let mut attacker = ship_at("d1", A, ShipClass::Destroyer, 0, 0);
        attacker.used_weapons.insert("destroyer_gun_2".to_string());
        let target = ship_at("t1", B, ShipClass::Frigate, 2, 0);
        let battle = fighting(vec![attacker, target], [0; 6]);
        let targets = battle.targets("d1").expect("targets");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].weapon_id, "destroyer_gun_1");
        assert_eq!(targets[0].target_ids, vec!["t1".to_string()]);
        assert_eq!(battle.targets("nope"), Err(BattleError::ShipNotFound));
    }
}
