// Room orchestration: lobby lifecycle, battle commands and teardown.

use crate::domain::{
    Battle, BattleError, Dice, MapBounds, PendingPlacement, PlayerId, Position, RandomDice,
    Turn, Victory,
};
use crate::domain::tuning::MAX_PLAYERS_PER_ROOM;
use crate::use_cases::catalog::ShipCatalog;
use crate::use_cases::types::{
    Fleet, GameEvent, GameOver, Outbound, PlayerSummary, Rejection, RoomId, RoomSummary,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

/// Shared configuration for new rooms.
#[derive(Debug, Clone, Copy)]
pub struct RoomSettings {
    /// Playing field used by every battle.
    pub map_bounds: MapBounds,
    /// Builds the dice a new room rolls with.
    pub dice: fn() -> Box<dyn Dice>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            map_bounds: MapBounds::default(),
            dice: entropy_dice,
        }
    }
}

fn entropy_dice() -> Box<dyn Dice> {
    Box::new(RandomDice::from_entropy())
}

struct Room {
    id: RoomId,
    name: String,
    /// Participants in join order.
    players: Vec<PlayerId>,
    fleets: HashMap<PlayerId, Fleet>,
    battle: Option<Battle>,
    dice: Box<dyn Dice>,
}

impl Room {
    fn new(id: RoomId, name: String, creator: PlayerId, dice: Box<dyn Dice>) -> Self {
        Self {
            id,
            name,
            players: vec![creator],
            fleets: HashMap::new(),
            battle: None,
            dice,
        }
    }
}

/// Thread-safe registry for active rooms and player nicknames.
///
/// Lock order: the room map is never held while awaiting a room mutex, and the nickname
/// map is only held for short, non-awaiting sections.
pub struct RoomRegistry {
    /// Settings applied to newly started battles.
    settings: RoomSettings,
    /// Project lookup used when a battle starts.
    catalog: Arc<ShipCatalog>,
    /// Map of room id to the room's state.
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
    /// Display names of connected players.
    nicknames: RwLock<HashMap<PlayerId, String>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(settings: RoomSettings, catalog: Arc<ShipCatalog>) -> Self {
        Self {
            settings,
            catalog,
            rooms: RwLock::new(HashMap::new()),
            nicknames: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new connection under its default nickname.
    pub async fn connect(&self, player: PlayerId) -> Vec<Outbound> {
        let nickname = default_nickname(player);
        self.nicknames.write().await.insert(player, nickname);
        vec![
            Outbound::to(player, GameEvent::Identity { player_id: player }),
            self.rooms_broadcast().await,
        ]
    }

    pub async fn set_nickname(&self, player: PlayerId, nickname: &str) -> Vec<Outbound> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Vec::new();
        }
        self.nicknames
            .write()
            .await
            .insert(player, nickname.to_string());
        vec![self.rooms_broadcast().await]
    }

    pub async fn nickname(&self, player: PlayerId) -> String {
        self.nicknames
            .read()
            .await
            .get(&player)
            .cloned()
            .unwrap_or_else(|| "-".to_string())
    }

    async fn nicknames_of(&self, players: &[PlayerId]) -> Vec<String> {
        let nicknames = self.nicknames.read().await;
        players
            .iter()
            .map(|player| nicknames.get(player).cloned().unwrap_or_else(|| "-".to_string()))
            .collect()
    }

    /// Current room directory.
    pub async fn rooms_data(&self) -> Vec<RoomSummary> {
        let rooms: Vec<Arc<Mutex<Room>>> = self.rooms.read().await.values().cloned().collect();
        let nicknames = self.nicknames.read().await.clone();

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let room = room.lock().await;
            summaries.push(RoomSummary {
                room_id: room.id.clone(),
                name: room.name.clone(),
                players: room
                    .players
                    .iter()
                    .map(|player| PlayerSummary {
                        id: *player,
                        nickname: nicknames.get(player).cloned().unwrap_or_else(|| "-".to_string()),
                        ready: room.fleets.contains_key(player),
                    })
                    .collect(),
                in_battle: room.battle.is_some(),
            });
        }
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    async fn rooms_broadcast(&self) -> Outbound {
        Outbound::everyone(GameEvent::RoomsData(self.rooms_data().await))
    }

    async fn room(&self, room_id: &str) -> Option<OwnedMutexGuard<Room>> {
        let room = self.rooms.read().await.get(room_id).cloned()?;
        Some(room.lock_owned().await)
    }

    /// Creates a room with the creator as its first participant.
    pub async fn create_room(
        &self,
        player: PlayerId,
        room_id: RoomId,
        room_name: Option<String>,
    ) -> Vec<Outbound> {
        let name = room_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| room_id.clone());

        let room = Room::new(room_id.clone(), name.clone(), player, (self.settings.dice)());
        self.rooms
            .write()
            .await
            .insert(room_id.clone(), Arc::new(Mutex::new(room)));
        info!(room_id = %room_id, player_id = player, "room created");

        vec![
            Outbound::to(
                player,
                GameEvent::RoomCreated {
                    room_id,
                    room_name: name,
                },
            ),
            self.rooms_broadcast().await,
        ]
    }

    pub async fn join_room(&self, player: PlayerId, room_id: &str) -> Vec<Outbound> {
        let Some(mut room) = self.room(room_id).await else {
            return vec![join_failed(player, "room does not exist")];
        };
        if !room.players.contains(&player) {
            if room.players.len() >= MAX_PLAYERS_PER_ROOM {
                return vec![join_failed(player, "room is full")];
            }
            room.players.push(player);
        }
        let players = room.players.clone();
        drop(room);
        info!(room_id = %room_id, player_id = player, "player joined room");

        vec![
            Outbound::to(
                player,
                GameEvent::JoinResult {
                    success: true,
                    room_id: Some(room_id.to_string()),
                    error: None,
                },
            ),
            self.rooms_broadcast().await,
            Outbound::to_all(
                &players,
                GameEvent::PlayerJoined {
                    room_id: room_id.to_string(),
                    players: self.nicknames_of(&players).await,
                },
            ),
        ]
    }

    /// Stores the player's fleet. The battle starts once both participants are ready.
    /// A fleet without ships is rejected.
    pub async fn player_ready(&self, player: PlayerId, room_id: &str, fleet: Fleet) -> Vec<Outbound> {
        let Some(mut room) = self.room(room_id).await else {
            debug!(room_id = %room_id, player_id = player, "ready for unknown room");
            return Vec::new();
        };
        if !room.players.contains(&player) || room.battle.is_some() {
            debug!(room_id = %room_id, player_id = player, "ready ignored");
            return Vec::new();
        }
        if fleet.ship_count() == 0 {
            drop(room);
            return rejected(player, Rejection::Placement, BattleError::EmptyFleet);
        }
        room.fleets.insert(player, fleet);
        info!(room_id = %room_id, player_id = player, "player ready");

        let mut out = Vec::new();
        if room.players.len() == MAX_PLAYERS_PER_ROOM
            && room.players.iter().all(|p| room.fleets.contains_key(p))
        {
            let pending = self.pending_placements(&room).await;
            let participants = room.players.len();
            let first_placer = room.dice.pick_index(participants);
            let battle = Battle::new(
                room.players.clone(),
                pending,
                self.settings.map_bounds,
                first_placer,
            );
            info!(
                room_id = %room_id,
                first_placer = battle.current_player,
                "placement started"
            );
            out.push(battle_state(&room.id, &room.players, &battle));
            room.battle = Some(battle);
        }
        drop(room);

        out.insert(0, self.rooms_broadcast().await);
        out
    }

    async fn pending_placements(&self, room: &Room) -> HashMap<PlayerId, Vec<PendingPlacement>> {
        let mut pending = HashMap::new();
        for (player, fleet) in &room.fleets {
            let mut queue = Vec::with_capacity(fleet.composition.len());
            for entry in &fleet.composition {
                let (class, stats) = self.catalog.resolve(&entry.project_id, entry.class).await;
                queue.push(PendingPlacement {
                    class,
                    project_id: entry.project_id.clone(),
                    remaining: entry.count,
                    stats,
                });
            }
            pending.insert(*player, queue);
        }
        pending
    }

    pub async fn place_ship(
        &self,
        player: PlayerId,
        room_id: &str,
        project_id: &str,
        position: Position,
    ) -> Vec<Outbound> {
        self.battle_command(room_id, player, Rejection::Placement, |battle, _| {
            let ship = battle.place_ship(player, project_id, position)?;
            debug!(ship_id = %ship.id, "ship placed");
            Ok(())
        })
        .await
    }

    pub async fn rotate_ship(
        &self,
        player: PlayerId,
        room_id: &str,
        ship_id: &str,
        turn: Turn,
    ) -> Vec<Outbound> {
        self.battle_command(room_id, player, Rejection::Movement, |battle, _| {
            battle.rotate_ship(player, ship_id, turn).map(|_| ())
        })
        .await
    }

    pub async fn move_ship(
        &self,
        player: PlayerId,
        room_id: &str,
        ship_id: &str,
        target: Position,
    ) -> Vec<Outbound> {
        self.battle_command(room_id, player, Rejection::Movement, |battle, _| {
            let plan = battle.move_ship(player, ship_id, target)?;
            debug!(
                ship_id,
                speed_cost = plan.speed_cost,
                maneuver_cost = plan.maneuver_cost,
                "ship moved"
            );
            Ok(())
        })
        .await
    }

    pub async fn activate_ship(
        &self,
        player: PlayerId,
        room_id: &str,
        ship_id: &str,
        face: Option<u8>,
    ) -> Vec<Outbound> {
        self.battle_command(room_id, player, Rejection::Activation, |battle, _| {
            battle.activate_ship(player, ship_id, face).map(|_| ())
        })
        .await
    }

    pub async fn end_turn(&self, player: PlayerId, room_id: &str) -> Vec<Outbound> {
        let Some(mut room) = self.room(room_id).await else {
            debug!(room_id = %room_id, "end turn for unknown room");
            return Vec::new();
        };
        let Room {
            id,
            players,
            battle,
            dice,
            ..
        } = &mut *room;
        let Some(battle) = battle.as_mut() else {
            debug!(room_id = %room_id, "end turn before battle");
            return Vec::new();
        };

        let change = match battle.end_turn(player, &mut **dice) {
            Ok(change) => change,
            Err(e) => return rejected(player, Rejection::Turn, e),
        };
        info!(
            room_id = %room_id,
            current_player = change.current_player,
            round = change.round,
            battle_started = change.battle_started,
            "turn changed"
        );

        let players = players.clone();
        let state = battle_state(id, &players, battle);
        drop(room);
        vec![
            state,
            Outbound::to_all(
                &players,
                GameEvent::TurnChanged {
                    current_player: change.current_player,
                    current_player_nick: self.nickname(change.current_player).await,
                    round: change.round,
                },
            ),
        ]
    }

    /// Resolves a volley, then ends the match if a side has been wiped out.
    pub async fn fire(
        &self,
        player: PlayerId,
        room_id: &str,
        attacker_id: &str,
        target_id: &str,
        weapon_ids: &[String],
    ) -> Vec<Outbound> {
        let Some(mut room) = self.room(room_id).await else {
            debug!(room_id = %room_id, "fire for unknown room");
            return Vec::new();
        };
        let Room {
            id,
            players,
            battle,
            dice,
            ..
        } = &mut *room;
        let Some(battle) = battle.as_mut() else {
            debug!(room_id = %room_id, "fire before battle");
            return Vec::new();
        };

        let report = match battle.fire(player, attacker_id, target_id, weapon_ids, &mut **dice) {
            Ok(report) => report,
            Err(e) => return rejected(player, Rejection::Combat, e),
        };
        let victory = battle.victory();
        info!(
            room_id = %room_id,
            attacker_id,
            target_id,
            shots = report.results.len(),
            "weapons fired"
        );

        let players = players.clone();
        let room_id = id.clone();
        let mut out = vec![
            Outbound::to_all(&players, GameEvent::CombatResults(report)),
            battle_state(&room_id, &players, battle),
        ];
        drop(room);

        if let Some(victory) = victory {
            out.push(Outbound::to_all(
                &players,
                GameEvent::GameOver(self.elimination(&victory).await),
            ));
            self.rooms.write().await.remove(&room_id);
            info!(
                room_id = %room_id,
                winners = ?victory.winners,
                losers = ?victory.losers,
                "match finished"
            );
            out.push(self.rooms_broadcast().await);
        }
        out
    }

    async fn elimination(&self, victory: &Victory) -> GameOver {
        let reason = if victory.is_draw() {
            "mutual destruction"
        } else {
            "all ships destroyed"
        };
        GameOver::Elimination {
            winners: self.nicknames_of(&victory.winners).await,
            losers: self.nicknames_of(&victory.losers).await,
            reason: reason.to_string(),
        }
    }

    pub async fn reachable_cells(&self, player: PlayerId, room_id: &str, ship_id: &str) -> Vec<Outbound> {
        let Some(room) = self.room(room_id).await else {
            return Vec::new();
        };
        let Some(battle) = room.battle.as_ref() else {
            return Vec::new();
        };
        match battle.reachable(ship_id) {
            Ok(cells) => vec![Outbound::to(
                player,
                GameEvent::ReachableCells {
                    ship_id: ship_id.to_string(),
                    cells,
                },
            )],
            Err(e) => rejected(player, Rejection::Movement, e),
        }
    }

    pub async fn targets(&self, player: PlayerId, room_id: &str, ship_id: &str) -> Vec<Outbound> {
        let Some(room) = self.room(room_id).await else {
            return Vec::new();
        };
        let Some(battle) = room.battle.as_ref() else {
            return Vec::new();
        };
        match battle.targets(ship_id) {
            Ok(weapons) => vec![Outbound::to(
                player,
                GameEvent::TargetsData {
                    ship_id: ship_id.to_string(),
                    weapons,
                },
            )],
            Err(e) => rejected(player, Rejection::Combat, e),
        }
    }

    /// Ends the player's current match in any phase with them as the loser.
    pub async fn surrender(&self, player: PlayerId) -> Vec<Outbound> {
        let Some((room_id, players)) = self.find_room_of(player).await else {
            debug!(player_id = player, "surrender outside any room");
            return Vec::new();
        };
        self.rooms.write().await.remove(&room_id);
        info!(room_id = %room_id, player_id = player, "player surrendered");

        vec![
            Outbound::to_all(
                &players,
                GameEvent::GameOver(GameOver::Surrender {
                    loser: self.nickname(player).await,
                }),
            ),
            self.rooms_broadcast().await,
        ]
    }

    async fn find_room_of(&self, player: PlayerId) -> Option<(RoomId, Vec<PlayerId>)> {
        let rooms: Vec<Arc<Mutex<Room>>> = self.rooms.read().await.values().cloned().collect();
        for room in rooms {
            let room = room.lock().await;
            if room.players.contains(&player) {
                return Some((room.id.clone(), room.players.clone()));
            }
        }
        None
    }

    /// Removes the player everywhere. Leaving a running battle counts as surrender.
    pub async fn disconnect(&self, player: PlayerId) -> Vec<Outbound> {
        let loser = self.nickname(player).await;
        let rooms: Vec<Arc<Mutex<Room>>> = self.rooms.read().await.values().cloned().collect();

        let mut out = Vec::new();
        let mut emptied = Vec::new();
        for room in rooms {
            let mut room = room.lock().await;
            if !room.players.contains(&player) {
                continue;
            }
            room.players.retain(|p| *p != player);
            room.fleets.remove(&player);
            let remaining = room.players.clone();

            out.push(Outbound::to_all(
                &remaining,
                GameEvent::PlayerLeft {
                    room_id: room.id.clone(),
                    player_id: player,
                },
            ));
            if room.battle.is_some() {
                out.push(Outbound::to_all(
                    &remaining,
                    GameEvent::GameOver(GameOver::Surrender {
                        loser: loser.clone(),
                    }),
                ));
                info!(room_id = %room.id, player_id = player, "player left mid-battle");
                emptied.push(room.id.clone());
            } else if remaining.is_empty() {
                emptied.push(room.id.clone());
            }
        }

        if !emptied.is_empty() {
            let mut rooms = self.rooms.write().await;
            for room_id in &emptied {
                rooms.remove(room_id);
            }
        }
        self.nicknames.write().await.remove(&player);
        out.push(self.rooms_broadcast().await);
        out
    }

    // Runs a battle command under the room lock and broadcasts the new state on success.
    async fn battle_command<F>(
        &self,
        room_id: &str,
        player: PlayerId,
        kind: Rejection,
        command: F,
    ) -> Vec<Outbound>
    where
        F: FnOnce(&mut Battle, &mut dyn Dice) -> Result<(), BattleError>,
    {
        let Some(mut room) = self.room(room_id).await else {
            debug!(room_id = %room_id, player_id = player, "command for unknown room");
            return Vec::new();
        };
        let Room {
            id,
            players,
            battle,
            dice,
            ..
        } = &mut *room;
        let Some(battle) = battle.as_mut() else {
            debug!(room_id = %room_id, player_id = player, "command before battle");
            return Vec::new();
        };

        match command(battle, &mut **dice) {
            Ok(()) => vec![battle_state(id, players, battle)],
            Err(e) => rejected(player, kind, e),
        }
    }
}

// Ids are sequential, so only the low-order digits tell neighbours apart.
fn default_nickname(player: PlayerId) -> String {
    format!("Player_{}", player % 100_000)
}

fn join_failed(player: PlayerId, error: &str) -> Outbound {
    Outbound::to(
        player,
        GameEvent::JoinResult {
            success: false,
            room_id: None,
            error: Some(error.to_string()),
        },
    )
}

fn battle_state(room_id: &str, players: &[PlayerId], battle: &Battle) -> Outbound {
    Outbound::to_all(
        players,
        GameEvent::BattleState {
            room_id: room_id.to_string(),
            battle: Box::new(battle.clone()),
        },
    )
}

fn rejected(player: PlayerId, kind: Rejection, error: BattleError) -> Vec<Outbound> {
    if error.is_missing_entity() {
        debug!(player_id = player, error = %error, "command ignored");
        return Vec::new();
    }
    info!(player_id = player, error = %error, "command rejected");
    vec![Outbound::to(
        player,
        GameEvent::Rejected {
            kind,
            message: error.to_string(),
        },
    )]
}
