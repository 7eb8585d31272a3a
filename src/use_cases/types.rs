// Use-case events and routing types shared with the adapter layer.

use crate::domain::{
    Battle, FireReport, PlayerId, Position, ShipClass, WeaponTargets,
};

pub type RoomId = String;

/// One line of a participant's fleet: `count` ships built from `project_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetEntry {
    pub class: ShipClass,
    pub project_id: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fleet {
    pub composition: Vec<FleetEntry>,
}

impl Fleet {
    pub fn ship_count(&self) -> u32 {
        self.composition.iter().map(|entry| entry.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub nickname: String,
    pub ready: bool,
}

/// Room directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub name: String,
    pub players: Vec<PlayerSummary>,
    pub in_battle: bool,
}

/// Channel a rejected command is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Placement,
    Turn,
    Movement,
    Combat,
    Activation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOver {
    Elimination {
        winners: Vec<String>,
        losers: Vec<String>,
        reason: String,
    },
    Surrender {
        loser: String,
    },
}

/// Everything the room registry can tell connected players.
#[derive(Debug, Clone)]
pub enum GameEvent {
    Identity {
        player_id: PlayerId,
    },
    RoomsData(Vec<RoomSummary>),
    RoomCreated {
        room_id: RoomId,
        room_name: String,
    },
    JoinResult {
        success: bool,
        room_id: Option<RoomId>,
        error: Option<String>,
    },
    PlayerJoined {
        room_id: RoomId,
        players: Vec<String>,
    },
    PlayerLeft {
        room_id: RoomId,
        player_id: PlayerId,
    },
    BattleState {
        room_id: RoomId,
        battle: Box<Battle>,
    },
    TurnChanged {
        current_player: PlayerId,
        current_player_nick: String,
        round: u32,
    },
    CombatResults(FireReport),
    GameOver(GameOver),
    ReachableCells {
        ship_id: String,
        cells: Vec<Position>,
    },
    TargetsData {
        ship_id: String,
        weapons: Vec<WeaponTargets>,
    },
    Rejected {
        kind: Rejection,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Player(PlayerId),
    Players(Vec<PlayerId>),
    Everyone,
}

/// An event together with who should receive it.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub audience: Audience,
    pub event: GameEvent,
}

impl Outbound {
    pub fn to(player: PlayerId, event: GameEvent) -> Self {
        Self {
            audience: Audience::Player(player),
            event,
        }
    }

    pub fn to_all(players: &[PlayerId], event: GameEvent) -> Self {
        Self {
            audience: Audience::Players(players.to_vec()),
            event,
        }
    }

    pub fn everyone(event: GameEvent) -> Self {
        Self {
            audience: Audience::Everyone,
            event,
        }
    }
}
