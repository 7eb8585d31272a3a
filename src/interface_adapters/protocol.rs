// Wire protocol DTOs and conversions for the public WebSocket and HTTP surface.

use crate::domain::combat::{CheckRoll, CriticalOutcome, ShotResult, SplashHit, WeaponResult};
use crate::domain::ship::{FiringArc, Weapon};
use crate::domain::{
    Battle, BattlePhase, DicePool, FireEntry, FireReport, MapBounds, PendingPlacement, PlayerId,
    Position, Ship, ShipClass, ShipStatus, Turn, WeaponTargets,
};
use crate::use_cases::{
    Fleet, FleetEntry, GameEvent, GameOver, PlayerSummary, Rejection, RoomSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default)]
        room_name: Option<String>,
    },
    JoinRoom {
        room_id: String,
    },
    GetRooms,
    SetNickname {
        nickname: String,
    },
    PlayerReady {
        room_id: String,
        fleet: FleetDto,
    },
    PlaceShip {
        room_id: String,
        project_id: String,
        position: PositionDto,
    },
    RotateShip {
        room_id: String,
        ship_id: String,
        direction: TurnDto,
    },
    MoveShip {
        room_id: String,
        ship_id: String,
        target_position: PositionDto,
    },
    ActivateShip {
        room_id: String,
        ship_id: String,
        #[serde(default)]
        dice_value: Option<u8>,
    },
    FireWeapons {
        room_id: String,
        attacker_id: String,
        target_id: String,
        weapon_ids: Vec<String>,
    },
    EndTurn {
        room_id: String,
    },
    Surrender,
    GetReachable {
        room_id: String,
        ship_id: String,
    },
    GetTargets {
        room_id: String,
        ship_id: String,
    },
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Identity {
        player_id: String,
    },
    RoomsData(Vec<RoomDto>),
    RoomCreated {
        room_id: String,
        room_name: String,
    },
    JoinResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    PlayerJoined {
        room_id: String,
        players: Vec<String>,
    },
    PlayerLeft {
        room_id: String,
        player_id: String,
    },
    BattleState(BattleDto),
    TurnChanged {
        current_player: String,
        current_player_nick: String,
        round: u32,
    },
    CombatResults(CombatResultsDto),
    GameOver(GameOverDto),
    ReachableCells {
        ship_id: String,
        cells: Vec<PositionDto>,
    },
    TargetsData {
        ship_id: String,
        weapons: Vec<WeaponTargetsDto>,
    },
    PlacementError(ErrorMessageDto),
    TurnError(ErrorMessageDto),
    MovementError(ErrorMessageDto),
    CombatError(ErrorMessageDto),
    ActivationError(ErrorMessageDto),
}

impl From<GameEvent> for ServerMessage {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::Identity { player_id } => ServerMessage::Identity {
                player_id: player_id.to_string(),
            },
            GameEvent::RoomsData(rooms) => {
                ServerMessage::RoomsData(rooms.into_iter().map(RoomDto::from).collect())
            }
            GameEvent::RoomCreated { room_id, room_name } => {
                ServerMessage::RoomCreated { room_id, room_name }
            }
            GameEvent::JoinResult {
                success,
                room_id,
                error,
            } => ServerMessage::JoinResult {
                success,
                room_id,
                error,
            },
            GameEvent::PlayerJoined { room_id, players } => {
                ServerMessage::PlayerJoined { room_id, players }
            }
            GameEvent::PlayerLeft { room_id, player_id } => ServerMessage::PlayerLeft {
                room_id,
                player_id: player_id.to_string(),
            },
            GameEvent::BattleState { room_id, battle } => {
                ServerMessage::BattleState(BattleDto::new(room_id, &battle))
            }
            GameEvent::TurnChanged {
                current_player,
                current_player_nick,
                round,
            } => ServerMessage::TurnChanged {
                current_player: current_player.to_string(),
                current_player_nick,
                round,
            },
            GameEvent::CombatResults(report) => {
                ServerMessage::CombatResults(CombatResultsDto::from(report))
            }
            GameEvent::GameOver(outcome) => ServerMessage::GameOver(outcome.into()),
            GameEvent::ReachableCells { ship_id, cells } => ServerMessage::ReachableCells {
                ship_id,
                cells: cells.into_iter().map(PositionDto::from).collect(),
            },
            GameEvent::TargetsData { ship_id, weapons } => ServerMessage::TargetsData {
                ship_id,
                weapons: weapons.into_iter().map(WeaponTargetsDto::from).collect(),
            },
            GameEvent::Rejected { kind, message } => {
                let payload = ErrorMessageDto { message };
                match kind {
                    Rejection::Placement => ServerMessage::PlacementError(payload),
                    Rejection::Turn => ServerMessage::TurnError(payload),
                    Rejection::Movement => ServerMessage::MovementError(payload),
                    Rejection::Combat => ServerMessage::CombatError(payload),
                    Rejection::Activation => ServerMessage::ActivationError(payload),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessageDto {
    pub message: String,
}

/// Cube coordinates. Clients may omit `s`; it is derived from `q` and `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDto {
    pub q: i32,
    pub r: i32,
    #[serde(default)]
    pub s: Option<i32>,
}

impl PositionDto {
    /// Domain position, or `None` when the coordinates are out of range or break `q + r + s = 0`.
    pub fn to_position(self) -> Option<Position> {
        Position::checked(self.q, self.r, self.s)
    }
}

impl From<Position> for PositionDto {
    fn from(position: Position) -> Self {
        Self {
            q: position.q,
            r: position.r,
            s: Some(position.s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDto {
    Left,
    Right,
}

impl From<TurnDto> for Turn {
    fn from(turn: TurnDto) -> Self {
        match turn {
            TurnDto::Left => Turn::Left,
            TurnDto::Right => Turn::Right,
        }
    }
}

/// Fleet as built in the client's fleet editor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FleetDto {
    #[serde(default)]
    pub composition: Vec<FleetEntryDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetEntryDto {
    pub ship_class: String,
    pub project_id: String,
    pub count: u32,
}

impl From<FleetDto> for Fleet {
    fn from(fleet: FleetDto) -> Self {
        let composition = fleet
            .composition
            .into_iter()
            .filter_map(|entry| match ShipClass::parse(&entry.ship_class) {
                Some(class) => Some(FleetEntry {
                    class,
                    project_id: entry.project_id,
                    count: entry.count,
                }),
                None => {
                    warn!(ship_class = %entry.ship_class, "unknown ship class in fleet; skipping");
                    None
                }
            })
            .collect();
        Fleet { composition }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub room_id: String,
    pub name: String,
    pub players: Vec<RoomPlayerDto>,
    pub in_battle: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayerDto {
    pub id: String,
    pub nick: String,
    pub ready: bool,
}

impl From<RoomSummary> for RoomDto {
    fn from(room: RoomSummary) -> Self {
        Self {
            room_id: room.room_id,
            name: room.name,
            players: room.players.into_iter().map(RoomPlayerDto::from).collect(),
            in_battle: room.in_battle,
        }
    }
}

impl From<PlayerSummary> for RoomPlayerDto {
    fn from(player: PlayerSummary) -> Self {
        Self {
            id: player.id.to_string(),
            nick: player.nickname,
            ready: player.ready,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseDto {
    Placement,
    Battle,
}

impl From<BattlePhase> for PhaseDto {
    fn from(phase: BattlePhase) -> Self {
        match phase {
            BattlePhase::Placement => PhaseDto::Placement,
            BattlePhase::Battle => PhaseDto::Battle,
        }
    }
}

/// Full battle snapshot broadcast after every accepted command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleDto {
    pub id: String,
    pub phase: PhaseDto,
    pub round: u32,
    pub current_player: String,
    pub players: Vec<String>,
    pub pending_placement: BTreeMap<String, Vec<PendingPlacementDto>>,
    pub ships: Vec<ShipDto>,
    pub dice_pools: BTreeMap<String, DicePoolDto>,
    pub map: MapDto,
    pub placement_turns: u32,
}

impl BattleDto {
    pub fn new(room_id: String, battle: &Battle) -> Self {
        Self {
            id: room_id,
            phase: battle.phase.into(),
            round: battle.round,
            current_player: battle.current_player.to_string(),
            players: battle.players.iter().map(PlayerId::to_string).collect(),
            pending_placement: battle
                .pending
                .iter()
                .map(|(player, queue)| {
                    (
                        player.to_string(),
                        queue.iter().map(PendingPlacementDto::from).collect(),
                    )
                })
                .collect(),
            ships: battle.ships.iter().map(ShipDto::from).collect(),
            dice_pools: battle
                .dice_pools
                .iter()
                .map(|(player, pool)| (player.to_string(), DicePoolDto::from(pool)))
                .collect(),
            map: battle.bounds.into(),
            placement_turns: battle.placement_turns,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPlacementDto {
    pub ship_class: &'static str,
    pub project_id: String,
    pub count: u32,
}

impl From<&PendingPlacement> for PendingPlacementDto {
    fn from(entry: &PendingPlacement) -> Self {
        Self {
            ship_class: entry.class.as_str(),
            project_id: entry.project_id.clone(),
            count: entry.remaining,
        }
    }
}

/// Dice counts indexed by face minus one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DicePoolDto {
    pub counts: [u32; 6],
    pub saved_ones: u32,
}

impl From<&DicePool> for DicePoolDto {
    fn from(pool: &DicePool) -> Self {
        Self {
            counts: pool.counts(),
            saved_ones: pool.saved_ones,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MapDto {
    pub width: u32,
    pub height: u32,
}

impl From<MapBounds> for MapDto {
    fn from(bounds: MapBounds) -> Self {
        Self {
            width: bounds.width,
            height: bounds.height,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipDto {
    pub id: String,
    pub owner: String,
    pub ship_class: &'static str,
    pub project_id: String,
    pub position: PositionDto,
    /// Direction index: 0 west, then clockwise.
    pub facing: usize,
    pub hp: u32,
    pub max_hp: u32,
    pub armor: u32,
    pub armor_penalty: u32,
    pub current_speed: u32,
    pub max_speed: u32,
    pub current_maneuverability: u32,
    pub max_maneuverability: u32,
    pub activation: u8,
    pub status: ShipStatusDto,
    pub used_weapons: Vec<String>,
    pub weapons: Vec<WeaponDto>,
    pub free_turn: bool,
}

impl From<&Ship> for ShipDto {
    fn from(ship: &Ship) -> Self {
        let mut used_weapons: Vec<String> = ship.used_weapons.iter().cloned().collect();
        used_weapons.sort();
        Self {
            id: ship.id.clone(),
            owner: ship.owner.to_string(),
            ship_class: ship.class.as_str(),
            project_id: ship.project_id.clone(),
            position: ship.position.into(),
            facing: ship.facing.index(),
            hp: ship.hp,
            max_hp: ship.max_hp,
            armor: ship.armor,
            armor_penalty: ship.armor_penalty,
            current_speed: ship.current_speed,
            max_speed: ship.max_speed,
            current_maneuverability: ship.current_maneuverability,
            max_maneuverability: ship.max_maneuverability,
            activation: ship.activation,
            status: ship.status.into(),
            used_weapons,
            weapons: ship.weapons.iter().map(WeaponDto::from).collect(),
            free_turn: ship.free_turn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipStatusDto {
    Ready,
    Activated,
    Spent,
    Destroyed,
}

impl From<ShipStatus> for ShipStatusDto {
    fn from(status: ShipStatus) -> Self {
        match status {
            ShipStatus::Ready => ShipStatusDto::Ready,
            ShipStatus::Activated => ShipStatusDto::Activated,
            ShipStatus::Spent => ShipStatusDto::Spent,
            ShipStatus::Destroyed => ShipStatusDto::Destroyed,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcDto {
    Narrow,
    Standard,
    Wide,
    Broadside,
}

impl From<FiringArc> for ArcDto {
    fn from(arc: FiringArc) -> Self {
        match arc {
            FiringArc::Narrow => ArcDto::Narrow,
            FiringArc::Standard => ArcDto::Standard,
            FiringArc::Wide => ArcDto::Wide,
            FiringArc::Broadside => ArcDto::Broadside,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponDto {
    pub id: String,
    pub name: String,
    pub damage: u32,
    pub range: u32,
    pub arc: ArcDto,
}

impl From<&Weapon> for WeaponDto {
    fn from(weapon: &Weapon) -> Self {
        Self {
            id: weapon.id.clone(),
            name: weapon.name.clone(),
            damage: weapon.damage,
            range: weapon.range,
            arc: weapon.arc.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponTargetsDto {
    pub weapon_id: String,
    pub weapon_name: String,
    pub target_ids: Vec<String>,
}

impl From<WeaponTargets> for WeaponTargetsDto {
    fn from(targets: WeaponTargets) -> Self {
        Self {
            weapon_id: targets.weapon_id,
            weapon_name: targets.weapon_name,
            target_ids: targets.target_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatResultsDto {
    pub attacker_id: String,
    pub target_id: String,
    pub results: Vec<FireEntryDto>,
}

impl From<FireReport> for CombatResultsDto {
    fn from(report: FireReport) -> Self {
        let results = report
            .results
            .into_iter()
            .map(|entry| match entry {
                FireEntry::Resolved(result) => FireEntryDto::Resolved(WeaponResultDto::new(
                    result,
                    &report.attacker_id,
                    &report.target_id,
                )),
                FireEntry::Rejected { weapon_id, error } => {
                    FireEntryDto::Rejected(RejectedWeaponDto { weapon_id, error })
                }
            })
            .collect();
        Self {
            attacker_id: report.attacker_id,
            target_id: report.target_id,
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FireEntryDto {
    Resolved(WeaponResultDto),
    Rejected(RejectedWeaponDto),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedWeaponDto {
    pub weapon_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotResultDto {
    Miss,
    Deflected,
    Hit,
}

impl From<ShotResult> for ShotResultDto {
    fn from(result: ShotResult) -> Self {
        match result {
            ShotResult::Miss => ShotResultDto::Miss,
            ShotResult::Deflected => ShotResultDto::Deflected,
            ShotResult::Hit => ShotResultDto::Hit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    HitCheck,
    ArmorCheck,
    CriticalHit,
}

/// One dice check in a weapon's resolution log.
#[derive(Debug, Clone, Serialize)]
pub struct StepDto {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub roll: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
    pub message: String,
}

impl StepDto {
    fn check(kind: StepKind, check: CheckRoll) -> Self {
        let label = match kind {
            StepKind::HitCheck => "Hit check",
            _ => "Armor check",
        };
        Self {
            kind,
            roll: check.roll,
            needed: Some(check.needed),
            success: Some(check.success()),
            effect: None,
            damage: None,
            message: format!("{label}: {} vs {}", check.roll, check.needed),
        }
    }

    fn critical(outcome: &CriticalOutcome) -> Self {
        let effect = outcome.kind.as_str();
        Self {
            kind: StepKind::CriticalHit,
            roll: outcome.roll,
            needed: None,
            success: None,
            effect: Some(effect),
            damage: Some(outcome.damage),
            message: format!("Critical hit: {} - {effect}", outcome.roll),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplashHitDto {
    pub ship_id: String,
    pub roll: u8,
    pub needed: u32,
    pub damaged: bool,
    pub destroyed: bool,
}

impl From<SplashHit> for SplashHitDto {
    fn from(hit: SplashHit) -> Self {
        Self {
            ship_id: hit.ship_id,
            roll: hit.roll,
            needed: hit.needed,
            damaged: hit.damaged,
            destroyed: hit.destroyed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponResultDto {
    pub weapon_id: String,
    pub weapon_name: String,
    pub attacker_id: String,
    pub target_id: String,
    pub steps: Vec<StepDto>,
    pub result: ShotResultDto,
    pub damage: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_effect: Option<&'static str>,
    pub additional_effects: Vec<String>,
    pub splash: Vec<SplashHitDto>,
    pub target_destroyed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeaponResultDto {
    fn new(result: WeaponResult, attacker_id: &str, target_id: &str) -> Self {
        let mut steps = vec![StepDto::check(StepKind::HitCheck, result.hit_check)];
        if let Some(armor) = result.armor_check {
            steps.push(StepDto::check(StepKind::ArmorCheck, armor));
        }
        steps.extend(result.criticals.iter().map(StepDto::critical));

        // Nested chain effects are indented by depth, as clients render them as a list.
        let additional_effects = result
            .criticals
            .iter()
            .flat_map(|critical| {
                let indent = "  ".repeat(critical.depth as usize);
                critical
                    .effects
                    .iter()
                    .map(move |effect| format!("{indent}{effect}"))
            })
            .collect();

        Self {
            weapon_id: result.weapon_id,
            weapon_name: result.weapon_name,
            attacker_id: attacker_id.to_string(),
            target_id: target_id.to_string(),
            steps,
            result: result.result.into(),
            damage: result.damage,
            critical_effect: result.criticals.first().map(|c| c.kind.as_str()),
            additional_effects,
            splash: result.splash.into_iter().map(SplashHitDto::from).collect(),
            target_destroyed: result.target_destroyed,
            error: result.error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GameOverDto {
    Elimination {
        winners: Vec<String>,
        losers: Vec<String>,
        reason: String,
    },
    Surrender {
        loser: String,
    },
}

impl From<GameOver> for GameOverDto {
    fn from(outcome: GameOver) -> Self {
        match outcome {
            GameOver::Elimination {
                winners,
                losers,
                reason,
            } => GameOverDto::Elimination {
                winners,
                losers,
                reason,
            },
            GameOver::Surrender { loser } => GameOverDto::Surrender { loser },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::combat::CriticalKind;
    use serde_json::json;

    #[test]
    fn when_client_sends_camel_case_payload_then_it_parses() {
        let raw = r#"{"type":"moveShip","data":{"roomId":"r1","shipId":"s1","targetPosition":{"q":2,"r":-1}}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).expect("valid message");
        match msg {
            ClientMessage::MoveShip {
                room_id,
                ship_id,
                target_position,
            } => {
                assert_eq!(room_id, "r1");
                assert_eq!(ship_id, "s1");
                assert_eq!(target_position.to_position(), Some(Position::new(2, -1)));
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"surrender"}"#).expect("unit");
        assert!(matches!(msg, ClientMessage::Surrender));
    }

    #[test]
    fn when_position_breaks_cube_invariant_then_it_is_rejected() {
        let dto = PositionDto {
            q: 1,
            r: 1,
            s: Some(1),
        };
        assert_eq!(dto.to_position(), None);
    }

    #[test]
    fn when_coordinates_are_extreme_then_they_are_rejected_without_overflow() {
        let raw = r#"{"type":"moveShip","data":{"roomId":"r1","shipId":"s1","targetPosition":{"q":-2147483648,"r":0}}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).expect("valid message");
        let ClientMessage::MoveShip {
            target_position, ..
        } = msg
        else {
            panic!("expected moveShip");
        };
        assert_eq!(target_position.to_position(), None);

        let wrapping = PositionDto {
            q: i32::MAX,
            r: i32::MAX,
            s: Some(2),
        };
        assert_eq!(wrapping.to_position(), None);
    }

    #[test]
    fn when_fleet_has_unknown_class_then_entry_is_skipped() {
        let dto: FleetDto = serde_json::from_value(json!({
            "composition": [
                {"shipClass": "Фрегат", "projectId": "f1", "count": 2},
                {"shipClass": "carrier", "projectId": "c1", "count": 1}
            ]
        }))
        .expect("fleet");
        let fleet = Fleet::from(dto);
        assert_eq!(fleet.composition.len(), 1);
        assert_eq!(fleet.composition[0].class, ShipClass::Frigate);
        assert_eq!(fleet.composition[0].count, 2);
    }

    #[test]
    fn when_rejection_is_serialized_then_channel_name_is_the_type() {
        let msg = ServerMessage::from(GameEvent::Rejected {
            kind: Rejection::Activation,
            message: "no die of 4 or higher available".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&msg).expect("json"),
            json!({
                "type": "activationError",
                "data": {"message": "no die of 4 or higher available"}
            })
        );
    }

    #[test]
    fn when_game_over_is_serialized_then_shape_depends_on_outcome() {
        let surrender = ServerMessage::from(GameEvent::GameOver(GameOver::Surrender {
            loser: "Player_1".to_string(),
        }));
        assert_eq!(
            serde_json::to_value(&surrender).expect("json"),
            json!({"type": "gameOver", "data": {"loser": "Player_1"}})
        );

        let elimination = ServerMessage::from(GameEvent::GameOver(GameOver::Elimination {
            winners: vec!["a".to_string()],
            losers: vec!["b".to_string()],
            reason: "all ships destroyed".to_string(),
        }));
        let value = serde_json::to_value(&elimination).expect("json");
        assert_eq!(value["data"]["winners"], json!(["a"]));
        assert_eq!(value["data"]["reason"], "all ships destroyed");
    }

    #[test]
    fn when_weapon_hits_then_steps_follow_resolution_order() {
        let report = FireReport {
            attacker_id: "a".to_string(),
            target_id: "t".to_string(),
            results: vec![
                FireEntry::Resolved(WeaponResult {
                    weapon_id: "frigate_gun_1".to_string(),
                    weapon_name: "Light gun".to_string(),
                    hit_check: CheckRoll { roll: 9, needed: 4 },
                    armor_check: Some(CheckRoll { roll: 8, needed: 5 }),
                    criticals: vec![CriticalOutcome {
                        roll: 12,
                        kind: CriticalKind::BridgeHit,
                        damage: 1,
                        effects: vec!["Bridge hit".to_string()],
                        depth: 0,
                    }],
                    splash: Vec::new(),
                    result: ShotResult::Hit,
                    damage: 1,
                    target_destroyed: true,
                    error: None,
                }),
                FireEntry::Rejected {
                    weapon_id: "ghost".to_string(),
                    error: "unknown weapon".to_string(),
                },
            ],
        };

        let value = serde_json::to_value(ServerMessage::from(GameEvent::CombatResults(report)))
            .expect("json");
        let results = &value["data"]["results"];
        let steps = results[0]["steps"].as_array().expect("steps");
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0]["type"], "hit_check");
        assert_eq!(steps[1]["success"], true);
        assert_eq!(steps[2]["type"], "critical_hit");
        assert_eq!(results[0]["result"], "hit");
        assert_eq!(results[0]["criticalEffect"], "bridge_hit");
        assert_eq!(results[0]["targetDestroyed"], true);
        assert_eq!(
            results[1],
            json!({"weaponId": "ghost", "error": "unknown weapon"})
        );
    }
}
