// Domain-level errors for battle commands and catalog access.

/// Why a battle command was rejected. The message is what the player sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("ship not found")]
    ShipNotFound,
    #[error("player is not part of this battle")]
    UnknownPlayer,
    #[error("placement phase is over")]
    NotInPlacement,
    #[error("battle has not started")]
    NotInBattle,
    #[error("not your turn")]
    NotYourTurn,
    #[error("this is not your ship")]
    NotYourShip,
    #[error("position is outside the map")]
    OutOfBounds,
    #[error("position is already occupied")]
    CellOccupied,
    #[error("no ships of this project left to place")]
    NothingToPlace,
    #[error("place all ships before ending the turn")]
    PlacementIncomplete,
    #[error("ship is destroyed")]
    ShipDestroyed,
    #[error("ship has already acted this round")]
    ShipSpent,
    #[error("ship is already activated")]
    AlreadyActivated,
    #[error("no die of {threshold} or higher available")]
    NoSuitableDie { threshold: u8 },
    #[error("die {face} is below the activation value {threshold}")]
    DieTooLow { face: u8, threshold: u8 },
    #[error("no die showing {face} left")]
    DieUnavailable { face: u8 },
    #[error("no maneuverability left")]
    NoManeuver,
    #[error("target cell is unreachable")]
    Unreachable,
    #[error("cannot fire at your own ship")]
    FriendlyTarget,
    #[error("target is already destroyed")]
    TargetDestroyed,
    #[error("no weapons selected")]
    NoWeapons,
    #[error("fleet has no ships")]
    EmptyFleet,
}

impl BattleError {
    /// Missing entities are dropped quietly instead of being reported to the player.
    pub fn is_missing_entity(&self) -> bool {
        matches!(self, BattleError::ShipNotFound | BattleError::UnknownPlayer)
    }
}

/// Failures while loading ship projects from an external catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("catalog returned malformed data: {0}")]
    Malformed(String),
}
