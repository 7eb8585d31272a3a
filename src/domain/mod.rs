// Domain layer: battle rules, hex geometry and dice.

pub mod battle;
pub mod combat;
pub mod dice;
pub mod errors;
pub mod hex;
pub mod movement;
pub mod ports;
pub mod ship;
pub mod tuning;
pub mod victory;

#[cfg(test)]
pub(crate) mod test_support;

/// Connection-scoped participant id.
pub type PlayerId = u64;

pub use battle::{
    Battle, BattlePhase, FireEntry, FireReport, PendingPlacement, TurnChange, WeaponTargets,
};
pub use dice::{Dice, DicePool, RandomDice};
pub use errors::{BattleError, CatalogError};
pub use hex::{Direction, MapBounds, Position, Turn};
pub use ship::{Module, Ship, ShipClass, ShipProject, ShipStats, ShipStatus};
pub use victory::Victory;
