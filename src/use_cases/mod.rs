// Use cases layer: room lifecycle and battle command workflows.

pub mod catalog;
pub mod rooms;
pub mod types;

pub use catalog::ShipCatalog;
pub use rooms::{RoomRegistry, RoomSettings};
pub use types::{
    Audience, Fleet, FleetEntry, GameEvent, GameOver, Outbound, PlayerSummary, Rejection, RoomId,
    RoomSummary,
};
