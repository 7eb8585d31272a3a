use crate::interface_adapters::hub::SessionHub;
use crate::use_cases::RoomRegistry;
use std::sync::Arc;

/// Shared handles passed to every route.
pub struct AppState {
    // Rooms, battles and nicknames.
    pub registry: Arc<RoomRegistry>,
    // Outboxes of connected sockets, used to fan out registry events.
    pub hub: Arc<SessionHub>,
    // Capacity of each connection's outbox.
    pub outbox_capacity: usize,
}
