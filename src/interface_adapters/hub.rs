// Session fan-out: serializes registry events once and queues them on socket outboxes.

use crate::domain::PlayerId;
use crate::interface_adapters::protocol::ServerMessage;
use crate::interface_adapters::utils::throttle::{log_ready, should_log};
use crate::use_cases::{Audience, Outbound};

use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, warn};

pub struct SessionHub {
    sessions: RwLock<HashMap<PlayerId, mpsc::Sender<Utf8Bytes>>>,
    last_full_log: Mutex<Instant>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            last_full_log: Mutex::new(log_ready()),
        }
    }

    pub async fn register(&self, player_id: PlayerId, outbox: mpsc::Sender<Utf8Bytes>) {
        self.sessions.write().await.insert(player_id, outbox);
    }

    pub async fn unregister(&self, player_id: PlayerId) {
        self.sessions.write().await.remove(&player_id);
    }

    /// Queues every event on its recipients' outboxes. Never waits on a slow socket.
    pub async fn dispatch(&self, outbound: Vec<Outbound>) {
        if outbound.is_empty() {
            return;
        }
        let sessions = self.sessions.read().await;
        for Outbound { audience, event } in outbound {
            let msg = ServerMessage::from(event);
            let bytes: Utf8Bytes = match serde_json::to_string(&msg) {
                Ok(text) => text.into(),
                Err(e) => {
                    error!(error = %e, "failed to serialize server message");
                    continue;
                }
            };

            match audience {
                Audience::Player(player_id) => self.deliver(&sessions, player_id, bytes),
                Audience::Players(players) => {
                    for player_id in players {
                        self.deliver(&sessions, player_id, bytes.clone());
                    }
                }
                Audience::Everyone => {
                    for player_id in sessions.keys() {
                        self.deliver(&sessions, *player_id, bytes.clone());
                    }
                }
            }
        }
    }

    fn deliver(
        &self,
        sessions: &HashMap<PlayerId, mpsc::Sender<Utf8Bytes>>,
        player_id: PlayerId,
        bytes: Utf8Bytes,
    ) {
        let Some(outbox) = sessions.get(&player_id) else {
            debug!(player_id, "no session for recipient");
            return;
        };
        match outbox.try_send(bytes) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let log = self
                    .last_full_log
                    .lock()
                    .map(|mut last| should_log(&mut last))
                    .unwrap_or(true);
                if log {
                    warn!(player_id, "session outbox full; dropping message");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(player_id, "session outbox closed");
            }
        }
    }
}
