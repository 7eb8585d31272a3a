use crate::domain::PlayerId;
use crate::interface_adapters::hub::SessionHub;
use crate::interface_adapters::protocol::ClientMessage;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::interface_adapters::utils::throttle::{log_ready, should_log};
use crate::use_cases::{Fleet, GameEvent, Outbound, RoomRegistry};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{sync::Arc, time::Instant};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    OutboxClosed,
}

enum LoopControl {
    Continue,
    Disconnect,
}

const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Separate connection id for correlating logs before/after a player_id exists.
    let conn_id = rand_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    ws.on_upgrade(move |socket| handle_socket(socket, state).instrument(span))
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub registry: Arc<RoomRegistry>,
    pub hub: Arc<SessionHub>,
    // Serialized events queued for this socket by the hub.
    pub outbox_rx: mpsc::Receiver<Utf8Bytes>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_invalid_msg_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    // Player ids live only as long as the socket; there is no resume.
    let player_id = rand_id();
    tracing::Span::current().record("player_id", player_id);

    // Register the outbox before the first event so nothing addressed to us is lost.
    let (outbox_tx, outbox_rx) = mpsc::channel(state.outbox_capacity);
    state.hub.register(player_id, outbox_tx).await;
    state.hub.dispatch(state.registry.connect(player_id).await).await;
    info!(player_id, "client connected");

    let mut ctx = ConnCtx {
        player_id,
        registry: state.registry.clone(),
        hub: state.hub.clone(),
        outbox_rx,
        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        invalid_json: 0,
        last_invalid_msg_log: log_ready(),
        close_frame: None,
    };

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        registry,
        hub,
        outbox_rx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_invalid_msg_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    registry,
                    hub,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_invalid_msg_log,
                    close_frame,
                ).await {
                    LoopControl::Continue => false,
                    LoopControl::Disconnect => true,
                }
            }

            // Outgoing events queued by the hub
            queued = outbox_rx.recv() => {
                match queued {
                    Some(bytes) => match forward_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    None => {
                        fatal = Some(NetError::OutboxClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    disconnect_cleanup(
        player_id,
        registry,
        hub,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
    )
    .await;

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    registry: &RoomRegistry,
    hub: &SessionHub,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_invalid_msg_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> LoopControl {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => {
                        let outbound =
                            route_message(registry, player_id, msg, last_invalid_msg_log).await;
                        hub.dispatch(outbound).await;
                        LoopControl::Continue
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_msg_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return LoopControl::Disconnect;
                        }

                        LoopControl::Continue
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                LoopControl::Disconnect
            }
            Message::Ping(_) | Message::Pong(_) => LoopControl::Continue,
            Message::Close(_) => LoopControl::Disconnect,
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => {
            info!(player_id, "websocket closed");
            LoopControl::Disconnect
        }
    }
}

/// Runs one client command against the registry and returns the events it produced.
async fn route_message(
    registry: &RoomRegistry,
    player_id: PlayerId,
    msg: ClientMessage,
    last_invalid_msg_log: &mut Instant,
) -> Vec<Outbound> {
    match msg {
        ClientMessage::CreateRoom { room_name } => {
            let room_id = format!("room_{}", rand_id());
            registry.create_room(player_id, room_id, room_name).await
        }
        ClientMessage::JoinRoom { room_id } => registry.join_room(player_id, &room_id).await,
        ClientMessage::GetRooms => vec![Outbound::to(
            player_id,
            GameEvent::RoomsData(registry.rooms_data().await),
        )],
        ClientMessage::SetNickname { nickname } => {
            registry.set_nickname(player_id, &nickname).await
        }
        ClientMessage::PlayerReady { room_id, fleet } => {
            registry
                .player_ready(player_id, &room_id, Fleet::from(fleet))
                .await
        }
        ClientMessage::PlaceShip {
            room_id,
            project_id,
            position,
        } => match position.to_position() {
            Some(position) => {
                registry
                    .place_ship(player_id, &room_id, &project_id, position)
                    .await
            }
            None => {
                invalid_coordinates(player_id, last_invalid_msg_log);
                Vec::new()
            }
        },
        ClientMessage::RotateShip {
            room_id,
            ship_id,
            direction,
        } => {
            registry
                .rotate_ship(player_id, &room_id, &ship_id, direction.into())
                .await
        }
        ClientMessage::MoveShip {
            room_id,
            ship_id,
            target_position,
        } => match target_position.to_position() {
            Some(target) => {
                registry
                    .move_ship(player_id, &room_id, &ship_id, target)
                    .await
            }
            None => {
                invalid_coordinates(player_id, last_invalid_msg_log);
                Vec::new()
            }
        },
        ClientMessage::ActivateShip {
            room_id,
            ship_id,
            dice_value,
        } => {
            registry
                .activate_ship(player_id, &room_id, &ship_id, dice_value)
                .await
        }
        ClientMessage::FireWeapons {
            room_id,
            attacker_id,
            target_id,
            weapon_ids,
        } => {
            registry
                .fire(player_id, &room_id, &attacker_id, &target_id, &weapon_ids)
                .await
        }
        ClientMessage::EndTurn { room_id } => registry.end_turn(player_id, &room_id).await,
        ClientMessage::Surrender => registry.surrender(player_id).await,
        ClientMessage::GetReachable { room_id, ship_id } => {
            registry
                .reachable_cells(player_id, &room_id, &ship_id)
                .await
        }
        ClientMessage::GetTargets { room_id, ship_id } => {
            registry.targets(player_id, &room_id, &ship_id).await
        }
    }
}

fn invalid_coordinates(player_id: PlayerId, last_invalid_msg_log: &mut Instant) {
    if should_log(last_invalid_msg_log) {
        warn!(player_id, "coordinates off the cube plane; ignoring");
    }
}

async fn forward_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket
        .send(Message::Text(bytes))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send server message");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: PlayerId,
    registry: &RoomRegistry,
    hub: &SessionHub,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
) {
    // Stop queueing before announcing the departure to the remaining players.
    hub.unregister(player_id).await;
    hub.dispatch(registry.disconnect(player_id).await).await;

    debug!(
        player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        "connection stats"
    );
    info!(player_id, "client disconnected");
}
