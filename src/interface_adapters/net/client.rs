use crate::domain::PeerId;
use crate::interface_adapters::net::PeerRegistry;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{GameEvent, WorldUpdate};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
// Spawn triggers are 17 bytes; anything near this size is not ours.
const MAX_ENVELOPE_LEN: usize = 256;

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Keep the latest bytes for lag recovery.
                let _ = world_latest_tx.send(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let peer_id = rand_id();
        handle_socket(socket, state, peer_id).instrument(info_span!("peer", peer_id))
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, peer_id: PeerId) {
    let mut ctx = match bootstrap_connection(&mut socket, &state, peer_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = ?e, "failed to bootstrap connection");
            let _ = socket.close().await;
            return;
        }
    };
    info!("peer connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    disconnect_cleanup(&state.peers, &ctx).await;
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket.send(Message::Text(txt.into())).await?;
    Ok(bytes)
}

struct ConnCtx {
    pub peer_id: PeerId,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub world_latest_rx: watch::Receiver<Utf8Bytes>,
    // Envelopes other peers' triggers relayed to this peer.
    pub outbound_rx: mpsc::Receiver<Bytes>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_world_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
    peer_id: PeerId,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so no update is missed.
    let world_bytes_rx = state.world_bytes_tx.subscribe();
    let world_latest_rx = state.world_latest_tx.subscribe();

    // Register before the ship exists so relays already reach this peer.
    let (outbound_tx, outbound_rx) = mpsc::channel(state.outbound_capacity);
    state.peers.register(peer_id, outbound_tx);

    let identity = ServerMessage::Identity {
        peer_id: peer_id.to_string(),
    };
    let bytes_out = match send_message(socket, &identity).await {
        Ok(bytes) => bytes as u64,
        Err(e) => {
            state.peers.unregister(peer_id);
            return Err(e);
        }
    };

    // The ship shares the peer id; spawn it before any of the peer's triggers arrive.
    if state
        .input_tx
        .send(GameEvent::Join { peer_id })
        .await
        .is_err()
    {
        state.peers.unregister(peer_id);
        return Err(NetError::InputClosed);
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        peer_id,
        input_tx: state.input_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        outbound_rx,

        msgs_in: 0,
        msgs_out: 1,
        bytes_in: 0,
        bytes_out,

        invalid_json: 0,

        last_input_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Drops the event when the session loop is saturated; only a closed loop is fatal.
fn forward_event(
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(evt)) => {
            if should_log(last_input_full_log) {
                warn!(event = ?evt, "input channel full; dropping event");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let peer_id = ctx.peer_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        world_bytes_rx,
        world_latest_rx,
        outbound_rx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_world_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    peer_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => matches!(
                        forward_frame(Message::Text(bytes), socket, msgs_out, bytes_out).await,
                        LoopControl::Disconnect
                    ),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending snapshot");
                        }

                        // Resync with the latest snapshot instead of replaying the backlog.
                        let latest = world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            matches!(
                                forward_frame(Message::Text(latest), socket, msgs_out, bytes_out).await,
                                LoopControl::Disconnect
                            )
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }

            relayed = outbound_rx.recv() => {
                match relayed {
                    Some(bytes) => matches!(
                        forward_frame(Message::Binary(bytes), socket, msgs_out, bytes_out).await,
                        LoopControl::Disconnect
                    ),
                    None => {
                        debug!("outbound queue closed");
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

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, axum::Error>>,
    peer_id: PeerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    let msg = match incoming {
        Some(Ok(msg)) => msg,
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            return Ok(LoopControl::Disconnect);
        }
        None => {
            info!("websocket closed");
            return Ok(LoopControl::Disconnect);
        }
    };

    match msg {
        Message::Text(text) => {
            *msgs_in += 1;
            *bytes_in += text.len() as u64;

            let event = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Pose(dto)) => match dto.into_pose() {
                    Some(pose) => Some(GameEvent::Pose { peer_id, pose }),
                    None => {
                        if should_log(last_invalid_input_log) {
                            warn!("invalid pose values (NaN/inf); dropping");
                        }
                        return Ok(LoopControl::Continue);
                    }
                },
                Ok(ClientMessage::EffectFinished { epilogue_id }) => epilogue_id
                    .parse()
                    .ok()
                    .map(|epilogue_id| GameEvent::EffectFinished { epilogue_id }),
                Err(parse_err) => {
                    if should_log(last_invalid_input_log) {
                        warn!(
                            bytes = text.len(),
                            error = %parse_err,
                            "failed to parse client message"
                        );
                    }
                    None
                }
            };

            let Some(event) = event else {
                *invalid_json += 1;
                if *invalid_json > MAX_INVALID_JSON {
                    *close_frame = Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: "too many invalid messages".into(),
                    });
                    return Ok(LoopControl::Disconnect);
                }
                return Ok(LoopControl::Continue);
            };
            forward_event(input_tx, event, last_input_full_log)
        }
        Message::Binary(bytes) => {
            *msgs_in += 1;
            *bytes_in += bytes.len() as u64;

            if bytes.len() > MAX_ENVELOPE_LEN {
                if should_log(last_invalid_input_log) {
                    warn!(bytes = bytes.len(), "oversized envelope dropped");
                }
                return Ok(LoopControl::Continue);
            }

            // Envelopes are decoded by the session; the socket only forwards them.
            forward_event(
                input_tx,
                GameEvent::Protocol {
                    peer_id,
                    bytes: bytes.to_vec(),
                },
                last_input_full_log,
            )
        }
        Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
        Message::Close(_) => Ok(LoopControl::Disconnect),
    }
}

async fn forward_frame(
    msg: Message,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let len = match &msg {
        Message::Text(text) => text.len(),
        Message::Binary(bytes) => bytes.len(),
        _ => 0,
    };
    match socket.send(msg).await {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send frame");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(peers: &PeerRegistry, ctx: &ConnCtx) {
    peers.unregister(ctx.peer_id);
    // The session loop may already be gone during shutdown.
    let _ = ctx
        .input_tx
        .send(GameEvent::Leave {
            peer_id: ctx.peer_id,
        })
        .await;

    info!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        "peer disconnected"
    );
}
