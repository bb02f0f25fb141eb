// Framework bootstrap for the grenade session host.

use crate::domain::Arena;
use crate::domain::state::Explosive;
use crate::domain::geometry::TrackGeometry;
use crate::domain::tuning::VolleyTuning;
use crate::frameworks::config;
use crate::interface_adapters::net::{PeerRegistry, world_update_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::game::world_task;
use crate::use_cases::{GameEvent, Replicator, Role, Session, WorldUpdate};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use glam::Vec3;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{Notify, broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let shutdown = Arc::new(Notify::new());
    let state = build_state(shutdown.clone());

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    let served = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });
    // Stop the session loop once nothing can reach it anymore.
    shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_arena() -> Arena<TrackGeometry> {
    let tuning = config::grenade_tuning();
    tracing::debug!(
        speed = tuning.speed,
        life_time = tuning.life_time,
        max_bounces = tuning.max_bounces,
        "grenade tuning"
    );
    let mut arena = Arena::new(
        TrackGeometry::straight(config::TRACK_HALF_WIDTH, config::TRACK_HALF_LENGTH),
        tuning,
        VolleyTuning::default(),
    );

    for (id, position) in (1..).zip(config::EXPLOSIVE_POSITIONS) {
        arena.add_explosive(Explosive {
            id,
            position: Vec3::from_array(position),
        });
    }
    arena
}

fn build_state(shutdown: Arc<Notify>) -> Arc<AppState> {
    // input_tx/rx: every socket feeds the single session loop.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);
    let (world_tx, _world_rx) = broadcast::channel::<WorldUpdate>(config::WORLD_BROADCAST_CAPACITY);
    // Serialized world updates shared across all clients.
    let (world_bytes_tx, _world_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::WORLD_BROADCAST_CAPACITY);
    let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));

    let peers = PeerRegistry::new();

    // The host is the authority; sockets are its participants.
    let session = Session::new(build_arena(), Replicator::new(Role::Authority, peers.clone()));

    tokio::spawn(world_task(
        input_rx,
        world_tx.clone(),
        session,
        config::TICK_INTERVAL,
        shutdown,
    ));

    tokio::spawn(world_update_serializer(
        world_tx.subscribe(),
        world_bytes_tx.clone(),
        world_latest_tx.clone(),
    ));

    Arc::new(AppState {
        input_tx,
        world_tx,
        world_bytes_tx,
        world_latest_tx,
        peers,
        outbound_capacity: config::OUTBOUND_CHANNEL_CAPACITY,
    })
}
