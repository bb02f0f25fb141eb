use super::session::Session;
use super::types::{GameEvent, WorldUpdate};
use crate::domain::geometry::TrackGeometry;
use crate::domain::systems::contacts::{ContactConfig, detect_contacts};
use crate::domain::{Pose, SimShip};
use crate::use_cases::replication::{ReceiveOutcome, Transport};
use glam::Vec3;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tracing::{debug, info};

const SPAWN_LANES: u64 = 13;
const LANE_WIDTH: f32 = 3.0;

// Ships line up across the track on join; live poses arrive from clients afterwards.
fn spawn_pose(join_index: u64) -> Pose {
    let lane = (join_index % SPAWN_LANES) as f32 - (SPAWN_LANES / 2) as f32;
    Pose::at(Vec3::new(lane * LANE_WIDTH, 1.0, 0.0))
}

pub async fn world_task<T: Transport + 'static>(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    mut session: Session<TrackGeometry, T>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut tick: u64 = 0;
    let mut joins: u64 = 0;
    let contacts = ContactConfig::default();

    // Drive the fixed-step simulation at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("session shutting down");
                break;
            }
            _ = interval.tick() => {}
        }

        while let Ok(ev) = input_rx.try_recv() {
            apply_event(&mut session, ev, &mut joins);
        }

        let dt = tick_interval.as_secs_f32();
        session.step_all(dt);

        // Contacts are delivered within the same step, after integration.
        for (grenade_id, body) in detect_contacts(session.arena_mut(), contacts) {
            session.on_collision(grenade_id, body);
        }

        tick += 1;
        let arena = session.arena_mut();
        let events = arena.drain_events();
        let _ = world_tx.send(WorldUpdate {
            tick,
            ships: arena.ship_snapshots(),
            grenades: arena.grenade_snapshots(),
            epilogues: arena.epilogue_snapshots(),
            events,
        });
    }
}

fn apply_event<T: Transport>(
    session: &mut Session<TrackGeometry, T>,
    ev: GameEvent,
    joins: &mut u64,
) {
    match ev {
        GameEvent::Join { peer_id } => {
            info!(peer_id, "peer joined");
            let pose = spawn_pose(*joins);
            *joins += 1;
            session.arena_mut().add_ship(SimShip::new(peer_id, pose));
        }
        GameEvent::Leave { peer_id } => {
            info!(peer_id, "peer left");
            session.arena_mut().remove_ship(peer_id);
        }
        GameEvent::Pose { peer_id, pose } => {
            session.arena_mut().update_pose(peer_id, pose);
        }
        GameEvent::Protocol { peer_id, bytes } => {
            match session.on_protocol_message(peer_id, &bytes) {
                ReceiveOutcome::Spawned { .. } => {}
                other => debug!(peer_id, outcome = ?other, "protocol message not applied"),
            }
        }
        GameEvent::EffectFinished { epilogue_id } => {
            if !session.arena_mut().finish_effect(epilogue_id) {
                debug!(epilogue_id, "effect finished for unknown epilogue");
            }
        }
    }
}
