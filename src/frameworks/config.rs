use crate::domain::tuning::GrenadeTuning;
use std::{env, str::FromStr, time::Duration};

// Runtime/server constants plus env overrides for a few gameplay knobs.

pub fn http_port() -> u16 {
    env_parse("GRENADE_SERVER_PORT").unwrap_or(3001)
}

/// Default tuning with `GRENADE_SPEED`, `GRENADE_LIFETIME` and `GRENADE_MAX_BOUNCES` applied.
pub fn grenade_tuning() -> GrenadeTuning {
    let mut tuning = GrenadeTuning::default();
    if let Some(speed) = env_parse::<f32>("GRENADE_SPEED").filter(|v| v.is_finite() && *v > 0.0) {
        tuning.speed = speed;
    }
    if let Some(life_time) =
        env_parse::<f32>("GRENADE_LIFETIME").filter(|v| v.is_finite() && *v > 0.0)
    {
        tuning.life_time = life_time;
    }
    if let Some(max_bounces) = env_parse("GRENADE_MAX_BOUNCES") {
        tuning.max_bounces = max_bounces;
    }
    tuning
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

// Box track the hosted session runs on.
pub const TRACK_HALF_WIDTH: f32 = 20.0;
pub const TRACK_HALF_LENGTH: f32 = 500.0;

// Explosive barrels placed down the track when the session starts.
pub const EXPLOSIVE_POSITIONS: [[f32; 3]; 3] = [
    [-6.0, 0.75, 80.0],
    [0.0, 0.75, 160.0],
    [6.0, 0.75, 240.0],
];
