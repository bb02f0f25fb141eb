/// Gameplay tuning for grenades.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrenadeTuning {
    /// Travel speed along the grenade's heading in units per second.
    pub speed: f32,

    /// Downward acceleration along the track's up axis.
    pub gravity: f32,

    /// Velocity change applied along the contact normal on a floor bounce.
    pub bounce_force: f32,

    /// Multiplier applied to the bounce force after each bounce.
    pub bounce_decay: f32,

    /// Lifetime in seconds before the grenade explodes on its own.
    pub life_time: f32,

    /// Counted bounces allowed before the grenade explodes.
    pub max_bounces: u32,

    /// Floor bounces stop counting once remaining lifetime drops to this many seconds.
    pub bounce_grace: f32,

    /// Scales the owner's forward velocity into a launch speed candidate.
    pub launch_speed_factor: f32,

    /// Score given to the owner for a ship hit.
    pub hit_score: u32,

    /// Seconds the explosion's primary effect runs when no client reports it finished.
    pub explosion_effect_time: f32,
}

impl Default for GrenadeTuning {
    fn default() -> Self {
        Self {
            speed: 25.0,
            gravity: 35.0,
            bounce_force: 4.0,
            bounce_decay: 0.9,
            life_time: 8.0,
            max_bounces: 3,
            bounce_grace: 0.5,
            launch_speed_factor: 0.06,
            hit_score: 1,
            explosion_effect_time: 2.0,
        }
    }
}
