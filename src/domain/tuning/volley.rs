/// Layout of the three grenades thrown by one use of the pickup.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolleyTuning {
    /// Sideways offset of the left and right grenades.
    pub spread: f32,

    /// Forward offset of the center grenade.
    pub center_forward: f32,
}

impl Default for VolleyTuning {
    fn default() -> Self {
        Self {
            spread: 0.6,
            center_forward: 1.0,
        }
    }
}
