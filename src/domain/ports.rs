use glam::Vec3;

// Port for queries against the static level geometry.
pub trait Environment: Send {
    /// True when static geometry (floor or walls) blocks the segment `from`..`to`.
    fn linecast(&self, from: Vec3, to: Vec3) -> bool;

    /// Up axis of the track segment containing `position`, if any.
    fn track_up(&self, position: Vec3) -> Option<Vec3>;
}
