// Lifetime extension for explosion visuals.
//
// The explosion's primary effect reports completion, but its debris keeps flying for a
// while after that; the epilogue holds the explosion alive for a fixed extra time.
// When nobody reports the primary effect, it is taken as finished after its nominal
// play time so the host never keeps epilogues forever.

use crate::domain::state::{EpilogueId, EpilogueSnapshot};
use glam::Vec3;

/// Seconds the explosion lingers after its primary effect finished.
pub const EXTRA_LIFETIME: f32 = 1.5;

#[derive(Debug, Clone)]
pub struct Epilogue {
    pub id: EpilogueId,
    pub position: Vec3,
    effect_time: f32,
    effect_elapsed: f32,
    completed: bool,
    extended_life: f32,
    destroyed: bool,
}

impl Epilogue {
    /// `effect_time` is how long the primary effect plays if no client reports it.
    pub fn new(id: EpilogueId, position: Vec3, effect_time: f32) -> Self {
        Self {
            id,
            position,
            effect_time,
            effect_elapsed: 0.0,
            completed: false,
            extended_life: 0.0,
            destroyed: false,
        }
    }

    /// Called when the effect system reports the primary effect has stopped.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Advances the effect and post-completion timers. Returns true on the tick the
    /// epilogue ends.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.destroyed {
            return false;
        }

        if !self.completed {
            self.effect_elapsed += dt;
            if self.effect_elapsed >= self.effect_time {
                // Extra lifetime starts counting on the next tick.
                self.completed = true;
            }
            return false;
        }

        self.extended_life += dt;
        if self.extended_life > EXTRA_LIFETIME {
            return self.destroy();
        }
        false
    }

    /// Returns false if the epilogue was already gone.
    pub fn destroy(&mut self) -> bool {
        !std::mem::replace(&mut self.destroyed, true)
    }
}

impl From<&Epilogue> for EpilogueSnapshot {
    fn from(e: &Epilogue) -> Self {
        Self {
            id: e.id,
            position: e.position,
            completed: e.completed,
        }
    }
}
