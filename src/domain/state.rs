// Domain-level simulation entities and snapshot types.

use glam::{Quat, Vec3};

pub type PeerId = u64;
pub type ShipId = u64;
pub type GrenadeId = u64;
pub type ExplosiveId = u64;
pub type EpilogueId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        }
    }

    /// Maps a point from the local frame into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Velocity expressed in the local frame (+Z is forward).
    pub fn local_velocity(&self) -> Vec3 {
        self.rotation.inverse() * self.velocity
    }
}

/// Current engine output as fractions of the ship's nominal stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    pub thrust: f32,
    pub power: f32,
    pub accel: f32,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            thrust: 1.0,
            power: 1.0,
            accel: 1.0,
        }
    }
}

/// Forced sideways drift applied to AI ships after an impact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slide {
    pub force: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone)]
pub struct SimShip {
    pub id: ShipId,
    pub pose: Pose,
    pub is_player: bool,
    pub team: Option<u8>,
    // Local z of the front of the ship mesh; side grenades spawn here.
    pub mesh_bounds_front: f32,

    // Combat state.
    pub hp: f32,
    pub shielding: f32,
    pub shield_active: bool,
    pub holding_shield: bool,
    pub engine: EngineState,
    pub slide: Option<Slide>,

    // Attribution.
    pub score: u32,
    pub sweeps: u32,
}

impl SimShip {
    pub const MAX_HP: f32 = 100.0;

    pub fn new(id: ShipId, pose: Pose) -> Self {
        Self {
            id,
            pose,
            is_player: true,
            team: None,
            mesh_bounds_front: 2.0,
            hp: Self::MAX_HP,
            shielding: 1.0,
            shield_active: false,
            holding_shield: false,
            engine: EngineState::default(),
            slide: None,
            score: 0,
            sweeps: 0,
        }
    }

    /// Whether hits on `target` may raise this ship's score.
    pub fn can_score_from(&self, target: &SimShip) -> bool {
        if self.id == target.id {
            return false;
        }
        match (self.team, target.team) {
            (Some(a), Some(b)) => a != b,
            _ => true,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(slide) = &mut self.slide {
            slide.remaining -= dt;
            if slide.remaining <= 0.0 {
                self.slide = None;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Explosive {
    pub id: ExplosiveId,
    pub position: Vec3,
}

#[derive(Debug, Clone)]
pub struct ShipSnapshot {
    pub id: ShipId,
    pub position: Vec3,
    pub rotation: Quat,
    pub hp: f32,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct GrenadeSnapshot {
    pub id: GrenadeId,
    pub owner_id: ShipId,
    pub position: Vec3,
    pub mesh_forward: Vec3,
    pub bounce_count: u32,
}

#[derive(Debug, Clone)]
pub struct EpilogueSnapshot {
    pub id: EpilogueId,
    pub position: Vec3,
    pub completed: bool,
}

impl From<&SimShip> for ShipSnapshot {
    fn from(s: &SimShip) -> Self {
        Self {
            id: s.id,
            position: s.pose.position,
            rotation: s.pose.rotation,
            hp: s.hp,
            score: s.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_teams_match_then_no_score() {
        let mut a = SimShip::new(1, Pose::at(Vec3::ZERO));
        let mut b = SimShip::new(2, Pose::at(Vec3::ZERO));
        a.team = Some(1);
        b.team = Some(1);
        assert!(!a.can_score_from(&b));

        b.team = Some(2);
        assert!(a.can_score_from(&b));
        assert!(!a.can_score_from(&a.clone()));
    }

    #[test]
    fn when_slide_runs_out_then_it_clears() {
        let mut ship = SimShip::new(1, Pose::at(Vec3::ZERO));
        ship.slide = Some(Slide {
            force: 15.0,
            remaining: 1.0,
        });
        ship.tick(0.5);
        assert!(ship.slide.is_some());
        ship.tick(0.5);
        assert!(ship.slide.is_none());
    }

    #[test]
    fn when_rotated_then_local_points_follow() {
        let pose = Pose {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            velocity: Vec3::new(10.0, 0.0, 0.0),
        };
        // +90 degrees about Y turns local +Z into world +X.
        assert!(pose.transform_point(Vec3::Z).distance(Vec3::new(2.0, 0.0, 0.0)) < 1e-5);
        assert!((pose.local_velocity().z - 10.0).abs() < 1e-4);
    }
}
