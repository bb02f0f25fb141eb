// Grenade state machine: flight, bounces, expiry and collision response.

use crate::domain::impact::ImpactSettings;
use crate::domain::math::{look_rotation, reflect};
use crate::domain::state::{ExplosiveId, GrenadeId, GrenadeSnapshot, ShipId, SimShip};
use crate::domain::tuning::GrenadeTuning;
use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrenadeState {
    Flying,
    /// Terminal. `play_effect` is false when visuals were already handled (occlusion).
    Destroyed { play_effect: bool },
}

/// What the grenade touched, as classified by the host's collision callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionBody {
    /// Trigger-only volume (checkpoints, speed pads and the like).
    TriggerVolume,
    Explosive(ExplosiveId),
    /// A collider on the ship layer; `None` when the owning ship could not be resolved.
    Ship(Option<ShipId>),
    /// Track or floor surface with the contact normal.
    Floor { normal: Vec3 },
    /// Any other static geometry, walls included.
    StaticSurface,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrenadeEvent {
    /// One physics step. `up` is the track segment's up axis when known.
    Tick { dt: f32, up: Option<Vec3> },
    CollisionWith(CollisionBody),
    Expire,
}

/// Side effects the owner of the grenade must carry out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrenadeAction {
    DestroyExplosive(ExplosiveId),
    StrikeShip {
        target: Option<ShipId>,
        settings: ImpactSettings,
    },
    PlayImpactSound {
        position: Vec3,
    },
    Destroyed {
        position: Vec3,
        play_effect: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Grenade {
    pub id: GrenadeId,
    pub owner: ShipId,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// Presentation only: direction the visible mesh faces.
    pub mesh_forward: Vec3,

    speed: f32,
    gravity: f32,
    bounce_force: f32,
    bounce_decay: f32,
    bounce_count: u32,
    max_bounces: u32,
    // f64 so long runs of small steps still land on the crossing tick.
    lifetime: f64,
    bounce_grace: f32,
    impact: ImpactSettings,
    state: GrenadeState,
}

impl Grenade {
    /// Creates a flying grenade at `position` facing `rotation`.
    ///
    /// The travel speed is fixed here: the configured speed, or more when the owner is
    /// already moving fast along its own heading.
    pub fn launch(
        id: GrenadeId,
        owner: &SimShip,
        position: Vec3,
        rotation: Quat,
        tuning: &GrenadeTuning,
        impact: ImpactSettings,
    ) -> Self {
        let velocity_based =
            owner.pose.local_velocity().z * tuning.speed * tuning.launch_speed_factor;
        let speed = tuning.speed.max(velocity_based);
        let forward = rotation * Vec3::Z;

        Self {
            id,
            owner: owner.id,
            position,
            rotation,
            velocity: forward * speed,
            mesh_forward: forward,
            speed,
            gravity: tuning.gravity,
            bounce_force: tuning.bounce_force,
            bounce_decay: tuning.bounce_decay,
            bounce_count: 0,
            max_bounces: tuning.max_bounces,
            lifetime: f64::from(tuning.life_time),
            bounce_grace: tuning.bounce_grace,
            impact,
            state: GrenadeState::Flying,
        }
    }

    pub fn state(&self) -> GrenadeState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, GrenadeState::Destroyed { .. })
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn bounce_force(&self) -> f32 {
        self.bounce_force
    }

    pub fn bounce_count(&self) -> u32 {
        self.bounce_count
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime as f32
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Velocity component along the grenade's own heading.
    pub fn forward_speed(&self) -> f32 {
        (self.rotation.inverse() * self.velocity).z
    }

    pub fn handle(&mut self, event: GrenadeEvent) -> Vec<GrenadeAction> {
        if self.is_destroyed() {
            return Vec::new();
        }

        match event {
            GrenadeEvent::Tick { dt, up } => self.tick(dt, up),
            GrenadeEvent::CollisionWith(body) => self.collide(body),
            GrenadeEvent::Expire => self.destroy(true).into_iter().collect(),
        }
    }

    /// Moves to `Destroyed`. Returns `None` when already destroyed.
    pub fn destroy(&mut self, play_effect: bool) -> Option<GrenadeAction> {
        if self.is_destroyed() {
            return None;
        }
        self.state = GrenadeState::Destroyed { play_effect };
        Some(GrenadeAction::Destroyed {
            position: self.position,
            play_effect,
        })
    }

    fn tick(&mut self, dt: f32, up: Option<Vec3>) -> Vec<GrenadeAction> {
        self.hold_forward_speed();

        let up = up.and_then(Vec3::try_normalize).unwrap_or(Vec3::Y);
        self.velocity -= up * self.gravity * dt;
        self.position += self.velocity * dt;

        if let Some(facing) = self.velocity.try_normalize() {
            self.mesh_forward = facing;
        }

        let dt = f64::from(dt);
        self.lifetime -= dt;
        // Rounding residue of a step that lands exactly on zero counts as zero.
        if self.lifetime <= dt * 1e-6 {
            self.lifetime = 0.0;
            return self.destroy(true).into_iter().collect();
        }
        Vec::new()
    }

    // Pin the speed along the heading to the setpoint; other axes keep their forces.
    pub(crate) fn hold_forward_speed(&mut self) {
        let mut local = self.rotation.inverse() * self.velocity;
        local.z = self.speed;
        self.velocity = self.rotation * local;
    }

    fn collide(&mut self, body: CollisionBody) -> Vec<GrenadeAction> {
        match body {
            CollisionBody::TriggerVolume => Vec::new(),
            CollisionBody::Ship(Some(id)) if id == self.owner => Vec::new(),
            CollisionBody::Explosive(id) => {
                let mut actions = vec![GrenadeAction::DestroyExplosive(id)];
                actions.extend(self.destroy(true));
                actions
            }
            CollisionBody::Ship(target) => {
                let mut actions = vec![GrenadeAction::StrikeShip {
                    target,
                    settings: self.impact,
                }];
                actions.extend(self.destroy(true));
                actions
            }
            CollisionBody::Floor { normal } => self.bounce(normal),
            CollisionBody::StaticSurface => self.destroy(true).into_iter().collect(),
        }
    }

    fn bounce(&mut self, normal: Vec3) -> Vec<GrenadeAction> {
        let normal = normal.try_normalize().unwrap_or(Vec3::Y);

        let heading = reflect(self.forward(), normal);
        if let Some(rotation) = look_rotation(heading, self.rotation * Vec3::Y) {
            self.rotation = rotation;
        }

        self.velocity += normal * self.bounce_force;
        self.bounce_force *= self.bounce_decay;

        let mut actions = vec![GrenadeAction::PlayImpactSound {
            position: self.position,
        }];

        // Bounces in the last moments of a grenade's life are free.
        if self.lifetime > f64::from(self.bounce_grace) {
            self.bounce_count += 1;
        }
        if self.bounce_count > self.max_bounces {
            actions.extend(self.destroy(true));
        }
        actions
    }
}

impl From<&Grenade> for GrenadeSnapshot {
    fn from(g: &Grenade) -> Self {
        Self {
            id: g.id,
            owner_id: g.owner,
            position: g.position,
            mesh_forward: g.mesh_forward,
            bounce_count: g.bounce_count,
        }
    }
}
