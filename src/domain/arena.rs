// The simulation arena: sole owner of ships, grenades, explosives and epilogues.

use crate::domain::epilogue::Epilogue;
use crate::domain::grenade::{CollisionBody, Grenade, GrenadeAction, GrenadeEvent};
use crate::domain::impact::{ImpactOutcome, ImpactSettings, apply_impact};
use crate::domain::ports::Environment;
use crate::domain::state::{
    EpilogueId, EpilogueSnapshot, Explosive, ExplosiveId, GrenadeId, GrenadeSnapshot, Pose,
    ShipId, ShipSnapshot, SimShip,
};
use crate::domain::tuning::{GrenadeTuning, VolleyTuning};
use glam::Vec3;
use std::collections::BTreeMap;
use tracing::debug;

/// Things the host presents (sounds, effects) or reports.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    VolleyDeployed {
        ship_id: ShipId,
        // Player ships get a 2D deploy cue.
        play_cue: bool,
    },
    GrenadeOccluded {
        grenade_id: GrenadeId,
    },
    ImpactSound {
        grenade_id: GrenadeId,
        position: Vec3,
    },
    Explosion {
        grenade_id: GrenadeId,
        position: Vec3,
        epilogue_id: EpilogueId,
    },
    ShipStruck {
        target_id: ShipId,
        owner_id: ShipId,
        outcome: ImpactOutcome,
    },
    ScoreAwarded {
        ship_id: ShipId,
        score: u32,
    },
    ExplosiveDestroyed {
        explosive_id: ExplosiveId,
        owner_id: ShipId,
    },
}

pub struct Arena<E> {
    env: E,
    grenade_tuning: GrenadeTuning,
    volley_tuning: VolleyTuning,
    impact: ImpactSettings,

    ships: BTreeMap<ShipId, SimShip>,
    grenades: BTreeMap<GrenadeId, Grenade>,
    explosives: BTreeMap<ExplosiveId, Explosive>,
    epilogues: BTreeMap<EpilogueId, Epilogue>,

    next_grenade_id: GrenadeId,
    next_epilogue_id: EpilogueId,
    events: Vec<SimEvent>,
}

impl<E: Environment> Arena<E> {
    pub fn new(env: E, grenade_tuning: GrenadeTuning, volley_tuning: VolleyTuning) -> Self {
        Self {
            env,
            grenade_tuning,
            volley_tuning,
            impact: ImpactSettings::default(),
            ships: BTreeMap::new(),
            grenades: BTreeMap::new(),
            explosives: BTreeMap::new(),
            epilogues: BTreeMap::new(),
            next_grenade_id: 1,
            next_epilogue_id: 1,
            events: Vec::new(),
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn add_ship(&mut self, ship: SimShip) {
        self.ships.insert(ship.id, ship);
    }

    /// Removes the ship and every grenade it still has in flight.
    pub fn remove_ship(&mut self, id: ShipId) -> Option<SimShip> {
        self.grenades.retain(|_, g| g.owner != id);
        self.ships.remove(&id)
    }

    pub fn ship(&self, id: ShipId) -> Option<&SimShip> {
        self.ships.get(&id)
    }

    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut SimShip> {
        self.ships.get_mut(&id)
    }

    pub fn ships(&self) -> impl Iterator<Item = &SimShip> {
        self.ships.values()
    }

    pub fn update_pose(&mut self, id: ShipId, pose: Pose) -> bool {
        match self.ships.get_mut(&id) {
            Some(ship) => {
                ship.pose = pose;
                true
            }
            None => false,
        }
    }

    pub fn add_explosive(&mut self, explosive: Explosive) {
        self.explosives.insert(explosive.id, explosive);
    }

    pub fn explosives(&self) -> impl Iterator<Item = &Explosive> {
        self.explosives.values()
    }

    pub fn grenade(&self, id: GrenadeId) -> Option<&Grenade> {
        self.grenades.get(&id)
    }

    pub(crate) fn grenade_mut(&mut self, id: GrenadeId) -> Option<&mut Grenade> {
        self.grenades.get_mut(&id)
    }

    pub fn grenades(&self) -> impl Iterator<Item = &Grenade> {
        self.grenades.values()
    }

    pub fn epilogue(&self, id: EpilogueId) -> Option<&Epilogue> {
        self.epilogues.get(&id)
    }

    /// Throws a volley of three grenades from the ship's current pose.
    ///
    /// Returns the ids of every grenade created, including ones destroyed on the spot
    /// because level geometry sits between the ship and the spawn point. An unknown
    /// ship yields an empty volley.
    pub fn spawn_volley(&mut self, ship_id: ShipId) -> Vec<GrenadeId> {
        let Some(ship) = self.ships.get(&ship_id) else {
            debug!(ship_id, "volley skipped; ship not found");
            return Vec::new();
        };

        let spread = self.volley_tuning.spread;
        let front = ship.mesh_bounds_front;
        let offsets = [
            Vec3::new(-spread, 0.0, front),
            Vec3::new(0.0, 0.0, self.volley_tuning.center_forward),
            Vec3::new(spread, 0.0, front),
        ];

        self.events.push(SimEvent::VolleyDeployed {
            ship_id,
            play_cue: ship.is_player,
        });

        let mut ids = Vec::with_capacity(offsets.len());
        for offset in offsets {
            let id = self.next_grenade_id;
            self.next_grenade_id = self.next_grenade_id.wrapping_add(1);

            let position = ship.pose.transform_point(offset);
            let mut grenade = Grenade::launch(
                id,
                ship,
                position,
                ship.pose.rotation,
                &self.grenade_tuning,
                self.impact,
            );
            ids.push(id);

            if self.env.linecast(ship.pose.position, position) {
                grenade.destroy(false);
                debug!(ship_id, grenade_id = id, "grenade spawn occluded");
                self.events
                    .push(SimEvent::GrenadeOccluded { grenade_id: id });
                continue;
            }
            self.grenades.insert(id, grenade);
        }
        ids
    }

    /// Advances every ship, grenade and epilogue by one fixed step.
    pub fn step(&mut self, dt: f32) {
        for ship in self.ships.values_mut() {
            ship.tick(dt);
        }

        let mut pending = Vec::new();
        for grenade in self.grenades.values_mut() {
            let up = self.env.track_up(grenade.position);
            let actions = grenade.handle(GrenadeEvent::Tick { dt, up });
            if !actions.is_empty() {
                pending.push((grenade.id, grenade.owner, actions));
            }
        }
        for (id, owner, actions) in pending {
            self.apply(id, owner, actions);
        }
        self.grenades.retain(|_, g| !g.is_destroyed());

        for epilogue in self.epilogues.values_mut() {
            epilogue.tick(dt);
        }
        self.epilogues.retain(|_, e| !e.is_destroyed());
    }

    /// Collision callback. Returns false when the grenade no longer exists.
    pub fn on_collision(&mut self, grenade_id: GrenadeId, body: CollisionBody) -> bool {
        let Some(grenade) = self.grenades.get_mut(&grenade_id) else {
            return false;
        };

        let owner = grenade.owner;
        let actions = grenade.handle(GrenadeEvent::CollisionWith(body));
        let destroyed = grenade.is_destroyed();
        self.apply(grenade_id, owner, actions);

        if destroyed {
            self.grenades.remove(&grenade_id);
        }
        true
    }

    /// Forces a grenade to explode as if its lifetime ran out.
    pub fn expire(&mut self, grenade_id: GrenadeId) -> bool {
        let Some(mut grenade) = self.grenades.remove(&grenade_id) else {
            return false;
        };
        let actions = grenade.handle(GrenadeEvent::Expire);
        self.apply(grenade_id, grenade.owner, actions);
        true
    }

    /// The effect system reports an explosion's primary effect has stopped.
    pub fn finish_effect(&mut self, epilogue_id: EpilogueId) -> bool {
        match self.epilogues.get_mut(&epilogue_id) {
            Some(epilogue) => {
                epilogue.mark_completed();
                true
            }
            None => false,
        }
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn ship_snapshots(&self) -> Vec<ShipSnapshot> {
        self.ships.values().map(ShipSnapshot::from).collect()
    }

    pub fn grenade_snapshots(&self) -> Vec<GrenadeSnapshot> {
        self.grenades.values().map(GrenadeSnapshot::from).collect()
    }

    pub fn epilogue_snapshots(&self) -> Vec<EpilogueSnapshot> {
        self.epilogues.values().map(EpilogueSnapshot::from).collect()
    }

    fn apply(&mut self, grenade_id: GrenadeId, owner_id: ShipId, actions: Vec<GrenadeAction>) {
        for action in actions {
            match action {
                GrenadeAction::DestroyExplosive(explosive_id) => {
                    self.destroy_explosive(explosive_id, owner_id);
                }
                GrenadeAction::StrikeShip { target, settings } => {
                    self.strike_ship(target, owner_id, &settings);
                }
                GrenadeAction::PlayImpactSound { position } => {
                    self.events.push(SimEvent::ImpactSound {
                        grenade_id,
                        position,
                    });
                }
                GrenadeAction::Destroyed {
                    position,
                    play_effect,
                } => {
                    if !play_effect {
                        continue;
                    }
                    let epilogue_id = self.next_epilogue_id;
                    self.next_epilogue_id = self.next_epilogue_id.wrapping_add(1);
                    self.epilogues.insert(
                        epilogue_id,
                        Epilogue::new(
                            epilogue_id,
                            position,
                            self.grenade_tuning.explosion_effect_time,
                        ),
                    );
                    self.events.push(SimEvent::Explosion {
                        grenade_id,
                        position,
                        epilogue_id,
                    });
                }
            }
        }
    }

    fn destroy_explosive(&mut self, explosive_id: ExplosiveId, owner_id: ShipId) {
        if self.explosives.remove(&explosive_id).is_none() {
            return;
        }
        if let Some(owner) = self.ships.get_mut(&owner_id) {
            owner.sweeps += 1;
        }
        self.events.push(SimEvent::ExplosiveDestroyed {
            explosive_id,
            owner_id,
        });
    }

    fn strike_ship(&mut self, target: Option<ShipId>, owner_id: ShipId, settings: &ImpactSettings) {
        let Some(target) = target.and_then(|id| self.ships.get_mut(&id)) else {
            debug!(owner_id, "grenade struck an unresolved ship");
            return;
        };

        let outcome = apply_impact(target, settings);
        let target = target.clone();
        self.events.push(SimEvent::ShipStruck {
            target_id: target.id,
            owner_id,
            outcome,
        });
        if !outcome.is_hit() {
            return;
        }

        let hit_score = self.grenade_tuning.hit_score;
        if let Some(owner) = self.ships.get_mut(&owner_id) {
            if owner.can_score_from(&target) {
                owner.score += hit_score;
                self.events.push(SimEvent::ScoreAwarded {
                    ship_id: owner_id,
                    score: owner.score,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::epilogue::EXTRA_LIFETIME;
    use crate::domain::geometry::{Aabb, TrackGeometry};
    use glam::Quat;

    fn track() -> TrackGeometry {
        TrackGeometry::straight(20.0, 500.0)
    }

    fn arena_with(env: TrackGeometry) -> Arena<TrackGeometry> {
        let mut arena = Arena::new(env, GrenadeTuning::default(), VolleyTuning::default());
        arena.add_ship(SimShip::new(1, Pose::at(Vec3::new(0.0, 1.0, 0.0))));
        arena.add_ship(SimShip::new(2, Pose::at(Vec3::new(0.0, 1.0, 50.0))));
        arena
    }

    fn arena() -> Arena<TrackGeometry> {
        arena_with(track())
    }

    #[test]
    fn when_spawning_volley_then_three_grenades_use_lateral_offsets() {
        let mut arena = arena();
        arena.ship_mut(1).expect("ship").mesh_bounds_front = 2.5;

        let ids = arena.spawn_volley(1);

        assert_eq!(ids.len(), 3);
        let positions: Vec<Vec3> = ids
            .iter()
            .map(|id| arena.grenade(*id).expect("grenade").position)
            .collect();
        assert_eq!(positions[0], Vec3::new(-0.6, 1.0, 2.5));
        assert_eq!(positions[1], Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(positions[2], Vec3::new(0.6, 1.0, 2.5));
        assert!(arena.grenades().all(|g| g.rotation == Quat::IDENTITY));
        assert_eq!(
            arena.drain_events(),
            vec![SimEvent::VolleyDeployed {
                ship_id: 1,
                play_cue: true
            }]
        );
    }

    #[test]
    fn when_ship_is_unknown_then_no_volley() {
        let mut arena = arena();
        assert!(arena.spawn_volley(42).is_empty());
        assert_eq!(arena.grenades().count(), 0);
    }

    #[test]
    fn when_wall_blocks_spawn_point_then_grenade_dies_without_effect() {
        let mut env = track();
        // Thin wall just ahead of the ship's right side.
        env.walls.push(Aabb::new(
            Vec3::new(0.3, 0.0, 1.5),
            Vec3::new(1.0, 3.0, 1.6),
        ));
        let mut arena = arena_with(env);

        let ids = arena.spawn_volley(1);

        assert_eq!(ids.len(), 3);
        assert!(arena.grenade(ids[0]).is_some());
        assert!(arena.grenade(ids[1]).is_some());
        assert!(arena.grenade(ids[2]).is_none());

        let events = arena.drain_events();
        assert!(events.contains(&SimEvent::GrenadeOccluded { grenade_id: ids[2] }));
        assert!(!events.iter().any(|e| matches!(e, SimEvent::Explosion { .. })));
    }

    #[test]
    fn when_lifetime_runs_out_then_grenade_explodes_and_leaves_epilogue() {
        let mut arena = arena();
        let ids = arena.spawn_volley(1);
        arena.drain_events();

        // 8s at 0.5s per step.
        for _ in 0..15 {
            arena.step(0.5);
        }
        assert_eq!(arena.grenades().count(), 3);

        arena.step(0.5);
        assert_eq!(arena.grenades().count(), 0);
        let explosions: Vec<EpilogueId> = arena
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SimEvent::Explosion { epilogue_id, .. } => Some(epilogue_id),
                _ => None,
            })
            .collect();
        assert_eq!(explosions.len(), ids.len());
        assert!(explosions.iter().all(|id| arena.epilogue(*id).is_some()));
    }

    #[test]
    fn when_effect_finishes_then_epilogue_is_reaped_after_extra_lifetime() {
        let mut arena = arena();
        let ids = arena.spawn_volley(1);
        arena.on_collision(ids[1], CollisionBody::StaticSurface);
        let epilogue_id = match arena.drain_events().last() {
            Some(SimEvent::Explosion { epilogue_id, .. }) => *epilogue_id,
            other => panic!("expected explosion, got {other:?}"),
        };

        // Still inside the effect's own play time.
        arena.step(1.0);
        assert!(arena.epilogue(epilogue_id).is_some());

        assert!(arena.finish_effect(epilogue_id));
        arena.step(1.0);
        arena.step(0.5);
        assert!(arena.epilogue(epilogue_id).is_some());
        arena.step(0.25);
        assert!(arena.epilogue(epilogue_id).is_none());
        assert!(!arena.finish_effect(epilogue_id));
    }

    #[test]
    fn when_nobody_reports_effects_then_epilogues_are_still_reaped() {
        let mut arena = arena();
        for _ in 0..20 {
            for id in arena.spawn_volley(1) {
                arena.on_collision(id, CollisionBody::StaticSurface);
            }
        }
        assert_eq!(arena.epilogue_snapshots().len(), 60);

        let effect_time = GrenadeTuning::default().explosion_effect_time;
        // Effect time, then one step past the extra lifetime.
        let steps = ((effect_time + EXTRA_LIFETIME) / 0.5) as usize + 1;
        for _ in 0..steps - 1 {
            arena.step(0.5);
        }
        assert_eq!(arena.epilogue_snapshots().len(), 60);
        assert!(arena.epilogue_snapshots().iter().all(|e| e.completed));

        arena.step(0.5);
        assert!(arena.epilogue_snapshots().is_empty());
    }

    #[test]
    fn when_grenade_hits_other_ship_then_impact_and_score_apply() {
        let mut arena = arena();
        let ids = arena.spawn_volley(1);
        arena.drain_events();

        assert!(arena.on_collision(ids[0], CollisionBody::Ship(Some(2))));

        let target = arena.ship(2).expect("target");
        assert_eq!(target.hp, SimShip::MAX_HP - 12.0);
        assert_eq!(arena.ship(1).expect("owner").score, 1);
        assert!(arena.grenade(ids[0]).is_none());

        let events = arena.drain_events();
        assert!(events.contains(&SimEvent::ScoreAwarded {
            ship_id: 1,
            score: 1
        }));
        assert!(events.iter().any(|e| matches!(e, SimEvent::Explosion { .. })));
    }

    #[test]
    fn when_target_is_teammate_then_no_score() {
        let mut arena = arena();
        arena.ship_mut(1).expect("ship").team = Some(3);
        arena.ship_mut(2).expect("ship").team = Some(3);
        let ids = arena.spawn_volley(1);

        arena.on_collision(ids[0], CollisionBody::Ship(Some(2)));

        assert_eq!(arena.ship(1).expect("owner").score, 0);
        assert!(arena.ship(2).expect("target").hp < SimShip::MAX_HP);
    }

    #[test]
    fn when_struck_ship_is_gone_then_grenade_still_explodes() {
        let mut arena = arena();
        let ids = arena.spawn_volley(1);
        arena.drain_events();

        assert!(arena.on_collision(ids[0], CollisionBody::Ship(Some(77))));

        assert!(arena.grenade(ids[0]).is_none());
        assert_eq!(arena.ship(1).expect("owner").score, 0);
        let events = arena.drain_events();
        assert!(!events.iter().any(|e| matches!(e, SimEvent::ShipStruck { .. })));
        assert!(events.iter().any(|e| matches!(e, SimEvent::Explosion { .. })));
    }

    #[test]
    fn when_grenade_hits_own_ship_then_it_keeps_flying() {
        let mut arena = arena();
        let ids = arena.spawn_volley(1);

        arena.on_collision(ids[0], CollisionBody::Ship(Some(1)));

        assert!(arena.grenade(ids[0]).is_some());
        assert_eq!(arena.ship(1).expect("owner").hp, SimShip::MAX_HP);
    }

    #[test]
    fn when_grenade_hits_explosive_then_owner_gets_sweep() {
        let mut arena = arena();
        arena.add_explosive(Explosive {
            id: 9,
            position: Vec3::new(0.0, 1.0, 10.0),
        });
        let ids = arena.spawn_volley(1);

        arena.on_collision(ids[1], CollisionBody::Explosive(9));

        assert_eq!(arena.explosives().count(), 0);
        assert_eq!(arena.ship(1).expect("owner").sweeps, 1);
        assert!(arena.grenade(ids[1]).is_none());
    }

    #[test]
    fn when_colliding_with_destroyed_grenade_then_call_is_ignored() {
        let mut arena = arena();
        let ids = arena.spawn_volley(1);
        arena.on_collision(ids[0], CollisionBody::StaticSurface);

        assert!(!arena.on_collision(ids[0], CollisionBody::StaticSurface));
        assert!(!arena.expire(ids[0]));
    }

    #[test]
    fn when_owner_leaves_then_its_grenades_are_removed() {
        let mut arena = arena();
        arena.spawn_volley(1);
        arena.spawn_volley(2);

        arena.remove_ship(1);

        assert!(arena.grenades().all(|g| g.owner == 2));
        assert_eq!(arena.grenades().count(), 3);
    }
}
