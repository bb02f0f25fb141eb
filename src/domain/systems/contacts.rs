use crate::domain::arena::Arena;
use crate::domain::geometry::TrackGeometry;
use crate::domain::grenade::CollisionBody;
use crate::domain::state::GrenadeId;
use glam::Vec3;

#[derive(Debug, Clone, Copy)]
pub struct ContactConfig {
    pub grenade_radius: f32,
    pub ship_radius: f32,
    pub explosive_radius: f32,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            grenade_radius: 0.25,
            ship_radius: 1.5,
            explosive_radius: 0.75,
        }
    }
}

/// Finds grenade contacts against ships, explosives and the box geometry.
///
/// Triggers (ships, explosives) win over solid geometry; at most one contact per
/// grenade per step. Grenades sinking into the floor are pushed back onto it.
pub fn detect_contacts(
    arena: &mut Arena<TrackGeometry>,
    cfg: ContactConfig,
) -> Vec<(GrenadeId, CollisionBody)> {
    let floor = arena.env().floor_height + cfg.grenade_radius;
    let ship_hit = cfg.ship_radius + cfg.grenade_radius;
    let explosive_hit = cfg.explosive_radius + cfg.grenade_radius;

    let mut contacts = Vec::new();
    let mut settle = Vec::new();

    // Naive O(G*(S+X+W)); volleys are small.
    for g in arena.grenades() {
        let ship = arena.ships().find(|s| {
            s.id != g.owner && s.pose.position.distance_squared(g.position) <= ship_hit * ship_hit
        });
        if let Some(ship) = ship {
            contacts.push((g.id, CollisionBody::Ship(Some(ship.id))));
            continue;
        }

        let explosive = arena.explosives().find(|x| {
            x.position.distance_squared(g.position) <= explosive_hit * explosive_hit
        });
        if let Some(explosive) = explosive {
            contacts.push((g.id, CollisionBody::Explosive(explosive.id)));
            continue;
        }

        let in_wall = arena
            .env()
            .walls
            .iter()
            .any(|wall| wall.expanded(cfg.grenade_radius).contains(g.position));
        if in_wall {
            contacts.push((g.id, CollisionBody::StaticSurface));
            continue;
        }

        if g.position.y <= floor && g.velocity.y < 0.0 {
            settle.push(g.id);
            contacts.push((g.id, CollisionBody::Floor { normal: Vec3::Y }));
        }
    }

    for id in settle {
        if let Some(g) = arena.grenade_mut(id) {
            g.position.y = floor;
            g.velocity.y = 0.0;
        }
    }
    contacts
}
