// Box-based static level geometry used by the session host.

use crate::domain::ports::Environment;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Slab test for the segment `from`..`to`.
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let dir = to - from;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        for axis in 0..3 {
            let (origin, delta) = (from[axis], dir[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if delta.abs() < f32::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }

            let inv = 1.0 / delta;
            let (mut t0, mut t1) = ((lo - origin) * inv, (hi - origin) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// A stretch of track with its own up axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSection {
    pub bounds: Aabb,
    pub up: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackGeometry {
    pub floor_height: f32,
    pub walls: Vec<Aabb>,
    pub sections: Vec<TrackSection>,
}

impl TrackGeometry {
    /// Flat straight track along Z with a wall on each side.
    pub fn straight(half_width: f32, half_length: f32) -> Self {
        let wall_height = 10.0;
        let left = Aabb::new(
            Vec3::new(-half_width - 1.0, 0.0, -half_length),
            Vec3::new(-half_width, wall_height, half_length),
        );
        let right = Aabb::new(
            Vec3::new(half_width, 0.0, -half_length),
            Vec3::new(half_width + 1.0, wall_height, half_length),
        );
        let section = TrackSection {
            bounds: Aabb::new(
                Vec3::new(-half_width, -wall_height, -half_length),
                Vec3::new(half_width, wall_height * 5.0, half_length),
            ),
            up: Vec3::Y,
        };

        Self {
            floor_height: 0.0,
            walls: vec![left, right],
            sections: vec![section],
        }
    }
}

impl Environment for TrackGeometry {
    fn linecast(&self, from: Vec3, to: Vec3) -> bool {
        if from.y.min(to.y) < self.floor_height {
            return true;
        }
        self.walls
            .iter()
            .any(|wall| wall.intersects_segment(from, to))
    }

    fn track_up(&self, position: Vec3) -> Option<Vec3> {
        self.sections
            .iter()
            .find(|section| section.bounds.contains(position))
            .map(|section| section.up)
    }
}
