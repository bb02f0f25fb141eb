// Small vector helpers shared by the simulation.

use glam::{Mat3, Quat, Vec3};

/// Mirrors `v` about the plane with normal `normal` (expected to be unit length).
pub fn reflect(v: Vec3, normal: Vec3) -> Vec3 {
    v - 2.0 * v.dot(normal) * normal
}

/// Builds a rotation whose local +Z faces `forward` and whose local +Y leans toward `up`.
///
/// Returns `None` for a zero-length forward vector.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let forward = forward.try_normalize()?;
    let right = up
        .cross(forward)
        .try_normalize()
        .or_else(|| Vec3::Z.cross(forward).try_normalize())
        .or_else(|| Vec3::X.cross(forward).try_normalize())?;
    let up = forward.cross(right);

    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize())
}
