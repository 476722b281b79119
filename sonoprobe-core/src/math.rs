//! Math types for SonoProbe

pub use glam::{Quat, Vec3};

/// Distances below this are treated as "same point".
pub const POSITION_EPSILON: f32 = 1.0e-3;

/// Unit direction and distance from `from` to `to`.
///
/// Returns `None` when the two points are closer than [`POSITION_EPSILON`],
/// where the direction is undefined.
pub fn direction_and_distance(from: Vec3, to: Vec3) -> Option<(Vec3, f32)> {
    let delta = to - from;
    let distance = delta.length();
    if !distance.is_finite() || distance < POSITION_EPSILON {
        return None;
    }
    Some((delta / distance, distance))
}

/// Rotation taking local `+Z` onto `forward` (which must be normalized).
pub fn rotation_onto(forward: Vec3) -> Quat {
    Quat::from_rotation_arc(Vec3::Z, forward)
}
