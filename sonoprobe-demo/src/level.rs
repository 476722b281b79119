use sonoprobe_core::math::Vec3;
use sonoprobe_core::scene::{Aabb, AabbScene, Face};

/// Interior half extents of the hall
pub const HALL_HALF: Vec3 = Vec3::new(6.0, 3.0, 6.0);
pub const WALL: f32 = 0.3;

/// A hall with a doorway in its -Z wall, and a free-standing wall outside.
///
/// ```text
///            +Z
///   +----------------+
///   |      hall      |
///   |   (radio)      |
///   +------  --------+   <- doorway, x in [-1, 1]
///
///        ======          <- garden wall at z = -12
///       (fountain)
/// ```
pub fn build() -> AabbScene {
    let mut scene = AabbScene::new();
    scene.add_room(Vec3::ZERO, HALL_HALF, WALL, &[Face::NegZ]);

    let outer = HALL_HALF + Vec3::splat(WALL);
    let z0 = -outer.z;
    let z1 = -HALL_HALF.z;
    scene.add_box(Aabb::new(
        Vec3::new(-outer.x, -outer.y, z0),
        Vec3::new(-1.0, outer.y, z1),
    ));
    scene.add_box(Aabb::new(
        Vec3::new(1.0, -outer.y, z0),
        Vec3::new(outer.x, outer.y, z1),
    ));
    // Lintel above the doorway
    scene.add_box(Aabb::new(
        Vec3::new(-1.0, 1.0, z0),
        Vec3::new(1.0, outer.y, z1),
    ));

    // Garden wall hiding the fountain
    scene.add_box(Aabb::new(Vec3::new(-4.0, -3.0, -12.2), Vec3::new(4.0, 1.5, -11.8)));
    // Ground outside
    scene.add_box(Aabb::new(Vec3::new(-60.0, -3.6, -60.0), Vec3::new(60.0, -3.3, 60.0)));

    scene
}

pub const RADIO: Vec3 = Vec3::new(3.0, -1.0, 3.0);
pub const FOUNTAIN: Vec3 = Vec3::new(0.0, -2.0, -15.0);

/// Listener path: across the hall, out through the doorway, around the garden wall
pub const WAYPOINTS: [Vec3; 5] = [
    Vec3::new(-3.0, 0.0, 4.0),
    Vec3::new(0.0, 0.0, -3.0),
    Vec3::new(0.0, 0.0, -9.0),
    Vec3::new(6.0, 0.0, -12.0),
    Vec3::new(3.0, 0.0, -17.0),
];

/// Position along the path after walking `distance` meters
pub fn position_along(distance: f32) -> Vec3 {
    let mut remaining = distance.max(0.0);
    for pair in WAYPOINTS.windows(2) {
        let segment = pair[1] - pair[0];
        let length = segment.length();
        if remaining <= length {
            return pair[0] + segment * (remaining / length);
        }
        remaining -= length;
    }
    WAYPOINTS[WAYPOINTS.len() - 1]
}

/// Total path length in meters
pub fn path_length() -> f32 {
    WAYPOINTS
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}
