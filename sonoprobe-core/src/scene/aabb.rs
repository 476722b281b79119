//! Axis-aligned box scene.
//!
//! A small reference [`RayTracer`] built from world-space boxes. It is what the
//! demo and the scenario tests probe against, and is a reasonable stand-in for
//! blockout geometry before a real physics backend is wired up.

use crate::error::Result;
use crate::math::Vec3;
use crate::scene::layer::LayerMask;
use crate::scene::ray_tracer::{RayHit, RayTracer};

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Builds a box from two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test. Returns the entry distance along the ray, or `None` if the
    /// ray misses the box within `max_distance`. A ray starting inside the
    /// box hits at distance 0.
    pub fn intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < f32::EPSILON {
                // Parallel to this slab: either always inside it or never.
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t1 = (lo - o) * inv;
            let mut t2 = (hi - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    /// Outward normal of the face closest to `point`.
    fn face_normal(&self, point: Vec3) -> Vec3 {
        let half_extents = ((self.max - self.min) * 0.5).max(Vec3::splat(f32::EPSILON));
        let relative = (point - self.center()) / half_extents;
        let abs_relative = relative.abs();

        if abs_relative.x >= abs_relative.y && abs_relative.x >= abs_relative.z {
            Vec3::new(relative.x.signum(), 0.0, 0.0)
        } else if abs_relative.y >= abs_relative.z {
            Vec3::new(0.0, relative.y.signum(), 0.0)
        } else {
            Vec3::new(0.0, 0.0, relative.z.signum())
        }
    }
}

/// One face of an axis-aligned room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    fn axis_and_sign(self) -> (usize, f32) {
        match self {
            Face::PosX => (0, 1.0),
            Face::NegX => (0, -1.0),
            Face::PosY => (1, 1.0),
            Face::NegY => (1, -1.0),
            Face::PosZ => (2, 1.0),
            Face::NegZ => (2, -1.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SceneBox {
    aabb: Aabb,
    layers: LayerMask,
}

/// Scene made of axis-aligned boxes, each on one or more layers.
#[derive(Debug, Clone, Default)]
pub struct AabbScene {
    boxes: Vec<SceneBox>,
}

impl AabbScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a box on every layer.
    pub fn add_box(&mut self, aabb: Aabb) -> &mut Self {
        self.add_box_on_layers(aabb, LayerMask::ALL)
    }

    pub fn add_box_on_layers(&mut self, aabb: Aabb, layers: LayerMask) -> &mut Self {
        self.boxes.push(SceneBox { aabb, layers });
        self
    }

    /// Adds the walls of a hollow room.
    ///
    /// `half_extents` describes the interior; walls are `thickness` thick and
    /// overlap at the edges so there are no corner gaps. Faces listed in
    /// `open` are left out.
    pub fn add_room(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        thickness: f32,
        open: &[Face],
    ) -> &mut Self {
        let outer = half_extents + Vec3::splat(thickness);
        for face in Face::ALL {
            if open.contains(&face) {
                continue;
            }
            let (axis, sign) = face.axis_and_sign();
            let mut wall_center = center;
            wall_center[axis] += sign * (half_extents[axis] + thickness * 0.5);
            let mut wall_half = outer;
            wall_half[axis] = thickness * 0.5;
            self.add_box(Aabb::from_center(wall_center, wall_half));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl RayTracer for AabbScene {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Result<Option<RayHit>> {
        let closest = self
            .boxes
            .iter()
            .filter(|b| b.layers.intersects(layers))
            .filter_map(|b| {
                b.aabb
                    .intersect(origin, direction, max_distance)
                    .map(|t| (t, b.aabb))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        Ok(closest.map(|(distance, aabb)| {
            let point = origin + direction * distance;
            RayHit::new(distance, point, aabb.face_normal(point))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_intersection() {
        let hit = unit_box().intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 10.0);
        assert!((hit.unwrap() - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_aabb_miss() {
        assert!(unit_box().intersect(Vec3::new(5.0, 0.0, 0.0), Vec3::Y, 10.0).is_none());
        // Pointing away
        assert!(unit_box().intersect(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z, 10.0).is_none());
        // Too short
        assert!(unit_box().intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 3.0).is_none());
    }

    #[test]
    fn test_aabb_origin_inside() {
        assert_eq!(unit_box().intersect(Vec3::ZERO, Vec3::X, 10.0), Some(0.0));
    }

    #[test]
    fn test_scene_closest_hit_and_normal() {
        let mut scene = AabbScene::new();
        scene
            .add_box(Aabb::new(Vec3::new(-1.0, -1.0, 8.0), Vec3::new(1.0, 1.0, 9.0)))
            .add_box(Aabb::new(Vec3::new(-1.0, -1.0, 3.0), Vec3::new(1.0, 1.0, 4.0)));

        let hit = scene
            .cast_ray(Vec3::ZERO, Vec3::Z, 20.0, LayerMask::ALL)
            .unwrap()
            .unwrap();
        assert!((hit.distance - 3.0).abs() < 1e-5);
        assert!((hit.point - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
        assert_eq!(hit.normal, -Vec3::Z);
    }

    #[test]
    fn test_scene_layers() {
        let mut scene = AabbScene::new();
        scene.add_box_on_layers(unit_box(), LayerMask::layer(2));
        let origin = Vec3::new(0.0, 0.0, -5.0);

        assert!(scene.cast_ray(origin, Vec3::Z, 10.0, LayerMask::layer(1)).unwrap().is_none());
        assert!(scene.cast_ray(origin, Vec3::Z, 10.0, LayerMask::layer(2)).unwrap().is_some());
    }

    #[test]
    fn test_add_room_encloses_center() {
        let mut scene = AabbScene::new();
        scene.add_room(Vec3::ZERO, Vec3::splat(5.0), 0.5, &[Face::PosX]);
        assert_eq!(scene.len(), 5);

        for dir in [-Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z] {
            let hit = scene.cast_ray(Vec3::ZERO, dir, 20.0, LayerMask::ALL).unwrap();
            assert!((hit.unwrap().distance - 5.0).abs() < 1e-4, "dir {:?}", dir);
        }
        assert!(scene.cast_ray(Vec3::ZERO, Vec3::X, 20.0, LayerMask::ALL).unwrap().is_none());
    }
}
