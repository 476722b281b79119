//! Deterministic ray direction sampling.
//!
//! Both scan shapes use a golden-ratio (Fibonacci) lattice: sample `i` gets an
//! azimuth of `i * 2π * φ` and an evenly stepped polar coordinate. This spreads
//! a few dozen directions almost uniformly with no iteration or randomness, so
//! the same inputs always give the same scan.
//!
//! - [`ScanShape::Sphere`] covers the whole sphere, for room characterization.
//! - [`ScanShape::Cone`] covers a spherical cap around local `+Z`, for
//!   occlusion. Rotate it onto the probing direction with
//!   [`rotation_onto`](crate::math::rotation_onto).

use crate::math::{Quat, Vec3};
use std::f64::consts::PI;

/// (1 + √5) / 2
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Shape of the region a sample set covers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanShape {
    /// Full sphere
    Sphere,
    /// Cap of directions within `half_angle` radians of local `+Z`
    Cone { half_angle: f32 },
}

/// Generate `sample_count` unit directions for `shape`.
///
/// A count of zero yields an empty vector.
pub fn generate(sample_count: usize, shape: ScanShape) -> Vec<Vec3> {
    match shape {
        ScanShape::Sphere => (0..sample_count)
            .map(|i| sphere_direction(i, sample_count))
            .collect(),
        ScanShape::Cone { half_angle } => {
            let half_angle = if half_angle.is_finite() {
                f64::from(half_angle).clamp(0.0, PI)
            } else {
                0.0
            };
            (0..sample_count)
                .map(|i| cone_direction(i, sample_count, half_angle))
                .collect()
        }
    }
}

fn golden_azimuth(i: usize) -> f64 {
    // Only the fractional turn matters; wrapping keeps precision for large i.
    let turns = (i as f64 * GOLDEN_RATIO).fract();
    turns * 2.0 * PI
}

fn from_spherical(cos_inclination: f64, azimuth: f64) -> Vec3 {
    let sin_inclination = (1.0 - cos_inclination * cos_inclination).max(0.0).sqrt();
    Vec3::new(
        (sin_inclination * azimuth.cos()) as f32,
        (sin_inclination * azimuth.sin()) as f32,
        cos_inclination as f32,
    )
    .normalize()
}

fn sphere_direction(i: usize, n: usize) -> Vec3 {
    let t = i as f64 / n as f64;
    // inclination = acos(1 - 2t)
    from_spherical(1.0 - 2.0 * t, golden_azimuth(i))
}

fn cone_direction(i: usize, n: usize, half_angle: f64) -> Vec3 {
    // Centered offsets keep every sample off the axis; the center ray is probed separately.
    let t = (i as f64 + 0.5) / n as f64;
    let cos_inclination = 1.0 - t * (1.0 - half_angle.cos());
    from_spherical(cos_inclination, golden_azimuth(i))
}

/// Ordered directions plus the parameters that produced them.
///
/// Scanners keep one of these per instance and only regenerate it when the
/// sample count or shape changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    shape: ScanShape,
    directions: Vec<Vec3>,
}

impl SampleSet {
    pub fn new(sample_count: usize, shape: ScanShape) -> Self {
        Self {
            shape,
            directions: generate(sample_count, shape),
        }
    }

    /// Returns the cached set in `slot`, regenerating it if the count or shape differs.
    pub fn ensure(slot: &mut Option<SampleSet>, sample_count: usize, shape: ScanShape) -> &SampleSet {
        let set = match slot.take() {
            Some(set) if set.matches(sample_count, shape) => set,
            _ => {
                log::trace!("Generating {} scan directions for {:?}", sample_count, shape);
                SampleSet::new(sample_count, shape)
            }
        };
        slot.insert(set)
    }

    pub fn matches(&self, sample_count: usize, shape: ScanShape) -> bool {
        self.directions.len() == sample_count && self.shape == shape
    }

    pub fn shape(&self) -> ScanShape {
        self.shape
    }

    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    /// Directions rotated into world space
    pub fn rotated(&self, rotation: Quat) -> impl Iterator<Item = Vec3> + '_ {
        self.directions.iter().map(move |&d| rotation * d)
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_count_and_unit_length() {
        for n in [1, 2, 7, 32, 50, 128] {
            let dirs = generate(n, ScanShape::Sphere);
            assert_eq!(dirs.len(), n);
            for d in &dirs {
                assert!((d.length() - 1.0).abs() < 1e-5, "n={} d={:?}", n, d);
            }
        }
    }

    #[test]
    fn test_sphere_directions_distinct() {
        for n in [2, 6, 32, 100, 256] {
            let dirs = generate(n, ScanShape::Sphere);
            for i in 0..n {
                for j in (i + 1)..n {
                    assert!(
                        dirs[i].distance(dirs[j]) > 1e-3,
                        "n={} duplicate at {} and {}",
                        n,
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn test_sphere_first_sample_is_pole() {
        let dirs = generate(32, ScanShape::Sphere);
        assert!((dirs[0] - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_sphere_roughly_balanced() {
        // Each hemisphere along each axis should get about half of the samples.
        let dirs = generate(64, ScanShape::Sphere);
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let positive = dirs.iter().filter(|d| d.dot(axis) > 0.0).count();
            assert!((26..=38).contains(&positive), "axis {:?}: {}", axis, positive);
        }
    }

    #[test]
    fn test_zero_samples_is_empty() {
        assert!(generate(0, ScanShape::Sphere).is_empty());
        assert!(generate(0, ScanShape::Cone { half_angle: 0.3 }).is_empty());
    }

    #[test]
    fn test_cone_within_half_angle() {
        let half_angle = 15.0_f32.to_radians();
        let dirs = generate(8, ScanShape::Cone { half_angle });
        assert_eq!(dirs.len(), 8);
        for d in &dirs {
            assert!((d.length() - 1.0).abs() < 1e-5);
            let angle = d.dot(Vec3::Z).clamp(-1.0, 1.0).acos();
            assert!(angle <= half_angle + 1e-4, "angle {} > {}", angle, half_angle);
            assert!(angle > 0.0, "cone samples must stay off the axis");
        }
    }

    #[test]
    fn test_cone_clamps_half_angle() {
        let dirs = generate(6, ScanShape::Cone { half_angle: f32::NAN });
        assert!(dirs.iter().all(|d| (*d - Vec3::Z).length() < 1e-5));

        let wide = generate(16, ScanShape::Cone { half_angle: 10.0 });
        assert!(wide.iter().all(|d| (d.length() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let shape = ScanShape::Cone { half_angle: 0.4 };
        assert_eq!(generate(12, shape), generate(12, shape));
        assert_eq!(generate(40, ScanShape::Sphere), generate(40, ScanShape::Sphere));
    }

    #[test]
    fn test_sample_set_cache() {
        let mut slot = None;
        let first = SampleSet::ensure(&mut slot, 8, ScanShape::Sphere).clone();
        assert_eq!(first.len(), 8);

        // Same parameters keep the cached set, without regenerating it
        let cached = slot.as_ref().map(|set| set.directions().as_ptr());
        let again = SampleSet::ensure(&mut slot, 8, ScanShape::Sphere);
        assert_eq!(again, &first);
        assert_eq!(Some(again.directions().as_ptr()), cached);

        // Changed count regenerates
        assert_eq!(SampleSet::ensure(&mut slot, 5, ScanShape::Sphere).len(), 5);

        // Changed shape regenerates
        let cone = SampleSet::ensure(&mut slot, 8, ScanShape::Cone { half_angle: 0.2 });
        assert_eq!(cone.shape(), ScanShape::Cone { half_angle: 0.2 });
        assert!(cone.matches(8, ScanShape::Cone { half_angle: 0.2 }));
        assert!(!cone.matches(9, ScanShape::Cone { half_angle: 0.2 }));
    }

    #[test]
    fn test_rotated_cone_points_at_target() {
        let forward = Vec3::new(1.0, 1.0, 0.0).normalize();
        let set = SampleSet::new(6, ScanShape::Cone { half_angle: 0.2 });
        for d in set.rotated(crate::math::rotation_onto(forward)) {
            assert!(d.dot(forward) >= 0.2_f32.cos() - 1e-4);
        }
    }
}
