//! Ray tracing callback trait for acoustic probing.
//!
//! This module provides the interface hosts implement to let the scanners query
//! scene geometry, plus the batch probe helper the scanners use to resolve a
//! whole sample set in one go.

use crate::error::Result;
use crate::math::Vec3;
use crate::scene::layer::LayerMask;
use std::sync::Arc;

/// Closest intersection of a ray with scene geometry.
///
/// Returned by `RayTracer::cast_ray()` wrapped in `Some` when the ray hit
/// something within the requested distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from ray origin to hit point (in meters)
    pub distance: f32,

    /// Hit point in world space
    pub point: Vec3,

    /// Surface normal at the hit point (normalized, pointing away from the surface)
    pub normal: Vec3,
}

impl RayHit {
    /// Creates a hit result
    pub fn new(distance: f32, point: Vec3, normal: Vec3) -> Self {
        Self {
            distance,
            point,
            normal,
        }
    }

    /// Creates a hit result at `distance` along a ray, deriving the hit point
    pub fn along(origin: Vec3, direction: Vec3, distance: f32, normal: Vec3) -> Self {
        Self::new(distance, origin + direction * distance, normal)
    }
}

/// Trait for providing scene ray queries to the acoustic scanners.
///
/// Implement this trait to connect your physics engine, BVH or GPU tracer.
/// One call is made per sample direction per scan, so a scan costs N (room) or
/// M + 1 (occlusion) calls.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: several scanners may query the same
/// tracer, and hosts are free to tick scanners from more than one thread.
/// Queries must not mutate observable scene state.
///
/// # Example
///
/// ```
/// use sonoprobe_core::math::Vec3;
/// use sonoprobe_core::scene::{LayerMask, RayHit, RayTracer};
///
/// /// Infinite floor plane at y = 0.
/// struct FloorTracer;
///
/// impl RayTracer for FloorTracer {
///     fn cast_ray(
///         &self,
///         origin: Vec3,
///         direction: Vec3,
///         max_distance: f32,
///         _layers: LayerMask,
///     ) -> sonoprobe_core::error::Result<Option<RayHit>> {
///         if direction.y >= 0.0 || origin.y < 0.0 {
///             return Ok(None);
///         }
///         let t = origin.y / -direction.y;
///         Ok((t <= max_distance).then(|| RayHit::along(origin, direction, t, Vec3::Y)))
///     }
/// }
///
/// let hit = FloorTracer
///     .cast_ray(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 10.0, LayerMask::ALL)
///     .unwrap()
///     .unwrap();
/// assert_eq!(hit.distance, 2.0);
/// ```
pub trait RayTracer: Send + Sync {
    /// Test if a ray intersects any geometry on the given layers.
    ///
    /// # Parameters
    ///
    /// * `origin` - Ray starting position in world space (meters)
    /// * `direction` - Ray direction (normalized)
    /// * `max_distance` - Maximum ray distance to test (meters)
    /// * `layers` - Geometry layers the ray may hit
    ///
    /// # Returns
    ///
    /// * `Ok(Some(hit))` - the **closest** hit within `max_distance`
    /// * `Ok(None)` - nothing was hit
    /// * `Err(SonoProbeError::QueryUnavailable)` - the backend cannot answer
    ///   right now (scene streaming, physics world locked, ...)
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Result<Option<RayHit>>;
}

impl<T: RayTracer + ?Sized> RayTracer for &T {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Result<Option<RayHit>> {
        (**self).cast_ray(origin, direction, max_distance, layers)
    }
}

impl<T: RayTracer + ?Sized> RayTracer for Arc<T> {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Result<Option<RayHit>> {
        (**self).cast_ray(origin, direction, max_distance, layers)
    }
}

/// Outcome of probing one sample direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub direction: Vec3,
    pub hit: Option<RayHit>,
}

impl ProbeResult {
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }

    /// Hit distance, or `fallback` for a miss
    pub fn distance_or(&self, fallback: f32) -> f32 {
        self.hit.map_or(fallback, |hit| hit.distance)
    }
}

/// Probe every direction from `origin`, writing results into `out`.
///
/// `out` is cleared first and reused between scans so steady-state scanning
/// does not allocate. On error `out` may hold a partial batch; callers must
/// discard it. Returns the number of queries issued.
pub fn probe_directions(
    tracer: &dyn RayTracer,
    origin: Vec3,
    directions: impl IntoIterator<Item = Vec3>,
    max_distance: f32,
    layers: LayerMask,
    out: &mut Vec<ProbeResult>,
) -> Result<usize> {
    out.clear();
    for direction in directions {
        let hit = tracer
            .cast_ray(origin, direction, max_distance, layers)?
            .filter(|hit| hit.distance <= max_distance);
        out.push(ProbeResult { direction, hit });
    }
    Ok(out.len())
}
