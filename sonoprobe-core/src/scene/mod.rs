//! Scene queries for acoustic probing.
//!
//! The scanners never touch geometry directly. Every ray goes through the
//! [`RayTracer`] trait, which hosts implement on top of their physics engine.
//!
//! # Overview
//!
//! 1. **RayTracer** - Trait for providing closest-hit ray queries
//! 2. **LayerMask** - Which geometry layers a query may hit
//! 3. **probe_directions** - Resolves a whole sample set against a tracer
//! 4. **AabbScene** - Reference tracer built from axis-aligned boxes
//!
//! # Example
//!
//! ```
//! use sonoprobe_core::math::Vec3;
//! use sonoprobe_core::scene::{AabbScene, Face, LayerMask, RayTracer};
//!
//! // A 10 x 10 x 10 room with its +X wall missing
//! let mut scene = AabbScene::new();
//! scene.add_room(Vec3::ZERO, Vec3::splat(5.0), 0.5, &[Face::PosX]);
//!
//! let hit = scene.cast_ray(Vec3::ZERO, Vec3::Y, 20.0, LayerMask::ALL).unwrap();
//! assert!(hit.is_some());
//! let open = scene.cast_ray(Vec3::ZERO, Vec3::X, 20.0, LayerMask::ALL).unwrap();
//! assert!(open.is_none());
//! ```

pub mod aabb;
pub mod layer;
pub mod ray_tracer;

pub use aabb::{Aabb, AabbScene, Face};
pub use layer::LayerMask;
pub use ray_tracer::{ProbeResult, RayHit, RayTracer, probe_directions};
