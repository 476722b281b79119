//! Real-time acoustic estimation by geometric probing.
//!
//! SonoProbe turns a handful of ray queries per scan into smooth audio
//! parameters: how enclosed the listener is, how large the space around them
//! is, and how occluded (and how muffled) every source is.
//!
//! - [`scanner::RoomScanner`] samples a sphere around the listener.
//! - [`scanner::OcclusionScanner`] samples a cone from a source toward the listener.
//! - [`SonoProbeWorld`] owns both kinds of scanner and drives them from one
//!   `update(dt)` call per frame.
//!
//! Geometry comes from the host through [`RayTracer`]; results go out through
//! a [`params::ParameterSink`].
//!
//! ```
//! use sonoprobe_core::gate::AlwaysAudible;
//! use sonoprobe_core::math::Vec3;
//! use sonoprobe_core::params::ParameterStore;
//! use sonoprobe_core::scanner::{RoomScanMode, RoomScanner, ScanContext};
//! use sonoprobe_core::scene::{AabbScene, Face};
//! use sonoprobe_core::RoomScannerDesc;
//!
//! let mut scene = AabbScene::new();
//! scene.add_room(Vec3::ZERO, Vec3::splat(5.0), 0.5, &[Face::NegZ]);
//!
//! let mut scanner = RoomScanner::new(RoomScannerDesc::default(), RoomScanMode::Global);
//! let mut params = ParameterStore::new();
//! let ctx = ScanContext::new(Vec3::ZERO, Vec3::ZERO, &AlwaysAudible, &scene);
//! scanner.tick(1.0 / 60.0, &ctx, &mut params);
//!
//! let room = scanner.estimate().unwrap();
//! assert!(room.enclosure_factor > 0.8);
//! assert_eq!(params.global("enclosure"), Some(room.enclosure_factor));
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod math;
pub mod params;
pub mod sampling;
pub mod scanner;
pub mod scene;
pub mod smoothing;
pub mod world;

pub use config::{
    DiffractionDesc, DistanceAggregate, OcclusionScannerDesc, ResponseCurve, RoomScannerDesc,
    SonoProbeWorldDesc,
};
pub use error::SonoProbeError;
pub use events::TickOutcome;
pub use gate::{ActivityFlag, ActivityGate, AudioActivity, GateDecision};
pub use params::{ChannelParameterSink, InstanceId, ParameterSink, ParameterStore};
pub use scanner::{OcclusionEstimate, OcclusionScanner, RoomEstimate, RoomScanMode, RoomScanner};
pub use scene::{LayerMask, RayHit, RayTracer};
pub use world::{SonoProbeWorld, SourceId, UpdateReport};
