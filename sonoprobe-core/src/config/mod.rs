//! Configuration descriptors and response curves

pub mod curve;
pub mod scanner_desc;
pub mod world_desc;

pub use curve::ResponseCurve;
pub use scanner_desc::{
    DiffractionDesc, DistanceAggregate, OcclusionParameterNames, OcclusionScannerDesc,
    RoomParameterNames, RoomScannerDesc,
};
pub use world_desc::SonoProbeWorldDesc;
