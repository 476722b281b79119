use crate::config::scanner_desc::{OcclusionScannerDesc, RoomScannerDesc};

/// Configuration descriptor for a SonoProbe world
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SonoProbeWorldDesc {
    /// Listener-centered room scan writing global parameters (None disables it)
    pub room: Option<RoomScannerDesc>,
    /// Occlusion settings used by `add_source`
    pub occlusion: OcclusionScannerDesc,
    /// Maximum number of concurrently tracked sources
    pub max_sources: usize,
}

impl Default for SonoProbeWorldDesc {
    fn default() -> Self {
        Self {
            room: Some(RoomScannerDesc::default()),
            occlusion: OcclusionScannerDesc::default(),
            max_sources: 64,
        }
    }
}

impl SonoProbeWorldDesc {
    pub fn with_room(mut self, room: Option<RoomScannerDesc>) -> Self {
        self.room = room;
        self
    }

    pub fn with_occlusion(mut self, occlusion: OcclusionScannerDesc) -> Self {
        self.occlusion = occlusion;
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }
}
