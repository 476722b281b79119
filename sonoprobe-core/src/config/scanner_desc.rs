//! Scanner configuration descriptors.
//!
//! Every field has a tuned default; the chained setters make call sites read
//! like `RoomScannerDesc::default().with_sample_count(48)`.

use crate::config::curve::ResponseCurve;
use crate::gate::ActivityGate;
use crate::scene::LayerMask;

/// How per-ray distances collapse into one room-size figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceAggregate {
    #[default]
    Mean,
    /// Less sensitive to a single doorway or window
    Median,
}

/// Parameter names written by a room scanner
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomParameterNames {
    pub enclosure: String,
    pub room_size: String,
}

impl Default for RoomParameterNames {
    fn default() -> Self {
        Self {
            enclosure: "enclosure".to_string(),
            room_size: "room_size".to_string(),
        }
    }
}

/// Configuration for a listener-centered (or local) room scanner
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomScannerDesc {
    /// Seconds of simulated time between scans
    pub scan_interval: f32,
    /// Smoothing time constant in seconds
    pub smoothing_time: f32,
    /// Rays per scan
    pub sample_count: usize,
    /// Maximum probe distance in meters; misses count as this distance
    pub max_range: f32,
    pub layers: LayerMask,
    pub distance_aggregate: DistanceAggregate,
    /// Applied to the raw hit fraction
    pub enclosure_curve: ResponseCurve,
    /// Applied to the aggregate distance normalized by `max_range`
    pub room_size_curve: ResponseCurve,
    pub gate: ActivityGate,
    pub parameters: RoomParameterNames,
}

impl Default for RoomScannerDesc {
    fn default() -> Self {
        Self {
            scan_interval: 0.2,
            smoothing_time: 0.25,
            sample_count: 32,
            max_range: 20.0,
            layers: LayerMask::ALL,
            distance_aggregate: DistanceAggregate::Mean,
            enclosure_curve: ResponseCurve::Linear,
            room_size_curve: ResponseCurve::Linear,
            gate: ActivityGate::audibility_only(),
            parameters: RoomParameterNames::default(),
        }
    }
}

impl RoomScannerDesc {
    pub fn with_scan_interval(mut self, seconds: f32) -> Self {
        self.scan_interval = seconds;
        self
    }

    pub fn with_smoothing_time(mut self, seconds: f32) -> Self {
        self.smoothing_time = seconds;
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_max_range(mut self, meters: f32) -> Self {
        self.max_range = meters;
        self
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_distance_aggregate(mut self, aggregate: DistanceAggregate) -> Self {
        self.distance_aggregate = aggregate;
        self
    }

    pub fn with_enclosure_curve(mut self, curve: ResponseCurve) -> Self {
        self.enclosure_curve = curve;
        self
    }

    pub fn with_room_size_curve(mut self, curve: ResponseCurve) -> Self {
        self.room_size_curve = curve;
        self
    }

    pub fn with_gate(mut self, gate: ActivityGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_parameters(mut self, parameters: RoomParameterNames) -> Self {
        self.parameters = parameters;
        self
    }

    /// Whether this configuration produces any scans at all
    pub fn is_scanning_enabled(&self) -> bool {
        is_valid_interval(self.scan_interval)
            && self.sample_count > 0
            && self.max_range.is_finite()
            && self.max_range > 0.0
    }
}

/// Diffraction estimate and the low-pass cutoff derived from it
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiffractionDesc {
    pub enabled: bool,
    /// Listener depth behind an obstacle, in meters, that maps to full diffraction
    pub range: f32,
    /// Applied to depth / range
    pub curve: ResponseCurve,
    /// Applied to the diffraction amount before picking the cutoff
    pub cutoff_curve: ResponseCurve,
    pub open_cutoff_hz: f32,
    pub occluded_cutoff_hz: f32,
}

impl Default for DiffractionDesc {
    fn default() -> Self {
        Self {
            enabled: true,
            range: 10.0,
            curve: ResponseCurve::Linear,
            cutoff_curve: ResponseCurve::Linear,
            open_cutoff_hz: 22_000.0,
            occluded_cutoff_hz: 800.0,
        }
    }
}

impl DiffractionDesc {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Low-pass cutoff for a diffraction amount.
    ///
    /// Interpolates in log-frequency so equal steps in the amount sound like
    /// equal steps in muffling.
    pub fn cutoff_hz(&self, diffraction_amount: f32) -> f32 {
        let t = self.cutoff_curve.evaluate(diffraction_amount).clamp(0.0, 1.0);
        let open = self.open_cutoff_hz.max(1.0);
        let occluded = self.occluded_cutoff_hz.max(1.0);
        (open.ln() + (occluded.ln() - open.ln()) * t)
            .exp()
            .clamp(open.min(occluded), open.max(occluded))
    }
}

/// Parameter names written by an occlusion scanner
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OcclusionParameterNames {
    pub occlusion: String,
    pub lowpass_cutoff: String,
}

impl Default for OcclusionParameterNames {
    fn default() -> Self {
        Self {
            occlusion: "occlusion".to_string(),
            lowpass_cutoff: "lowpass_cutoff".to_string(),
        }
    }
}

/// Configuration for a per-source occlusion scanner
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OcclusionScannerDesc {
    /// Seconds of simulated time between scans
    pub scan_interval: f32,
    /// Smoothing time constant in seconds
    pub smoothing_time: f32,
    /// Cone rays per scan (the center ray comes on top)
    pub sample_count: usize,
    /// Cone half angle in radians
    pub cone_half_angle: f32,
    /// Hits closer than this to the listener are ignored while the center ray is clear
    pub near_field_threshold: f32,
    pub layers: LayerMask,
    pub gate: ActivityGate,
    pub diffraction: DiffractionDesc,
    pub parameters: OcclusionParameterNames,
}

impl Default for OcclusionScannerDesc {
    fn default() -> Self {
        Self {
            scan_interval: 0.2,
            smoothing_time: 0.1,
            sample_count: 6,
            cone_half_angle: 15.0_f32.to_radians(),
            near_field_threshold: 0.5,
            layers: LayerMask::ALL,
            gate: ActivityGate::culling(),
            diffraction: DiffractionDesc::default(),
            parameters: OcclusionParameterNames::default(),
        }
    }
}

impl OcclusionScannerDesc {
    pub fn with_scan_interval(mut self, seconds: f32) -> Self {
        self.scan_interval = seconds;
        self
    }

    pub fn with_smoothing_time(mut self, seconds: f32) -> Self {
        self.smoothing_time = seconds;
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_cone_half_angle(mut self, radians: f32) -> Self {
        self.cone_half_angle = radians;
        self
    }

    pub fn with_near_field_threshold(mut self, meters: f32) -> Self {
        self.near_field_threshold = meters;
        self
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_gate(mut self, gate: ActivityGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_diffraction(mut self, diffraction: DiffractionDesc) -> Self {
        self.diffraction = diffraction;
        self
    }

    pub fn with_parameters(mut self, parameters: OcclusionParameterNames) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn is_scanning_enabled(&self) -> bool {
        is_valid_interval(self.scan_interval) && self.sample_count > 0
    }
}

fn is_valid_interval(seconds: f32) -> bool {
    seconds.is_finite() && seconds > 0.0
}
