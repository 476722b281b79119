//! Listener-centered room characterization.
//!
//! A sphere of rays around the listener measures how enclosed the space is
//! (fraction of rays that hit something) and how big it is (typical distance
//! to the nearest surface).

use super::{ScanContext, ScanPass, ScanStrategy, Scanner};
use crate::config::{DistanceAggregate, RoomScannerDesc};
use crate::error::Result;
use crate::params::{InstanceId, ParameterSink, ParameterTarget};
use crate::sampling::{SampleSet, ScanShape};
use crate::scene::{ProbeResult, probe_directions};
use crate::smoothing::Blend;

/// Where a room scanner writes its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomScanMode {
    /// Scene-wide parameters
    Global,
    /// Parameters of one event instance only
    Local(InstanceId),
}

impl RoomScanMode {
    pub fn target(&self) -> ParameterTarget {
        match self {
            Self::Global => ParameterTarget::Global,
            Self::Local(instance) => ParameterTarget::Instance(*instance),
        }
    }
}

/// Smoothed room characterization
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoomEstimate {
    /// 0 = open field, 1 = fully enclosed
    pub enclosure_factor: f32,
    /// Meters, at most the scan's max range
    pub room_size: f32,
}

impl Blend for RoomEstimate {
    fn blend(self, target: Self, t: f32) -> Self {
        Self {
            enclosure_factor: self.enclosure_factor.blend(target.enclosure_factor, t),
            room_size: self.room_size.blend(target.room_size, t),
        }
    }
}

/// Raw measurements of one room scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomAggregate {
    pub hits: usize,
    pub samples: usize,
    /// `hits / samples`
    pub enclosure_raw: f32,
    /// Mean or median ray distance, misses counted as max range
    pub aggregate_distance: f32,
}

/// Sphere-sampling strategy behind [`RoomScanner`]
#[derive(Debug)]
pub struct RoomScan {
    desc: RoomScannerDesc,
    mode: RoomScanMode,
    samples: Option<SampleSet>,
    probes: Vec<ProbeResult>,
    distances: Vec<f32>,
}

impl RoomScan {
    pub fn new(desc: RoomScannerDesc, mode: RoomScanMode) -> Self {
        Self {
            desc,
            mode,
            samples: None,
            probes: Vec::new(),
            distances: Vec::new(),
        }
    }

    pub fn desc(&self) -> &RoomScannerDesc {
        &self.desc
    }

    pub fn mode(&self) -> RoomScanMode {
        self.mode
    }

    fn aggregate_distance(&mut self) -> f32 {
        let max_range = self.desc.max_range;
        self.distances.clear();
        self.distances.extend(
            self.probes
                .iter()
                .map(|probe| probe.distance_or(max_range).min(max_range)),
        );
        if self.distances.is_empty() {
            return max_range;
        }

        match self.desc.distance_aggregate {
            DistanceAggregate::Mean => {
                self.distances.iter().sum::<f32>() / self.distances.len() as f32
            }
            DistanceAggregate::Median => {
                self.distances.sort_by(|a, b| a.total_cmp(b));
                let mid = self.distances.len() / 2;
                if self.distances.len() % 2 == 0 {
                    (self.distances[mid - 1] + self.distances[mid]) * 0.5
                } else {
                    self.distances[mid]
                }
            }
        }
    }
}

impl ScanStrategy for RoomScan {
    type Estimate = RoomEstimate;
    type Raw = RoomAggregate;

    fn label(&self) -> String {
        match self.mode {
            RoomScanMode::Global => "Room".to_string(),
            RoomScanMode::Local(instance) => format!("Room[{}]", instance),
        }
    }

    fn is_configured(&self) -> bool {
        self.desc.sample_count > 0 && self.desc.max_range.is_finite() && self.desc.max_range > 0.0
    }

    fn scan(&mut self, ctx: &ScanContext<'_>) -> Result<ScanPass<RoomAggregate, RoomEstimate>> {
        let max_range = self.desc.max_range;
        let set = SampleSet::ensure(&mut self.samples, self.desc.sample_count, ScanShape::Sphere);
        let queries = probe_directions(
            ctx.tracer,
            ctx.listener,
            set.directions().iter().copied(),
            max_range,
            self.desc.layers,
            &mut self.probes,
        )?;

        let samples = self.probes.len();
        let hits = self.probes.iter().filter(|probe| probe.is_hit()).count();
        let enclosure_raw = if samples == 0 {
            0.0
        } else {
            hits as f32 / samples as f32
        };
        let aggregate_distance = self.aggregate_distance();

        let enclosure_factor = self.desc.enclosure_curve.evaluate(enclosure_raw).clamp(0.0, 1.0);
        let room_size = (self.desc.room_size_curve.evaluate(aggregate_distance / max_range)
            * max_range)
            .clamp(0.0, max_range);

        Ok(ScanPass {
            raw: RoomAggregate {
                hits,
                samples,
                enclosure_raw,
                aggregate_distance,
            },
            target: RoomEstimate {
                enclosure_factor,
                room_size,
            },
            queries,
        })
    }

    fn publish(&self, estimate: &RoomEstimate, sink: &mut dyn ParameterSink) -> Result<()> {
        let target = self.mode.target();
        sink.set_parameter(target, &self.desc.parameters.enclosure, estimate.enclosure_factor)?;
        sink.set_parameter(
            target,
            &self.desc.parameters.room_size,
            estimate.room_size / self.desc.max_range,
        )
    }
}

/// Room characterization scanner
pub type RoomScanner = Scanner<RoomScan>;

impl Scanner<RoomScan> {
    pub fn new(desc: RoomScannerDesc, mode: RoomScanMode) -> Self {
        let interval = desc.scan_interval;
        let smoothing_time = desc.smoothing_time;
        let gate = desc.gate;
        Scanner::with_strategy(RoomScan::new(desc, mode), interval, smoothing_time, gate)
    }

    pub fn mode(&self) -> RoomScanMode {
        self.strategy().mode()
    }
}
