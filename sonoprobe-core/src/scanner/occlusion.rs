//! Source-centered occlusion and diffraction.
//!
//! A narrow cone of rays is cast from the source toward the listener. The
//! fraction of blocked rays gives the occlusion ratio; how far the listener
//! sits behind the blocking obstacle gives the diffraction amount, which in
//! turn drives a low-pass cutoff.
//!
//! # Near-field correction
//!
//! When the listener stands right next to a wall (or the camera rig clips
//! into one), the outer cone rays graze that wall just before reaching the
//! listener even though the direct path is open. A cone hit closer to the
//! listener than `near_field_threshold` is therefore ignored as long as the
//! center ray is clear.

use super::{ScanContext, ScanPass, ScanStrategy, Scanner};
use crate::config::OcclusionScannerDesc;
use crate::error::Result;
use crate::math::{self, Vec3};
use crate::params::{InstanceId, ParameterSink};
use crate::sampling::{SampleSet, ScanShape};
use crate::scene::{ProbeResult, RayHit, probe_directions};
use crate::smoothing::Blend;

/// Smoothed occlusion state of one source
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OcclusionEstimate {
    /// Fraction of cone rays blocked, in `[0, 1]`
    pub occlusion_ratio: f32,
    /// 0 when unoccluded; grows as the listener moves deeper behind the obstacle
    pub diffraction_amount: f32,
}

impl Blend for OcclusionEstimate {
    fn blend(self, target: Self, t: f32) -> Self {
        Self {
            occlusion_ratio: self.occlusion_ratio.blend(target.occlusion_ratio, t),
            diffraction_amount: self.diffraction_amount.blend(target.diffraction_amount, t),
        }
    }
}

/// Raw classification of one occlusion scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionAggregate {
    pub blocked: usize,
    /// Cone hits discarded by the near-field correction
    pub near_field_ignored: usize,
    pub samples: usize,
    pub center_blocked: bool,
    pub target_distance: f32,
    /// `blocked / samples`
    pub ratio: f32,
    /// Listener depth behind the blocking obstacle nearest to it, `None` unless a cone ray is blocked
    pub obstacle_depth: Option<f32>,
}

impl OcclusionAggregate {
    fn unoccluded(samples: usize, target_distance: f32) -> Self {
        Self {
            blocked: 0,
            near_field_ignored: 0,
            samples,
            center_blocked: false,
            target_distance,
            ratio: 0.0,
            obstacle_depth: None,
        }
    }
}

/// Cone-sampling strategy behind [`OcclusionScanner`]
#[derive(Debug)]
pub struct OcclusionScan {
    desc: OcclusionScannerDesc,
    instance: InstanceId,
    samples: Option<SampleSet>,
    probes: Vec<ProbeResult>,
}

impl OcclusionScan {
    pub fn new(desc: OcclusionScannerDesc, instance: InstanceId) -> Self {
        Self {
            desc,
            instance,
            samples: None,
            probes: Vec::new(),
        }
    }

    pub fn desc(&self) -> &OcclusionScannerDesc {
        &self.desc
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    fn diffraction_for(&self, depth: Option<f32>) -> f32 {
        let diffraction = &self.desc.diffraction;
        let Some(depth) = depth.filter(|_| diffraction.enabled) else {
            return 0.0;
        };
        let normalized = if diffraction.range > 0.0 {
            depth / diffraction.range
        } else {
            1.0
        };
        diffraction.curve.evaluate(normalized).max(0.0)
    }
}

/// Listener depth past the plane through `hit` facing along `forward`
fn depth_behind(hit: &RayHit, listener: Vec3, forward: Vec3) -> f32 {
    (listener - hit.point).dot(forward).max(0.0)
}

fn min_depth(current: Option<f32>, depth: f32) -> Option<f32> {
    Some(current.map_or(depth, |d| d.min(depth)))
}

impl ScanStrategy for OcclusionScan {
    type Estimate = OcclusionEstimate;
    type Raw = OcclusionAggregate;

    fn label(&self) -> String {
        format!("Occlusion[{}]", self.instance)
    }

    fn is_configured(&self) -> bool {
        self.desc.sample_count > 0
    }

    fn scan(&mut self, ctx: &ScanContext<'_>) -> Result<ScanPass<OcclusionAggregate, OcclusionEstimate>> {
        let sample_count = self.desc.sample_count;
        let Some((forward, target_distance)) = math::direction_and_distance(ctx.emitter, ctx.listener)
        else {
            // Co-located: nothing can be in between
            return Ok(ScanPass {
                raw: OcclusionAggregate::unoccluded(sample_count, ctx.emitter.distance(ctx.listener)),
                target: OcclusionEstimate::default(),
                queries: 0,
            });
        };

        let center_hit = ctx
            .tracer
            .cast_ray(ctx.emitter, forward, target_distance, self.desc.layers)?
            .filter(|hit| hit.distance <= target_distance);

        let set = SampleSet::ensure(
            &mut self.samples,
            sample_count,
            ScanShape::Cone {
                half_angle: self.desc.cone_half_angle,
            },
        );
        let cone_queries = probe_directions(
            ctx.tracer,
            ctx.emitter,
            set.rotated(math::rotation_onto(forward)),
            target_distance,
            self.desc.layers,
            &mut self.probes,
        )?;

        let center_blocked = center_hit.is_some();
        let mut obstacle_depth = center_hit.map(|hit| depth_behind(&hit, ctx.listener, forward));
        let mut blocked = 0;
        let mut near_field_ignored = 0;

        for hit in self.probes.iter().filter_map(|probe| probe.hit) {
            let hit_to_target = target_distance - hit.distance;
            if !center_blocked && hit_to_target < self.desc.near_field_threshold {
                near_field_ignored += 1;
                continue;
            }
            blocked += 1;
            obstacle_depth = min_depth(obstacle_depth, depth_behind(&hit, ctx.listener, forward));
        }

        let samples = self.probes.len();
        let ratio = if samples == 0 {
            0.0
        } else {
            (blocked as f32 / samples as f32).clamp(0.0, 1.0)
        };
        // A lone center hit leaves the ratio at zero, so nothing diffracts either
        let obstacle_depth = obstacle_depth.filter(|_| blocked > 0);
        let diffraction_amount = self.diffraction_for(obstacle_depth);

        Ok(ScanPass {
            raw: OcclusionAggregate {
                blocked,
                near_field_ignored,
                samples,
                center_blocked,
                target_distance,
                ratio,
                obstacle_depth,
            },
            target: OcclusionEstimate {
                occlusion_ratio: ratio,
                diffraction_amount,
            },
            queries: cone_queries + 1,
        })
    }

    fn publish(&self, estimate: &OcclusionEstimate, sink: &mut dyn ParameterSink) -> Result<()> {
        let names = &self.desc.parameters;
        sink.set_instance_parameter(self.instance, &names.occlusion, estimate.occlusion_ratio)?;
        if self.desc.diffraction.enabled {
            let cutoff = self.desc.diffraction.cutoff_hz(estimate.diffraction_amount);
            sink.set_instance_parameter(self.instance, &names.lowpass_cutoff, cutoff)?;
        }
        Ok(())
    }
}

/// Per-source occlusion scanner
pub type OcclusionScanner = Scanner<OcclusionScan>;

impl Scanner<OcclusionScan> {
    pub fn new(desc: OcclusionScannerDesc, instance: InstanceId) -> Self {
        let interval = desc.scan_interval;
        let smoothing_time = desc.smoothing_time;
        let gate = desc.gate;
        Scanner::with_strategy(OcclusionScan::new(desc, instance), interval, smoothing_time, gate)
    }

    pub fn instance(&self) -> InstanceId {
        self.strategy().instance()
    }
}
