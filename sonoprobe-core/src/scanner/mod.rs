//! Timer-gated scanners.
//!
//! A [`Scanner`] runs the same per-tick skeleton for every kind of scan:
//!
//! 1. **Gate** - skip everything while the source is silent or out of range
//! 2. **Throttle** - only scan once every `scan_interval` seconds
//! 3. **Scan** - the [`ScanStrategy`] samples, probes and aggregates
//! 4. **Smooth** - the estimate glides toward the newest scan result every tick
//! 5. **Publish** - the smoothed estimate is pushed to a [`ParameterSink`]
//!
//! The strategies ([`RoomScan`], [`OcclusionScan`]) only decide where rays go
//! and how their results collapse into an estimate.

pub mod occlusion;
pub mod room;

use crate::error::Result;
use crate::events::TickOutcome;
use crate::gate::{ActivityGate, AudioActivity, GateDecision};
use crate::math::Vec3;
use crate::params::ParameterSink;
use crate::scene::RayTracer;
use crate::smoothing::{Blend, ExponentialSmoother, Smoothed};
use std::fmt::Debug;

pub use occlusion::{OcclusionAggregate, OcclusionEstimate, OcclusionScan, OcclusionScanner};
pub use room::{RoomAggregate, RoomEstimate, RoomScan, RoomScanMode, RoomScanner};

/// Everything a scanner reads from the outside world during one tick
#[derive(Clone, Copy)]
pub struct ScanContext<'a> {
    pub listener: Vec3,
    /// Position of the owning source; equal to `listener` for listener-global scans
    pub emitter: Vec3,
    pub activity: &'a dyn AudioActivity,
    pub tracer: &'a dyn RayTracer,
}

impl<'a> ScanContext<'a> {
    pub fn new(
        listener: Vec3,
        emitter: Vec3,
        activity: &'a dyn AudioActivity,
        tracer: &'a dyn RayTracer,
    ) -> Self {
        Self {
            listener,
            emitter,
            activity,
            tracer,
        }
    }
}

/// Result of one completed scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPass<R, E> {
    /// Raw aggregate, before curves and smoothing
    pub raw: R,
    /// New smoothing target
    pub target: E,
    /// Ray queries issued
    pub queries: usize,
}

/// The scan-specific half of a [`Scanner`].
pub trait ScanStrategy {
    type Estimate: Blend + Default + Debug + PartialEq;
    type Raw: Clone + Debug;

    /// Short name used in log lines
    fn label(&self) -> String;

    /// False when the configuration can never produce a scan
    fn is_configured(&self) -> bool;

    /// Sample, probe and aggregate.
    ///
    /// An error means the pass was discarded as a whole; partial results must
    /// not leak into the returned estimate.
    fn scan(&mut self, ctx: &ScanContext<'_>) -> Result<ScanPass<Self::Raw, Self::Estimate>>;

    fn publish(&self, estimate: &Self::Estimate, sink: &mut dyn ParameterSink) -> Result<()>;
}

/// Lifecycle status of a scanner
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScannerStatus {
    /// Active; scans whenever the interval has elapsed
    Idle,
    /// Held by the gate; clocks and smoothing are paused
    Frozen(GateDecision),
    /// Misconfigured, never scans
    Disabled,
}

/// Private per-scanner state, owned exclusively by one [`Scanner`]
#[derive(Debug, Clone)]
struct ScannerState<E, R> {
    since_last_scan: f32,
    clock: f64,
    last_scan_time: Option<f64>,
    estimate: Smoothed<E>,
    last_raw: Option<R>,
    scans_completed: u64,
    status: ScannerStatus,
}

/// Generic scanner: gate, throttle, scan, smooth and publish.
pub struct Scanner<S: ScanStrategy> {
    label: String,
    interval: f32,
    smoother: ExponentialSmoother,
    gate: ActivityGate,
    strategy: S,
    state: ScannerState<S::Estimate, S::Raw>,
}

impl<S: ScanStrategy> Scanner<S> {
    pub fn with_strategy(strategy: S, scan_interval: f32, smoothing_time: f32, gate: ActivityGate) -> Self {
        let label = strategy.label();
        let interval_valid = scan_interval.is_finite() && scan_interval > 0.0;
        let status = if interval_valid && strategy.is_configured() {
            ScannerStatus::Idle
        } else {
            log::warn!(
                "{} scanner disabled (interval: {}s, configured: {})",
                label,
                scan_interval,
                strategy.is_configured()
            );
            ScannerStatus::Disabled
        };

        Self {
            label,
            interval: scan_interval,
            smoother: ExponentialSmoother::new(smoothing_time),
            gate,
            strategy,
            state: ScannerState {
                // The first active tick scans immediately
                since_last_scan: scan_interval,
                clock: 0.0,
                last_scan_time: None,
                estimate: Smoothed::default(),
                last_raw: None,
                scans_completed: 0,
                status,
            },
        }
    }

    /// Advance the scanner by `dt` seconds of simulated time.
    pub fn tick(&mut self, dt: f32, ctx: &ScanContext<'_>, sink: &mut dyn ParameterSink) -> TickOutcome {
        if self.state.status == ScannerStatus::Disabled {
            return TickOutcome::Disabled;
        }

        let decision = self.gate.evaluate(ctx.activity, ctx.emitter, ctx.listener);
        if !decision.allows_scan() {
            if self.state.status == ScannerStatus::Idle {
                log::debug!("{} scanner frozen: {:?}", self.label, decision);
            }
            self.state.status = ScannerStatus::Frozen(decision);
            return TickOutcome::Skipped(decision);
        }

        if let ScannerStatus::Frozen(previous) = self.state.status {
            log::debug!("{} scanner resumed after {:?}", self.label, previous);
            self.state.since_last_scan = self.interval;
        }
        self.state.status = ScannerStatus::Idle;

        let dt = if dt.is_nan() || dt < 0.0 { 0.0 } else { dt };
        self.state.since_last_scan += dt;
        self.state.clock += f64::from(dt);

        let mut outcome = TickOutcome::Waiting;
        if self.state.since_last_scan >= self.interval {
            match self.strategy.scan(ctx) {
                Ok(pass) => {
                    log::debug!(
                        "{} scan #{}: {:?} -> {:?} ({} queries)",
                        self.label,
                        self.state.scans_completed + 1,
                        pass.raw,
                        pass.target,
                        pass.queries
                    );
                    self.state.estimate.set_target(pass.target);
                    self.state.last_raw = Some(pass.raw);
                    self.state.since_last_scan = 0.0;
                    self.state.last_scan_time = Some(self.state.clock);
                    self.state.scans_completed += 1;
                    outcome = TickOutcome::Scanned {
                        queries: pass.queries,
                    };
                }
                Err(e) => {
                    log::warn!("{} scan failed, keeping previous estimate: {}", self.label, e);
                    outcome = TickOutcome::ProbeFailed;
                }
            }
        } else {
            log::trace!(
                "{} scanner waiting ({:.3}s of {:.3}s)",
                self.label,
                self.state.since_last_scan,
                self.interval
            );
        }

        self.state.estimate.advance(dt, &self.smoother);
        if self.state.estimate.is_primed() {
            let current = self.state.estimate.current();
            if let Err(e) = self.strategy.publish(&current, sink) {
                log::warn!("{} failed to publish parameters: {}", self.label, e);
            }
        }

        outcome
    }

    /// Smoothed estimate, or `None` before the first completed scan
    pub fn estimate(&self) -> Option<S::Estimate> {
        self.state
            .estimate
            .is_primed()
            .then(|| self.state.estimate.current())
    }

    /// Result of the newest scan, before smoothing
    pub fn target_estimate(&self) -> Option<S::Estimate> {
        self.state
            .estimate
            .is_primed()
            .then(|| self.state.estimate.target())
    }

    pub fn last_raw(&self) -> Option<&S::Raw> {
        self.state.last_raw.as_ref()
    }

    pub fn status(&self) -> ScannerStatus {
        self.state.status
    }

    pub fn is_disabled(&self) -> bool {
        self.state.status == ScannerStatus::Disabled
    }

    pub fn scans_completed(&self) -> u64 {
        self.state.scans_completed
    }

    /// Simulated time (seconds since creation) of the newest completed scan
    pub fn last_scan_time(&self) -> Option<f64> {
        self.state.last_scan_time
    }

    pub fn scan_interval(&self) -> f32 {
        self.interval
    }

    pub fn gate(&self) -> &ActivityGate {
        &self.gate
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<S: ScanStrategy + Debug> Debug for Scanner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("label", &self.label)
            .field("interval", &self.interval)
            .field("status", &self.state.status)
            .field("scans_completed", &self.state.scans_completed)
            .field("strategy", &self.strategy)
            .finish()
    }
}
