//! Activity gate: decides whether a scanner may spend any rays this tick.
//!
//! The gate is evaluated on every tick, before the throttle and before any
//! sampling or probing, so a silent or far-away source costs one distance
//! check and nothing else.

use crate::math::Vec3;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether an audio source is currently producing audible output.
///
/// Implemented by the host's audio layer (playing and not virtualized).
pub trait AudioActivity {
    fn is_audible(&self) -> bool;

    /// Maximum attenuation distance of the source, if the audio layer knows it.
    fn max_distance(&self) -> Option<f32> {
        None
    }
}

/// Activity for listener-global scans that have no owning source
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAudible;

impl AudioActivity for AlwaysAudible {
    fn is_audible(&self) -> bool {
        true
    }
}

impl AudioActivity for bool {
    fn is_audible(&self) -> bool {
        *self
    }
}

/// Shared "is playing" flag.
///
/// Cloning shares the flag, so the audio side can flip it (on start, stop or
/// virtualization) while the scanner side reads it.
#[derive(Debug, Clone)]
pub struct ActivityFlag {
    playing: Arc<AtomicBool>,
    max_distance: Option<f32>,
}

impl ActivityFlag {
    pub fn new(playing: bool) -> Self {
        Self {
            playing: Arc::new(AtomicBool::new(playing)),
            max_distance: None,
        }
    }

    /// Flag carrying the source's max attenuation distance
    pub fn with_max_distance(playing: bool, max_distance: f32) -> Self {
        Self {
            playing: Arc::new(AtomicBool::new(playing)),
            max_distance: Some(max_distance),
        }
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl AudioActivity for ActivityFlag {
    fn is_audible(&self) -> bool {
        self.is_playing()
    }

    fn max_distance(&self) -> Option<f32> {
        self.max_distance
    }
}

/// Result of a gate check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Go ahead
    Scan,
    /// The source is stopped or virtualized
    Inactive,
    /// The listener is out of range
    Culled { distance: f32, max_distance: f32 },
}

impl GateDecision {
    pub fn allows_scan(&self) -> bool {
        matches!(self, Self::Scan)
    }
}

/// Gate policy: audibility check plus optional distance culling.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivityGate {
    /// Skip scans while the listener is beyond the max distance
    pub distance_culling: bool,
    /// Max distance used instead of the source's own attenuation distance
    pub override_max_distance: Option<f32>,
}

impl ActivityGate {
    /// Gate that only checks audibility
    pub const fn audibility_only() -> Self {
        Self {
            distance_culling: false,
            override_max_distance: None,
        }
    }

    /// Gate culling at the source's own max distance
    pub const fn culling() -> Self {
        Self {
            distance_culling: true,
            override_max_distance: None,
        }
    }

    /// Gate culling at a fixed distance
    pub const fn culling_at(max_distance: f32) -> Self {
        Self {
            distance_culling: true,
            override_max_distance: Some(max_distance),
        }
    }

    pub fn evaluate(&self, activity: &dyn AudioActivity, emitter: Vec3, listener: Vec3) -> GateDecision {
        if !activity.is_audible() {
            return GateDecision::Inactive;
        }

        if self.distance_culling {
            let max_distance = self.override_max_distance.or_else(|| activity.max_distance());
            if let Some(max_distance) = max_distance.filter(|d| !d.is_nan()) {
                let distance = emitter.distance(listener);
                if distance > max_distance {
                    return GateDecision::Culled {
                        distance,
                        max_distance,
                    };
                }
            }
        }

        GateDecision::Scan
    }

    pub fn should_scan(&self, activity: &dyn AudioActivity, emitter: Vec3, listener: Vec3) -> bool {
        self.evaluate(activity, emitter, listener).allows_scan()
    }
}

impl Default for ActivityGate {
    fn default() -> Self {
        Self::audibility_only()
    }
}
