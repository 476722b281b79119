//! Temporal smoothing for scan estimates.
//!
//! Scans arrive a few times per second; the smoothed value moves toward the
//! newest scan result on every tick so the exposed parameters glide instead of
//! stepping.
//!
//! # Example
//!
//! ```
//! use sonoprobe_core::smoothing::{ExponentialSmoother, Smoothed};
//!
//! let smoother = ExponentialSmoother::new(0.1);
//! let mut wet = Smoothed::new(0.0_f32);
//!
//! // First scan result is taken as-is
//! wet.set_target(0.8);
//! assert_eq!(wet.current(), 0.8);
//!
//! // Later results are approached over time
//! wet.set_target(0.2);
//! wet.advance(0.1, &smoother);
//! assert!(wet.current() > 0.2 && wet.current() < 0.8);
//! ```

/// Values that can be linearly interpolated toward a target
pub trait Blend: Copy {
    /// Move `self` toward `target` by fraction `t` in `[0, 1]`.
    fn blend(self, target: Self, t: f32) -> Self;
}

impl Blend for f32 {
    #[inline]
    fn blend(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
}

/// First-order exponential approach with a fixed time constant.
///
/// After `time_constant` seconds the remaining distance to the target has
/// shrunk to about 37%. The step never overshoots, for any `dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
    time_constant: f32,
}

impl ExponentialSmoother {
    /// A non-positive time constant disables smoothing (values snap).
    pub fn new(time_constant_secs: f32) -> Self {
        Self {
            time_constant: time_constant_secs,
        }
    }

    pub fn time_constant(&self) -> f32 {
        self.time_constant
    }

    /// Fraction of the remaining distance to cover in `dt` seconds
    #[inline]
    pub fn alpha(&self, dt: f32) -> f32 {
        if !self.time_constant.is_finite() || self.time_constant <= 0.0 {
            return 1.0;
        }
        if dt.is_nan() || dt <= 0.0 {
            return 0.0;
        }
        (1.0 - (-dt / self.time_constant).exp()).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn step<T: Blend>(&self, current: T, target: T, dt: f32) -> T {
        current.blend(target, self.alpha(dt))
    }
}

/// Smoothed value with a target.
///
/// Until the first target arrives the value is "unprimed"; the first
/// [`set_target`](Smoothed::set_target) snaps instead of fading in from the
/// initial value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed<T> {
    current: T,
    target: T,
    primed: bool,
}

impl<T: Blend> Smoothed<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            target: initial,
            primed: false,
        }
    }

    pub fn set_target(&mut self, target: T) {
        self.target = target;
        if !self.primed {
            self.current = target;
            self.primed = true;
        }
    }

    pub fn advance(&mut self, dt: f32, smoother: &ExponentialSmoother) {
        if self.primed {
            self.current = smoother.step(self.current, self.target, dt);
        }
    }

    #[inline]
    pub fn current(&self) -> T {
        self.current
    }

    #[inline]
    pub fn target(&self) -> T {
        self.target
    }

    #[inline]
    pub fn is_primed(&self) -> bool {
        self.primed
    }
}

impl<T: Blend + Default> Default for Smoothed<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
