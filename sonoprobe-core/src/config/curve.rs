//! Response curves for tuning how raw geometric measurements map onto
//! audio parameters.

use std::fmt;
use std::sync::Arc;

/// Mapping applied to a normalized measurement before smoothing.
///
/// Built-in curves take an input in `[0, 1]` (values outside are clamped) and
/// are monotonic. `Keyframes` and `Custom` are whatever the designer provides.
///
/// ```
/// use sonoprobe_core::ResponseCurve;
///
/// // Stay "open" until half the rays hit, then ramp up quickly
/// let curve = ResponseCurve::keyframes(vec![(0.0, 0.0), (0.5, 0.1), (1.0, 1.0)]);
/// assert!((curve.evaluate(0.75) - 0.55).abs() < 1e-6);
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseCurve {
    /// Identity
    #[default]
    Linear,
    /// `x^exponent`; exponents above 1 make the low end less sensitive
    Power(f32),
    /// Hermite smoothstep, `3x² - 2x³`
    SmoothStep,
    /// Piecewise-linear through `(input, output)` points sorted by input.
    /// Inputs before the first point or after the last take that point's output.
    Keyframes(Vec<(f32, f32)>),
    /// Arbitrary mapping supplied by the application. Serializing a curve
    /// holding one fails rather than dropping it.
    #[cfg_attr(feature = "serde", serde(skip))]
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl ResponseCurve {
    /// Piecewise-linear curve; points are sorted by input.
    pub fn keyframes(mut points: Vec<(f32, f32)>) -> Self {
        points.retain(|(x, y)| x.is_finite() && y.is_finite());
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::Keyframes(points)
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Evaluate the curve. Non-finite inputs and outputs collapse to 0.
    pub fn evaluate(&self, x: f32) -> f32 {
        if !x.is_finite() {
            return 0.0;
        }
        let unit = x.clamp(0.0, 1.0);
        let y = match self {
            Self::Linear => unit,
            Self::Power(exponent) => unit.powf(exponent.max(0.0)),
            Self::SmoothStep => unit * unit * (3.0 - 2.0 * unit),
            Self::Keyframes(points) => evaluate_keyframes(points, x),
            Self::Custom(f) => f(x),
        };
        if y.is_finite() { y } else { 0.0 }
    }
}

fn evaluate_keyframes(points: &[(f32, f32)], x: f32) -> f32 {
    let Some(&(first_x, first_y)) = points.first() else {
        return x;
    };
    if x <= first_x {
        return first_y;
    }
    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            let span = x1 - x0;
            if span <= f32::EPSILON {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / span;
        }
    }
    points.last().map_or(x, |&(_, y)| y)
}

impl fmt::Debug for ResponseCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
            Self::Power(exponent) => f.debug_tuple("Power").field(exponent).finish(),
            Self::SmoothStep => write!(f, "SmoothStep"),
            Self::Keyframes(points) => f.debug_tuple("Keyframes").field(points).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
