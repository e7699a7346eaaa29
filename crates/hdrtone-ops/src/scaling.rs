//! Luminance scaling operators.
//!
//! A scaler maps scene-referred RGB to display-referred RGB that is then
//! clamped and encoded by [`crate::display`]. Scalers operate lane-wise on
//! channel vectors and never touch alpha.
//!
//! - [`ExposureScaler`]: `rgb * 2^exposure`
//! - [`Reinhard02Scaler`]: global photographic operator with white burn-out

use crate::luminance::{luminance, REC709_LUMA};
use crate::stats::Reinhard02Params;
use hdrtone_math::simd::SimdF32;

/// Per-pixel scene-to-display scaling.
pub trait LuminanceScaler: Copy + Send + Sync {
    /// Scales one vector of pixels.
    fn scale<V: SimdF32>(&self, r: V, g: V, b: V) -> (V, V, V);
}

/// Multiplies every channel by `2^exposure`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureScaler {
    factor: f32,
}

impl ExposureScaler {
    /// Scaler for `exposure` stops.
    pub fn new(exposure: f32) -> Self {
        Self {
            factor: exposure.exp2(),
        }
    }

    /// The linear multiplier.
    pub fn factor(&self) -> f32 {
        self.factor
    }
}

impl LuminanceScaler for ExposureScaler {
    #[inline]
    fn scale<V: SimdF32>(&self, r: V, g: V, b: V) -> (V, V, V) {
        let f = V::splat(self.factor);
        (r * f, g * f, b * f)
    }
}

/// Reinhard02 global operator.
///
/// With `Lw` the log-average, `a` the key and `Lwhite` the white point, the
/// scene luminance is first exposed to `L = a Y / Lw` and then compressed by
/// `L (1 + L / Lwhite^2) / (1 + L)`. Dividing the result by `Y` gives one
/// rational factor per pixel,
///
/// ```text
/// k(Y) = (P + R Y) / (Q + P Y),  P = Lw a Lwhite^2,  Q = Lw^2 Lwhite^2,  R = a^2
/// ```
///
/// which multiplies all three channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reinhard02Scaler {
    p: f32,
    q: f32,
    r: f32,
}

impl Reinhard02Scaler {
    /// Precomputes the rational coefficients.
    pub fn new(params: &Reinhard02Params) -> Self {
        let lw = params.log_avg;
        let wh2 = params.white_point * params.white_point;
        Self {
            p: lw * params.key * wh2,
            q: lw * lw * wh2,
            r: params.key * params.key,
        }
    }

    /// `false` for degenerate parameters, which map every pixel to black.
    pub fn is_valid(&self) -> bool {
        self.q > 0.0
    }

    /// Scalar scaling factor for luminance `y`.
    pub fn factor(&self, y: f32) -> f32 {
        if !self.is_valid() {
            return 0.0;
        }
        (self.p + self.r * y) / (self.q + self.p * y)
    }
}

impl LuminanceScaler for Reinhard02Scaler {
    #[inline]
    fn scale<V: SimdF32>(&self, r: V, g: V, b: V) -> (V, V, V) {
        if !self.is_valid() {
            let zero = V::splat(0.0);
            return (zero, zero, zero);
        }
        let y = luminance(r, g, b, REC709_LUMA);
        let p = V::splat(self.p);
        let k = (p + V::splat(self.r) * y) / (V::splat(self.q) + p * y);
        (r * k, g * k, b * k)
    }
}
