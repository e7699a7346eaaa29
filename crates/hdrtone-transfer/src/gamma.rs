//! Pure power-law gamma encoding.
//!
//! `encoded = linear^(1/gamma)` for `linear > 0`, `0` otherwise.
//!
//! Two evaluators are provided: [`GammaReference`] calls libm `powf` per lane,
//! [`GammaFast`] uses the vectorized [`fastmath::pow`].

use crate::TransferCurve;
use hdrtone_math::fastmath;
use hdrtone_math::simd::SimdF32;

/// Selects the gamma evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GammaMethod {
    /// libm `powf`.
    #[default]
    Reference,
    /// `exp(log(x) / gamma)` with the approximate kernels.
    Fast,
}

impl std::str::FromStr for GammaMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ref" | "reference" => Ok(Self::Reference),
            "fast" => Ok(Self::Fast),
            other => Err(format!("unknown gamma method '{other}' (ref, fast)")),
        }
    }
}

/// `x^(1/gamma)` through libm.
///
/// ```rust
/// use hdrtone_transfer::{GammaReference, TransferCurve};
///
/// let encoded = GammaReference::new(2.2).apply_scalar(0.218);
/// assert!((encoded - 0.5).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GammaReference {
    inv_gamma: f32,
}

impl GammaReference {
    /// Encoder for `gamma` (must be positive).
    pub fn new(gamma: f32) -> Self {
        Self {
            inv_gamma: 1.0 / gamma,
        }
    }
}

impl TransferCurve for GammaReference {
    #[inline]
    fn apply<V: SimdF32>(&self, x: V) -> V {
        let inv = self.inv_gamma;
        x.map(|v| if v > 0.0 { v.powf(inv) } else { 0.0 })
    }
}

/// `x^(1/gamma)` through [`fastmath::pow`].
#[derive(Debug, Clone, Copy)]
pub struct GammaFast {
    inv_gamma: f32,
}

impl GammaFast {
    /// Encoder for `gamma` (must be positive).
    pub fn new(gamma: f32) -> Self {
        Self {
            inv_gamma: 1.0 / gamma,
        }
    }
}

impl TransferCurve for GammaFast {
    #[inline]
    fn apply<V: SimdF32>(&self, x: V) -> V {
        let zero = V::splat(0.0);
        let p = fastmath::pow(x, V::splat(self.inv_gamma));
        V::select(x.gt(zero), p, zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use hdrtone_math::simd::f32x4;

    #[test]
    fn test_inverse_power() {
        let enc = GammaReference::new(2.2);
        for i in 1..=100 {
            let v = i as f32 / 100.0;
            assert_relative_eq!(enc.apply_scalar(v.powf(2.2)), v, max_relative = 1e-5);
        }
        assert_eq!(enc.apply_scalar(1.0), 1.0);
    }

    #[test]
    fn test_non_positive_is_zero() {
        let x = f32x4::from([0.0, -0.5, f32::NAN, 0.25]);
        let r = GammaFast::new(2.0).apply(x).to_array();
        assert_eq!(&r[..3], &[0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(r[3], 0.5, epsilon = 1e-5);
        let r = GammaReference::new(2.0).apply(x).to_array();
        assert_eq!(&r[..3], &[0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(r[3], 0.5, epsilon = 1e-7);
    }

    #[test]
    fn test_fast_matches_reference() {
        let fast = GammaFast::new(2.2);
        let reference = GammaReference::new(2.2);
        for i in 0..=1000 {
            let x = i as f32 / 1000.0;
            assert_abs_diff_eq!(fast.apply_scalar(x), reference.apply_scalar(x), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("fast".parse::<GammaMethod>(), Ok(GammaMethod::Fast));
        assert_eq!("Reference".parse::<GammaMethod>(), Ok(GammaMethod::Reference));
        assert!("x".parse::<GammaMethod>().is_err());
    }
}
