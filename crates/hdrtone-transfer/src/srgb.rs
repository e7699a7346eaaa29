//! sRGB transfer function.
//!
//! The sRGB standard uses a piecewise function combining a linear segment
//! near black with a power curve (approximately gamma 2.2) for the rest.
//!
//! Besides the reference encoder this module provides two rational minimax
//! approximations of the power segment, used on the hot tone-mapping path:
//!
//! | Method | Form | Max relative error |
//! |--------|------|--------------------|
//! | [`SrgbMethod::Reference`] | `1.055 x^(1/2.4) - 0.055` | libm |
//! | [`SrgbMethod::Fast1`] | rational 7/7 | 6.368e-7 |
//! | [`SrgbMethod::Fast2`] | rational 4/4 | 1.623e-4 |
//!
//! Fast1 is accurate enough for 16-bit output, Fast2 for 8-bit output.
//! The rational forms switch to the linear segment at `0.003041229589676`,
//! where the approximations cross `12.92 x`.
//!
//! # Range
//!
//! - Input/Output: [0, 1]
//!
//! # Reference
//!
//! IEC 61966-2-1:1999

use crate::TransferCurve;
use hdrtone_math::simd::{f32x4, SimdF32};

/// Linear-segment threshold of the reference encoder.
pub const LINEAR_CUTOFF: f32 = 0.003_130_8;

/// Linear-segment threshold of the rational approximations.
pub const FAST_LINEAR_CUTOFF: f32 = 0.003_041_229_589_676;

const LINEAR_SLOPE: f32 = 12.92;

const REMEZ44_P: [f32; 5] = [
    -0.019_973_047_084_702_95,
    24.951_731_691_596_51,
    3_279.752_175_439_042,
    39_156.546_674_561_556,
    42_959.451_119_871_745,
];

const REMEZ44_Q: [f32; 5] = [
    1.0,
    361.538_489_444_874_4,
    13_090.206_953_080_155,
    55_800.948_825_871_434,
    16_180.833_742_684_188,
];

const REMEZ77_P: [f32; 8] = [
    -0.031_852_703_288_410_084,
    18.553_896_638_433_446,
    22_006.067_211_014_7,
    2.635_850_360_294_788e6,
    7.352_843_882_592_331e7,
    5.330_866_283_442_694e8,
    9.261_676_939_514_283e8,
    2.632_919_307_024_597e8,
];

const REMEZ77_Q: [f32; 8] = [
    1.0,
    1_280.349_636_078_170_5,
    274_007.588_669_500_5,
    1.449_256_238_492_446_4e7,
    2.102_901_531_999_225_6e8,
    8.142_158_667_694_515e8,
    6.956_059_106_558_038e8,
    6.385_307_687_779_470_5e7,
];

/// sRGB OETF: Encodes linear light to sRGB.
///
/// # Formula
///
/// ```text
/// if L <= 0.0031308:
///     V = L * 12.92
/// else:
///     V = 1.055 * L^(1/2.4) - 0.055
/// ```
///
/// # Example
///
/// ```rust
/// use hdrtone_transfer::srgb::oetf;
///
/// let encoded = oetf(0.214);
/// assert!((encoded - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn oetf(l: f32) -> f32 {
    if l <= LINEAR_CUTOFF {
        l * LINEAR_SLOPE
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    }
}

/// OETF through the 7/7 rational approximation.
#[inline]
pub fn oetf_fast1(l: f32) -> f32 {
    SrgbFast1.apply(f32x4::splat(l)).to_array()[0]
}

/// OETF through the 4/4 rational approximation.
#[inline]
pub fn oetf_fast2(l: f32) -> f32 {
    SrgbFast2.apply(f32x4::splat(l)).to_array()[0]
}

/// Selects the sRGB encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SrgbMethod {
    /// Exact power function.
    Reference,
    /// Rational 7/7, good for 16-bit output.
    Fast1,
    /// Rational 4/4, good for 8-bit output.
    #[default]
    Fast2,
}

impl SrgbMethod {
    /// Scalar OETF with this method.
    #[inline]
    pub fn oetf(self, l: f32) -> f32 {
        match self {
            Self::Reference => oetf(l),
            Self::Fast1 => oetf_fast1(l),
            Self::Fast2 => oetf_fast2(l),
        }
    }
}

impl std::str::FromStr for SrgbMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ref" | "reference" => Ok(Self::Reference),
            "fast1" => Ok(Self::Fast1),
            "fast2" | "fast" => Ok(Self::Fast2),
            other => Err(format!("unknown sRGB method '{other}' (ref, fast1, fast2)")),
        }
    }
}

/// Reference sRGB encoder, per lane.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrgbReference;

impl TransferCurve for SrgbReference {
    #[inline]
    fn apply<V: SimdF32>(&self, x: V) -> V {
        let curve = x.map(|v| 1.055 * v.powf(1.0 / 2.4) - 0.055);
        V::select(x.gt(V::splat(LINEAR_CUTOFF)), curve, x * V::splat(LINEAR_SLOPE))
    }
}

/// 7/7 rational sRGB encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrgbFast1;

impl TransferCurve for SrgbFast1 {
    #[inline]
    fn apply<V: SimdF32>(&self, x: V) -> V {
        let curve = horner(x, &REMEZ77_P) / horner(x, &REMEZ77_Q);
        V::select(x.gt(V::splat(FAST_LINEAR_CUTOFF)), curve, x * V::splat(LINEAR_SLOPE))
    }
}

/// 4/4 rational sRGB encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrgbFast2;

impl TransferCurve for SrgbFast2 {
    #[inline]
    fn apply<V: SimdF32>(&self, x: V) -> V {
        let curve = horner(x, &REMEZ44_P) / horner(x, &REMEZ44_Q);
        V::select(x.gt(V::splat(FAST_LINEAR_CUTOFF)), curve, x * V::splat(LINEAR_SLOPE))
    }
}

/// `c[0] + x (c[1] + x (c[2] + ...))`
#[inline(always)]
fn horner<V: SimdF32, const N: usize>(x: V, c: &[f32; N]) -> V {
    let mut acc = V::splat(c[N - 1]);
    for &k in c[..N - 1].iter().rev() {
        acc = acc.mul_add(x, V::splat(k));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn sweep() -> impl Iterator<Item = f32> {
        (0..=10_000).map(|i| i as f32 / 10_000.0)
    }

    #[test]
    fn test_inverts_power_segment() {
        for i in 11..=100 {
            let v = i as f32 / 100.0;
            let linear = ((v + 0.055) / 1.055).powf(2.4);
            assert_abs_diff_eq!(oetf(linear), v, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(oetf(0.0), 0.0);
        assert_abs_diff_eq!(oetf(1.0), 1.0, epsilon = 1e-6);
        assert_eq!(oetf(LINEAR_CUTOFF), LINEAR_CUTOFF * 12.92);
    }

    #[test]
    fn test_fast1_error() {
        for x in sweep().filter(|&x| x > LINEAR_CUTOFF) {
            assert_relative_eq!(oetf_fast1(x), oetf(x), max_relative = 1e-5);
        }
    }

    #[test]
    fn test_fast2_error() {
        for x in sweep().filter(|&x| x > LINEAR_CUTOFF) {
            assert_relative_eq!(oetf_fast2(x), oetf(x), max_relative = 3e-4);
        }
    }

    #[test]
    fn test_fast_linear_segment() {
        assert_eq!(oetf_fast1(0.0), 0.0);
        assert_eq!(oetf_fast2(0.001), 0.001 * 12.92);
    }

    #[test]
    fn test_methods_agree_within_one_8bit_step() {
        for x in sweep() {
            let r = (SrgbMethod::Reference.oetf(x) * 255.0).round();
            let f2 = (SrgbMethod::Fast2.oetf(x) * 255.0).round();
            assert!((r - f2).abs() <= 1.0, "x={x}");
        }
    }

    #[test]
    fn test_vector_matches_scalar() {
        let xs = [0.0f32, 0.002, 0.01, 0.18, 0.5, 0.75, 0.9, 1.0];
        let v = SrgbReference.apply(hdrtone_math::simd::f32x8::from(xs)).to_array();
        for (x, y) in xs.iter().zip(v) {
            assert_abs_diff_eq!(oetf(*x), y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("ref".parse::<SrgbMethod>(), Ok(SrgbMethod::Reference));
        assert_eq!("FAST1".parse::<SrgbMethod>(), Ok(SrgbMethod::Fast1));
        assert!("bogus".parse::<SrgbMethod>().is_err());
        assert_eq!(SrgbMethod::default(), SrgbMethod::Fast2);
    }
}
