//! Display encoding: clamp, transfer curve, quantization, lookup table.
//!
//! After scaling, every channel goes through
//!
//! ```text
//! clamp[0,1] -> curve -> clamp[0,1] -> round(x * MAX)
//! ```
//!
//! where `curve` is a [`DisplayCurve`]. For 8-bit output the middle two steps
//! can be replaced by a [`DisplayLut`] lookup.
//!
//! The curve is resolved once per pass into a concrete
//! [`TransferCurve`] through [`DisplayCurve::visit`], so the per-pixel loop is
//! monomorphized and branch-free.

use crate::error::{OpsError, OpsResult};
use hdrtone_math::simd::{f32x4, SimdF32, SimdI32};
use hdrtone_transfer::{
    GammaFast, GammaMethod, GammaReference, SrgbFast1, SrgbFast2, SrgbMethod, SrgbReference,
    TransferCurve,
};

/// Default number of LUT entries.
pub const DEFAULT_LUT_SIZE: usize = 2048;

/// Sample count of the [`DisplayLut::max_error`] sweep.
const ERROR_SWEEP: u32 = 1 << 16;

/// Display encoding applied after scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DisplayCurve {
    /// Pure power law `x^(1/gamma)`.
    Gamma {
        /// Display gamma, positive and finite.
        gamma: f32,
        /// Evaluator.
        #[cfg_attr(feature = "serde", serde(with = "gamma_method_serde"))]
        method: GammaMethod,
    },
    /// The sRGB OETF.
    Srgb(#[cfg_attr(feature = "serde", serde(with = "srgb_method_serde"))] SrgbMethod),
}

impl Default for DisplayCurve {
    fn default() -> Self {
        Self::Srgb(SrgbMethod::default())
    }
}

/// Receives the concrete evaluator behind a [`DisplayCurve`].
pub trait CurveVisitor {
    /// Value produced by the visit.
    type Output;

    /// Called once with the resolved curve.
    fn visit<C: TransferCurve>(self, curve: C) -> Self::Output;
}

impl DisplayCurve {
    /// Power-law curve with the reference evaluator.
    pub fn gamma(gamma: f32) -> Self {
        Self::Gamma {
            gamma,
            method: GammaMethod::Reference,
        }
    }

    /// sRGB with the given method.
    pub fn srgb(method: SrgbMethod) -> Self {
        Self::Srgb(method)
    }

    /// `true` for the gamma variant.
    pub fn is_gamma(&self) -> bool {
        matches!(self, Self::Gamma { .. })
    }

    /// Dispatches to `visitor` with the concrete evaluator.
    pub fn visit<W: CurveVisitor>(&self, visitor: W) -> W::Output {
        match *self {
            Self::Gamma {
                gamma,
                method: GammaMethod::Reference,
            } => visitor.visit(GammaReference::new(gamma)),
            Self::Gamma {
                gamma,
                method: GammaMethod::Fast,
            } => visitor.visit(GammaFast::new(gamma)),
            Self::Srgb(SrgbMethod::Reference) => visitor.visit(SrgbReference),
            Self::Srgb(SrgbMethod::Fast1) => visitor.visit(SrgbFast1),
            Self::Srgb(SrgbMethod::Fast2) => visitor.visit(SrgbFast2),
        }
    }

    /// Encodes and quantizes one value to `0..=max` through the vector path.
    pub fn encode_scalar(&self, x: f32, max: u32) -> u32 {
        struct One {
            x: f32,
            max: u32,
        }
        impl CurveVisitor for One {
            type Output = u32;
            fn visit<C: TransferCurve>(self, curve: C) -> u32 {
                let q = encode(&curve, f32x4::splat(self.x), self.max);
                q.to_array()[0] as u32
            }
        }
        self.visit(One { x, max })
    }

    pub(crate) fn validate(&self) -> OpsResult<()> {
        if let Self::Gamma { gamma, .. } = *self {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(OpsError::InvalidParameter(format!(
                    "gamma must be positive and finite, got {gamma}"
                )));
            }
        }
        Ok(())
    }
}

/// Clamps to `[0, 1]`; NaN maps to `0`.
#[inline]
pub fn clamp01<V: SimdF32>(x: V) -> V {
    let zero = V::splat(0.0);
    let one = V::splat(1.0);
    // both comparisons are false for NaN
    let x = V::select(x.gt(zero), x, zero);
    V::select(x.lt(one), x, one)
}

/// `round(x * max)` for `x` in `[0, 1]`.
#[inline]
pub fn quantize<V: SimdF32>(x: V, max: u32) -> V::Int {
    (x * V::splat(max as f32)).round_int()
}

/// Full direct display transform of one channel vector.
#[inline]
pub fn encode<C: TransferCurve, V: SimdF32>(curve: &C, x: V, max: u32) -> V::Int {
    quantize(clamp01(curve.apply(clamp01(x))), max)
}

/// Immutable 8-bit display lookup table.
///
/// Entry `i` holds the 8-bit display value of `(i + 0.5) / len`. A query
/// clamps its input and reads entry `round(x * (len - 1))`.
///
/// # Accuracy
///
/// Against the direct transform, sRGB tables of [`DEFAULT_LUT_SIZE`] entries
/// stay within 2 steps for every [`SrgbMethod`]. A gamma table is looser:
/// `x^(1/gamma)` has unbounded slope at zero, so the first entries cover
/// several output steps each. For gamma 2.2 the bound is 6 steps at 4096
/// entries and shrinks as the table grows. [`DisplayLut::max_error`] measures
/// the bound of a built table.
///
/// # Example
///
/// ```rust
/// use hdrtone_ops::display::{DisplayCurve, DisplayLut};
///
/// let lut = DisplayLut::build(DisplayCurve::default(), 1026).unwrap();
/// assert_eq!(lut.len(), 1024);
/// assert_eq!(lut.lookup(1.0), 255);
/// assert!(lut.max_error() <= 4);
/// ```
#[derive(Clone, PartialEq)]
pub struct DisplayLut {
    table: Vec<u8>,
    curve: DisplayCurve,
}

impl DisplayLut {
    /// Builds a table for `curve`. `size` is rounded down to a multiple of 4.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] if the rounded size is zero or the
    /// curve is an invalid gamma.
    pub fn build(curve: DisplayCurve, size: usize) -> OpsResult<Self> {
        curve.validate()?;
        let size = size & !3;
        if size == 0 {
            return Err(OpsError::InvalidParameter(
                "LUT size must be at least 4".into(),
            ));
        }

        struct Fill<'a> {
            table: &'a mut [u8],
        }
        impl CurveVisitor for Fill<'_> {
            type Output = ();
            fn visit<C: TransferCurve>(self, curve: C) {
                let table = self.table;
                let n = table.len() as f32;
                for (i4, out) in table.chunks_exact_mut(4).enumerate() {
                    let base = (i4 * 4) as f32;
                    let x = (f32x4::lane_index() + f32x4::splat(base + 0.5)) / f32x4::splat(n);
                    let q = encode(&curve, x, u8::MAX as u32).to_array();
                    for (o, v) in out.iter_mut().zip(q) {
                        *o = v as u8;
                    }
                }
            }
        }

        let mut table = vec![0u8; size];
        curve.visit(Fill { table: &mut table });
        if curve.is_gamma() {
            table[0] = 0;
        }
        Ok(Self { table, curve })
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always `false`; a built table has at least 4 entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Curve the table was built from.
    pub fn curve(&self) -> DisplayCurve {
        self.curve
    }

    /// Raw entries.
    pub fn as_slice(&self) -> &[u8] {
        &self.table
    }

    /// Table indices for every lane of `x`.
    #[inline]
    pub fn index<V: SimdF32>(&self, x: V) -> V::Int {
        quantize(clamp01(x), self.table.len() as u32 - 1)
    }

    /// Looks up every lane of `x` into `out`.
    #[inline]
    pub fn lookup_lanes<V: SimdF32>(&self, x: V, out: &mut [u8]) {
        let idx = self.index(x).to_array();
        for (o, &i) in out.iter_mut().zip(idx.as_ref()) {
            *o = self.table[i as usize];
        }
    }

    /// Scalar lookup.
    #[inline]
    pub fn lookup(&self, x: f32) -> u8 {
        let i = self.index(f32x4::splat(x)).to_array()[0];
        self.table[i as usize]
    }

    /// Largest difference in 8-bit steps between [`Self::lookup`] and the
    /// direct transform over a dense sweep of `[0, 1]`.
    pub fn max_error(&self) -> u32 {
        struct Sweep<'a> {
            lut: &'a DisplayLut,
        }
        impl CurveVisitor for Sweep<'_> {
            type Output = u32;
            fn visit<C: TransferCurve>(self, curve: C) -> u32 {
                let mut worst = 0;
                for k in (0..=ERROR_SWEEP).step_by(4) {
                    let x = (f32x4::lane_index() + f32x4::splat(k as f32)) / f32x4::splat(ERROR_SWEEP as f32);
                    let direct = encode(&curve, x, u8::MAX as u32).to_array();
                    let mut lut = [0u8; 4];
                    self.lut.lookup_lanes(x, &mut lut);
                    for (d, l) in direct.iter().zip(lut) {
                        worst = worst.max(d.abs_diff(l as i32));
                    }
                }
                worst
            }
        }
        self.curve.visit(Sweep { lut: self })
    }
}

impl std::fmt::Debug for DisplayLut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayLut")
            .field("len", &self.table.len())
            .field("curve", &self.curve)
            .finish()
    }
}

#[cfg(feature = "serde")]
mod gamma_method_serde {
    use hdrtone_transfer::GammaMethod;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(m: &GammaMethod, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(match m {
            GammaMethod::Reference => "reference",
            GammaMethod::Fast => "fast",
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<GammaMethod, D::Error> {
        String::deserialize(d)?.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
mod srgb_method_serde {
    use hdrtone_transfer::SrgbMethod;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(m: &SrgbMethod, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(match m {
            SrgbMethod::Reference => "reference",
            SrgbMethod::Fast1 => "fast1",
            SrgbMethod::Fast2 => "fast2",
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SrgbMethod, D::Error> {
        String::deserialize(d)?.parse().map_err(serde::de::Error::custom)
    }
}
