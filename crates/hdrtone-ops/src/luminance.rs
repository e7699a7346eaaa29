//! Luminance extraction and validity tests.
//!
//! Two weight sets are in use. The statistics estimator weighs channels with
//! [`STATS_LUMA`]; the Reinhard02 scaler uses the Rec.709 coefficients
//! [`REC709_LUMA`]. Estimated parameters are consumed by the scaler as is.
//!
//! A luminance value is *valid* when it is a positive, normal, finite float.
//! Zero, negatives, subnormals, infinities and NaN are all invalid.

use hdrtone_core::{Channel, ImageSoA, Rgba32F};
use hdrtone_math::simd::{SimdF32, SimdI32};

/// Channel weights used by the statistics estimator.
pub const STATS_LUMA: [f32; 3] = [0.27, 0.67, 0.06];

/// Rec.709 channel weights used by the Reinhard02 scaler.
pub const REC709_LUMA: [f32; 3] = [0.212_639_005_871_510, 0.715_168_678_767_756, 0.072_192_315_360_734];

/// Bit pattern of the smallest positive normal float.
const MIN_VALID_BITS: u32 = 0x0080_0000;
/// Bit pattern of positive infinity.
const INF_BITS: u32 = 0x7f80_0000;

/// Scalar validity test on the bit pattern.
///
/// Positive normal finite floats occupy exactly the bit range
/// `[0x0080_0000, 0x7f80_0000)`; the sign bit, zero, subnormals, infinity and
/// every NaN fall outside it.
///
/// ```rust
/// use hdrtone_ops::luminance::is_valid_luminance;
///
/// assert!(is_valid_luminance(0.18));
/// assert!(!is_valid_luminance(0.0));
/// assert!(!is_valid_luminance(-1.0));
/// assert!(!is_valid_luminance(f32::NAN));
/// assert!(!is_valid_luminance(f32::INFINITY));
/// assert!(!is_valid_luminance(f32::from_bits(1)));
/// ```
#[inline]
pub fn is_valid_luminance(y: f32) -> bool {
    (MIN_VALID_BITS..INF_BITS).contains(&y.to_bits())
}

/// Lane-wise validity mask, the vector counterpart of [`is_valid_luminance`].
///
/// Tests the same bit range with signed integer compares, so negative
/// values fail through the sign bit and NaN payloads sit above `INF_BITS`.
#[inline]
pub fn valid_luminance_mask<V: SimdF32>(y: V) -> V {
    let bits = y.to_bits();
    let lo = <V::Int as SimdI32>::splat(MIN_VALID_BITS as i32 - 1);
    let hi = <V::Int as SimdI32>::splat(INF_BITS as i32);
    V::from_bits(bits.gt(lo) & bits.lt(hi))
}

/// Weighted sum of three channel vectors.
#[inline]
pub fn luminance<V: SimdF32>(r: V, g: V, b: V, w: [f32; 3]) -> V {
    r * V::splat(w[0]) + g * V::splat(w[1]) + b * V::splat(w[2])
}

/// Scalar [`luminance`] of one pixel.
#[inline]
pub fn luminance_scalar(p: Rgba32F, w: [f32; 3]) -> f32 {
    p.dot_rgb(w)
}

/// Read-only color source addressed by flat storage index.
///
/// Implemented for AoS pixel slices and for the channel arrays of an
/// [`ImageSoA`], so passes are written once and monomorphized per layout.
pub trait RgbSource: Sync {
    /// Number of pixels.
    fn len(&self) -> usize;

    /// `true` if the source has no pixels.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads `count <= V::LANES` pixels starting at `start` as channel
    /// vectors. Lanes past `count` are zero.
    fn load_rgb<V: SimdF32>(&self, start: usize, count: usize) -> (V, V, V);
}

impl RgbSource for [Rgba32F] {
    #[inline]
    fn len(&self) -> usize {
        <[Rgba32F]>::len(self)
    }

    #[inline]
    fn load_rgb<V: SimdF32>(&self, start: usize, count: usize) -> (V, V, V) {
        let mut r = V::splat(0.0).to_array();
        let mut g = r;
        let mut b = r;
        for (k, p) in self[start..start + count].iter().enumerate() {
            r.as_mut()[k] = p.r;
            g.as_mut()[k] = p.g;
            b.as_mut()[k] = p.b;
        }
        (V::from_array(r), V::from_array(g), V::from_array(b))
    }
}

/// The color channels of an [`ImageSoA`], including their zero padding.
#[derive(Clone, Copy)]
pub struct SoaRgb<'a> {
    r: &'a [f32],
    g: &'a [f32],
    b: &'a [f32],
    len: usize,
}

impl<'a> SoaRgb<'a> {
    /// Borrows the R, G and B channels of `img`.
    pub fn new(img: &'a ImageSoA) -> Self {
        Self {
            r: img.channel_padded(Channel::R),
            g: img.channel_padded(Channel::G),
            b: img.channel_padded(Channel::B),
            len: img.pixel_count(),
        }
    }
}

impl RgbSource for SoaRgb<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn load_rgb<V: SimdF32>(&self, start: usize, count: usize) -> (V, V, V) {
        let end = start + count;
        (
            V::load_partial(&self.r[start..end], 0.0),
            V::load_partial(&self.g[start..end], 0.0),
            V::load_partial(&self.b[start..end], 0.0),
        )
    }
}
