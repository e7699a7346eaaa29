//! Vectorized approximate `log`, `exp` and `pow`.
//!
//! Cephes-style range reduction with short minimax polynomials, evaluated on
//! every lane of a [`SimdF32`]. The statistics pass takes a logarithm of every
//! pixel's luminance, which makes these kernels the dominant cost next to
//! memory traffic.
//!
//! # Accuracy
//!
//! | Function | Domain | Max relative error |
//! |----------|--------|--------------------|
//! | [`log`] | normal `x > 0` | ~2e-7 |
//! | [`exp`] | `[-87, 88]` | ~2e-7 |
//! | [`pow`] | `x in [1e-6, 1]`, `y in [0.1, 4]` | < 1e-4 |
//!
//! # Domain
//!
//! - `log(x)` is NaN for `x <= 0` and for NaN; subnormal `x` is treated as
//!   the smallest normal.
//! - `exp(x)` clamps `x` to `±88.3762626647949`.
//! - `pow(x, y)` inherits both; `pow(0, y)` is NaN, callers that need
//!   `0^y = 0` must select it themselves.
//!
//! ```rust
//! use hdrtone_math::fastmath;
//!
//! let l = fastmath::log_scalar(10.0);
//! assert!((l - 10f32.ln()).abs() < 1e-5);
//! assert!(fastmath::log_scalar(-1.0).is_nan());
//! ```

use crate::simd::{f32x4, SimdF32, SimdI32};

const MIN_NORM_POS: f32 = f32::MIN_POSITIVE;
const INV_MANT_MASK: i32 = !0x7f80_0000;
const SQRTHF: f32 = 0.707_106_781_186_547_524;

const LOG_P0: f32 = 7.037_683_629_2E-2;
const LOG_P1: f32 = -1.151_461_031_0E-1;
const LOG_P2: f32 = 1.167_699_874_0E-1;
const LOG_P3: f32 = -1.242_014_084_6E-1;
const LOG_P4: f32 = 1.424_932_278_7E-1;
const LOG_P5: f32 = -1.666_805_766_5E-1;
const LOG_P6: f32 = 2.000_071_476_5E-1;
const LOG_P7: f32 = -2.499_999_399_3E-1;
const LOG_P8: f32 = 3.333_333_117_4E-1;

// ln 2 split so that e * LN2_HI is exact for the exponent range.
const LN2_LO: f32 = -2.121_944_40e-4;
const LN2_HI: f32 = 0.693_359_375;

const EXP_HI: f32 = 88.376_262_664_794_9;
const EXP_LO: f32 = -88.376_262_664_794_9;
const LOG2EF: f32 = 1.442_695_040_888_963_41;

const EXP_P0: f32 = 1.987_569_150_0E-4;
const EXP_P1: f32 = 1.398_199_950_7E-3;
const EXP_P2: f32 = 8.333_451_907_3E-3;
const EXP_P3: f32 = 4.166_579_589_4E-2;
const EXP_P4: f32 = 1.666_666_545_9E-1;
const EXP_P5: f32 = 5.000_000_120_1E-1;

/// Natural logarithm of every lane.
#[inline]
pub fn log<V: SimdF32>(x: V) -> V {
    let one = V::splat(1.0);
    let invalid = x.gt(V::splat(0.0)).not();

    let x = x.max(V::splat(MIN_NORM_POS));
    let bits = x.to_bits();
    let emm0 = bits.shr(23) - <V::Int as SimdI32>::splat(0x7f);

    // mantissa in [0.5, 1)
    let mut x = V::from_bits(bits & <V::Int as SimdI32>::splat(INV_MANT_MASK)) | V::splat(0.5);
    let mut e = V::from_int(emm0) + one;

    // x < sqrt(1/2): e -= 1, x = 2x - 1; otherwise x = x - 1
    let mask = x.lt(V::splat(SQRTHF));
    let tmp = x & mask;
    x = x - one;
    e = e - (one & mask);
    x = x + tmp;

    let z = x * x;
    let mut y = V::splat(LOG_P0);
    y = y.mul_add(x, V::splat(LOG_P1));
    y = y.mul_add(x, V::splat(LOG_P2));
    y = y.mul_add(x, V::splat(LOG_P3));
    y = y.mul_add(x, V::splat(LOG_P4));
    y = y.mul_add(x, V::splat(LOG_P5));
    y = y.mul_add(x, V::splat(LOG_P6));
    y = y.mul_add(x, V::splat(LOG_P7));
    y = y.mul_add(x, V::splat(LOG_P8));
    y = y * x * z;

    y = e.mul_add(V::splat(LN2_LO), y);
    y = y - z * V::splat(0.5);
    x = x + y;
    x = e.mul_add(V::splat(LN2_HI), x);

    // all-ones bits are a NaN
    x | invalid
}

/// `e^x` for every lane.
#[inline]
pub fn exp<V: SimdF32>(x: V) -> V {
    let one = V::splat(1.0);
    let x = x.min(V::splat(EXP_HI)).max(V::splat(EXP_LO));

    // fx = floor(x * log2(e) + 0.5)
    let fx = x.mul_add(V::splat(LOG2EF), V::splat(0.5));
    let tmp = V::from_int(fx.trunc_int());
    let fx = (tmp - (tmp.gt(fx) & one)).min(V::splat(127.0));

    let x = x - fx * V::splat(LN2_HI) - fx * V::splat(LN2_LO);
    let z = x * x;

    let mut y = V::splat(EXP_P0);
    y = y.mul_add(x, V::splat(EXP_P1));
    y = y.mul_add(x, V::splat(EXP_P2));
    y = y.mul_add(x, V::splat(EXP_P3));
    y = y.mul_add(x, V::splat(EXP_P4));
    y = y.mul_add(x, V::splat(EXP_P5));
    y = y.mul_add(z, x) + one;

    // 2^n, n <= 127 keeps the clamp boundary finite
    let n = fx.trunc_int() + <V::Int as SimdI32>::splat(0x7f);
    let pow2n = V::from_bits(n.shl(23));
    y * pow2n
}

/// `x^y` as `exp(y * log(x))`.
#[inline]
pub fn pow<V: SimdF32>(x: V, y: V) -> V {
    exp(y * log(x))
}

/// Scalar [`log`], sharing the vector kernel's results.
#[inline]
pub fn log_scalar(x: f32) -> f32 {
    log(f32x4::splat(x)).to_array()[0]
}

/// Scalar [`exp`], sharing the vector kernel's results.
#[inline]
pub fn exp_scalar(x: f32) -> f32 {
    exp(f32x4::splat(x)).to_array()[0]
}

/// Scalar [`pow`], sharing the vector kernel's results.
#[inline]
pub fn pow_scalar(x: f32, y: f32) -> f32 {
    pow(f32x4::splat(x), f32x4::splat(y)).to_array()[0]
}

/// Applies [`log`] to a slice in place.
pub fn log_slice(values: &mut [f32]) {
    apply_slice::<crate::simd::DefaultSimd>(values, log);
}

/// Applies [`exp`] to a slice in place.
pub fn exp_slice(values: &mut [f32]) {
    apply_slice::<crate::simd::DefaultSimd>(values, exp);
}

fn apply_slice<V: SimdF32>(values: &mut [f32], f: impl Fn(V) -> V) {
    let mut chunks = values.chunks_exact_mut(V::LANES);
    for chunk in &mut chunks {
        let r = f(V::load(chunk)).to_array();
        chunk.copy_from_slice(r.as_ref());
    }
    let rem = chunks.into_remainder();
    if !rem.is_empty() {
        let r = f(V::load_partial(rem, 1.0)).to_array();
        let n = rem.len();
        rem.copy_from_slice(&r.as_ref()[..n]);
    }
}
