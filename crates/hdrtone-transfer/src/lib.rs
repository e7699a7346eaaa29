//! # hdrtone-transfer
//!
//! Display encodings applied after tone mapping: linear [0, 1] in, encoded
//! [0, 1] out.
//!
//! # Terminology
//!
//! - **OETF** (Opto-Electronic Transfer Function): Linear -> Encoded
//! - **Gamma**: The exponent in a power-law transfer function
//!
//! # Supported Transfer Functions
//!
//! | Function | Evaluators |
//! |----------|------------|
//! | [`srgb`] | [`SrgbReference`], [`SrgbFast1`], [`SrgbFast2`] |
//! | [`gamma`] | [`GammaReference`], [`GammaFast`] |
//!
//! Every evaluator implements [`TransferCurve`], a generic lane-wise encoder.
//! Callers resolve the method once and monomorphize their loop over the
//! concrete evaluator type.
//!
//! # Usage
//!
//! ```rust
//! use hdrtone_transfer::{srgb, SrgbFast2, TransferCurve};
//! use hdrtone_math::simd::f32x4;
//!
//! let encoded = srgb::oetf(0.18);
//! let fast = SrgbFast2.apply(f32x4::splat(0.18)).to_array()[0];
//! assert!((encoded - fast).abs() < 1e-3);
//! ```
//!
//! # Dependencies
//!
//! - [`hdrtone-math`] - SIMD vectors and approximate `pow`

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod gamma;
pub mod srgb;

use hdrtone_math::simd::SimdF32;

pub use gamma::{GammaFast, GammaMethod, GammaReference};
pub use srgb::{SrgbFast1, SrgbFast2, SrgbMethod, SrgbReference};

/// Lane-wise display encoder.
///
/// Inputs are expected in [0, 1]; behaviour outside that range is whatever
/// the underlying formula gives.
pub trait TransferCurve: Copy + Send + Sync {
    /// Encodes every lane of `x`.
    fn apply<V: SimdF32>(&self, x: V) -> V;

    /// Encodes a single value.
    #[inline]
    fn apply_scalar(&self, x: f32) -> f32 {
        self.apply(hdrtone_math::simd::f32x4::splat(x)).to_array()[0]
    }
}
