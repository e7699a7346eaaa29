//! # hdrtone-math
//!
//! Numeric building blocks for the tone-mapping pipeline.
//!
//! - [`simd`] - [`SimdF32`]/[`SimdI32`] over `wide` vectors, [`DefaultSimd`]
//! - [`fastmath`] - vectorized approximate `log`, `exp`, `pow`
//! - [`kahan`] - compensated summation, scalar and lane-wise
//!
//! # Usage
//!
//! ```rust
//! use hdrtone_math::{fastmath, DefaultSimd, KahanSimd, SimdF32};
//!
//! let lum = [0.5f32, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0];
//! let mut acc = KahanSimd::<DefaultSimd>::new();
//! for chunk in lum.chunks(DefaultSimd::LANES) {
//!     acc.add(fastmath::log(DefaultSimd::load_partial(chunk, 1.0)));
//! }
//! let mean_log = acc.finish().value() / lum.len() as f32;
//! assert!((mean_log.exp() - 5.656854).abs() < 1e-4);
//! ```
//!
//! # Dependencies
//!
//! - [`wide`] - portable SIMD on stable Rust
//! - [`bytemuck`] - bit casts between float and integer vectors
//!
//! # Feature Flags
//!
//! - `wide8` (default) - [`DefaultSimd`] is `f32x8`; without it, `f32x4`

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod fastmath;
pub mod kahan;
pub mod simd;

pub use kahan::{KahanSimd, KahanSum};
pub use simd::{DefaultSimd, SimdF32, SimdI32};
