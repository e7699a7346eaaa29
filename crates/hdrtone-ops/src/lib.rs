//! # hdrtone-ops
//!
//! HDR to LDR tone mapping with automatic Reinhard02 parameter estimation.
//!
//! # Modules
//!
//! - [`stats`] - Reinhard02 parameter estimation from luminance statistics
//! - [`tonemapper`] - the [`ToneMapper`] pipeline, AoS and SoA
//! - [`scaling`] - exposure and Reinhard02 luminance scalers
//! - [`display`] - display curves, quantization and the 8-bit [`DisplayLut`]
//! - [`luminance`] - luminance weights, validity and pixel sources
//! - [`compare`] - per-channel absolute difference of two images
//! - [`parallel`] - chunked dispatch, rayon-backed with the `parallel` feature
//!
//! # Example
//!
//! ```rust
//! use hdrtone_core::{Bgra8, Image, Rgba32F, ScanlineOrder};
//! use hdrtone_ops::{estimate_params, TmoTechnique, ToneMapper, ToneMapperConfig};
//!
//! let hdr = Image::filled(64, 32, ScanlineOrder::TopDown, Rgba32F::rgb(4.0, 2.0, 1.0)).unwrap();
//! let mut ldr = Image::<Bgra8>::new(64, 32, ScanlineOrder::TopDown).unwrap();
//!
//! let mut tm = ToneMapper::new(ToneMapperConfig {
//!     technique: TmoTechnique::Reinhard02,
//!     ..Default::default()
//! })
//! .unwrap();
//! tm.set_params(estimate_params(&hdr).unwrap());
//! tm.tone_map(&mut ldr, &hdr, true).unwrap();
//!
//! let p = ldr.pixel(0);
//! assert!(p.r > p.g && p.g > p.b);
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - run passes on the rayon thread pool
//! - `serde` - serialize parameters, configs and difference summaries

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod compare;
pub mod display;
pub mod luminance;
pub mod parallel;
pub mod scaling;
pub mod stats;
pub mod tonemapper;

pub use compare::{absolute_difference, absolute_difference_soa, DifferenceSummary};
pub use display::{DisplayCurve, DisplayLut, DEFAULT_LUT_SIZE};
pub use error::{OpsError, OpsResult};
pub use stats::{estimate_params, estimate_params_soa, Reinhard02Overrides, Reinhard02Params};
pub use tonemapper::{TmoTechnique, ToneMapper, ToneMapperConfig};

pub use hdrtone_transfer::{GammaMethod, SrgbMethod};
