//! # hdrtone-core
//!
//! Core types for HDR tone mapping.
//!
//! - [`Rgba32F`] - HDR pixel, four aligned `f32` channels
//! - [`Bgra8`], [`Rgba8`], [`Rgba16`] - display pixels, see [`LdrPixel`]
//! - [`Image`] - owned array-of-structures buffer with a [`ScanlineOrder`]
//! - [`ImageSoA`] - structure-of-arrays copy with 64-byte padded channels
//!
//! ## Design Philosophy
//!
//! Scanline order is data, not type. Both layouts carry a [`ScanlineOrder`]
//! next to their dimensions, and every coordinate accessor receives the
//! caller's order explicitly. Generic code that reads a `BottomUp` source and
//! writes a `TopDown` destination therefore needs no special types:
//!
//! ```rust
//! use hdrtone_core::prelude::*;
//!
//! let src = Image::filled(4, 2, ScanlineOrder::BottomUp, Rgba32F::rgb(1.0, 0.5, 0.25)).unwrap();
//! let dst = Image::<Rgba8>::new(4, 2, ScanlineOrder::TopDown).unwrap();
//! for y in 0..dst.height() {
//!     let row = src.scanline(y, dst.order());
//!     assert_eq!(row.len(), 4);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! hdrtone-core (this crate)
//!    ^
//!    +-- hdrtone-ops (statistics, tone mapping)
//!    +-- hdrtone-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod pixel;
pub mod soa;

pub use error::{Error, Result};
pub use image::{Image, ScanlineOrder};
pub use pixel::{Bgra8, LdrPixel, Rgba16, Rgba32F, Rgba8};
pub use soa::{Channel, ImageSoA, CHANNEL_PADDING};

/// Prelude module for convenient imports.
///
/// ```
/// use hdrtone_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image, ScanlineOrder};
    pub use crate::pixel::{Bgra8, LdrPixel, Rgba16, Rgba32F, Rgba8};
    pub use crate::soa::{Channel, ImageSoA};
}
