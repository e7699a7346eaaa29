//! Pixel types for HDR input and LDR output.
//!
//! # Types
//!
//! - [`Rgba32F`] - HDR pixel, four `f32` channels, 16-byte aligned
//! - [`Bgra8`], [`Rgba8`] - 8-bit display pixels
//! - [`Rgba16`] - 16-bit display pixel
//! - [`LdrPixel`] - trait shared by the display pixels
//!
//! # Memory Layout
//!
//! All pixel types are `#[repr(C)]` and implement [`bytemuck::Pod`], so a
//! pixel slice can be reinterpreted as a flat channel slice without copying:
//!
//! ```
//! use hdrtone_core::Rgba32F;
//!
//! let px = [Rgba32F::new(1.0, 2.0, 3.0, 4.0)];
//! let flat: &[f32] = bytemuck::cast_slice(&px);
//! assert_eq!(flat, &[1.0, 2.0, 3.0, 4.0]);
//! ```
//!
//! HDR values carry no range invariant: negative, NaN and infinite channels
//! are legal and must be handled by consumers.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// HDR pixel: four packed 32-bit floats (R, G, B, A).
#[repr(C, align(16))]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Rgba32F {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Rgba32F {
    /// Creates a pixel from its four channels.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque pixel (alpha = 1).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a pixel with every channel set to `v`.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { r: v, g: v, b: v, a: v }
    }

    /// Returns the channels as `[r, g, b, a]`.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Weighted sum of the color channels.
    #[inline]
    pub fn dot_rgb(self, w: [f32; 3]) -> f32 {
        self.r * w[0] + self.g * w[1] + self.b * w[2]
    }

    /// Multiplies the color channels by `k`, leaving alpha untouched.
    #[inline]
    pub fn scale_rgb(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k, self.a)
    }
}

impl From<[f32; 4]> for Rgba32F {
    #[inline]
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl fmt::Debug for Rgba32F {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgba32F({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Display pixel produced by the tone mapper.
///
/// Channel values arrive already quantized to `0..=MAX`. Implementors place
/// them in their own layout and set alpha to `MAX`.
pub trait LdrPixel: Copy + Default + Send + Sync + PartialEq + fmt::Debug + 'static {
    /// Bits per channel.
    const BITS: u32;

    /// Largest channel value, `2^BITS - 1`.
    const MAX: u32 = (1u32 << Self::BITS) - 1;

    /// Whether the 8-bit lookup table can produce this format.
    const SUPPORTS_LUT: bool = Self::BITS == 8;

    /// Builds an opaque pixel from quantized channels.
    fn from_quantized(r: u32, g: u32, b: u32) -> Self;

    /// Returns the quantized color channels as `[r, g, b]`.
    fn quantized(&self) -> [u32; 3];
}

/// 8-bit pixel in B, G, R, A byte order.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Pod, Zeroable)]
pub struct Bgra8 {
    /// Blue
    pub b: u8,
    /// Green
    pub g: u8,
    /// Red
    pub r: u8,
    /// Alpha
    pub a: u8,
}

impl Bgra8 {
    /// Creates a pixel, alpha = 0xFF.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { b, g, r, a: 0xFF }
    }

    /// Packs the pixel as a little-endian `0xAARRGGBB` word.
    #[inline]
    pub const fn to_argb_u32(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl Default for Bgra8 {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl LdrPixel for Bgra8 {
    const BITS: u32 = 8;

    #[inline]
    fn from_quantized(r: u32, g: u32, b: u32) -> Self {
        Self::new(r as u8, g as u8, b as u8)
    }

    #[inline]
    fn quantized(&self) -> [u32; 3] {
        [self.r as u32, self.g as u32, self.b as u32]
    }
}

/// 8-bit pixel in R, G, B, A byte order.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Pod, Zeroable)]
pub struct Rgba8 {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba8 {
    /// Creates a pixel, alpha = 0xFF.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl LdrPixel for Rgba8 {
    const BITS: u32 = 8;

    #[inline]
    fn from_quantized(r: u32, g: u32, b: u32) -> Self {
        Self::new(r as u8, g as u8, b as u8)
    }

    #[inline]
    fn quantized(&self) -> [u32; 3] {
        [self.r as u32, self.g as u32, self.b as u32]
    }
}

/// 16-bit pixel in R, G, B, A order.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Pod, Zeroable)]
pub struct Rgba16 {
    /// Red
    pub r: u16,
    /// Green
    pub g: u16,
    /// Blue
    pub b: u16,
    /// Alpha
    pub a: u16,
}

impl Rgba16 {
    /// Creates a pixel, alpha = 0xFFFF.
    #[inline]
    pub const fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b, a: 0xFFFF }
    }
}

impl Default for Rgba16 {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl LdrPixel for Rgba16 {
    const BITS: u32 = 16;

    #[inline]
    fn from_quantized(r: u32, g: u32, b: u32) -> Self {
        Self::new(r as u16, g as u16, b as u16)
    }

    #[inline]
    fn quantized(&self) -> [u32; 3] {
        [self.r as u32, self.g as u32, self.b as u32]
    }
}
