//! Array-of-structures image buffer and scanline order.
//!
//! An [`Image<P>`] is a width x height grid of pixels stored row by row.
//! Rows are laid out in the image's [`ScanlineOrder`]: `TopDown` stores the
//! visually top row first, `BottomUp` stores the bottom row first.
//!
//! # Addressing
//!
//! Every coordinate accessor takes the *caller's* order as an explicit
//! argument. Row `y` counted in `mode` maps to a storage row:
//!
//! ```text
//! mode == image.order()  ->  storage row y
//! mode != image.order()  ->  storage row (height - 1 - y)
//! ```
//!
//! This lets an algorithm walk a destination in its own order while reading
//! a source that was stored the other way round.
//!
//! ```rust
//! use hdrtone_core::{Image, Rgba32F, ScanlineOrder};
//!
//! let mut img = Image::<Rgba32F>::new(2, 2, ScanlineOrder::BottomUp).unwrap();
//! img.as_mut_slice()[0] = Rgba32F::splat(1.0); // first stored row = bottom row
//!
//! assert_eq!(img.pixel_at(0, 1, ScanlineOrder::TopDown).r, 1.0);
//! assert_eq!(img.pixel_at(0, 0, ScanlineOrder::BottomUp).r, 1.0);
//! ```
//!
//! # Lifecycle
//!
//! Buffers are allocated explicitly ([`Image::new`], [`Image::alloc`]) and
//! released with [`Image::clear`]. No operation resizes an image implicitly.

use crate::error::{try_alloc, Error, Result};

/// Row storage order of an image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanlineOrder {
    /// First stored row is the top of the picture.
    #[default]
    TopDown,
    /// First stored row is the bottom of the picture.
    BottomUp,
}

impl ScanlineOrder {
    /// Returns the opposite order.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Self::TopDown => Self::BottomUp,
            Self::BottomUp => Self::TopDown,
        }
    }

    /// Maps row `y`, counted in `self`, to a row counted in `other`.
    #[inline]
    pub fn remap_row(self, y: u32, height: u32, other: ScanlineOrder) -> u32 {
        if self == other { y } else { height - 1 - y }
    }
}

/// Owned image buffer of pixels `P`.
///
/// # Example
///
/// ```rust
/// use hdrtone_core::{Image, Rgba32F, ScanlineOrder};
///
/// let img = Image::filled(4, 3, ScanlineOrder::TopDown, Rgba32F::rgb(0.5, 0.5, 0.5)).unwrap();
/// assert_eq!(img.pixel_count(), 12);
/// assert_eq!(img.pixel(11).g, 0.5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Image<P> {
    data: Vec<P>,
    width: u32,
    height: u32,
    order: ScanlineOrder,
}

impl<P: Copy + Default> Image<P> {
    /// Allocates an image filled with `P::default()`.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] if the buffer cannot be reserved,
    /// [`Error::InvalidDimensions`] if `width * height` overflows.
    pub fn new(width: u32, height: u32, order: ScanlineOrder) -> Result<Self> {
        Self::filled(width, height, order, P::default())
    }

    /// Allocates an image filled with `value`.
    pub fn filled(width: u32, height: u32, order: ScanlineOrder, value: P) -> Result<Self> {
        let len = checked_len(width, height)?;
        Ok(Self {
            data: try_alloc(len, value)?,
            width,
            height,
            order,
        })
    }

    /// Reallocates the buffer for new dimensions, discarding the contents.
    pub fn alloc(&mut self, width: u32, height: u32) -> Result<()> {
        let len = checked_len(width, height)?;
        self.data = try_alloc(len, P::default())?;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

impl<P> Image<P> {
    /// Wraps an existing pixel vector.
    ///
    /// # Errors
    ///
    /// [`Error::DataLength`] if `data.len() != width * height`.
    pub fn from_data(width: u32, height: u32, order: ScanlineOrder, data: Vec<P>) -> Result<Self> {
        let expected = checked_len(width, height)?;
        if data.len() != expected {
            return Err(Error::DataLength {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            order,
        })
    }

    /// Releases the buffer, leaving a 0x0 image with the same order.
    pub fn clear(&mut self) {
        self.data = Vec::new();
        self.width = 0;
        self.height = 0;
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    /// `true` if the image holds no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Storage order of the rows.
    #[inline]
    pub fn order(&self) -> ScanlineOrder {
        self.order
    }

    /// Changes the declared order without moving any pixel.
    #[inline]
    pub fn set_order(&mut self, order: ScanlineOrder) {
        self.order = order;
    }

    /// Linear index of `(x, y)` where `y` is counted in `mode`.
    #[inline]
    pub fn index_of(&self, x: u32, y: u32, mode: ScanlineOrder) -> usize {
        let row = mode.remap_row(y, self.height, self.order);
        row as usize * self.width as usize + x as usize
    }

    /// Pixel at linear storage index `i`.
    #[inline]
    pub fn pixel(&self, i: usize) -> &P {
        &self.data[i]
    }

    /// Mutable pixel at linear storage index `i`.
    #[inline]
    pub fn pixel_mut(&mut self, i: usize) -> &mut P {
        &mut self.data[i]
    }

    /// Pixel at `(x, y)` with `y` counted in `mode`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds; see [`Self::get`].
    #[inline]
    pub fn pixel_at(&self, x: u32, y: u32, mode: ScanlineOrder) -> &P {
        &self.data[self.index_of(x, y, mode)]
    }

    /// Checked version of [`Self::pixel_at`].
    pub fn get(&self, x: u32, y: u32, mode: ScanlineOrder) -> Result<&P> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(self.pixel_at(x, y, mode))
    }

    /// Row `y` counted in `mode`.
    #[inline]
    pub fn scanline(&self, y: u32, mode: ScanlineOrder) -> &[P] {
        let start = self.index_of(0, y, mode);
        &self.data[start..start + self.width as usize]
    }

    /// Mutable row `y` counted in `mode`.
    #[inline]
    pub fn scanline_mut(&mut self, y: u32, mode: ScanlineOrder) -> &mut [P] {
        let start = self.index_of(0, y, mode);
        let w = self.width as usize;
        &mut self.data[start..start + w]
    }

    /// Pixels in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    /// Mutable pixels in storage order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [P] {
        &mut self.data
    }

    /// Consumes the image, returning its pixels in storage order.
    pub fn into_vec(self) -> Vec<P> {
        self.data
    }

    /// Returns an error unless `other` has the same dimensions.
    pub fn check_same_size<Q>(&self, other: &Image<Q>) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), other.dimensions()));
        }
        Ok(())
    }
}

fn checked_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::invalid_dimensions(width, height, "pixel count overflows usize"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{Rgba32F, Rgba8};

    fn ramp(order: ScanlineOrder) -> Image<Rgba32F> {
        // value = storage index
        let data = (0..6).map(|i| Rgba32F::splat(i as f32)).collect();
        Image::from_data(3, 2, order, data).unwrap()
    }

    #[test]
    fn test_new_dimensions() {
        let img = Image::<Rgba8>::new(7, 5, ScanlineOrder::TopDown).unwrap();
        assert_eq!(img.dimensions(), (7, 5));
        assert_eq!(img.pixel_count(), 35);
        assert!(img.as_slice().iter().all(|p| p.a == 0xFF));
    }

    #[test]
    fn test_from_data_length_mismatch() {
        let err = Image::from_data(2, 2, ScanlineOrder::TopDown, vec![Rgba32F::default(); 3]);
        assert!(matches!(err, Err(Error::DataLength { expected: 4, got: 3, .. })));
    }

    #[test]
    fn test_same_order_addressing() {
        let img = ramp(ScanlineOrder::TopDown);
        assert_eq!(img.pixel_at(1, 1, ScanlineOrder::TopDown).r, 4.0);
        assert_eq!(img.index_of(2, 0, ScanlineOrder::TopDown), 2);
    }

    #[test]
    fn test_cross_order_addressing() {
        let img = ramp(ScanlineOrder::BottomUp);
        // Top row counted top-down is the last stored row.
        assert_eq!(img.pixel_at(0, 0, ScanlineOrder::TopDown).r, 3.0);
        assert_eq!(img.pixel_at(0, 0, ScanlineOrder::BottomUp).r, 0.0);
        let row: Vec<f32> = img.scanline(1, ScanlineOrder::TopDown).iter().map(|p| p.r).collect();
        assert_eq!(row, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let img = ramp(ScanlineOrder::TopDown);
        assert!(img.get(3, 0, ScanlineOrder::TopDown).is_err());
        assert!(img.get(0, 2, ScanlineOrder::BottomUp).is_err());
        assert!(img.get(2, 1, ScanlineOrder::BottomUp).is_ok());
    }

    #[test]
    fn test_alloc_and_clear() {
        let mut img = ramp(ScanlineOrder::BottomUp);
        img.clear();
        assert!(img.is_empty());
        assert_eq!(img.dimensions(), (0, 0));
        assert_eq!(img.order(), ScanlineOrder::BottomUp);
        img.alloc(4, 4).unwrap();
        assert_eq!(img.pixel_count(), 16);
    }

    #[test]
    fn test_check_same_size() {
        let a = ramp(ScanlineOrder::TopDown);
        let b = Image::<Rgba8>::new(3, 2, ScanlineOrder::BottomUp).unwrap();
        let c = Image::<Rgba8>::new(2, 3, ScanlineOrder::TopDown).unwrap();
        assert!(a.check_same_size(&b).is_ok());
        assert!(a.check_same_size(&c).is_err());
    }

    #[test]
    fn test_remap_row() {
        assert_eq!(ScanlineOrder::TopDown.remap_row(0, 10, ScanlineOrder::BottomUp), 9);
        assert_eq!(ScanlineOrder::TopDown.remap_row(3, 10, ScanlineOrder::TopDown), 3);
        assert_eq!(ScanlineOrder::BottomUp.flipped(), ScanlineOrder::TopDown);
    }
}
