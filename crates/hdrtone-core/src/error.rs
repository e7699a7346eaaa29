//! Error types for hdrtone-core operations.
//!
//! The [`Error`] enum covers failures of the image containers:
//! - Buffer allocation (AoS pixel vectors, padded SoA channels)
//! - Bounds checking on coordinate access
//! - Dimension and data length validation
//!
//! # Usage
//!
//! ```rust
//! use hdrtone_core::{Error, Result};
//!
//! fn check(x: u32, y: u32, width: u32, height: u32) -> Result<()> {
//!     if x >= width || y >= height {
//!         return Err(Error::out_of_bounds(x, y, width, height));
//!     }
//!     Ok(())
//! }
//! assert!(check(3, 0, 2, 2).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by image containers.
///
/// # Categories
///
/// - **Bounds errors**: [`OutOfBounds`](Error::OutOfBounds)
/// - **Allocation errors**: [`AllocationFailed`](Error::AllocationFailed)
/// - **Dimension errors**: [`DimensionMismatch`](Error::DimensionMismatch),
///   [`InvalidDimensions`](Error::InvalidDimensions), [`DataLength`](Error::DataLength)
#[derive(Debug, Error)]
pub enum Error {
    /// Pixel coordinates are outside image bounds.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: u32,
        /// Y coordinate that was out of bounds
        y: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Memory allocation failed.
    ///
    /// Buffers are reserved with `try_reserve_exact`, so an oversized image
    /// surfaces here instead of aborting the process.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },

    /// Two images that must match have different sizes.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First image width
        a_width: u32,
        /// First image height
        a_height: u32,
        /// Second image width
        b_width: u32,
        /// Second image height
        b_height: u32,
    },

    /// Invalid image dimensions (overflowing element count and the like).
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// A caller-provided buffer does not hold `width * height` pixels.
    #[error("data length {got} does not match {width}x{height} (expected {expected})")]
    DataLength {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
        /// Expected element count
        expected: usize,
        /// Provided element count
        got: usize,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }

    /// Returns `true` for errors caused by the caller's arguments.
    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        !self.is_allocation_error()
    }
}

/// Reserves a vector of exactly `len` elements, mapping failure to
/// [`Error::AllocationFailed`].
pub(crate) fn try_alloc<T: Clone>(len: usize, fill: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|e| {
        Error::allocation_failed(len.saturating_mul(std::mem::size_of::<T>()), e.to_string())
    })?;
    v.resize(len, fill);
    Ok(v)
}
