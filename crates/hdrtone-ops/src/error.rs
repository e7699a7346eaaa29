//! Error types for tone-mapping operations.

use thiserror::Error;

/// Error type for statistics and tone-mapping operations.
///
/// Numeric degeneracy (all pixels invalid, zero dynamic range) is never an
/// error; those cases produce sentinel parameters instead.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Images have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A scratch or output buffer could not be reserved.
    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    /// Error raised by the image model.
    #[error(transparent)]
    Core(#[from] hdrtone_core::Error),
}

impl OpsError {
    /// `true` for errors caused by caller-supplied arguments.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::InvalidDimensions(_) | Self::SizeMismatch(_) | Self::InvalidParameter(_) => true,
            Self::AllocationFailed(_) => false,
            Self::Core(e) => e.is_invalid_argument(),
        }
    }

    /// `true` for out-of-memory conditions.
    pub fn is_resource_error(&self) -> bool {
        match self {
            Self::AllocationFailed(_) => true,
            Self::Core(e) => e.is_allocation_error(),
            _ => false,
        }
    }

    pub(crate) fn size_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::SizeMismatch(format!("{}x{} vs {}x{}", a.0, a.1, b.0, b.1))
    }

    pub(crate) fn empty_image() -> Self {
        Self::InvalidDimensions("image has no pixels".into())
    }
}

/// Result type for tone-mapping operations.
pub type OpsResult<T> = Result<T, OpsError>;
