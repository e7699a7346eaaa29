//! Lane-width generic SIMD vectors.
//!
//! [`SimdF32`] is implemented for `wide::f32x4` and `wide::f32x8`; each has a
//! matching [`SimdI32`] (`i32x4`, `i32x8`) for exponent-field manipulation.
//! Kernels are written once against the trait and monomorphized for the
//! width chosen by [`DefaultSimd`], so there is no run-time dispatch inside a
//! hot loop.
//!
//! # Masks
//!
//! Comparisons return a vector of the same type whose lanes are all-ones
//! (true) or all-zeros (false). Every ordered comparison involving NaN is
//! false, so `x.gt(zero)` is a NaN-rejecting positivity test.
//!
//! ```rust
//! use hdrtone_math::simd::SimdF32;
//! use wide::f32x4;
//!
//! let x = f32x4::from([1.0, -1.0, f32::NAN, 2.0]);
//! let positive = x.gt(f32x4::splat(0.0));
//! assert_eq!(positive.count_true(), 2);
//! let y = f32x4::select(positive, x, f32x4::splat(0.0));
//! assert_eq!(y.to_array(), [1.0, 0.0, 0.0, 2.0]);
//! ```

use bytemuck::cast;
use std::fmt::Debug;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Sub};
#[allow(unused_imports)]
use wide::{CmpEq, CmpGe, CmpGt, CmpLe, CmpLt};
pub use wide::{f32x4, f32x8, i32x4, i32x8};

/// Vector width used by the pipeline's hot loops.
#[cfg(feature = "wide8")]
pub type DefaultSimd = f32x8;

/// Vector width used by the pipeline's hot loops.
#[cfg(not(feature = "wide8"))]
pub type DefaultSimd = f32x4;

/// Integer companion of a [`SimdF32`] type.
pub trait SimdI32:
    Copy
    + Send
    + Sync
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + 'static
{
    /// Lane array.
    type Array: AsRef<[i32]> + Copy;

    /// Broadcasts `v` to every lane.
    fn splat(v: i32) -> Self;

    /// Shifts every lane left by `bits`.
    fn shl(self, bits: i32) -> Self;

    /// Arithmetic right shift of every lane by `bits`.
    fn shr(self, bits: i32) -> Self;

    /// Signed lane-wise `self < rhs` mask.
    fn lt(self, rhs: Self) -> Self;

    /// Signed lane-wise `self > rhs` mask.
    fn gt(self, rhs: Self) -> Self;

    /// Lanes as an array.
    fn to_array(self) -> Self::Array;
}

/// Float vector with a fixed number of lanes.
pub trait SimdF32:
    Copy
    + Send
    + Sync
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + 'static
{
    /// Number of lanes.
    const LANES: usize;

    /// Lane array, `[f32; LANES]`.
    type Array: AsRef<[f32]> + AsMut<[f32]> + Copy + Send + Sync;

    /// Integer vector with the same lane count.
    type Int: SimdI32;

    /// Broadcasts `v` to every lane.
    fn splat(v: f32) -> Self;

    /// Builds a vector from an array.
    fn from_array(a: Self::Array) -> Self;

    /// Lanes as an array.
    fn to_array(self) -> Self::Array;

    /// `[0, 1, 2, ...]`.
    fn lane_index() -> Self;

    /// Lane-wise `self < rhs`.
    fn lt(self, rhs: Self) -> Self;
    /// Lane-wise `self <= rhs`.
    fn le(self, rhs: Self) -> Self;
    /// Lane-wise `self > rhs`.
    fn gt(self, rhs: Self) -> Self;
    /// Lane-wise `self >= rhs`.
    fn ge(self, rhs: Self) -> Self;
    /// Lane-wise `self == rhs`.
    fn eq(self, rhs: Self) -> Self;

    /// Picks `a` where `mask` is set, `b` elsewhere.
    fn select(mask: Self, a: Self, b: Self) -> Self;

    /// Lane-wise minimum.
    fn min(self, rhs: Self) -> Self;
    /// Lane-wise maximum.
    fn max(self, rhs: Self) -> Self;
    /// `self * b + c`.
    fn mul_add(self, b: Self, c: Self) -> Self;
    /// Lane-wise absolute value.
    fn abs(self) -> Self;

    /// Rounds to nearest (ties to even) and converts to integers.
    fn round_int(self) -> Self::Int;
    /// Truncates toward zero and converts to integers.
    fn trunc_int(self) -> Self::Int;
    /// Converts integers to floats.
    fn from_int(v: Self::Int) -> Self;
    /// Reinterprets the lane bits as integers.
    fn to_bits(self) -> Self::Int;
    /// Reinterprets integer lanes as float bits.
    fn from_bits(v: Self::Int) -> Self;

    /// Horizontal sum.
    fn reduce_add(self) -> f32;

    /// Loads the first `LANES` values of `s`.
    ///
    /// # Panics
    ///
    /// Panics if `s` is shorter than `LANES`.
    #[inline]
    fn load(s: &[f32]) -> Self {
        let mut a = Self::splat(0.0).to_array();
        a.as_mut().copy_from_slice(&s[..Self::LANES]);
        Self::from_array(a)
    }

    /// Loads up to `LANES` values, filling missing lanes with `fill`.
    #[inline]
    fn load_partial(s: &[f32], fill: f32) -> Self {
        let mut a = Self::splat(fill).to_array();
        let n = s.len().min(Self::LANES);
        a.as_mut()[..n].copy_from_slice(&s[..n]);
        Self::from_array(a)
    }

    /// Mask with the first `count` lanes set.
    #[inline]
    fn lane_mask(count: usize) -> Self {
        Self::lane_index().lt(Self::splat(count as f32))
    }

    /// All-ones mask.
    #[inline]
    fn all_true() -> Self {
        Self::from_bits(<Self::Int as SimdI32>::splat(-1))
    }

    /// Bitwise complement.
    #[inline]
    fn not(self) -> Self {
        self ^ Self::all_true()
    }

    /// `self & !rhs`.
    #[inline]
    fn bit_andnot(self, rhs: Self) -> Self {
        self ^ (self & rhs)
    }

    /// Number of set lanes in a mask.
    #[inline]
    fn count_true(self) -> usize {
        self.to_bits().to_array().as_ref().iter().filter(|&&b| b != 0).count()
    }

    /// Horizontal minimum.
    #[inline]
    fn reduce_min(self) -> f32 {
        self.to_array().as_ref().iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Horizontal maximum.
    #[inline]
    fn reduce_max(self) -> f32 {
        self.to_array().as_ref().iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Applies a scalar function to every lane.
    #[inline]
    fn map(self, f: impl Fn(f32) -> f32) -> Self {
        let mut a = self.to_array();
        for v in a.as_mut() {
            *v = f(*v);
        }
        Self::from_array(a)
    }
}

macro_rules! impl_simd {
    ($f:ty, $i:ty, $lanes:expr, $from_int:ident, [$($idx:expr),*]) => {
        impl SimdI32 for $i {
            type Array = [i32; $lanes];

            #[inline(always)]
            fn splat(v: i32) -> Self {
                <$i>::splat(v)
            }

            #[inline(always)]
            fn shl(self, bits: i32) -> Self {
                self << bits
            }

            #[inline(always)]
            fn shr(self, bits: i32) -> Self {
                self >> bits
            }

            #[inline(always)]
            fn lt(self, rhs: Self) -> Self {
                <$i>::cmp_lt(self, rhs)
            }

            #[inline(always)]
            fn gt(self, rhs: Self) -> Self {
                <$i>::cmp_gt(self, rhs)
            }

            #[inline(always)]
            fn to_array(self) -> Self::Array {
                cast(self)
            }
        }

        impl SimdF32 for $f {
            const LANES: usize = $lanes;
            type Array = [f32; $lanes];
            type Int = $i;

            #[inline(always)]
            fn splat(v: f32) -> Self {
                <$f>::splat(v)
            }

            #[inline(always)]
            fn from_array(a: Self::Array) -> Self {
                <$f>::from(a)
            }

            #[inline(always)]
            fn to_array(self) -> Self::Array {
                cast(self)
            }

            #[inline(always)]
            fn lane_index() -> Self {
                <$f>::from([$($idx as f32),*])
            }

            #[inline(always)]
            fn lt(self, rhs: Self) -> Self {
                self.cmp_lt(rhs)
            }

            #[inline(always)]
            fn le(self, rhs: Self) -> Self {
                self.cmp_le(rhs)
            }

            #[inline(always)]
            fn gt(self, rhs: Self) -> Self {
                self.cmp_gt(rhs)
            }

            #[inline(always)]
            fn ge(self, rhs: Self) -> Self {
                self.cmp_ge(rhs)
            }

            #[inline(always)]
            fn eq(self, rhs: Self) -> Self {
                self.cmp_eq(rhs)
            }

            #[inline(always)]
            fn select(mask: Self, a: Self, b: Self) -> Self {
                mask.blend(a, b)
            }

            #[inline(always)]
            fn min(self, rhs: Self) -> Self {
                <$f>::min(self, rhs)
            }

            #[inline(always)]
            fn max(self, rhs: Self) -> Self {
                <$f>::max(self, rhs)
            }

            #[inline(always)]
            fn mul_add(self, b: Self, c: Self) -> Self {
                <$f>::mul_add(self, b, c)
            }

            #[inline(always)]
            fn abs(self) -> Self {
                <$f>::abs(self)
            }

            #[inline(always)]
            fn round_int(self) -> Self::Int {
                <$f>::round_int(self)
            }

            #[inline(always)]
            fn trunc_int(self) -> Self::Int {
                <$f>::trunc_int(self)
            }

            #[inline(always)]
            fn from_int(v: Self::Int) -> Self {
                <$f>::$from_int(v)
            }

            #[inline(always)]
            fn to_bits(self) -> Self::Int {
                cast(self)
            }

            #[inline(always)]
            fn from_bits(v: Self::Int) -> Self {
                cast(v)
            }

            #[inline(always)]
            fn reduce_add(self) -> f32 {
                <$f>::reduce_add(self)
            }
        }
    };
}

impl_simd!(f32x4, i32x4, 4, from_i32x4, [0, 1, 2, 3]);
impl_simd!(f32x8, i32x8, 8, from_i32x8, [0, 1, 2, 3, 4, 5, 6, 7]);

#[cfg(test)]
mod tests {
    use super::*;

    fn check_basics<V: SimdF32>() {
        let idx = V::lane_index();
        let a = idx.to_array();
        for (i, v) in a.as_ref().iter().enumerate() {
            assert_eq!(*v, i as f32);
        }
        assert_eq!(idx.reduce_add(), (0..V::LANES).sum::<usize>() as f32);
        assert_eq!(idx.reduce_min(), 0.0);
        assert_eq!(idx.reduce_max(), (V::LANES - 1) as f32);
        assert_eq!(V::lane_mask(3).count_true(), 3);
        assert_eq!(V::all_true().count_true(), V::LANES);
        assert_eq!(V::all_true().not().count_true(), 0);
    }

    #[test]
    fn test_basics_x4() {
        check_basics::<f32x4>();
    }

    #[test]
    fn test_basics_x8() {
        check_basics::<f32x8>();
    }

    #[test]
    fn test_nan_comparisons_are_false() {
        let nan = f32x4::splat(f32::NAN);
        let zero = f32x4::splat(0.0);
        assert_eq!(nan.gt(zero).count_true(), 0);
        assert_eq!(nan.lt(zero).count_true(), 0);
        assert_eq!(nan.ge(zero).count_true(), 0);
        assert_eq!(nan.le(zero).count_true(), 0);
        assert_eq!(nan.eq(nan).count_true(), 0);
    }

    #[test]
    fn test_select_and_not() {
        let a = f32x8::splat(1.0);
        let b = f32x8::splat(2.0);
        let m = f32x8::lane_mask(5);
        let r = f32x8::select(m, a, b).to_array();
        assert_eq!(r, [1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        let inv = f32x8::select(m.not(), a, b).to_array();
        assert_eq!(inv, [2.0, 2.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0]);
        assert_eq!(a.bit_andnot(m).to_array()[..5], [0.0; 5]);
    }

    #[test]
    fn test_load_partial() {
        let v = f32x4::load_partial(&[5.0, 6.0], 1.0);
        assert_eq!(v.to_array(), [5.0, 6.0, 1.0, 1.0]);
        let w = f32x4::load(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(w.to_array(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_int_conversions() {
        let v = f32x4::from([1.4, 1.6, -2.5, 3.0]);
        assert_eq!(v.trunc_int().to_array(), [1, 1, -2, 3]);
        assert_eq!(v.round_int().to_array(), [1, 2, -2, 3]);
        let bits = SimdF32::to_bits(f32x4::splat(1.0)).to_array();
        assert_eq!(bits, [0x3f80_0000; 4]);
        let two = <f32x4 as SimdF32>::from_bits(i32x4::splat(1).shl(30));
        assert_eq!(two.to_array(), [2.0; 4]);
        assert_eq!(i32x4::splat(-8).shr(1).to_array(), [-4; 4]);
    }

    #[test]
    fn test_int_comparisons() {
        let v = i32x8::new([-5, 0, 1, 7, i32::MIN, i32::MAX, 3, 4]);
        let t = i32x8::splat(3);
        assert_eq!(SimdI32::lt(v, t).to_array(), [-1, -1, -1, 0, -1, 0, 0, 0]);
        assert_eq!(SimdI32::gt(v, t).to_array(), [0, 0, 0, -1, 0, -1, 0, -1]);
    }

    #[test]
    fn test_map() {
        let v = f32x4::from([1.0, 4.0, 9.0, 16.0]).map(f32::sqrt);
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0]);
    }
}
