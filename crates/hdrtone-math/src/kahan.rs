//! Compensated (Kahan) summation.
//!
//! Summing millions of `f32` log-luminances naively loses several digits.
//! [`KahanSum`] carries the rounding error of each addition into the next
//! one; [`KahanSimd`] does the same independently in every vector lane and
//! folds the lanes into a [`KahanSum`] at the end.
//!
//! Both are mergeable, so per-worker partial sums from a parallel fold can be
//! combined in any order. Different merge orders may differ by float
//! reassociation error only.

use crate::simd::SimdF32;

/// Scalar compensated sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KahanSum {
    sum: f32,
    c: f32,
}

impl KahanSum {
    /// Empty sum.
    pub const fn new() -> Self {
        Self { sum: 0.0, c: 0.0 }
    }

    /// Adds one value.
    #[inline]
    pub fn add(&mut self, x: f32) {
        let y = x - self.c;
        let t = self.sum + y;
        self.c = (t - self.sum) - y;
        self.sum = t;
    }

    /// Folds another partial sum into this one.
    #[inline]
    pub fn merge(&mut self, other: &KahanSum) {
        self.add(other.sum);
        self.add(-other.c);
    }

    /// Current total.
    #[inline]
    pub fn value(&self) -> f32 {
        self.sum - self.c
    }
}

impl Extend<f32> for KahanSum {
    fn extend<I: IntoIterator<Item = f32>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<f32> for KahanSum {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        let mut k = Self::new();
        k.extend(iter);
        k
    }
}

/// Lane-wise compensated sum over a [`SimdF32`].
#[derive(Debug, Clone, Copy)]
pub struct KahanSimd<V> {
    sum: V,
    c: V,
}

impl<V: SimdF32> Default for KahanSimd<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SimdF32> KahanSimd<V> {
    /// Empty sum.
    #[inline]
    pub fn new() -> Self {
        Self {
            sum: V::splat(0.0),
            c: V::splat(0.0),
        }
    }

    /// Adds one vector, lane by lane.
    #[inline]
    pub fn add(&mut self, x: V) {
        let y = x - self.c;
        let t = self.sum + y;
        self.c = (t - self.sum) - y;
        self.sum = t;
    }

    /// Folds the lanes into a scalar compensated sum.
    pub fn finish(self) -> KahanSum {
        let mut k = KahanSum::new();
        let sums = self.sum.to_array();
        let cs = self.c.to_array();
        for (s, c) in sums.as_ref().iter().zip(cs.as_ref()) {
            k.add(*s);
            k.add(-*c);
        }
        k
    }
}
