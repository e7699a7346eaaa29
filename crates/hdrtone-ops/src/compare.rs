//! Per-channel absolute difference of two HDR images.
//!
//! Used to compare the output of two pipelines (for example AoS against SoA,
//! or an estimate against a reference render). The difference image is
//! written to a caller-provided destination and summarized in the same pass.
//!
//! Rows are addressed through the destination's scanline order, so `a`, `b`
//! and `dest` may each be stored top-down or bottom-up.

use crate::error::{OpsError, OpsResult};
use crate::parallel;
use hdrtone_core::{Channel, Image, ImageSoA, Rgba32F};
use hdrtone_math::KahanSum;

/// Statistics of a difference image over the color channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifferenceSummary {
    /// Largest finite channel difference.
    pub max: f32,
    /// Mean of the finite channel differences.
    pub mean: f32,
    /// Channel differences that were NaN or infinite.
    pub non_finite: usize,
}

#[derive(Clone, Copy, Default)]
struct DiffAccum {
    max: f32,
    sum: KahanSum,
    count: usize,
    non_finite: usize,
}

impl DiffAccum {
    #[inline]
    fn add(&mut self, d: f32) {
        if d.is_finite() {
            self.max = self.max.max(d);
            self.sum.add(d);
            self.count += 1;
        } else {
            self.non_finite += 1;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.max = self.max.max(other.max);
        self.sum.merge(&other.sum);
        self.count += other.count;
        self.non_finite += other.non_finite;
        self
    }

    fn summary(&self) -> DifferenceSummary {
        DifferenceSummary {
            max: self.max,
            mean: if self.count == 0 {
                0.0
            } else {
                self.sum.value() / self.count as f32
            },
            non_finite: self.non_finite,
        }
    }
}

fn check_dims(dest: (u32, u32), a: (u32, u32), b: (u32, u32)) -> OpsResult<()> {
    if a.0 == 0 || a.1 == 0 {
        return Err(OpsError::empty_image());
    }
    if a != b {
        return Err(OpsError::size_mismatch(a, b));
    }
    if dest != a {
        return Err(OpsError::size_mismatch(a, dest));
    }
    Ok(())
}

/// Writes `|a - b|` per color channel into `dest`, alpha set to 1.
///
/// # Errors
///
/// - [`OpsError::InvalidDimensions`] if the images have no pixels
/// - [`OpsError::SizeMismatch`] if any two dimensions differ
///
/// # Example
///
/// ```rust
/// use hdrtone_core::{Image, Rgba32F, ScanlineOrder};
/// use hdrtone_ops::compare::absolute_difference;
///
/// let a = Image::filled(4, 4, ScanlineOrder::TopDown, Rgba32F::rgb(1.0, 2.0, 3.0)).unwrap();
/// let b = Image::filled(4, 4, ScanlineOrder::BottomUp, Rgba32F::rgb(1.5, 2.0, 1.0)).unwrap();
/// let mut diff = Image::new(4, 4, ScanlineOrder::TopDown).unwrap();
///
/// let s = absolute_difference(&mut diff, &a, &b).unwrap();
/// assert_eq!(*diff.pixel(0), Rgba32F::new(0.5, 0.0, 2.0, 1.0));
/// assert_eq!(s.max, 2.0);
/// assert!((s.mean - 2.5 / 3.0).abs() < 1e-6);
/// ```
pub fn absolute_difference(
    dest: &mut Image<Rgba32F>,
    a: &Image<Rgba32F>,
    b: &Image<Rgba32F>,
) -> OpsResult<DifferenceSummary> {
    check_dims(dest.dimensions(), a.dimensions(), b.dimensions())?;
    let width = dest.width() as usize;
    let order = dest.order();

    let acc = parallel::fold_chunks_mut(
        dest.as_mut_slice(),
        width,
        DiffAccum::default,
        |mut acc, offset, row| {
            let y = (offset / width) as u32;
            let ra = a.scanline(y, order);
            let rb = b.scanline(y, order);
            for ((out, pa), pb) in row.iter_mut().zip(ra).zip(rb) {
                let d = Rgba32F::new((pa.r - pb.r).abs(), (pa.g - pb.g).abs(), (pa.b - pb.b).abs(), 1.0);
                acc.add(d.r);
                acc.add(d.g);
                acc.add(d.b);
                *out = d;
            }
            acc
        },
        DiffAccum::merge,
    );
    Ok(acc.summary())
}

/// SoA version of [`absolute_difference`].
pub fn absolute_difference_soa(
    dest: &mut ImageSoA,
    a: &ImageSoA,
    b: &ImageSoA,
) -> OpsResult<DifferenceSummary> {
    check_dims(dest.dimensions(), a.dimensions(), b.dimensions())?;
    let width = dest.width() as usize;
    let order = dest.order();

    let mut total = DiffAccum::default();
    for c in [Channel::R, Channel::G, Channel::B] {
        let (ca, cb) = (a.channel(c), b.channel(c));
        let acc = parallel::fold_chunks_mut(
            dest.channel_mut(c),
            width,
            DiffAccum::default,
            |mut acc, offset, row| {
                let y = (offset / width) as u32;
                let sa = a.index_of(0, y, order);
                let sb = b.index_of(0, y, order);
                for ((out, va), vb) in row.iter_mut().zip(&ca[sa..sa + width]).zip(&cb[sb..sb + width]) {
                    *out = (va - vb).abs();
                    acc.add(*out);
                }
                acc
            },
            DiffAccum::merge,
        );
        total = total.merge(acc);
    }
    dest.channel_mut(Channel::A).fill(1.0);
    Ok(total.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hdrtone_core::ScanlineOrder;

    fn ramp(w: u32, h: u32, order: ScanlineOrder, k: f32) -> Image<Rgba32F> {
        let data = (0..w * h).map(|i| Rgba32F::rgb(i as f32 * k, 1.0, -(i as f32))).collect();
        Image::from_data(w, h, order, data).unwrap()
    }

    #[test]
    fn test_identical_is_zero() {
        let a = ramp(5, 3, ScanlineOrder::TopDown, 0.5);
        let mut d = Image::new(5, 3, ScanlineOrder::TopDown).unwrap();
        let s = absolute_difference(&mut d, &a, &a).unwrap();
        assert_eq!(s, DifferenceSummary::default());
        assert!(d.as_slice().iter().all(|p| *p == Rgba32F::new(0.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_mixed_orders() {
        let a = ramp(3, 4, ScanlineOrder::TopDown, 1.0);
        // same picture stored bottom-up
        let mut b = Image::new(3, 4, ScanlineOrder::BottomUp).unwrap();
        for y in 0..4 {
            for x in 0..3 {
                let i = b.index_of(x, y, ScanlineOrder::TopDown);
                *b.pixel_mut(i) = *a.pixel_at(x, y, ScanlineOrder::TopDown);
            }
        }
        let mut d = Image::new(3, 4, ScanlineOrder::BottomUp).unwrap();
        let s = absolute_difference(&mut d, &a, &b).unwrap();
        assert_eq!(s.max, 0.0);
    }

    #[test]
    fn test_size_mismatch() {
        let a = ramp(3, 4, ScanlineOrder::TopDown, 1.0);
        let b = ramp(4, 3, ScanlineOrder::TopDown, 1.0);
        let mut d = Image::new(3, 4, ScanlineOrder::TopDown).unwrap();
        assert!(matches!(absolute_difference(&mut d, &a, &b), Err(OpsError::SizeMismatch(_))));
        let mut wrong = Image::new(1, 1, ScanlineOrder::TopDown).unwrap();
        assert!(matches!(absolute_difference(&mut wrong, &a, &a), Err(OpsError::SizeMismatch(_))));
    }

    #[test]
    fn test_non_finite_counted() {
        let a = Image::from_data(2, 1, ScanlineOrder::TopDown, vec![Rgba32F::rgb(f32::NAN, 1.0, 1.0); 2]).unwrap();
        let b = Image::filled(2, 1, ScanlineOrder::TopDown, Rgba32F::rgb(0.0, 0.0, 0.0)).unwrap();
        let mut d = Image::new(2, 1, ScanlineOrder::TopDown).unwrap();
        let s = absolute_difference(&mut d, &a, &b).unwrap();
        assert_eq!(s.non_finite, 2);
        assert_eq!(s.max, 1.0);
        assert_eq!(s.mean, 1.0);
    }

    #[test]
    fn test_soa_matches_aos() {
        let a = ramp(17, 9, ScanlineOrder::TopDown, 0.25);
        let b = ramp(17, 9, ScanlineOrder::BottomUp, 0.75);
        let mut d = Image::new(17, 9, ScanlineOrder::TopDown).unwrap();
        let aos = absolute_difference(&mut d, &a, &b).unwrap();

        let (sa, sb) = (ImageSoA::from_image(&a).unwrap(), ImageSoA::from_image(&b).unwrap());
        let mut sd = ImageSoA::new(17, 9, ScanlineOrder::TopDown).unwrap();
        let soa = absolute_difference_soa(&mut sd, &sa, &sb).unwrap();

        assert_eq!(aos.max, soa.max);
        assert_relative_eq!(aos.mean, soa.mean, max_relative = 1e-5);
        assert_eq!(sd.to_image().unwrap(), d);
    }
}
