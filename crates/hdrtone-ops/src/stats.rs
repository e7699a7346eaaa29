//! Reinhard02 parameter estimation.
//!
//! A single parallel sweep over the image derives the parameters of the
//! global photographic operator (Reinhard et al. 2002) without any user
//! input:
//!
//! 1. luminance of every pixel into a scratch buffer, invalid values zeroed,
//!    tracking min, max and the invalid count;
//! 2. zeros partitioned to the front, so the tail holds valid values only;
//! 3. natural logs of the valid values, compensated-summed and bucketed into
//!    a histogram over `[ln Ymin, ln Ymax]`;
//! 4. 1st and 99th percentiles read off the histogram;
//! 5. at most 1% of extreme outliers removed from the log sum;
//! 6. key, log-average and white point computed from the above.
//!
//! An image without a single valid pixel yields
//! [`Reinhard02Params::SENTINEL`]; that is not an error.
//!
//! # Example
//!
//! ```rust
//! use hdrtone_core::{Image, Rgba32F, ScanlineOrder};
//! use hdrtone_ops::stats::estimate_params;
//!
//! let img = Image::filled(16, 16, ScanlineOrder::TopDown, Rgba32F::rgb(0.5, 0.5, 0.5)).unwrap();
//! let p = estimate_params(&img).unwrap();
//! assert!((p.log_avg - 0.5).abs() < 1e-4);
//! assert_eq!(p.key, 0.18);
//! ```

use crate::error::{OpsError, OpsResult};
use crate::luminance::{luminance, valid_luminance_mask, RgbSource, SoaRgb, STATS_LUMA};
use crate::parallel::{self, chunk_len};
use hdrtone_core::{Image, ImageSoA, Rgba32F};
use hdrtone_math::{fastmath, DefaultSimd, KahanSimd, KahanSum, SimdF32, SimdI32};
use std::f32::consts::LOG2_E;
use tracing::{debug, trace, warn};

/// Middle-grey key used when the image gives no better estimate.
pub const DEFAULT_KEY: f32 = 0.18;

/// Upper bound on histogram bins.
pub const MAX_BINS: usize = 2048;

const BINS_PER_LOG_UNIT: f32 = 100.0;

/// Log ranges below this skip the histogram.
const MIN_HISTOGRAM_RANGE: f32 = 5e-8;

/// 2^-19
const INITIAL_EPSILON: f32 = 1.907_348_632_812_5e-6;

/// Fraction of valid pixels cut at each end of the histogram.
const PERCENTILE: f64 = 0.01;

/// log2(32 / 1.5): the white candidate `1.5 * 2^(r - 5)` exceeds the
/// log-average exactly when `r > log2(log_avg) + WHITE_LOG2_OFFSET`.
const WHITE_LOG2_OFFSET: f32 = 4.415_037_499_278;

/// Parameters of the Reinhard02 global operator.
///
/// `white_point >= log_avg` is expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reinhard02Params {
    /// Target exposure of the log-average ("key value").
    pub key: f32,
    /// Smallest luminance mapped to pure white.
    pub white_point: f32,
    /// Geometric mean of the valid luminances.
    pub log_avg: f32,
    /// Smallest valid luminance.
    pub l_min: f32,
    /// Largest valid luminance.
    pub l_max: f32,
}

impl Default for Reinhard02Params {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY,
            white_point: 1.0,
            log_avg: DEFAULT_KEY,
            l_min: 0.0,
            l_max: 1.0,
        }
    }
}

impl Reinhard02Params {
    /// Result for an image without a single valid pixel.
    pub const SENTINEL: Self = Self {
        key: 0.0,
        white_point: 0.0,
        log_avg: 0.0,
        l_min: 0.0,
        l_max: 0.0,
    };

    /// `true` for [`Self::SENTINEL`]-style parameters.
    pub fn is_sentinel(&self) -> bool {
        self.key == 0.0 && self.white_point == 0.0 && self.log_avg == 0.0
    }
}

/// Explicit values that replace parts of an estimate.
///
/// `None` means "auto": keep the estimated value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reinhard02Overrides {
    /// Key override.
    pub key: Option<f32>,
    /// White point override.
    pub white_point: Option<f32>,
    /// Log-average override.
    pub log_avg: Option<f32>,
}

impl Reinhard02Overrides {
    /// `true` when every field is auto.
    pub fn is_auto(&self) -> bool {
        self.key.is_none() && self.white_point.is_none() && self.log_avg.is_none()
    }

    /// Merges the overrides into `estimate`.
    pub fn resolve(&self, estimate: &Reinhard02Params) -> Reinhard02Params {
        Reinhard02Params {
            key: self.key.unwrap_or(estimate.key),
            white_point: self.white_point.unwrap_or(estimate.white_point),
            log_avg: self.log_avg.unwrap_or(estimate.log_avg),
            ..*estimate
        }
    }
}

/// Estimates Reinhard02 parameters of an AoS image.
///
/// # Errors
///
/// - [`OpsError::InvalidDimensions`] for an image without pixels
/// - [`OpsError::AllocationFailed`] if the scratch buffer cannot be reserved
pub fn estimate_params(img: &Image<Rgba32F>) -> OpsResult<Reinhard02Params> {
    estimate::<DefaultSimd, _>(img.as_slice())
}

/// Estimates Reinhard02 parameters of a SoA image.
///
/// Produces the same result as [`estimate_params`] on the equivalent AoS
/// image, up to float reassociation in the parallel reductions.
pub fn estimate_params_soa(img: &ImageSoA) -> OpsResult<Reinhard02Params> {
    estimate::<DefaultSimd, _>(&SoaRgb::new(img))
}

fn estimate<V: SimdF32, S: RgbSource + ?Sized>(src: &S) -> OpsResult<Reinhard02Params> {
    let len = src.len();
    if len == 0 {
        return Err(OpsError::empty_image());
    }
    trace!(pixels = len, lanes = V::LANES, "stats::estimate");

    let mut scratch = alloc_scratch(len)?;
    let range = luminance_pass::<V, S>(src, &mut scratch);
    let valid = len - range.invalid;
    if valid == 0 {
        debug!(pixels = len, "no valid luminance, returning sentinel parameters");
        return Ok(Reinhard02Params::SENTINEL);
    }
    if range.invalid > valid {
        warn!(invalid = range.invalid, pixels = len, "most pixels have invalid luminance");
    }

    let zeros = partition_invalid(&mut scratch);
    let values = &scratch[zeros..];

    let lmin_log = fastmath::log_scalar(range.min);
    let lmax_log = fastmath::log_scalar(range.max);
    let layout = HistogramLayout::new(lmin_log, lmax_log);
    let logs = log_pass::<V>(values, layout.as_ref());

    let threshold = (PERCENTILE * valid as f64).floor() as u64;
    let (l1, l99) = match &layout {
        Some(h) => h.percentiles(&logs.hist, threshold, lmin_log, lmax_log),
        None => (lmin_log, lmin_log),
    };

    let cutoff = fastmath::exp_scalar(fastmath::exp_scalar(l99));
    let (removed, removed_sum) = exclude_outliers(values, cutoff, threshold);
    let mut log_sum = logs.sum;
    log_sum.add(-removed_sum.value());

    let log_mean = log_sum.value() / (valid - removed) as f32;
    let log_avg = fastmath::exp_scalar(log_mean);

    let key = if l99 - l1 > f32::MIN_POSITIVE {
        DEFAULT_KEY * 4f32.powf((2.0 * log_mean - l1 - l99) / (l99 - l1))
    } else {
        DEFAULT_KEY
    };

    let full_range = LOG2_E * (lmax_log - lmin_log);
    let white_point = if full_range > LOG2_E * log_mean + WHITE_LOG2_OFFSET {
        1.5 * (full_range - 5.0).exp2()
    } else {
        1.5 * range.max
    };

    let params = Reinhard02Params {
        key,
        white_point,
        log_avg,
        l_min: range.min,
        l_max: range.max,
    };
    debug!(
        key,
        white_point,
        log_avg,
        l_min = range.min,
        l_max = range.max,
        valid,
        removed,
        bins = layout.map_or(0, |h| h.bins),
        "estimated Reinhard02 parameters"
    );
    Ok(params)
}

fn alloc_scratch(len: usize) -> OpsResult<Vec<f32>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| OpsError::AllocationFailed(format!("{len} luminance values: {e}")))?;
    v.resize(len, 0.0);
    Ok(v)
}

/// Min, max and invalid count of one chunk.
#[derive(Debug, Clone, Copy)]
struct LumRange {
    min: f32,
    max: f32,
    invalid: usize,
}

impl LumRange {
    fn empty() -> Self {
        Self {
            min: f32::INFINITY,
            max: 0.0,
            invalid: 0,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            invalid: self.invalid + other.invalid,
        }
    }
}

/// Writes the luminance of every pixel to `scratch`, `0` for invalid ones.
fn luminance_pass<V: SimdF32, S: RgbSource + ?Sized>(src: &S, scratch: &mut [f32]) -> LumRange {
    let chunk = chunk_len(scratch.len());
    parallel::fold_chunks_mut(
        scratch,
        chunk,
        LumRange::empty,
        |mut acc, offset, out| {
            let zero = V::splat(0.0);
            let inf = V::splat(f32::INFINITY);
            let mut vmin = inf;
            let mut vmax = zero;
            for (k, lanes) in out.chunks_mut(V::LANES).enumerate() {
                let n = lanes.len();
                let (r, g, b) = src.load_rgb::<V>(offset + k * V::LANES, n);
                let y = luminance(r, g, b, STATS_LUMA);
                let valid = valid_luminance_mask(y) & V::lane_mask(n);
                let y = V::select(valid, y, zero);
                lanes.copy_from_slice(&y.to_array().as_ref()[..n]);
                vmin = vmin.min(V::select(valid, y, inf));
                vmax = vmax.max(y);
                acc.invalid += n - valid.count_true();
            }
            acc.min = acc.min.min(vmin.reduce_min());
            acc.max = acc.max.max(vmax.reduce_max());
            acc
        },
        LumRange::merge,
    )
}

/// Moves zero entries to the front and returns how many there are.
fn partition_invalid(values: &mut [f32]) -> usize {
    let mut front = 0;
    for i in 0..values.len() {
        if values[i] == 0.0 {
            values.swap(front, i);
            front += 1;
        }
    }
    front
}

/// Bin geometry over `[lmin, lmin + range + eps)`.
#[derive(Debug, Clone, Copy)]
struct HistogramLayout {
    bins: usize,
    scale: f32,
    bin_width: f32,
    lmin: f32,
}

impl HistogramLayout {
    /// `None` when the log range is too narrow to bin.
    fn new(lmin: f32, lmax: f32) -> Option<Self> {
        let range = lmax - lmin;
        if range < MIN_HISTOGRAM_RANGE {
            return None;
        }
        let bins = ((BINS_PER_LOG_UNIT * (1e-5 + range).ceil()) as usize).clamp(1, MAX_BINS);

        // grow eps until the top value lands strictly inside the last bin
        let mut eps = INITIAL_EPSILON;
        while ((bins as f32 / (eps + range)) * range) as usize >= bins {
            eps *= 2.0;
        }
        Some(Self {
            bins,
            scale: bins as f32 / (eps + range),
            bin_width: (eps + range) / bins as f32,
            lmin,
        })
    }

    /// `(L1, L99)`: lower bin edges where the cumulative count from either
    /// end first exceeds `threshold`.
    fn percentiles(&self, hist: &[u64], threshold: u64, lmin: f32, lmax: f32) -> (f32, f32) {
        let edge = |i: usize| i as f32 * self.bin_width + self.lmin;

        let mut l99 = lmax;
        let mut cum = 0;
        for (i, &c) in hist.iter().enumerate().rev() {
            cum += c;
            if cum > threshold {
                l99 = edge(i);
                break;
            }
        }

        let mut l1 = lmin;
        cum = 0;
        for (i, &c) in hist.iter().enumerate() {
            cum += c;
            if cum > threshold {
                l1 = edge(i);
                break;
            }
        }
        (l1, l99)
    }
}

/// Per-worker log sum and histogram.
struct LogAccum {
    sum: KahanSum,
    hist: Vec<u64>,
}

impl LogAccum {
    fn new(bins: usize) -> Self {
        Self {
            sum: KahanSum::new(),
            hist: vec![0; bins],
        }
    }

    fn add_chunk<V: SimdF32>(&mut self, values: &[f32], layout: Option<&HistogramLayout>) {
        let mut k = KahanSimd::<V>::new();
        for lanes in values.chunks(V::LANES) {
            let n = lanes.len();
            // fill with 1.0 so padding lanes add ln(1) = 0
            let l = fastmath::log(V::load_partial(lanes, 1.0));
            k.add(V::select(V::lane_mask(n), l, V::splat(0.0)));

            if let Some(h) = layout {
                let idx = ((l - V::splat(h.lmin)) * V::splat(h.scale)).trunc_int().to_array();
                for &i in &idx.as_ref()[..n] {
                    let bin = (i.max(0) as usize).min(h.bins - 1);
                    self.hist[bin] += 1;
                }
            }
        }
        self.sum.merge(&k.finish());
    }

    fn merge(mut self, other: Self) -> Self {
        self.sum.merge(&other.sum);
        for (a, b) in self.hist.iter_mut().zip(&other.hist) {
            *a += b;
        }
        self
    }
}

fn log_pass<V: SimdF32>(values: &[f32], layout: Option<&HistogramLayout>) -> LogAccum {
    let bins = layout.map_or(0, |h| h.bins);
    parallel::fold_chunks(
        values,
        chunk_len(values.len()),
        || LogAccum::new(bins),
        |mut acc, _, c| {
            acc.add_chunk::<V>(c, layout);
            acc
        },
        LogAccum::merge,
    )
}

/// Removes at most `limit` values above `cutoff`, returning how many were
/// removed and the compensated sum of their logs.
fn exclude_outliers(values: &[f32], cutoff: f32, limit: u64) -> (usize, KahanSum) {
    let mut sum = KahanSum::new();
    let mut removed = 0usize;
    if limit == 0 {
        return (removed, sum);
    }
    for &v in values {
        if v > cutoff {
            sum.add(fastmath::log_scalar(v));
            removed += 1;
            if removed as u64 == limit {
                break;
            }
        }
    }
    (removed, sum)
}
