//! Benchmarks for hdrtone operations.
//!
//! Run with: `cargo bench -p hdrtone-bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use hdrtone_bench::{random_hdr, unit_ramp};
use hdrtone_core::{Bgra8, Image, ImageSoA, Rgba16, ScanlineOrder};
use hdrtone_math::{fastmath, DefaultSimd, SimdF32};
use hdrtone_ops::{
    estimate_params, estimate_params_soa, DisplayCurve, SrgbMethod, TmoTechnique, ToneMapper, ToneMapperConfig,
};
use hdrtone_transfer::{SrgbFast1, SrgbFast2, SrgbReference, TransferCurve};

const SIZES: [(u32, u32); 2] = [(640, 480), (1920, 1080)];

/// Benchmark the Reinhard02 estimator, AoS and SoA.
fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");

    for (w, h) in SIZES {
        let img = random_hdr(w, h, 1).unwrap();
        let soa = ImageSoA::from_image(&img).unwrap();
        let label = format!("{w}x{h}");
        group.throughput(Throughput::Elements(img.pixel_count() as u64));

        group.bench_with_input(BenchmarkId::new("aos", &label), &img, |b, img| {
            b.iter(|| estimate_params(black_box(img)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("soa", &label), &soa, |b, soa| {
            b.iter(|| estimate_params_soa(black_box(soa)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark full tone mapping through the LUT and the direct curve.
fn bench_tonemap(c: &mut Criterion) {
    let mut group = c.benchmark_group("tonemap");

    let (w, h) = SIZES[1];
    let img = random_hdr(w, h, 2).unwrap();
    let soa = ImageSoA::from_image(&img).unwrap();
    let params = estimate_params(&img).unwrap();
    group.throughput(Throughput::Elements(img.pixel_count() as u64));

    for technique in [TmoTechnique::Exposure, TmoTechnique::Reinhard02] {
        let mut tm = ToneMapper::new(ToneMapperConfig {
            technique,
            ..Default::default()
        })
        .unwrap();
        tm.set_params(params);
        let name = format!("{technique:?}").to_lowercase();
        let mut ldr = Image::<Bgra8>::new(w, h, ScanlineOrder::TopDown).unwrap();

        group.bench_function(format!("{name}_lut"), |b| {
            b.iter(|| tm.tone_map(&mut ldr, black_box(&img), true).unwrap())
        });

        group.bench_function(format!("{name}_direct"), |b| {
            b.iter(|| tm.tone_map(&mut ldr, black_box(&img), false).unwrap())
        });

        group.bench_function(format!("{name}_soa_lut"), |b| {
            b.iter(|| tm.tone_map_soa(&mut ldr, black_box(&soa), true).unwrap())
        });
    }

    let tm = ToneMapper::new(ToneMapperConfig {
        curve: DisplayCurve::srgb(SrgbMethod::Fast1),
        ..Default::default()
    })
    .unwrap();
    let mut ldr16 = Image::<Rgba16>::new(w, h, ScanlineOrder::TopDown).unwrap();
    group.bench_function("exposure_16bit", |b| {
        b.iter(|| tm.tone_map(&mut ldr16, black_box(&img), false).unwrap())
    });

    let mut flipped = Image::<Bgra8>::new(w, h, ScanlineOrder::BottomUp).unwrap();
    group.bench_function("exposure_remap_rows", |b| {
        b.iter(|| tm.tone_map(&mut flipped, black_box(&img), true).unwrap())
    });

    group.finish();
}

/// Benchmark the approximate log/exp/pow against libm.
fn bench_fastmath(c: &mut Criterion) {
    let mut group = c.benchmark_group("fastmath");

    let values: Vec<f32> = unit_ramp(16384).iter().map(|v| v * 100.0).collect();
    group.throughput(Throughput::Elements(values.len() as u64));

    group.bench_function("log_fast", |b| {
        b.iter(|| {
            values
                .chunks_exact(DefaultSimd::LANES)
                .map(|c| fastmath::log(DefaultSimd::load(black_box(c))).reduce_add())
                .sum::<f32>()
        })
    });

    group.bench_function("log_libm", |b| {
        b.iter(|| values.iter().map(|&v| black_box(v).ln()).sum::<f32>())
    });

    group.bench_function("exp_fast", |b| {
        b.iter(|| {
            values
                .chunks_exact(DefaultSimd::LANES)
                .map(|c| fastmath::exp(DefaultSimd::load(black_box(c)) * DefaultSimd::splat(0.01)).reduce_add())
                .sum::<f32>()
        })
    });

    group.bench_function("exp_libm", |b| {
        b.iter(|| values.iter().map(|&v| (black_box(v) * 0.01).exp()).sum::<f32>())
    });

    group.bench_function("pow_fast", |b| {
        let y = DefaultSimd::splat(1.0 / 2.4);
        b.iter(|| {
            values
                .chunks_exact(DefaultSimd::LANES)
                .map(|c| fastmath::pow(DefaultSimd::load(black_box(c)), y).reduce_add())
                .sum::<f32>()
        })
    });

    group.bench_function("pow_libm", |b| {
        b.iter(|| values.iter().map(|&v| black_box(v).powf(1.0 / 2.4)).sum::<f32>())
    });

    group.finish();
}

fn encode_all<C: TransferCurve>(curve: C, values: &[f32]) -> f32 {
    values
        .chunks_exact(DefaultSimd::LANES)
        .map(|c| curve.apply(DefaultSimd::load(c)).reduce_add())
        .sum()
}

/// Benchmark the sRGB evaluators.
fn bench_srgb(c: &mut Criterion) {
    let mut group = c.benchmark_group("srgb");

    for size in [4096usize, 65536] {
        let values = unit_ramp(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("reference", size), &values, |b, v| {
            b.iter(|| encode_all(SrgbReference, black_box(v)))
        });

        group.bench_with_input(BenchmarkId::new("fast1", size), &values, |b, v| {
            b.iter(|| encode_all(SrgbFast1, black_box(v)))
        });

        group.bench_with_input(BenchmarkId::new("fast2", size), &values, |b, v| {
            b.iter(|| encode_all(SrgbFast2, black_box(v)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_estimate, bench_tonemap, bench_fastmath, bench_srgb);

criterion_main!(benches);
