//! Estimator behavior on synthetic scenes.

use approx::assert_relative_eq;
use hdrtone_core::{Image, ImageSoA, Rgba32F, ScanlineOrder};
use hdrtone_ops::{estimate_params, estimate_params_soa, Reinhard02Params};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const W: u32 = 640;
const H: u32 = 480;

fn random_image(seed: u64, w: u32, h: u32) -> Image<Rgba32F> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..w * h)
        .map(|_| Rgba32F::rgb(rng.gen_range(0.0..8.0), rng.gen_range(0.0..8.0), rng.gen_range(0.0..8.0)))
        .collect();
    Image::from_data(w, h, ScanlineOrder::TopDown, data).unwrap()
}

fn assert_finite(p: &Reinhard02Params) {
    for v in [p.key, p.white_point, p.log_avg, p.l_min, p.l_max] {
        assert!(v.is_finite(), "{p:?}");
    }
}

#[test]
fn test_uniform_images() {
    for l in [0.05f32, 0.18, 0.5, 1.0, 10.0, 1000.0] {
        let img = Image::filled(37, 23, ScanlineOrder::TopDown, Rgba32F::rgb(l, l, l)).unwrap();
        let p = estimate_params(&img).unwrap();
        assert_relative_eq!(p.key, 0.18, max_relative = 1e-4);
        assert_relative_eq!(p.log_avg, l, max_relative = 1e-3);
        assert_relative_eq!(p.white_point, 1.5 * l, max_relative = 1e-3);
        assert_relative_eq!(p.l_min, l, max_relative = 1e-5);
        assert_relative_eq!(p.l_max, l, max_relative = 1e-5);
    }
}

#[test]
fn test_dim_uniform_image_uses_floor_white() {
    let l = 0.01;
    let img = Image::filled(8, 8, ScanlineOrder::TopDown, Rgba32F::rgb(l, l, l)).unwrap();
    let p = estimate_params(&img).unwrap();
    assert_relative_eq!(p.white_point, 1.5 / 32.0, max_relative = 1e-4);
    assert_relative_eq!(p.log_avg, l, max_relative = 1e-3);
}

#[test]
fn test_random_scene() {
    let img = random_image(0x5eed, W, H);
    let p = estimate_params(&img).unwrap();
    assert_finite(&p);
    assert!(p.key > 0.25 && p.key < 0.35, "key {}", p.key);
    assert!(p.log_avg > 3.4 && p.log_avg < 3.7, "log_avg {}", p.log_avg);
    assert!(p.white_point >= p.log_avg, "{p:?}");
    assert!(p.l_min >= 0.0 && p.l_max <= 8.0);
}

#[test]
fn test_outlier_spikes() {
    let clean = random_image(7, W, H);
    let base = estimate_params(&clean).unwrap();

    let mut spiked = clean.clone();
    let mut rng = StdRng::seed_from_u64(8);
    let spikes = spiked.pixel_count() * 9 / 1000;
    for _ in 0..spikes {
        let i = rng.gen_range(0..spiked.pixel_count());
        let p = spiked.pixel_mut(i);
        *p = Rgba32F::rgb(p.r * 1e20, p.g * 1e20, p.b * 1e20);
    }

    let p = estimate_params(&spiked).unwrap();
    assert_finite(&p);
    assert!(p.key > 0.1 && p.key < 0.35, "key {}", p.key);
    assert_relative_eq!(p.log_avg, base.log_avg, max_relative = 0.05);
    assert!(p.l_max > 1e19);
}

#[test]
fn test_degenerate_range_has_finite_key() {
    let a = 1.0f32;
    let b = f32::from_bits(a.to_bits() + 1);
    let data = (0..64).map(|i| if i % 2 == 0 { Rgba32F::rgb(a, a, a) } else { Rgba32F::rgb(b, b, b) }).collect();
    let img = Image::from_data(8, 8, ScanlineOrder::TopDown, data).unwrap();
    let p = estimate_params(&img).unwrap();
    assert_finite(&p);
    assert!(p.key > 0.0);
}

#[test]
fn test_all_invalid_is_sentinel() {
    let data = vec![
        Rgba32F::rgb(0.0, 0.0, 0.0),
        Rgba32F::rgb(-1.0, -2.0, -3.0),
        Rgba32F::rgb(f32::NAN, 1.0, 1.0),
        Rgba32F::rgb(f32::INFINITY, 0.0, 0.0),
    ];
    let img = Image::from_data(2, 2, ScanlineOrder::BottomUp, data).unwrap();
    let p = estimate_params(&img).unwrap();
    assert!(p.is_sentinel());
    assert_eq!(p, Reinhard02Params::SENTINEL);
}

#[test]
fn test_invalid_pixels_are_ignored() {
    let l = 0.7f32;
    let mut img = Image::filled(32, 32, ScanlineOrder::TopDown, Rgba32F::rgb(l, l, l)).unwrap();
    for i in (0..img.pixel_count()).step_by(5) {
        *img.pixel_mut(i) = Rgba32F::rgb(f32::NAN, -1.0, 0.0);
    }
    let p = estimate_params(&img).unwrap();
    assert_relative_eq!(p.log_avg, l, max_relative = 1e-3);
    assert_relative_eq!(p.key, 0.18, max_relative = 1e-4);
}

#[test]
fn test_soa_matches_aos() {
    // odd width so rows do not line up with vector lanes
    let img = random_image(42, 641, 97);
    let soa = ImageSoA::from_image(&img).unwrap();
    let a = estimate_params(&img).unwrap();
    let b = estimate_params_soa(&soa).unwrap();
    assert_relative_eq!(a.key, b.key, max_relative = 1e-6);
    assert_relative_eq!(a.log_avg, b.log_avg, max_relative = 1e-6);
    assert_relative_eq!(a.white_point, b.white_point, max_relative = 1e-6);
    assert_eq!(a.l_min, b.l_min);
    assert_eq!(a.l_max, b.l_max);
}

#[test]
fn test_scanline_order_does_not_matter() {
    let img = random_image(3, 64, 48);
    let mut flipped = img.clone();
    flipped.set_order(ScanlineOrder::BottomUp);
    let a = estimate_params(&img).unwrap();
    let b = estimate_params(&flipped).unwrap();
    assert_eq!(a, b);
}
