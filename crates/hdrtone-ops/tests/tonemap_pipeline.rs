//! End-to-end tone mapping through the public API.

use hdrtone_core::{Bgra8, Image, ImageSoA, LdrPixel, Rgba16, Rgba32F, Rgba8, ScanlineOrder};
use hdrtone_ops::{
    estimate_params, DisplayCurve, OpsError, SrgbMethod, TmoTechnique, ToneMapper, ToneMapperConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_image(seed: u64, w: u32, h: u32, order: ScanlineOrder) -> Image<Rgba32F> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..w * h)
        .map(|_| Rgba32F::rgb(rng.gen_range(0.0..8.0), rng.gen_range(0.0..8.0), rng.gen_range(0.0..8.0)))
        .collect();
    Image::from_data(w, h, order, data).unwrap()
}

fn gradient(w: u32, h: u32) -> Image<Rgba32F> {
    let data = (0..w * h)
        .map(|i| {
            let t = i as f32 / (w * h) as f32;
            Rgba32F::rgb(t * 4.0, t * 2.0, t)
        })
        .collect();
    Image::from_data(w, h, ScanlineOrder::TopDown, data).unwrap()
}

fn mapper(technique: TmoTechnique, curve: DisplayCurve) -> ToneMapper {
    ToneMapper::new(ToneMapperConfig {
        technique,
        curve,
        ..Default::default()
    })
    .unwrap()
}

fn max_channel_diff<P: LdrPixel>(a: &Image<P>, b: &Image<P>) -> u32 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .flat_map(|(p, q)| {
            let (p, q) = (p.quantized(), q.quantized());
            (0..3).map(move |c| p[c].abs_diff(q[c]))
        })
        .max()
        .unwrap_or(0)
}

#[test]
fn test_lut_matches_direct_on_random_image() {
    let src = random_image(11, 640, 480, ScanlineOrder::TopDown);
    for technique in [TmoTechnique::Exposure, TmoTechnique::Reinhard02] {
        let mut tm = mapper(technique, DisplayCurve::default());
        tm.set_exposure(-2.0);
        tm.set_params(estimate_params(&src).unwrap());

        let mut lut = Image::<Bgra8>::new(640, 480, ScanlineOrder::TopDown).unwrap();
        let mut direct = Image::<Bgra8>::new(640, 480, ScanlineOrder::TopDown).unwrap();
        tm.tone_map(&mut lut, &src, true).unwrap();
        tm.tone_map(&mut direct, &src, false).unwrap();

        let d = max_channel_diff(&lut, &direct);
        assert!(d <= 2, "{technique:?}: {d}");
    }
}

#[test]
fn test_exposure_is_monotonic() {
    let src = gradient(97, 13);
    let mut tm = mapper(TmoTechnique::Exposure, DisplayCurve::srgb(SrgbMethod::Reference));
    let mut prev = Image::<Rgba8>::new(97, 13, ScanlineOrder::TopDown).unwrap();

    for step in -8..=8 {
        tm.set_exposure(step as f32 * 0.5);
        let mut cur = Image::<Rgba8>::new(97, 13, ScanlineOrder::TopDown).unwrap();
        tm.tone_map(&mut cur, &src, false).unwrap();
        for (p, q) in prev.as_slice().iter().zip(cur.as_slice()) {
            assert!(q.r >= p.r && q.g >= p.g && q.b >= p.b, "exposure {step}: {p:?} -> {q:?}");
        }
        prev = cur;
    }
    // within a frame, brighter input never maps darker
    for row in prev.as_slice().windows(2) {
        assert!(row[1].r >= row[0].r);
    }
}

#[test]
fn test_soa_matches_aos() {
    let src = random_image(5, 333, 71, ScanlineOrder::BottomUp);
    let soa = ImageSoA::from_image(&src).unwrap();

    for curve in [DisplayCurve::srgb(SrgbMethod::Reference), DisplayCurve::gamma(2.2)] {
        let mut tm = mapper(TmoTechnique::Reinhard02, curve);
        tm.set_params(estimate_params(&src).unwrap());
        for use_lut in [true, false] {
            let mut a = Image::<Bgra8>::new(333, 71, ScanlineOrder::TopDown).unwrap();
            let mut b = Image::<Bgra8>::new(333, 71, ScanlineOrder::TopDown).unwrap();
            tm.tone_map(&mut a, &src, use_lut).unwrap();
            tm.tone_map_soa(&mut b, &soa, use_lut).unwrap();
            assert_eq!(a, b, "{curve:?} lut={use_lut}");
        }
    }
}

#[test]
fn test_scanline_remap() {
    let top_down = random_image(9, 45, 31, ScanlineOrder::TopDown);

    // the same picture stored bottom-up
    let mut bottom_up = Image::new(45, 31, ScanlineOrder::BottomUp).unwrap();
    for y in 0..31 {
        bottom_up
            .scanline_mut(y, ScanlineOrder::TopDown)
            .copy_from_slice(top_down.scanline(y, ScanlineOrder::TopDown));
    }

    let tm = mapper(TmoTechnique::Exposure, DisplayCurve::default());
    let mut expected = Image::<Bgra8>::new(45, 31, ScanlineOrder::TopDown).unwrap();
    let mut remapped = Image::<Bgra8>::new(45, 31, ScanlineOrder::TopDown).unwrap();
    tm.tone_map(&mut expected, &top_down, true).unwrap();
    tm.tone_map(&mut remapped, &bottom_up, true).unwrap();
    assert_eq!(expected, remapped);

    // and the SoA path with a bottom-up destination
    let soa = ImageSoA::from_image(&top_down).unwrap();
    let mut flipped = Image::<Bgra8>::new(45, 31, ScanlineOrder::BottomUp).unwrap();
    tm.tone_map_soa(&mut flipped, &soa, false).unwrap();
    for y in 0..31 {
        for x in 0..45 {
            assert_eq!(
                flipped.pixel_at(x, y, ScanlineOrder::TopDown),
                expected.pixel_at(x, y, ScanlineOrder::TopDown)
            );
        }
    }
}

#[test]
fn test_reinhard_end_to_end() {
    let src = random_image(21, 128, 96, ScanlineOrder::TopDown);
    let mut tm = mapper(TmoTechnique::Reinhard02, DisplayCurve::default());
    tm.set_params(estimate_params(&src).unwrap());

    let mut out = Image::<Rgba16>::new(128, 96, ScanlineOrder::TopDown).unwrap();
    tm.tone_map(&mut out, &src, true).unwrap();

    let saturated = out.as_slice().iter().filter(|p| p.r == u16::MAX).count();
    assert!(saturated < out.pixel_count() / 10, "saturated {saturated}");
    assert!(out.as_slice().iter().all(|p| p.a == u16::MAX));
    let mean = out.as_slice().iter().map(|p| p.g as f64).sum::<f64>() / out.pixel_count() as f64;
    assert!(mean > 10_000.0 && mean < 60_000.0, "mean {mean}");
}

#[test]
fn test_dimension_mismatch() {
    let src = random_image(1, 16, 16, ScanlineOrder::TopDown);
    let tm = mapper(TmoTechnique::Exposure, DisplayCurve::default());
    let mut dst = Image::<Bgra8>::new(16, 15, ScanlineOrder::TopDown).unwrap();
    let err = tm.tone_map(&mut dst, &src, true).unwrap_err();
    assert!(matches!(err, OpsError::SizeMismatch(_)));
    assert!(err.is_invalid_argument());
    // nothing written
    assert!(dst.as_slice().iter().all(|p| *p == Bgra8::default()));
}

#[test]
fn test_invalid_gamma() {
    for g in [0.0f32, -2.2, f32::NAN, f32::INFINITY] {
        let res = ToneMapper::new(ToneMapperConfig {
            curve: DisplayCurve::gamma(g),
            ..Default::default()
        });
        assert!(matches!(res, Err(OpsError::InvalidParameter(_))), "gamma {g}");

        let mut tm = mapper(TmoTechnique::Exposure, DisplayCurve::default());
        assert!(tm.set_gamma(g).is_err());
        assert_eq!(tm.config().curve, DisplayCurve::default());
    }
}

#[test]
fn test_gamma_lut_error_bound() {
    let mut tm = mapper(TmoTechnique::Exposure, DisplayCurve::default());
    tm.set_lut_size(4096).unwrap();
    tm.set_gamma(2.2).unwrap();
    assert!(tm.max_lut_error() <= 6);
    tm.set_srgb().unwrap();
    tm.set_lut_size(2048).unwrap();
    assert!(tm.max_lut_error() <= 2);
}
