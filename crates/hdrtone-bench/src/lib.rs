//! Input generators shared by the hdrtone benchmarks.

use hdrtone_core::{Image, Result, Rgba32F, ScanlineOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random scene with channels in `[0, 8)` and a few bright highlights.
pub fn random_hdr(width: u32, height: u32, seed: u64) -> Result<Image<Rgba32F>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width as usize * height as usize)
        .map(|_| {
            let boost = if rng.gen_ratio(1, 200) { 1000.0 } else { 1.0 };
            Rgba32F::rgb(
                rng.gen_range(0.0..8.0) * boost,
                rng.gen_range(0.0..8.0) * boost,
                rng.gen_range(0.0..8.0) * boost,
            )
        })
        .collect();
    Image::from_data(width, height, ScanlineOrder::TopDown, data)
}

/// `n` evenly spaced values in `(0, 1]`.
pub fn unit_ramp(n: usize) -> Vec<f32> {
    (1..=n).map(|i| i as f32 / n as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators() {
        let img = random_hdr(16, 8, 1).unwrap();
        assert_eq!(img.dimensions(), (16, 8));
        assert!(img.as_slice().iter().all(|p| p.r >= 0.0 && p.a == 1.0));
        let r = unit_ramp(4);
        assert_eq!(r, vec![0.25, 0.5, 0.75, 1.0]);
    }
}
