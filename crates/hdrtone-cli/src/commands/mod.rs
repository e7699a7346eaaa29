//! CLI command implementations

pub mod diff;
pub mod stats;
pub mod tonemap;

use anyhow::{bail, Context, Result};
use hdrtone_core::{Image, LdrPixel, Rgba16, Rgba32F, Rgba8, ScanlineOrder};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// A number, or `auto` to use the estimated value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AutoValue(pub Option<f32>);

impl AutoValue {
    /// `auto`.
    pub const AUTO: Self = Self(None);
}

impl FromStr for AutoValue {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::AUTO);
        }
        match s.parse::<f32>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(Self(Some(v))),
            Ok(v) => Err(format!("expected a positive number, got {v}")),
            Err(_) => Err(format!("expected a number or `auto`, got `{s}`")),
        }
    }
}

/// Expands paths and glob patterns, in argument order.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.exists() {
            files.push(path.to_path_buf());
            continue;
        }
        let before = files.len();
        files.extend(
            glob::glob(pattern)
                .with_context(|| format!("Invalid pattern: {pattern}"))?
                .filter_map(|r| r.ok()),
        );
        if files.len() == before {
            // kept so the per-file error shows up in the failure count
            warn!(pattern = %pattern, "no files match");
            files.push(path.to_path_buf());
        }
    }
    if files.is_empty() {
        bail!("No input files");
    }
    Ok(files)
}

/// `<dir>/<input stem>.<ext>`
pub fn output_path(dir: &Path, input: &Path, ext: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    dir.join(format!("{stem}.{ext}"))
}

/// Load an HDR image as top-down RGBA float.
pub fn load_hdr(path: &Path) -> Result<Image<Rgba32F>> {
    let img = image::open(path).with_context(|| format!("Failed to load: {}", path.display()))?;
    let (width, height) = (img.width(), img.height());
    debug!(path = %path.display(), width, height, color = ?img.color(), "loaded");

    let data = img
        .into_rgba32f()
        .into_raw()
        .chunks_exact(4)
        .map(|c| Rgba32F::new(c[0], c[1], c[2], c[3]))
        .collect();
    Image::from_data(width, height, ScanlineOrder::TopDown, data)
        .with_context(|| format!("Invalid image: {}", path.display()))
}

/// Display pixel formats the CLI can write.
pub trait SavePixel: LdrPixel {
    /// Save a top-down image.
    fn save(img: &Image<Self>, path: &Path) -> Result<()>;
}

impl SavePixel for Rgba8 {
    fn save(img: &Image<Self>, path: &Path) -> Result<()> {
        let raw = bytemuck::cast_slice::<Rgba8, u8>(img.as_slice()).to_vec();
        let buf = image::RgbaImage::from_raw(img.width(), img.height(), raw).context("Buffer size mismatch")?;
        buf.save(path).with_context(|| format!("Failed to save: {}", path.display()))
    }
}

impl SavePixel for Rgba16 {
    fn save(img: &Image<Self>, path: &Path) -> Result<()> {
        let raw = bytemuck::cast_slice::<Rgba16, u16>(img.as_slice()).to_vec();
        let buf = image::ImageBuffer::<image::Rgba<u16>, _>::from_raw(img.width(), img.height(), raw)
            .context("Buffer size mismatch")?;
        buf.save(path).with_context(|| format!("Failed to save: {}", path.display()))
    }
}

/// Save an LDR image, flipping it to top-down first if needed.
pub fn save_ldr<P: SavePixel>(img: &Image<P>, path: &Path) -> Result<()> {
    if img.order() == ScanlineOrder::TopDown {
        return P::save(img, path);
    }
    let mut flipped = Image::<P>::new(img.width(), img.height(), ScanlineOrder::TopDown)?;
    for y in 0..img.height() {
        flipped
            .scanline_mut(y, ScanlineOrder::TopDown)
            .copy_from_slice(img.scanline(y, ScanlineOrder::TopDown));
    }
    P::save(&flipped, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_value() {
        assert_eq!("auto".parse::<AutoValue>(), Ok(AutoValue::AUTO));
        assert_eq!("AUTO".parse::<AutoValue>(), Ok(AutoValue::AUTO));
        assert_eq!("0.18".parse::<AutoValue>(), Ok(AutoValue(Some(0.18))));
        assert!("0".parse::<AutoValue>().is_err());
        assert!("-1".parse::<AutoValue>().is_err());
        assert!("nan".parse::<AutoValue>().is_err());
        assert!("key".parse::<AutoValue>().is_err());
    }

    #[test]
    fn test_output_path() {
        let p = output_path(Path::new("out"), Path::new("shots/a.b.exr"), "png");
        assert_eq!(p, Path::new("out").join("a.b.png"));
    }

    #[test]
    fn test_expand_inputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.hdr", "b.hdr", "c.exr"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let pattern = dir.path().join("*.hdr").to_string_lossy().into_owned();
        let files = expand_inputs(&[pattern]).unwrap();
        assert_eq!(files.len(), 2);

        let exact = dir.path().join("c.exr").to_string_lossy().into_owned();
        let missing = dir.path().join("*.tif").to_string_lossy().into_owned();
        let files = expand_inputs(&[exact, missing]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(expand_inputs(&[]).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        let mut img = Image::<Rgba8>::new(3, 2, ScanlineOrder::BottomUp).unwrap();
        // top-left in picture space
        let i = img.index_of(0, 0, ScanlineOrder::TopDown);
        *img.pixel_mut(i) = Rgba8::new(255, 0, 0);
        save_ldr(&img, &path).unwrap();

        let back = load_hdr(&path).unwrap();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(*back.pixel(0), Rgba32F::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(*back.pixel(5), Rgba32F::new(0.0, 0.0, 0.0, 1.0));
    }
}
