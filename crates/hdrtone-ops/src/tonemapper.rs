//! Tone-mapping orchestrator.
//!
//! [`ToneMapper`] owns the configuration, the current Reinhard02 parameters
//! and the display LUT. A call to [`ToneMapper::tone_map`] resolves the
//! configuration once into a monomorphized kernel
//!
//! ```text
//! {Exposure, Reinhard02} x {LUT, Gamma(ref|fast), sRGB(ref|fast1|fast2)}
//! ```
//!
//! and runs it over the image in parallel chunks.
//!
//! # Example
//!
//! ```rust
//! use hdrtone_core::{Bgra8, Image, Rgba32F, ScanlineOrder};
//! use hdrtone_ops::{ToneMapper, ToneMapperConfig};
//!
//! let src = Image::filled(8, 8, ScanlineOrder::TopDown, Rgba32F::rgb(0.5, 0.5, 0.5)).unwrap();
//! let mut dst = Image::<Bgra8>::new(8, 8, ScanlineOrder::TopDown).unwrap();
//!
//! let mut tm = ToneMapper::new(ToneMapperConfig::default()).unwrap();
//! tm.set_exposure(1.0);
//! tm.tone_map(&mut dst, &src, true).unwrap();
//! assert_eq!(*dst.pixel(0), Bgra8::new(255, 255, 255));
//! ```

use crate::display::{encode, CurveVisitor, DisplayCurve, DisplayLut, DEFAULT_LUT_SIZE};
use crate::error::{OpsError, OpsResult};
use crate::luminance::{RgbSource, SoaRgb};
use crate::parallel::{self, chunk_len};
use crate::scaling::{ExposureScaler, LuminanceScaler, Reinhard02Scaler};
use crate::stats::Reinhard02Params;
use hdrtone_core::{Image, ImageSoA, LdrPixel, Rgba32F, ScanlineOrder};
use hdrtone_math::simd::{DefaultSimd, SimdF32, SimdI32};
use hdrtone_transfer::{GammaMethod, SrgbMethod, TransferCurve};
use std::sync::Arc;
use tracing::{debug, trace};

/// Scaling operator applied before display encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TmoTechnique {
    /// `rgb * 2^exposure`.
    #[default]
    Exposure,
    /// Reinhard02 global operator with the mapper's current parameters.
    Reinhard02,
}

/// Tone-mapper settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToneMapperConfig {
    /// Scaling operator.
    pub technique: TmoTechnique,
    /// Exposure in stops, used by [`TmoTechnique::Exposure`].
    pub exposure: f32,
    /// Display encoding.
    pub curve: DisplayCurve,
    /// Requested LUT size; rounded down to a multiple of 4.
    pub lut_size: usize,
}

impl Default for ToneMapperConfig {
    fn default() -> Self {
        Self {
            technique: TmoTechnique::Exposure,
            exposure: 0.0,
            curve: DisplayCurve::default(),
            lut_size: DEFAULT_LUT_SIZE,
        }
    }
}

/// HDR to LDR converter.
///
/// Tone mapping takes `&self` and never mutates the source; setters take
/// `&mut self` and replace the LUT with a freshly built one, so a rebuild
/// cannot overlap a running pass.
#[derive(Debug, Clone)]
pub struct ToneMapper {
    config: ToneMapperConfig,
    params: Reinhard02Params,
    lut: Arc<DisplayLut>,
    srgb_method: SrgbMethod,
    gamma_method: GammaMethod,
}

impl ToneMapper {
    /// Validates `config` and builds its LUT.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for a non-positive or non-finite gamma,
    /// or a LUT size below 4.
    pub fn new(config: ToneMapperConfig) -> OpsResult<Self> {
        let lut = DisplayLut::build(config.curve, config.lut_size)?;
        let (srgb_method, gamma_method) = match config.curve {
            DisplayCurve::Srgb(m) => (m, GammaMethod::default()),
            DisplayCurve::Gamma { method, .. } => (SrgbMethod::default(), method),
        };
        let config = ToneMapperConfig {
            lut_size: lut.len(),
            ..config
        };
        Ok(Self {
            config,
            params: Reinhard02Params::default(),
            lut: Arc::new(lut),
            srgb_method,
            gamma_method,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &ToneMapperConfig {
        &self.config
    }

    /// Current Reinhard02 parameters.
    pub fn params(&self) -> &Reinhard02Params {
        &self.params
    }

    /// Current display LUT.
    pub fn lut(&self) -> &Arc<DisplayLut> {
        &self.lut
    }

    /// Sets the exposure in stops.
    pub fn set_exposure(&mut self, exposure: f32) {
        self.config.exposure = exposure;
    }

    /// Selects the scaling operator.
    pub fn set_technique(&mut self, technique: TmoTechnique) {
        self.config.technique = technique;
    }

    /// Replaces the Reinhard02 parameters.
    pub fn set_params(&mut self, params: Reinhard02Params) {
        self.params = params;
    }

    /// Switches to the power-law curve with `gamma`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] if `gamma <= 0` or not finite; the
    /// mapper is left unchanged.
    pub fn set_gamma(&mut self, gamma: f32) -> OpsResult<()> {
        self.set_curve(DisplayCurve::Gamma {
            gamma,
            method: self.gamma_method,
        })
    }

    /// Switches to the sRGB curve with the last selected sRGB method.
    pub fn set_srgb(&mut self) -> OpsResult<()> {
        self.set_curve(DisplayCurve::Srgb(self.srgb_method))
    }

    /// Selects the sRGB evaluator, rebuilding the LUT when sRGB is active.
    pub fn set_srgb_method(&mut self, method: SrgbMethod) -> OpsResult<()> {
        self.srgb_method = method;
        match self.config.curve {
            DisplayCurve::Srgb(_) => self.set_curve(DisplayCurve::Srgb(method)),
            DisplayCurve::Gamma { .. } => Ok(()),
        }
    }

    /// Selects the gamma evaluator, rebuilding the LUT when gamma is active.
    pub fn set_gamma_method(&mut self, method: GammaMethod) -> OpsResult<()> {
        self.gamma_method = method;
        match self.config.curve {
            DisplayCurve::Gamma { gamma, .. } => self.set_curve(DisplayCurve::Gamma { gamma, method }),
            DisplayCurve::Srgb(_) => Ok(()),
        }
    }

    /// Changes the LUT size; rounded down to a multiple of 4.
    pub fn set_lut_size(&mut self, size: usize) -> OpsResult<()> {
        let lut = DisplayLut::build(self.config.curve, size)?;
        self.config.lut_size = lut.len();
        self.lut = Arc::new(lut);
        Ok(())
    }

    /// Largest LUT error in 8-bit steps, see [`DisplayLut::max_error`].
    pub fn max_lut_error(&self) -> u32 {
        self.lut.max_error()
    }

    fn set_curve(&mut self, curve: DisplayCurve) -> OpsResult<()> {
        let lut = DisplayLut::build(curve, self.config.lut_size)?;
        debug!(?curve, lut_size = lut.len(), "rebuilt display LUT");
        self.config.curve = curve;
        self.lut = Arc::new(lut);
        Ok(())
    }

    /// Tone maps an AoS image into `dest`.
    ///
    /// The LUT is used only when `use_lut` is set and `P` is an 8-bit format;
    /// 16-bit output always takes the direct path. Source and destination
    /// may have different scanline orders.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidDimensions`] if `src` has no pixels
    /// - [`OpsError::SizeMismatch`] if the dimensions differ
    pub fn tone_map<P: LdrPixel>(
        &self,
        dest: &mut Image<P>,
        src: &Image<Rgba32F>,
        use_lut: bool,
    ) -> OpsResult<()> {
        check_dims(dest.dimensions(), src.dimensions())?;
        self.dispatch(dest, src.as_slice(), src.order(), use_lut);
        Ok(())
    }

    /// Tone maps a SoA image into `dest`; see [`Self::tone_map`].
    pub fn tone_map_soa<P: LdrPixel>(
        &self,
        dest: &mut Image<P>,
        src: &ImageSoA,
        use_lut: bool,
    ) -> OpsResult<()> {
        check_dims(dest.dimensions(), src.dimensions())?;
        self.dispatch(dest, &SoaRgb::new(src), src.order(), use_lut);
        Ok(())
    }

    fn dispatch<P: LdrPixel, S: RgbSource + ?Sized>(
        &self,
        dest: &mut Image<P>,
        src: &S,
        src_order: ScanlineOrder,
        use_lut: bool,
    ) {
        let lut = if use_lut && P::SUPPORTS_LUT {
            Some(self.lut.as_ref())
        } else {
            if use_lut {
                debug!(bits = P::BITS, "LUT needs 8-bit output, using the direct path");
            }
            None
        };
        trace!(
            width = dest.width(),
            height = dest.height(),
            technique = ?self.config.technique,
            lut = lut.is_some(),
            "tone_map"
        );

        match self.config.technique {
            TmoTechnique::Exposure => {
                let scaler = ExposureScaler::new(self.config.exposure);
                self.run(scaler, dest, src, src_order, lut);
            }
            TmoTechnique::Reinhard02 => {
                let scaler = Reinhard02Scaler::new(&self.params);
                if !scaler.is_valid() {
                    debug!(params = ?self.params, "degenerate Reinhard02 parameters, output is black");
                }
                self.run(scaler, dest, src, src_order, lut);
            }
        }
    }

    fn run<Sc: LuminanceScaler, P: LdrPixel, S: RgbSource + ?Sized>(
        &self,
        scaler: Sc,
        dest: &mut Image<P>,
        src: &S,
        src_order: ScanlineOrder,
        lut: Option<&DisplayLut>,
    ) {
        match lut {
            Some(lut) => map_image::<DefaultSimd, _, _, _>(dest, src, src_order, &LutKernel { scaler, lut }),
            None => self.config.curve.visit(DirectPass {
                scaler,
                dest,
                src,
                src_order,
            }),
        }
    }
}

fn check_dims(dest: (u32, u32), src: (u32, u32)) -> OpsResult<()> {
    if src.0 == 0 || src.1 == 0 {
        return Err(OpsError::empty_image());
    }
    if dest != src {
        return Err(OpsError::size_mismatch(src, dest));
    }
    Ok(())
}

/// Converts one vector of scene pixels into display pixels.
trait PixelKernel: Sync {
    /// Writes `out.len() <= V::LANES` pixels.
    fn map<V: SimdF32, P: LdrPixel>(&self, r: V, g: V, b: V, out: &mut [P]);
}

struct DirectKernel<Sc, C> {
    scaler: Sc,
    curve: C,
}

impl<Sc: LuminanceScaler, C: TransferCurve> PixelKernel for DirectKernel<Sc, C> {
    #[inline]
    fn map<V: SimdF32, P: LdrPixel>(&self, r: V, g: V, b: V, out: &mut [P]) {
        let (r, g, b) = self.scaler.scale(r, g, b);
        let qr = encode(&self.curve, r, P::MAX).to_array();
        let qg = encode(&self.curve, g, P::MAX).to_array();
        let qb = encode(&self.curve, b, P::MAX).to_array();
        let (qr, qg, qb) = (qr.as_ref(), qg.as_ref(), qb.as_ref());
        for (k, px) in out.iter_mut().enumerate() {
            *px = P::from_quantized(qr[k] as u32, qg[k] as u32, qb[k] as u32);
        }
    }
}

struct LutKernel<'a, Sc> {
    scaler: Sc,
    lut: &'a DisplayLut,
}

impl<Sc: LuminanceScaler> PixelKernel for LutKernel<'_, Sc> {
    #[inline]
    fn map<V: SimdF32, P: LdrPixel>(&self, r: V, g: V, b: V, out: &mut [P]) {
        let (r, g, b) = self.scaler.scale(r, g, b);
        let table = self.lut.as_slice();
        let ir = self.lut.index(r).to_array();
        let ig = self.lut.index(g).to_array();
        let ib = self.lut.index(b).to_array();
        let (ir, ig, ib) = (ir.as_ref(), ig.as_ref(), ib.as_ref());
        for (k, px) in out.iter_mut().enumerate() {
            *px = P::from_quantized(
                table[ir[k] as usize] as u32,
                table[ig[k] as usize] as u32,
                table[ib[k] as usize] as u32,
            );
        }
    }
}

struct DirectPass<'a, Sc, P, S: ?Sized> {
    scaler: Sc,
    dest: &'a mut Image<P>,
    src: &'a S,
    src_order: ScanlineOrder,
}

impl<Sc, P, S> CurveVisitor for DirectPass<'_, Sc, P, S>
where
    Sc: LuminanceScaler,
    P: LdrPixel,
    S: RgbSource + ?Sized,
{
    type Output = ();

    fn visit<C: TransferCurve>(self, curve: C) {
        let kernel = DirectKernel {
            scaler: self.scaler,
            curve,
        };
        map_image::<DefaultSimd, _, _, _>(self.dest, self.src, self.src_order, &kernel);
    }
}

/// Runs `kernel` over every pixel of `dest`.
///
/// With matching scanline orders the destination is split into flat chunks
/// over the pixel index range. Otherwise each destination row `y` reads the
/// source row that is `y` counted in the destination's order.
fn map_image<V, P, S, K>(dest: &mut Image<P>, src: &S, src_order: ScanlineOrder, kernel: &K)
where
    V: SimdF32,
    P: LdrPixel,
    S: RgbSource + ?Sized,
    K: PixelKernel,
{
    let width = dest.width() as usize;
    let height = dest.height();
    let dest_order = dest.order();

    if dest_order == src_order {
        let out = dest.as_mut_slice();
        let chunk = chunk_len(out.len());
        parallel::for_each_chunk_mut(out, chunk, |offset, px| {
            map_span::<V, _, _, _>(src, offset, px, kernel);
        });
    } else {
        trace!(?dest_order, ?src_order, "tone_map: row remap");
        parallel::for_each_row_mut(dest.as_mut_slice(), width, |y, row| {
            let src_row = dest_order.remap_row(y as u32, height, src_order) as usize;
            map_span::<V, _, _, _>(src, src_row * width, row, kernel);
        });
    }
}

#[inline]
fn map_span<V, P, S, K>(src: &S, start: usize, out: &mut [P], kernel: &K)
where
    V: SimdF32,
    P: LdrPixel,
    S: RgbSource + ?Sized,
    K: PixelKernel,
{
    for (k, px) in out.chunks_mut(V::LANES).enumerate() {
        let (r, g, b) = src.load_rgb::<V>(start + k * V::LANES, px.len());
        kernel.map(r, g, b, px);
    }
}
