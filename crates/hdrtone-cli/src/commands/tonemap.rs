//! Batch tone mapping command

use super::{expand_inputs, load_hdr, output_path, save_ldr, SavePixel};
use crate::{GammaArg, SrgbArg, TonemapArgs};
use anyhow::{bail, Context, Result};
use hdrtone_core::{Image, ImageSoA, Rgba16, Rgba32F, Rgba8, ScanlineOrder};
use hdrtone_ops::{
    estimate_params, estimate_params_soa, DisplayCurve, GammaMethod, Reinhard02Overrides, SrgbMethod,
    TmoTechnique, ToneMapper, ToneMapperConfig,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

pub fn run(args: TonemapArgs, verbose: u8) -> Result<()> {
    trace!(inputs = args.input.len(), "tonemap::run");
    let tm = build_mapper(&args)?;
    let files = expand_inputs(&args.input)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create: {}", args.output.display()))?;
    info!(files = files.len(), output = %args.output.display(), "Starting tone mapping");

    let results: Vec<Result<PathBuf>> = files.par_iter().map(|input| process_file(input, &args, &tm)).collect();

    let mut failed = 0;
    for (input, r) in files.iter().zip(results) {
        match r {
            Ok(out) => {
                if verbose > 0 {
                    println!("{} -> {}", input.display(), out.display());
                }
            }
            Err(e) => {
                failed += 1;
                error!(file = %input.display(), "{e:#}");
                eprintln!("Error: {e:#}");
            }
        }
    }

    info!(success = files.len() - failed, failed, "Tone mapping complete");
    if failed > 0 {
        bail!("{} of {} files failed", failed, files.len());
    }
    Ok(())
}

fn exposure(args: &TonemapArgs) -> Result<f32> {
    match (args.exposure, args.expmult) {
        (Some(e), _) if !e.is_finite() => bail!("Exposure must be finite, got {e}"),
        (Some(e), _) => Ok(e),
        (None, Some(m)) if !(m.is_finite() && m > 0.0) => bail!("Exposure multiplier must be positive, got {m}"),
        (None, Some(m)) => Ok(m.log2()),
        (None, None) => Ok(0.0),
    }
}

fn curve(args: &TonemapArgs) -> DisplayCurve {
    if let Some(gamma) = args.gamma {
        let method = match args.gamma_method {
            GammaArg::Ref => GammaMethod::Reference,
            GammaArg::Fast => GammaMethod::Fast,
        };
        return DisplayCurve::Gamma { gamma, method };
    }
    match args.srgb.unwrap_or(SrgbArg::Fast2) {
        SrgbArg::Ref => DisplayCurve::srgb(SrgbMethod::Reference),
        SrgbArg::Fast1 => DisplayCurve::srgb(SrgbMethod::Fast1),
        SrgbArg::Fast2 => DisplayCurve::srgb(SrgbMethod::Fast2),
    }
}

fn build_mapper(args: &TonemapArgs) -> Result<ToneMapper> {
    let config = ToneMapperConfig {
        technique: if args.reinhard {
            TmoTechnique::Reinhard02
        } else {
            TmoTechnique::Exposure
        },
        exposure: exposure(args)?,
        curve: curve(args),
        lut_size: args.lut_size,
    };
    debug!(?config, "tone mapper");
    ToneMapper::new(config).context("Invalid tone mapping options")
}

fn overrides(args: &TonemapArgs) -> Reinhard02Overrides {
    Reinhard02Overrides {
        key: args.key.0,
        white_point: args.white.0,
        log_avg: args.log_avg.0,
    }
}

fn process_file(input: &Path, args: &TonemapArgs, base: &ToneMapper) -> Result<PathBuf> {
    let hdr = load_hdr(input)?;
    let soa = if args.soa {
        Some(ImageSoA::from_image(&hdr)?)
    } else {
        None
    };

    let mut tm = base.clone();
    if args.reinhard {
        let estimate = match &soa {
            Some(s) => estimate_params_soa(s)?,
            None => estimate_params(&hdr)?,
        };
        let params = overrides(args).resolve(&estimate);
        if params.is_sentinel() {
            warn!(file = %input.display(), "no valid pixels, output is black");
        }
        debug!(file = %input.display(), ?params, "Reinhard02");
        tm.set_params(params);
    }

    let out = output_path(&args.output, input, &args.format);
    if args.bpp16 {
        write::<Rgba16>(&tm, &hdr, soa.as_ref(), !args.no_lut, &out)?;
    } else {
        write::<Rgba8>(&tm, &hdr, soa.as_ref(), !args.no_lut, &out)?;
    }
    Ok(out)
}

fn write<P: SavePixel>(
    tm: &ToneMapper,
    hdr: &Image<Rgba32F>,
    soa: Option<&ImageSoA>,
    use_lut: bool,
    out: &Path,
) -> Result<()> {
    let mut ldr = Image::<P>::new(hdr.width(), hdr.height(), ScanlineOrder::TopDown)?;
    match soa {
        Some(s) => tm.tone_map_soa(&mut ldr, s, use_lut)?,
        None => tm.tone_map(&mut ldr, hdr, use_lut)?,
    }
    save_ldr(&ldr, out)
}
