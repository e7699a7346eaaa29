//! HDR image diff command

use super::{load_hdr, save_ldr};
use crate::DiffArgs;
use anyhow::{bail, Context, Result};
use hdrtone_core::{Image, Rgba8, ScanlineOrder};
use hdrtone_ops::{absolute_difference, ToneMapper, ToneMapperConfig};
use tracing::{info, trace};

pub fn run(args: DiffArgs, verbose: u8) -> Result<()> {
    trace!(a = %args.a.display(), b = %args.b.display(), "diff::run");
    let img_a = load_hdr(&args.a)?;
    let img_b = load_hdr(&args.b)?;

    let mut diff = Image::new(img_a.width(), img_a.height(), ScanlineOrder::TopDown)?;
    let summary = absolute_difference(&mut diff, &img_a, &img_b).context("Cannot compare images")?;
    info!(max = summary.max, mean = summary.mean, non_finite = summary.non_finite, "diff");

    println!("Comparing {} vs {}", args.a.display(), args.b.display());
    println!("  Max difference:  {:.6}", summary.max);
    println!("  Mean difference: {:.6}", summary.mean);
    if summary.non_finite > 0 {
        println!("  Non-finite:      {}", summary.non_finite);
    }

    if let Some(ref output) = args.output {
        let tm = ToneMapper::new(ToneMapperConfig {
            exposure: args.exposure,
            ..Default::default()
        })?;
        let mut preview = Image::<Rgba8>::new(diff.width(), diff.height(), ScanlineOrder::TopDown)?;
        tm.tone_map(&mut preview, &diff, true)?;
        save_ldr(&preview, output)?;
        if verbose > 0 {
            println!("Difference image saved to {}", output.display());
        }
    }

    if args.threshold > 0.0 && summary.max > args.threshold {
        bail!("FAIL: Max difference {} exceeds threshold {}", summary.max, args.threshold);
    }
    Ok(())
}
