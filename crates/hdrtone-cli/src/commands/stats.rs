//! Reinhard02 statistics command

use super::{expand_inputs, load_hdr};
use crate::StatsArgs;
use anyhow::{bail, Result};
use hdrtone_core::ImageSoA;
use hdrtone_ops::{estimate_params, estimate_params_soa, Reinhard02Params};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{error, trace};

/// One line of `stats --json` output.
#[derive(Debug, Serialize)]
struct StatsReport {
    file: String,
    width: u32,
    height: u32,
    #[serde(flatten)]
    params: Reinhard02Params,
}

pub fn run(args: StatsArgs, verbose: u8) -> Result<()> {
    trace!(inputs = args.input.len(), "stats::run");
    let files = expand_inputs(&args.input)?;

    let results: Vec<Result<StatsReport>> = files.par_iter().map(|f| analyze(f, args.soa)).collect();

    let mut reports = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (input, r) in files.iter().zip(results) {
        match r {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                error!(file = %input.display(), "{e:#}");
                eprintln!("Error: {e:#}");
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for r in &reports {
            print_report(r, verbose);
        }
    }

    if failed > 0 {
        bail!("{} of {} files failed", failed, files.len());
    }
    Ok(())
}

fn analyze(path: &Path, soa: bool) -> Result<StatsReport> {
    let hdr = load_hdr(path)?;
    let params = if soa {
        estimate_params_soa(&ImageSoA::from_image(&hdr)?)?
    } else {
        estimate_params(&hdr)?
    };
    Ok(StatsReport {
        file: path.display().to_string(),
        width: hdr.width(),
        height: hdr.height(),
        params,
    })
}

fn print_report(r: &StatsReport, verbose: u8) {
    println!("{} ({}x{})", r.file, r.width, r.height);
    if r.params.is_sentinel() {
        println!("  no valid pixels");
        return;
    }
    println!("  Key:         {:.6}", r.params.key);
    println!("  White point: {:.6}", r.params.white_point);
    println!("  Log average: {:.6}", r.params.log_avg);
    if verbose > 0 {
        println!("  Min lum:     {:.6e}", r.params.l_min);
        println!("  Max lum:     {:.6e}", r.params.l_max);
    }
}
