use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use histcorr::api::output_path_for;
use histcorr::{
    CorrectionParams, CorrectionStatus, ProfileTable, collect_histograms_to_path,
    correct_image_to_path, process_directory_with,
};

use super::args::CliArgs;
use super::errors::AppError;

fn build_params(args: &CliArgs) -> Result<CorrectionParams, AppError> {
    let mut params = match &args.params {
        Some(path) => CorrectionParams::from_json_path(path)?,
        None => CorrectionParams::default(),
    };
    if let Some(bins) = args.bins {
        if bins == 0 {
            return Err(AppError::ZeroBins { bins });
        }
        params.bins = bins;
    }
    if args.no_trim {
        params.trim_tails = false;
    }
    if let Some(fallback) = args.fallback {
        params.fallback = fallback;
    }
    if args.respread {
        params.respread = true;
    }
    Ok(params)
}

fn histogram_path(dir: &Path, raster: &Path) -> PathBuf {
    let stem = raster
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{}_hist.json", stem))
}

fn process_single_file(
    input: &Path,
    output: &Path,
    profiles: &ProfileTable,
    params: &CorrectionParams,
    histogram: bool,
) -> histcorr::Result<()> {
    let out_dir = output
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if histogram {
        collect_histograms_to_path(input, &histogram_path(&out_dir, input), params)?;
    }

    let report = correct_image_to_path(input, output, profiles, params)?;
    for band in &report.bands {
        if band.status == CorrectionStatus::PassThrough {
            warn!("Band {} was passed through uncorrected", band.band);
        }
    }

    if histogram {
        collect_histograms_to_path(output, &histogram_path(&out_dir, output), params)?;
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let profiles = match &args.profiles {
        Some(path) => ProfileTable::from_json_path(path)?,
        None => ProfileTable::landsat_default(),
    };
    let params = build_params(&args)?;
    info!(
        "Parameters: bins={}, trim_tails={}, fallback={}, respread={}",
        params.bins, params.trim_tails, params.fallback, params.respread
    );

    let batch_mode = args.batch || args.input_dir.is_some();

    if batch_mode {
        let input_dir = args.input_dir.ok_or(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        })?;
        let output_dir = args.output_dir.ok_or(AppError::MissingArgument {
            arg: "--output-dir".to_string(),
        })?;

        info!("Starting batch processing from directory: {:?}", input_dir);
        info!("Output directory: {:?}", output_dir);

        let report = process_directory_with(&input_dir, &output_dir, args.batch, |input, output| {
            process_single_file(input, output, &profiles, &params, args.histogram)?;
            info!("Successfully processed: {:?}\n", input);
            Ok(())
        })?;

        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
    } else {
        let input = args.input.ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;
        let output = match args.output {
            Some(output) => output,
            None => {
                let dir = args.output_dir.ok_or(AppError::MissingArgument {
                    arg: "--output".to_string(),
                })?;
                fs::create_dir_all(&dir)?;
                output_path_for(&input, &dir)
            }
        };

        process_single_file(&input, &output, &profiles, &params, args.histogram)?;
        info!("Successfully processed: {:?} -> {:?}\n", input, output);
    }

    Ok(())
}
