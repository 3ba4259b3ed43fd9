//! High-level, ergonomic library API: correct a raster file into a new file,
//! batch helpers for directories, and histogram dumps. Prefer these
//! entrypoints over the low-level processing modules when integrating histcorr.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::params::CorrectionParams;
use crate::core::processing::collect::{HistogramReport, collect_histograms};
use crate::core::processing::pipeline::{ImageReport, correct_image};
use crate::core::profile::ProfileTable;
use crate::error::{Error, Result};
use crate::io::writers::metadata::{create_provenance_sidecar, sidecar_path};
use crate::io::{GdalBandReader, GdalBandWriter};

/// Suffix appended to the input file stem for corrected outputs.
pub const OUTPUT_SUFFIX: &str = "_histcorr";

/// Output path for `input` inside `output_dir`: `<stem>_histcorr.tiff`.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{}{}.tiff", stem, OUTPUT_SUFFIX))
}

fn is_raster_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
            .unwrap_or(false)
}

fn write_corrected(
    reader: &GdalBandReader,
    output: &Path,
    profiles: &ProfileTable,
    params: &CorrectionParams,
) -> Result<ImageReport> {
    let mut writer = GdalBandWriter::create(output, &reader.metadata)?;
    let report = correct_image(reader, &mut writer, profiles, params)?;
    let bands = writer.finish()?;
    create_provenance_sidecar(output, &bands)?;
    Ok(report)
}

/// Correct every band of the raster at `input` and write a Float64 GeoTIFF
/// to `output`, with a JSON provenance sidecar next to it.
///
/// On failure no output is left behind.
pub fn correct_image_to_path(
    input: &Path,
    output: &Path,
    profiles: &ProfileTable,
    params: &CorrectionParams,
) -> Result<ImageReport> {
    params.validate()?;
    let reader = GdalBandReader::open(input)?;
    info!(
        "Correcting {:?}: {}x{} pixels, {} band(s)",
        input, reader.metadata.size_x, reader.metadata.size_y, reader.metadata.bands
    );

    match write_corrected(&reader, output, profiles, params) {
        Ok(report) => {
            info!("Wrote corrected image: {:?}", output);
            Ok(report)
        }
        Err(e) => {
            for path in [output.to_path_buf(), sidecar_path(output)] {
                if path.exists() {
                    if let Err(rm) = fs::remove_file(&path) {
                        warn!("Failed to remove partial output {:?}: {}", path, rm);
                    }
                }
            }
            Err(e)
        }
    }
}

/// Dump the per-band histograms of the raster at `input` as JSON to `output`.
pub fn collect_histograms_to_path(
    input: &Path,
    output: &Path,
    params: &CorrectionParams,
) -> Result<HistogramReport> {
    let reader = GdalBandReader::open(input)?;
    let report = collect_histograms(&reader, params)?;
    report.write_json(output)?;
    Ok(report)
}

/// Summary of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Correct every `*.tif`/`*.tiff` file in `input_dir` into `output_dir`.
///
/// With `continue_on_error`, a failing image is logged and counted; otherwise
/// the first failure is returned.
pub fn process_directory_to_path(
    input_dir: &Path,
    output_dir: &Path,
    profiles: &ProfileTable,
    params: &CorrectionParams,
    continue_on_error: bool,
) -> Result<BatchReport> {
    process_directory_with(input_dir, output_dir, continue_on_error, |input, output| {
        correct_image_to_path(input, output, profiles, params).map(|_| ())
    })
}

/// Run `process(input, output)` for every `*.tif`/`*.tiff` file in
/// `input_dir`, with `output` named by [`output_path_for`] inside `output_dir`.
///
/// Files are visited in name order; other entries are skipped and counted.
pub fn process_directory_with<F>(
    input_dir: &Path,
    output_dir: &Path,
    continue_on_error: bool,
    mut process: F,
) -> Result<BatchReport>
where
    F: FnMut(&Path, &Path) -> Result<()>,
{
    if !input_dir.is_dir() {
        return Err(Error::InvalidArgument {
            arg: "input_dir",
            value: input_dir.display().to_string(),
        });
    }
    fs::create_dir_all(output_dir)?;

    let mut entries: Vec<PathBuf> = fs::read_dir(input_dir)?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();

    let mut report = BatchReport::default();
    for path in entries {
        if !is_raster_file(&path) {
            info!("Skipping non-raster entry: {:?}", path);
            report.skipped += 1;
            continue;
        }
        let output = output_path_for(&path, output_dir);
        info!("Processing: {:?} -> {:?}", path, output);
        match process(&path, &output) {
            Ok(()) => report.processed += 1,
            Err(e) if continue_on_error => {
                warn!("Error processing {:?}: {}", path, e);
                report.errors += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Batch complete: processed={}, skipped={}, errors={}",
        report.processed, report.skipped, report.errors
    );
    Ok(report)
}
