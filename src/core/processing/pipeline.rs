//! Per-band orchestration: histogram, modes, selection, correction, and the
//! provenance strings that describe what was done to each band.
use std::collections::BTreeMap;

use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::correct::{ClampStats, CorrectionTransform};
use super::histogram::Histogram;
use super::modes::{Mode, describe, detect_modes};
use super::select::{Selection, select_modes};
use crate::core::params::CorrectionParams;
use crate::core::profile::{ProfileTable, TargetProfile};
use crate::error::{Error, Result};
use crate::types::CorrectionStatus;

/// Descriptive key/value metadata attached to a corrected band.
pub type Provenance = BTreeMap<String, String>;

pub const KEY_STATUS: &str = "HISTCORR_STATUS";
pub const KEY_MODES: &str = "HISTCORR_MODES";
pub const KEY_VOLUMES: &str = "HISTCORR_VOLUMES";
pub const KEY_TARGETS: &str = "HISTCORR_TARGETS";
pub const KEY_FORMULA: &str = "HISTCORR_FORMULA";
pub const KEY_RANGE: &str = "HISTCORR_RANGE";
pub const KEY_HIST_RANGE: &str = "HISTCORR_HIST_RANGE";

/// Supplies band samples (1-based band index); missing samples are NaN.
pub trait BandSource {
    fn band_count(&self) -> usize;
    fn read_band(&self, index: usize) -> Result<Array2<f64>>;
}

/// Receives corrected band samples with their provenance.
pub trait BandSink {
    fn write_band(&mut self, index: usize, data: &Array2<f64>, provenance: &Provenance)
    -> Result<()>;
}

/// Outcome of correcting one band
#[derive(Debug, Clone)]
pub struct BandReport {
    pub band: usize,
    pub status: CorrectionStatus,
    /// Selected mode values, ascending
    pub modes: Vec<f64>,
    /// Targets the selected modes were mapped onto
    pub targets: Vec<f64>,
    pub transform: Option<CorrectionTransform>,
    pub clamp: ClampStats,
    pub provenance: Provenance,
}

/// Outcome of correcting every band of an image
#[derive(Debug, Clone, Default)]
pub struct ImageReport {
    pub bands: Vec<BandReport>,
}

impl ImageReport {
    pub fn count(&self, status: CorrectionStatus) -> usize {
        self.bands.iter().filter(|b| b.status == status).count()
    }
}

/// Histogram of a band honoring the tail-trim settings.
pub fn build_histogram(samples: &[f64], params: &CorrectionParams) -> Histogram {
    if params.trim_tails {
        Histogram::build_trimmed(samples, params.bins, params.tail_fraction)
    } else {
        Histogram::build(samples, params.bins)
    }
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Correct one band in place against its profile.
///
/// A band without a usable mode is left untouched and reported as
/// `PassThrough`; only an unsupported profile is an error.
pub fn correct_band(
    samples: &mut [f64],
    profile: &TargetProfile,
    params: &CorrectionParams,
) -> Result<BandReport> {
    let hist = build_histogram(samples, params);
    debug!(
        "Band {}: histogram [{:.6}, {:.6}] over {} samples",
        profile.band,
        hist.min(),
        hist.max(),
        hist.total()
    );
    let modes = detect_modes(&hist, profile.min_spread);
    let selection = select_modes(&modes, profile, params.fallback)?;
    let transform = CorrectionTransform::from_selection(&selection, profile, params.respread);

    let mut provenance = Provenance::new();
    provenance.insert(
        KEY_HIST_RANGE.to_string(),
        format!("[{:.6}, {:.6}]", hist.min(), hist.max()),
    );
    provenance.insert(
        KEY_RANGE.to_string(),
        format!("[{}, {}]", profile.min, profile.max),
    );

    let (selected, targets): (Vec<Mode>, Vec<f64>) = match &selection {
        Selection::None => (Vec::new(), Vec::new()),
        Selection::Single { mode, target, .. } => (vec![*mode], vec![*target]),
        Selection::Dual { modes, targets } => (modes.to_vec(), targets.to_vec()),
    };

    let Some(transform) = transform else {
        warn!(
            "Band {}: found no usable mode for correction (detected: [{}]); passing through",
            profile.band,
            describe(&modes)
        );
        provenance.insert(
            KEY_STATUS.to_string(),
            CorrectionStatus::PassThrough.to_string(),
        );
        return Ok(BandReport {
            band: profile.band,
            status: CorrectionStatus::PassThrough,
            modes: Vec::new(),
            targets: Vec::new(),
            transform: None,
            clamp: ClampStats::default(),
            provenance,
        });
    };

    let status = match selection {
        Selection::Single { degraded: true, .. } => CorrectionStatus::Degraded,
        _ => CorrectionStatus::Corrected,
    };

    let clamp = transform.apply(samples);
    let mode_values: Vec<f64> = selected.iter().map(|m| m.value).collect();
    let volumes: Vec<f64> = selected.iter().map(|m| m.volume).collect();

    info!(
        "Band {}: {} modes [{}] -> targets [{}], {} (floored={}, discarded={})",
        profile.band,
        status,
        join(&mode_values),
        join(&targets),
        transform.formula(),
        clamp.floored,
        clamp.discarded
    );

    provenance.insert(KEY_STATUS.to_string(), status.to_string());
    provenance.insert(KEY_MODES.to_string(), join(&mode_values));
    provenance.insert(KEY_VOLUMES.to_string(), join(&volumes));
    provenance.insert(KEY_TARGETS.to_string(), join(&targets));
    provenance.insert(KEY_FORMULA.to_string(), transform.formula());

    Ok(BandReport {
        band: profile.band,
        status,
        modes: mode_values,
        targets,
        transform: Some(transform),
        clamp,
        provenance,
    })
}

/// Correct every band of `source` and hand the results to `sink`.
///
/// All profiles are resolved and every band is read and corrected before the
/// first write, so a configuration or read failure leaves the sink untouched.
/// Bands are corrected in parallel.
pub fn correct_image<S, K>(
    source: &S,
    sink: &mut K,
    profiles: &ProfileTable,
    params: &CorrectionParams,
) -> Result<ImageReport>
where
    S: BandSource + ?Sized,
    K: BandSink + ?Sized,
{
    params.validate()?;
    let count = source.band_count();
    let mut band_profiles = Vec::with_capacity(count);
    for band in 1..=count {
        let profile = profiles.get(band)?;
        profile.validate()?;
        band_profiles.push(profile);
    }

    let mut bands = Vec::with_capacity(count);
    for band in 1..=count {
        bands.push(source.read_band(band)?);
    }

    let reports = bands
        .par_iter_mut()
        .zip(band_profiles.par_iter())
        .map(|(data, profile)| {
            let samples = data.as_slice_mut().ok_or_else(|| {
                Error::Processing(format!("band {} is not contiguous", profile.band))
            })?;
            correct_band(samples, profile, params)
        })
        .collect::<Result<Vec<_>>>()?;

    for (data, report) in bands.iter().zip(&reports) {
        sink.write_band(report.band, data, &report.provenance)?;
    }

    let image = ImageReport { bands: reports };
    info!(
        "Image corrected: {} band(s), corrected={}, degraded={}, passthrough={}",
        count,
        image.count(CorrectionStatus::Corrected),
        image.count(CorrectionStatus::Degraded),
        image.count(CorrectionStatus::PassThrough)
    );
    Ok(image)
}
