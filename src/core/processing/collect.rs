//! Per-band histogram dumps for inspecting band distributions before and
//! after correction.
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::histogram::Histogram;
use super::pipeline::{BandSource, build_histogram};
use crate::core::params::CorrectionParams;
use crate::error::Result;

/// One non-empty histogram bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// 1-based bin index
    pub bin: usize,
    /// Upper edge of the bin
    pub value: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandHistogram {
    pub band: usize,
    pub min: f64,
    pub max: f64,
    pub total: u64,
    pub bins: Vec<HistogramBin>,
}

impl BandHistogram {
    pub fn from_histogram(band: usize, hist: &Histogram) -> Self {
        let bins = hist
            .counts()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(i, &count)| HistogramBin {
                bin: i + 1,
                value: hist.upper_edge(i),
                count,
            })
            .collect();
        Self {
            band,
            min: hist.min(),
            max: hist.max(),
            total: hist.total(),
            bins,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramReport {
    pub bands: Vec<BandHistogram>,
}

impl HistogramReport {
    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Wrote histogram report: {:?}", path);
        Ok(())
    }
}

/// Histogram of every band of `source`, built with the same settings the
/// correction uses.
pub fn collect_histograms<S: BandSource + ?Sized>(
    source: &S,
    params: &CorrectionParams,
) -> Result<HistogramReport> {
    params.validate()?;
    let mut bands = Vec::with_capacity(source.band_count());
    for band in 1..=source.band_count() {
        let data = source.read_band(band)?;
        let samples: Vec<f64> = data.iter().copied().collect();
        let hist = build_histogram(&samples, params);
        bands.push(BandHistogram::from_histogram(band, &hist));
    }
    Ok(HistogramReport { bands })
}
