use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::FallbackPolicy;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 100;

/// Default share of samples cut from each histogram tail.
pub const DEFAULT_TAIL_FRACTION: f64 = 0.01;

/// Run-wide correction parameters suitable for config files and CLI overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionParams {
    /// Number of histogram bins, fixed for the run
    pub bins: usize,
    /// If true, drop the low-density tails before locating modes
    pub trim_tails: bool,
    /// Share of samples cut from each tail when `trim_tails` is set
    pub tail_fraction: f64,
    /// Anchor choice when fewer modes are found than the profile expects
    pub fallback: FallbackPolicy,
    /// Rescale the spread around a single anchor by the detected/target volume ratio
    pub respread: bool,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            trim_tails: true,
            tail_fraction: DEFAULT_TAIL_FRACTION,
            fallback: FallbackPolicy::default(),
            respread: false,
        }
    }
}

impl CorrectionParams {
    /// Load parameters from a JSON file; missing fields take their defaults.
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: CorrectionParams = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::InvalidArgument {
                arg: "bins",
                value: self.bins.to_string(),
            });
        }
        if !(0.0..0.5).contains(&self.tail_fraction) {
            return Err(Error::InvalidArgument {
                arg: "tail_fraction",
                value: self.tail_fraction.to_string(),
            });
        }
        Ok(())
    }
}
