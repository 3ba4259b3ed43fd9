//! Per-band target profiles: where the dominant histogram modes of each
//! spectral band are expected to land after correction.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest number of target modes a profile may declare.
pub const MAX_TARGETS: usize = 2;

/// Reference configuration for one spectral band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Canonical band index, 1-based
    pub band: usize,
    /// Lowest plausible corrected value; smaller results are floored to it
    pub min: f64,
    /// Highest plausible corrected value; larger results become no-data
    pub max: f64,
    /// Expected mode values, ascending (one or two)
    pub targets: Vec<f64>,
    /// Expected mode volumes, one per target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<f64>>,
    /// Peaks closer than this many bins are merged
    pub min_spread: usize,
    /// Sections lighter than this are treated as noise
    pub min_vol: f64,
}

impl TargetProfile {
    pub fn single(band: usize, min: f64, max: f64, target: f64) -> Self {
        Self {
            band,
            min,
            max,
            targets: vec![target],
            volumes: None,
            min_spread: DEFAULT_MIN_SPREAD,
            min_vol: DEFAULT_MIN_VOL,
        }
    }

    pub fn dual(band: usize, min: f64, max: f64, targets: [f64; 2], volumes: [f64; 2]) -> Self {
        Self {
            band,
            min,
            max,
            targets: targets.to_vec(),
            volumes: Some(volumes.to_vec()),
            min_spread: DEFAULT_MIN_SPREAD,
            min_vol: DEFAULT_MIN_VOL,
        }
    }

    /// Configured volume of the target at `idx`, if any.
    pub fn target_volume(&self, idx: usize) -> Option<f64> {
        self.volumes.as_ref().and_then(|v| v.get(idx).copied())
    }

    pub fn validate(&self) -> Result<()> {
        let band = self.band;
        if band == 0 {
            return Err(Error::configuration(band, "band index is 1-based"));
        }
        if self.targets.is_empty() {
            return Err(Error::configuration(band, "no target modes"));
        }
        if self.targets.len() > MAX_TARGETS {
            return Err(Error::configuration(
                band,
                format!(
                    "supported at most {} target modes, provided {}",
                    MAX_TARGETS,
                    self.targets.len()
                ),
            ));
        }
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return Err(Error::configuration(
                band,
                format!("invalid range [{}, {}]", self.min, self.max),
            ));
        }
        if self.targets.iter().any(|t| !t.is_finite()) {
            return Err(Error::configuration(band, "target modes must be finite"));
        }
        if self.targets.len() == 2 && self.targets[0] >= self.targets[1] {
            return Err(Error::configuration(band, "target modes must be ascending"));
        }
        if let Some(volumes) = &self.volumes {
            if volumes.len() != self.targets.len() {
                return Err(Error::configuration(
                    band,
                    format!(
                        "{} volumes for {} target modes",
                        volumes.len(),
                        self.targets.len()
                    ),
                ));
            }
            if volumes.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(Error::configuration(band, "target volumes must be positive"));
            }
        }
        if !(0.0..=1.0).contains(&self.min_vol) {
            return Err(Error::configuration(
                band,
                format!("min_vol {} outside [0, 1]", self.min_vol),
            ));
        }
        Ok(())
    }
}

pub const DEFAULT_MIN_SPREAD: usize = 3;
pub const DEFAULT_MIN_VOL: f64 = 0.05;

/// Target profiles for every band of an image, looked up by band index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTable {
    pub profiles: Vec<TargetProfile>,
}

impl ProfileTable {
    pub fn new(profiles: Vec<TargetProfile>) -> Result<Self> {
        let table = Self { profiles };
        table.validate()?;
        Ok(table)
    }

    /// Reference modes for Landsat surface reflectance bands 1..7
    /// (band 6 is thermal, in brightness units).
    pub fn landsat_default() -> Self {
        Self {
            profiles: vec![
                TargetProfile::single(1, 0.06, 0.12, 0.085),
                TargetProfile::dual(2, 0.03, 0.12, [0.045, 0.065], [0.2, 0.8]),
                TargetProfile::dual(3, 0.01, 0.11, [0.025, 0.05], [0.2, 0.8]),
                TargetProfile::dual(4, 0.0, 0.33, [0.02, 0.2], [0.2, 0.8]),
                TargetProfile::dual(5, -0.1, 0.21, [0.003, 0.12], [0.2, 0.8]),
                TargetProfile::single(6, 90.0, 165.0, 130.0),
                TargetProfile::dual(7, -0.01, 0.14, [0.002, 0.05], [0.2, 0.8]),
            ],
        }
    }

    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let table: ProfileTable = serde_json::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..i].iter().any(|p| p.band == profile.band) {
                return Err(Error::configuration(profile.band, "duplicate profile"));
            }
        }
        Ok(())
    }

    /// Profile for a 1-based band index.
    pub fn get(&self, band: usize) -> Result<&TargetProfile> {
        self.profiles
            .iter()
            .find(|p| p.band == band)
            .ok_or_else(|| Error::configuration(band, "no target profile configured"))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::landsat_default()
    }
}
