//! Shared types and enums used across histcorr.
//! Includes `FallbackPolicy` and `CorrectionStatus`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which target a band with two configured modes anchors to when only one
/// usable mode is detected.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Always the lower target.
    FirstTarget,
    /// Always the upper target.
    SecondTarget,
    /// The target with the largest configured volume; the first one when
    /// the profile carries no volumes.
    #[default]
    DominantTarget,
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FallbackPolicy::FirstTarget => "FirstTarget",
            FallbackPolicy::SecondTarget => "SecondTarget",
            FallbackPolicy::DominantTarget => "DominantTarget",
        };
        write!(f, "{}", s)
    }
}

/// What happened to a band during correction.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    /// Detected modes matched the profile and the band was rescaled.
    Corrected,
    /// Fewer modes than configured; rescaled against a single fallback target.
    Degraded,
    /// No usable mode; samples left untouched.
    PassThrough,
}

impl std::fmt::Display for CorrectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrectionStatus::Corrected => write!(f, "corrected"),
            CorrectionStatus::Degraded => write!(f, "degraded"),
            CorrectionStatus::PassThrough => write!(f, "passthrough"),
        }
    }
}
