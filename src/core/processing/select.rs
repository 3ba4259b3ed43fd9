use tracing::{debug, warn};

use super::modes::Mode;
use crate::core::profile::{MAX_TARGETS, TargetProfile};
use crate::error::{Error, Result};
use crate::types::FallbackPolicy;

/// Detected mode(s) paired with the target(s) they should be moved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Nothing survived the volume filter; the band must pass through unchanged.
    None,
    /// One anchor. `degraded` marks a two-target profile matched with a single mode.
    Single {
        mode: Mode,
        target: f64,
        target_volume: Option<f64>,
        degraded: bool,
    },
    /// Two anchors, both ascending.
    Dual { modes: [Mode; 2], targets: [f64; 2] },
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }
}

/// Match detected modes against a band profile.
///
/// Modes lighter than the profile's `min_vol` are dropped as noise. A
/// one-target profile takes the heaviest remaining mode. A two-target profile
/// takes the two heaviest, kept in ascending value order; with only one mode
/// left it falls back to a single anchor chosen by `fallback`.
pub fn select_modes(
    modes: &[Mode],
    profile: &TargetProfile,
    fallback: FallbackPolicy,
) -> Result<Selection> {
    if profile.targets.is_empty() || profile.targets.len() > MAX_TARGETS {
        return Err(Error::configuration(
            profile.band,
            format!(
                "supported at most {} target modes, provided {}",
                MAX_TARGETS,
                profile.targets.len()
            ),
        ));
    }

    let kept: Vec<Mode> = modes
        .iter()
        .filter(|m| m.volume >= profile.min_vol)
        .copied()
        .collect();
    if kept.len() < modes.len() {
        debug!(
            "Band {}: dropped {} mode(s) below min_vol {}",
            profile.band,
            modes.len() - kept.len(),
            profile.min_vol
        );
    }

    let Some(heaviest) = heaviest(&kept, None) else {
        return Ok(Selection::None);
    };

    if profile.targets.len() == 1 {
        return Ok(Selection::Single {
            mode: kept[heaviest],
            target: profile.targets[0],
            target_volume: profile.target_volume(0),
            degraded: false,
        });
    }

    match heaviest_pair(&kept, heaviest) {
        Some((i0, i1)) => Ok(Selection::Dual {
            modes: [kept[i0], kept[i1]],
            targets: [profile.targets[0], profile.targets[1]],
        }),
        None => {
            let idx = fallback_target(profile, fallback);
            warn!(
                "Band {}: expected {} modes, found 1; falling back to target {} ({})",
                profile.band,
                profile.targets.len(),
                profile.targets[idx],
                fallback
            );
            Ok(Selection::Single {
                mode: kept[heaviest],
                target: profile.targets[idx],
                target_volume: profile.target_volume(idx),
                degraded: true,
            })
        }
    }
}

// Leftmost mode with the largest volume, optionally skipping one index.
fn heaviest(modes: &[Mode], skip: Option<usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, m) in modes.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        match best {
            Some(b) if modes[b].volume >= m.volume => {}
            _ => best = Some(i),
        }
    }
    best
}

// The two heaviest modes as indices in left-to-right order.
fn heaviest_pair(modes: &[Mode], first: usize) -> Option<(usize, usize)> {
    let second = heaviest(modes, Some(first))?;
    Some((first.min(second), first.max(second)))
}

fn fallback_target(profile: &TargetProfile, policy: FallbackPolicy) -> usize {
    match policy {
        FallbackPolicy::FirstTarget => 0,
        FallbackPolicy::SecondTarget => profile.targets.len() - 1,
        FallbackPolicy::DominantTarget => match &profile.volumes {
            Some(volumes) => {
                let mut best = 0;
                for (i, v) in volumes.iter().enumerate() {
                    if *v > volumes[best] {
                        best = i;
                    }
                }
                best
            }
            None => 0,
        },
    }
}
