use tracing::debug;

use super::select::Selection;
use crate::core::profile::TargetProfile;

/// Piecewise-linear correction `(v*factor - center)*spread + center`, clamped
/// to the profile range: results below `min` are floored to `min`, results
/// above `max` become NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionTransform {
    pub factor: f64,
    pub center: f64,
    pub spread: f64,
    pub min: f64,
    pub max: f64,
}

/// How many samples the clamp touched during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClampStats {
    pub floored: usize,
    pub discarded: usize,
}

impl CorrectionTransform {
    /// Scale `mode` onto `target`, then stretch around the target by `spread`.
    pub fn single_anchor(mode: f64, target: f64, spread: f64, min: f64, max: f64) -> Option<Self> {
        Self {
            factor: target / mode,
            center: target,
            spread,
            min,
            max,
        }
        .finite()
    }

    /// Move the midpoint of two modes onto the midpoint of two targets and
    /// stretch so the modes land on the targets.
    pub fn dual_anchor(modes: [f64; 2], targets: [f64; 2], min: f64, max: f64) -> Option<Self> {
        let center = 0.5 * (targets[0] + targets[1]);
        let factor = center / (0.5 * (modes[0] + modes[1]));
        let spread = (targets[1] - targets[0]) / (modes[1] - modes[0]) / factor;
        Self {
            factor,
            center,
            spread,
            min,
            max,
        }
        .finite()
    }

    /// Build the transform for a selection; `None` when nothing was selected
    /// or the anchors give a non-finite transform.
    pub fn from_selection(
        selection: &Selection,
        profile: &TargetProfile,
        respread: bool,
    ) -> Option<Self> {
        match selection {
            Selection::None => None,
            Selection::Single {
                mode,
                target,
                target_volume,
                ..
            } => {
                if !mode.value.is_finite() {
                    return None;
                }
                let spread = match target_volume {
                    Some(tv) if respread => mode.volume / tv,
                    _ => 1.0,
                };
                Self::single_anchor(mode.value, *target, spread, profile.min, profile.max)
            }
            Selection::Dual { modes, .. }
                if !(modes[0].value.is_finite() && modes[1].value.is_finite()) =>
            {
                None
            }
            Selection::Dual { modes, targets } => Self::dual_anchor(
                [modes[0].value, modes[1].value],
                *targets,
                profile.min,
                profile.max,
            ),
        }
    }

    fn finite(self) -> Option<Self> {
        if self.factor.is_finite() && self.spread.is_finite() && self.center.is_finite() {
            Some(self)
        } else {
            debug!(
                "Rejected non-finite transform: factor={}, center={}, spread={}",
                self.factor, self.center, self.spread
            );
            None
        }
    }

    #[inline]
    fn unclamped(&self, v: f64) -> f64 {
        (v * self.factor - self.center) * self.spread + self.center
    }

    /// Correct one sample; NaN stays NaN.
    #[inline]
    pub fn correct(&self, v: f64) -> f64 {
        if v.is_nan() {
            return v;
        }
        let res = self.unclamped(v);
        if res < self.min {
            self.min
        } else if res > self.max {
            f64::NAN
        } else {
            res
        }
    }

    /// Correct every sample in place.
    pub fn apply(&self, samples: &mut [f64]) -> ClampStats {
        let mut stats = ClampStats::default();
        for v in samples.iter_mut() {
            if v.is_nan() {
                continue;
            }
            let res = self.unclamped(*v);
            *v = if res < self.min {
                stats.floored += 1;
                self.min
            } else if res > self.max {
                stats.discarded += 1;
                f64::NAN
            } else {
                res
            };
        }
        stats
    }

    /// Human-readable formula for provenance metadata.
    pub fn formula(&self) -> String {
        format!(
            "(v*{:.6} - {:.6})*{:.6} + {:.6}; <{} -> {}; >{} -> nodata",
            self.factor, self.center, self.spread, self.center, self.min, self.min, self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processing::modes::{Mode, Section};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn mode(value: f64, volume: f64) -> Mode {
        Mode {
            value,
            volume,
            section: Section {
                start: 0,
                peak: 0,
                end: 0,
            },
        }
    }

    #[test]
    fn single_anchor_moves_mode_onto_target() {
        let t = CorrectionTransform::single_anchor(0.1, 0.085, 1.0, 0.0, 1.0).unwrap();
        assert!(close(t.correct(0.1), 0.085));
        assert!(close(t.correct(0.2), 0.17));
    }

    #[test]
    fn dual_anchor_maps_both_modes() {
        let t = CorrectionTransform::dual_anchor([0.03, 0.25], [0.02, 0.2], -1.0, 1.0).unwrap();
        assert!(close(t.correct(0.03), 0.02));
        assert!(close(t.correct(0.25), 0.2));
        assert!(close(t.correct(0.14), 0.11));
    }

    #[test]
    fn identity_when_modes_equal_targets() {
        let t = CorrectionTransform::dual_anchor([0.2, 0.6], [0.2, 0.6], -1.0, 2.0).unwrap();
        assert!(close(t.factor, 1.0));
        assert!(close(t.spread, 1.0));
        let mut samples = vec![0.0, 0.1, 0.35, 0.99, 1.5, f64::NAN];
        let original = samples.clone();
        t.apply(&mut samples);
        for (a, b) in samples.iter().zip(&original) {
            if b.is_nan() {
                assert!(a.is_nan());
            } else {
                assert!(close(*a, *b));
            }
        }
    }

    #[test]
    fn identity_still_clamps_out_of_range() {
        let t = CorrectionTransform::single_anchor(0.5, 0.5, 1.0, 0.0, 1.0).unwrap();
        assert_eq!(t.correct(-0.2), 0.0);
        assert!(t.correct(1.3).is_nan());
    }

    #[test]
    fn clamp_is_asymmetric() {
        let t = CorrectionTransform::single_anchor(1.0, 1.0, 1.0, 0.5, 2.0).unwrap();
        assert!(t.correct(2.0 + 1e-9).is_nan());
        assert_eq!(t.correct(0.5 - 1e-9), 0.5);
        assert_eq!(t.correct(2.0), 2.0);
    }

    #[test]
    fn scaling_samples_and_target_scales_output() {
        let k = 3.5;
        let samples = [0.12, 0.3, 0.45, 0.7];
        let t1 = CorrectionTransform::single_anchor(0.4, 0.5, 1.0, -100.0, 100.0).unwrap();
        let tk = CorrectionTransform::single_anchor(0.4 * k, 0.5 * k, 1.0, -100.0, 100.0).unwrap();
        for v in samples {
            assert!(close(tk.correct(v * k), k * t1.correct(v)));
        }
    }

    #[test]
    fn nan_passes_through_apply() {
        let t = CorrectionTransform::single_anchor(0.5, 0.25, 1.0, 0.0, 1.0).unwrap();
        let mut samples = vec![f64::NAN, 0.5, f64::NAN];
        let stats = t.apply(&mut samples);
        assert!(samples[0].is_nan());
        assert!(close(samples[1], 0.25));
        assert!(samples[2].is_nan());
        assert_eq!(stats, ClampStats::default());
    }

    #[test]
    fn apply_counts_clamped_samples() {
        let t = CorrectionTransform::single_anchor(1.0, 1.0, 1.0, 0.5, 2.0).unwrap();
        let mut samples = vec![0.1, 0.2, 1.0, 3.0];
        let stats = t.apply(&mut samples);
        assert_eq!(stats.floored, 2);
        assert_eq!(stats.discarded, 1);
        assert_eq!(samples[0], 0.5);
        assert!(samples[3].is_nan());
    }

    #[test]
    fn exact_mapping_onto_min_is_not_floored() {
        let t = CorrectionTransform::single_anchor(1.0, 1.0, 1.0, 0.5, 2.0).unwrap();
        let mut samples = vec![0.5, 0.25];
        let stats = t.apply(&mut samples);
        assert_eq!(samples, vec![0.5, 0.5]);
        assert_eq!(stats.floored, 1);
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn infinite_mode_has_no_transform() {
        let profile = TargetProfile::single(1, 0.0, 1.0, 0.3);
        let selection = Selection::Single {
            mode: mode(f64::INFINITY, 1.0),
            target: 0.3,
            target_volume: None,
            degraded: false,
        };
        assert!(CorrectionTransform::from_selection(&selection, &profile, false).is_none());

        let profile = TargetProfile::dual(2, 0.0, 1.0, [0.2, 0.6], [0.5, 0.5]);
        let selection = Selection::Dual {
            modes: [mode(0.3, 0.5), mode(f64::INFINITY, 0.5)],
            targets: [0.2, 0.6],
        };
        assert!(CorrectionTransform::from_selection(&selection, &profile, false).is_none());
    }

    #[test]
    fn zero_mode_is_rejected() {
        assert!(CorrectionTransform::single_anchor(0.0, 0.5, 1.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn respread_uses_volume_ratio() {
        let profile = TargetProfile::dual(2, 0.0, 1.0, [0.2, 0.6], [0.25, 0.75]);
        let selection = Selection::Single {
            mode: mode(0.4, 0.5),
            target: 0.2,
            target_volume: Some(0.25),
            degraded: true,
        };
        let plain = CorrectionTransform::from_selection(&selection, &profile, false).unwrap();
        assert_eq!(plain.spread, 1.0);

        let respread = CorrectionTransform::from_selection(&selection, &profile, true).unwrap();
        assert!(close(respread.spread, 2.0));
        assert!(close(respread.factor, 0.5));
        // the anchor itself stays fixed
        assert!(close(respread.correct(0.4), 0.2));
    }

    #[test]
    fn no_selection_has_no_transform() {
        let profile = TargetProfile::single(1, 0.0, 1.0, 0.5);
        assert!(CorrectionTransform::from_selection(&Selection::None, &profile, true).is_none());
    }
}
