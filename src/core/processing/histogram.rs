use tracing::debug;

/// Fixed-bin count histogram over the valid (finite) samples of a band.
///
/// Bins are `delta = (max - min) / bins` wide; bin `i` covers
/// `[min + i*delta, min + (i+1)*delta)` and the last bin also takes `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    min: f64,
    max: f64,
    counts: Vec<u64>,
}

impl Histogram {
    /// Build a histogram over every finite sample; NaN and infinities are
    /// treated as missing.
    /// An input without valid samples yields `min = max = 0` and all-zero counts.
    pub fn build(samples: &[f64], bins: usize) -> Self {
        Self::build_filtered(samples, bins, |_| true)
    }

    /// Build a histogram over the samples inside `[lo, hi]`.
    pub fn build_within(samples: &[f64], bins: usize, lo: f64, hi: f64) -> Self {
        Self::build_filtered(samples, bins, |v| v >= lo && v <= hi)
    }

    /// Two-pass histogram that drops the low-density tails first.
    ///
    /// Walking from the left, the bin at which the accumulated count first
    /// reaches `tail_fraction` of all samples gives the new lower bound (its
    /// upper edge); the symmetric walk from the right gives the new upper
    /// bound (its lower edge). The histogram is then rebuilt over the samples
    /// inside the new bounds. With too few samples for the fraction to cover
    /// a whole sample, the first-pass histogram is returned as is.
    pub fn build_trimmed(samples: &[f64], bins: usize, tail_fraction: f64) -> Self {
        let full = Self::build(samples, bins);
        let threshold = (full.total() as f64 * tail_fraction).floor() as u64;
        if threshold == 0 || full.delta() <= 0.0 {
            return full;
        }

        let ileft = tail_bin(full.counts.iter(), threshold);
        let iright = full.counts.len() - 1 - tail_bin(full.counts.iter().rev(), threshold);
        let lo = full.min + full.delta() * (ileft + 1) as f64;
        let hi = full.min + full.delta() * iright as f64;
        if lo >= hi {
            debug!(
                "Tail trim skipped: window [{:.6}, {:.6}] collapsed (bins {}..{})",
                lo, hi, ileft, iright
            );
            return full;
        }

        let trimmed = Self::build_within(samples, bins, lo, hi);
        if trimmed.is_empty() {
            return full;
        }
        debug!(
            "Tail trim: [{:.6}, {:.6}] -> [{:.6}, {:.6}], kept {}/{} samples",
            full.min,
            full.max,
            trimmed.min,
            trimmed.max,
            trimmed.total(),
            full.total()
        );
        trimmed
    }

    fn build_filtered(samples: &[f64], bins: usize, keep: impl Fn(f64) -> bool) -> Self {
        let bins = bins.max(1);

        // First pass: extremes of the retained samples
        let mut count: u64 = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in samples {
            if !v.is_finite() || !keep(v) {
                continue;
            }
            count += 1;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }

        let mut counts = vec![0u64; bins];
        if count == 0 {
            return Self {
                min: 0.0,
                max: 0.0,
                counts,
            };
        }

        // Degenerate case: all values are equal
        if max - min <= 0.0 {
            counts[0] = count;
            return Self { min, max, counts };
        }

        // Second pass: bin the retained samples
        let delta = (max - min) / bins as f64;
        for &v in samples {
            if !v.is_finite() || !keep(v) {
                continue;
            }
            let idx = ((v - min) / delta).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        Self { min, max, counts }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Bin width.
    pub fn delta(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    /// Number of samples binned.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Upper edge of bin `idx`, the value reported for a mode peaking there.
    pub fn upper_edge(&self, idx: usize) -> f64 {
        self.min + self.delta() * (idx + 1) as f64
    }

    /// Probability density per bin; all zeros for an empty histogram.
    pub fn density(&self) -> Vec<f64> {
        let total = self.total();
        if total == 0 {
            return vec![0.0; self.counts.len()];
        }
        let total = total as f64;
        self.counts.iter().map(|&c| c as f64 / total).collect()
    }
}

// Index (in iteration order) of the bin at which the running count reaches `threshold`.
fn tail_bin<'a>(counts: impl Iterator<Item = &'a u64>, threshold: u64) -> usize {
    let mut acc = 0u64;
    let mut last = 0;
    for (i, &c) in counts.enumerate() {
        acc += c;
        last = i;
        if acc >= threshold {
            break;
        }
    }
    last
}
