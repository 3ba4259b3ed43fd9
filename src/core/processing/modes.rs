//! Mode (peak) detection over a density histogram.
//!
//! A single left-to-right scan splits the histogram into sections, each one
//! an ascending run followed by a descending run. Empty bins are skipped
//! entirely: they neither extend nor break a section. Sections whose peaks
//! are closer than `min_spread` bins are merged as they are pushed.
use tracing::debug;

use super::histogram::Histogram;

/// Bin indices of one ascend-then-descend run of the density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub peak: usize,
    pub end: usize,
}

impl Section {
    fn at(i: usize) -> Self {
        Self {
            start: i,
            peak: i,
            end: i,
        }
    }
}

/// A detected mode: its value, its share of the total mass, and the section it spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mode {
    pub value: f64,
    pub volume: f64,
    pub section: Section,
}

enum ScanState {
    NoSection,
    Growing(Section),
    Shrinking(Section),
}

/// Scan `density` for sections, merging peaks closer than `min_spread` bins.
pub fn detect_sections(density: &[f64], min_spread: usize) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut state = ScanState::NoSection;
    let mut prev = 0.0;

    for (i, &d) in density.iter().enumerate() {
        if d <= 0.0 {
            continue;
        }
        state = match state {
            ScanState::NoSection => ScanState::Growing(Section::at(i)),
            ScanState::Growing(mut s) => {
                s.end = i;
                if d >= prev {
                    s.peak = i;
                    ScanState::Growing(s)
                } else {
                    ScanState::Shrinking(s)
                }
            }
            ScanState::Shrinking(mut s) => {
                if d < prev {
                    s.end = i;
                    ScanState::Shrinking(s)
                } else {
                    // local minimum passed: close and start over from here
                    push_section(&mut sections, s, density, min_spread);
                    ScanState::Growing(Section::at(i))
                }
            }
        };
        prev = d;
    }

    if let ScanState::Growing(s) | ScanState::Shrinking(s) = state {
        push_section(&mut sections, s, density, min_spread);
    }
    sections
}

fn push_section(sections: &mut Vec<Section>, s: Section, density: &[f64], min_spread: usize) {
    if let Some(last) = sections.last_mut() {
        if s.peak - last.peak < min_spread {
            last.end = s.end;
            if density[s.peak] > density[last.peak] {
                last.peak = s.peak;
            }
            return;
        }
    }
    sections.push(s);
}

/// Detect modes over a density array spanning `[min, max]`, in ascending value order.
pub fn detect_modes_in(min: f64, max: f64, density: &[f64], min_spread: usize) -> Vec<Mode> {
    if density.is_empty() {
        return Vec::new();
    }
    let delta = (max - min) / density.len() as f64;
    detect_sections(density, min_spread)
        .into_iter()
        .map(|section| Mode {
            value: min + delta * (section.peak + 1) as f64,
            volume: density[section.start..=section.end].iter().sum(),
            section,
        })
        .collect()
}

/// Detect modes of a histogram.
pub fn detect_modes(hist: &Histogram, min_spread: usize) -> Vec<Mode> {
    let modes = detect_modes_in(hist.min(), hist.max(), &hist.density(), min_spread);
    debug!(
        "Detected {} mode(s) over [{:.6}, {:.6}]: {}",
        modes.len(),
        hist.min(),
        hist.max(),
        describe(&modes)
    );
    modes
}

/// `value(volume)` pairs, comma separated, for logs and provenance.
pub fn describe(modes: &[Mode]) -> String {
    modes
        .iter()
        .map(|m| format!("{:.6}({:.3})", m.value, m.volume))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn two_separated_peaks() {
        let density = [0.0, 0.05, 0.10, 0.20, 0.15, 0.05, 0.0, 0.10, 0.30, 0.10];
        let modes = detect_modes_in(0.0, 100.0, &density, 2);
        assert_eq!(modes.len(), 2);

        assert_eq!(
            modes[0].section,
            Section {
                start: 1,
                peak: 3,
                end: 5
            }
        );
        assert!(close(modes[0].value, 40.0));
        assert!(close(modes[0].volume, 0.55));

        assert_eq!(
            modes[1].section,
            Section {
                start: 7,
                peak: 8,
                end: 9
            }
        );
        assert!(close(modes[1].value, 90.0));
        assert!(close(modes[1].volume, 0.50));
    }

    #[test]
    fn all_zero_density_has_no_sections() {
        assert!(detect_sections(&[0.0; 100], 3).is_empty());
        assert!(detect_modes_in(0.0, 0.0, &[0.0; 100], 3).is_empty());
    }

    #[test]
    fn single_bin_forms_one_section() {
        let mut density = vec![0.0; 100];
        density[0] = 1.0;
        let sections = detect_sections(&density, 3);
        assert_eq!(sections, vec![Section::at(0)]);

        let hist = Histogram::build(&[7.5; 20], 100);
        let modes = detect_modes(&hist, 3);
        assert_eq!(modes.len(), 1);
        assert_eq!(modes[0].value, 7.5);
        assert_eq!(modes[0].volume, 1.0);
    }

    #[test]
    fn close_peaks_merge_below_min_spread() {
        // peaks at bins 1 and 3
        let density = [0.1, 0.3, 0.1, 0.35, 0.15];

        let merged = detect_sections(&density, 3);
        assert_eq!(
            merged,
            vec![Section {
                start: 0,
                peak: 3,
                end: 4
            }]
        );

        let separate = detect_sections(&density, 2);
        assert_eq!(separate.len(), 2);
        assert_eq!(separate[0].peak, 1);
        assert_eq!(separate[1].peak, 3);
    }

    #[test]
    fn merge_keeps_higher_peak_on_the_left() {
        let density = [0.1, 0.4, 0.1, 0.3, 0.1];
        let merged = detect_sections(&density, 5);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].peak, 1);
        assert_eq!(merged[0].end, 4);
    }

    #[test]
    fn zero_bins_do_not_break_a_section() {
        // rising through an empty bin, then falling through another
        let density = [0.1, 0.0, 0.3, 0.4, 0.0, 0.2];
        let sections = detect_sections(&density, 1);
        assert_eq!(
            sections,
            vec![Section {
                start: 0,
                peak: 3,
                end: 5
            }]
        );
    }

    #[test]
    fn open_growing_section_is_pushed_at_end() {
        let density = [0.1, 0.2, 0.3, 0.4];
        let sections = detect_sections(&density, 1);
        assert_eq!(
            sections,
            vec![Section {
                start: 0,
                peak: 3,
                end: 3
            }]
        );
    }

    #[test]
    fn descending_start_is_one_section() {
        let density = [0.5, 0.3, 0.2];
        let sections = detect_sections(&density, 1);
        assert_eq!(
            sections,
            vec![Section {
                start: 0,
                peak: 0,
                end: 2
            }]
        );
    }

    #[test]
    fn describe_lists_value_and_volume() {
        let density = [0.0, 0.05, 0.10, 0.20, 0.15, 0.05, 0.0, 0.10, 0.30, 0.10];
        let modes = detect_modes_in(0.0, 100.0, &density, 2);
        assert_eq!(describe(&modes), "40.000000(0.550), 90.000000(0.500)");
    }
}
