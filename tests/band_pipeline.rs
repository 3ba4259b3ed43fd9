use std::fs;

use histcorr::core::processing::collect::collect_histograms;
use histcorr::core::processing::pipeline::{KEY_FORMULA, KEY_STATUS, KEY_TARGETS};
use histcorr::{
    BandSink, BandSource, CorrectionParams, CorrectionStatus, Error, FallbackPolicy, ProfileTable,
    Provenance, TargetProfile, correct_image,
};
use ndarray::Array2;

const EPS: f64 = 1e-9;

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

// Triangular cluster of values 0.01 apart around `center`.
fn cluster(center: f64, scale: usize) -> Vec<f64> {
    let mut out = Vec::new();
    for k in -5i32..=5 {
        let n = (6 - k.abs()) as usize * scale;
        out.extend(std::iter::repeat(center + k as f64 * 0.01).take(n));
    }
    out
}

fn band_from(samples: Vec<f64>) -> Array2<f64> {
    let n = samples.len();
    Array2::from_shape_vec((1, n), samples).unwrap()
}

struct MemSource(Vec<Array2<f64>>);

impl BandSource for MemSource {
    fn band_count(&self) -> usize {
        self.0.len()
    }

    fn read_band(&self, index: usize) -> histcorr::Result<Array2<f64>> {
        self.0
            .get(index - 1)
            .cloned()
            .ok_or_else(|| Error::Processing(format!("no band {}", index)))
    }
}

#[derive(Default)]
struct MemSink {
    written: Vec<(usize, Array2<f64>, Provenance)>,
}

impl BandSink for MemSink {
    fn write_band(
        &mut self,
        index: usize,
        data: &Array2<f64>,
        provenance: &Provenance,
    ) -> histcorr::Result<()> {
        self.written.push((index, data.clone(), provenance.clone()));
        Ok(())
    }
}

const PROFILES_JSON: &str = r#"{
  "profiles": [
    { "band": 1, "min": -1.0, "max": 2.0, "targets": [0.05, 0.2],
      "volumes": [0.4, 0.6], "min_spread": 3, "min_vol": 0.05 },
    { "band": 2, "min": 0.0, "max": 1.0, "targets": [0.1, 0.4],
      "volumes": [0.3, 0.7], "min_spread": 3, "min_vol": 0.05 },
    { "band": 3, "min": 0.0, "max": 1.0, "targets": [0.5],
      "min_spread": 3, "min_vol": 0.05 }
  ]
}"#;

const PARAMS_JSON: &str = r#"{ "trim_tails": false, "fallback": "first_target" }"#;

fn load_config() -> (ProfileTable, CorrectionParams) {
    let dir = tempfile::tempdir().unwrap();
    let profiles_path = dir.path().join("profiles.json");
    let params_path = dir.path().join("params.json");
    fs::write(&profiles_path, PROFILES_JSON).unwrap();
    fs::write(&params_path, PARAMS_JSON).unwrap();

    let profiles = ProfileTable::from_json_path(&profiles_path).unwrap();
    let params = CorrectionParams::from_json_path(&params_path).unwrap();
    (profiles, params)
}

fn three_band_source() -> MemSource {
    let mut bimodal = cluster(0.2, 30);
    bimodal.extend(cluster(0.6, 50));
    MemSource(vec![
        band_from(bimodal),
        band_from(cluster(0.3, 20)),
        band_from(vec![f64::NAN; 32]),
    ])
}

#[test]
fn json_config_is_loaded_with_defaults_filled_in() {
    let (profiles, params) = load_config();
    assert_eq!(profiles.len(), 3);
    assert_eq!(profiles.get(3).unwrap().targets, vec![0.5]);
    assert!(!params.trim_tails);
    assert_eq!(params.fallback, FallbackPolicy::FirstTarget);
    assert_eq!(params.bins, 100);
    assert!(!params.respread);
}

#[test]
fn image_is_corrected_band_by_band() {
    let (profiles, params) = load_config();
    let source = three_band_source();
    let mut sink = MemSink::default();

    let report = correct_image(&source, &mut sink, &profiles, &params).unwrap();
    assert_eq!(report.bands.len(), 3);
    assert_eq!(report.count(CorrectionStatus::Corrected), 1);
    assert_eq!(report.count(CorrectionStatus::Degraded), 1);
    assert_eq!(report.count(CorrectionStatus::PassThrough), 1);

    let indices: Vec<usize> = sink.written.iter().map(|(i, _, _)| *i).collect();
    assert_eq!(indices, vec![1, 2, 3]);

    // Band 1: both modes land on their targets.
    let bimodal = &report.bands[0];
    assert_eq!(bimodal.status, CorrectionStatus::Corrected);
    assert!(approx(bimodal.modes[0], 0.2, 0.01));
    assert!(approx(bimodal.modes[1], 0.6, 0.01));
    let transform = bimodal.transform.unwrap();
    assert!(approx(transform.correct(bimodal.modes[0]), 0.05, EPS));
    assert!(approx(transform.correct(bimodal.modes[1]), 0.2, EPS));
    assert!(sink.written[0].2.contains_key(KEY_FORMULA));

    // Band 2: one mode found for two targets, anchored to the first target.
    let degraded = &report.bands[1];
    assert_eq!(degraded.status, CorrectionStatus::Degraded);
    assert_eq!(degraded.targets, vec![0.1]);
    let transform = degraded.transform.unwrap();
    assert!(approx(transform.correct(degraded.modes[0]), 0.1, EPS));
    assert_eq!(sink.written[1].2[KEY_STATUS], "degraded");
    assert_eq!(sink.written[1].2[KEY_TARGETS], "0.100000");

    // Band 3: no data at all, passed through.
    assert_eq!(report.bands[2].status, CorrectionStatus::PassThrough);
    assert!(sink.written[2].1.iter().all(|v| v.is_nan()));
    assert_eq!(sink.written[2].2[KEY_STATUS], "passthrough");
}

#[test]
fn corrected_values_respect_the_profile_range() {
    let profiles = ProfileTable::new(vec![TargetProfile::single(1, 0.0, 0.5, 0.3)]).unwrap();
    let params = CorrectionParams {
        trim_tails: false,
        ..Default::default()
    };
    // Heavy mode at 0.3 (identity), one low outlier and one high outlier.
    let mut samples = cluster(0.3, 10);
    samples.push(-0.2);
    samples.push(0.9);
    let source = MemSource(vec![band_from(samples)]);
    let mut sink = MemSink::default();

    let report = correct_image(&source, &mut sink, &profiles, &params).unwrap();
    let band = &report.bands[0];
    assert_eq!(band.clamp.floored, 1);
    assert_eq!(band.clamp.discarded, 1);

    let out = &sink.written[0].1;
    assert!(out.iter().any(|v| *v == 0.0));
    assert_eq!(out.iter().filter(|v| v.is_nan()).count(), 1);
    assert!(
        out.iter()
            .filter(|v| !v.is_nan())
            .all(|v| (0.0..=0.5).contains(v))
    );
}

#[test]
fn three_target_profile_fails_before_anything_is_written() {
    let (mut profiles, params) = load_config();
    profiles.profiles[2] = TargetProfile {
        targets: vec![0.1, 0.2, 0.3],
        volumes: None,
        ..TargetProfile::single(3, 0.0, 1.0, 0.5)
    };
    let source = three_band_source();
    let mut sink = MemSink::default();

    let result = correct_image(&source, &mut sink, &profiles, &params);
    assert!(matches!(result, Err(Error::Configuration { band: 3, .. })));
    assert!(sink.written.is_empty());
}

#[test]
fn three_target_profile_is_rejected_on_load() {
    let json = r#"{ "profiles": [ { "band": 1, "min": 0.0, "max": 1.0,
        "targets": [0.1, 0.2, 0.3], "min_spread": 3, "min_vol": 0.05 } ] }"#;
    let result = ProfileTable::from_json_str(json);
    assert!(matches!(result, Err(Error::Configuration { band: 1, .. })));
}

#[test]
fn histograms_are_collected_for_every_band() {
    let (_, params) = load_config();
    let source = three_band_source();
    let report = collect_histograms(&source, &params).unwrap();
    assert_eq!(report.bands.len(), 3);
    assert_eq!(report.bands[0].total, 36 * 80);
    assert_eq!(report.bands[1].total, 36 * 20);
    assert_eq!(report.bands[2].total, 0);
    assert!(report.bands[2].bins.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bands_hist.json");
    report.write_json(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["bands"].as_array().unwrap().len(), 3);
}
