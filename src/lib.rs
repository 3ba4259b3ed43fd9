#![doc = r#"
histcorr: automatic histogram-mode radiometric correction for multi-band
satellite imagery.

Images of the same area acquired at different times, or by different
instruments, drift apart radiometrically. For every spectral band this crate
finds the dominant modes (local peaks) of the value distribution and rescales
the band so that those modes land on configured reference values. It powers
the `histcorr` CLI and can be embedded in your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system (file-level API only;
  the algorithm itself works on plain `f64` slices).
- Rust 2024 edition toolchain.

Correct an image file
---------------------
```rust,no_run
use std::path::Path;
use histcorr::{correct_image_to_path, CorrectionParams, ProfileTable};

fn main() -> histcorr::Result<()> {
    let report = correct_image_to_path(
        Path::new("/data/LT05_scene.tif"),
        Path::new("/out/LT05_scene_histcorr.tiff"),
        &ProfileTable::landsat_default(),
        &CorrectionParams::default(),
    )?;
    for band in &report.bands {
        println!("band {}: {}", band.band, band.status);
    }
    Ok(())
}
```

Correct a band in memory
------------------------
```rust
use histcorr::{correct_band, CorrectionParams, CorrectionStatus, TargetProfile};

let profile = TargetProfile::single(1, 0.0, 1.0, 0.5);
let mut samples = vec![0.25; 64];
samples.push(f64::NAN);

let report = correct_band(&mut samples, &profile, &CorrectionParams::default()).unwrap();
assert_eq!(report.status, CorrectionStatus::Corrected);
assert!((samples[0] - 0.5).abs() < 1e-12);
assert!(samples[64].is_nan());
```

Choosing the fallback
---------------------
When a band's profile expects two modes but only one usable mode is found, the
band is corrected against a single target picked by [`FallbackPolicy`]
(`CorrectionParams::fallback`), and reported as `CorrectionStatus::Degraded`.

Error handling
--------------
All public functions return `histcorr::Result<T>`. A band without a usable mode
is not an error: it is passed through unchanged. Unsupported profiles surface as
`Error::Configuration` before anything is written.

Useful modules
--------------
- [`api`]: file-level and batch entry points.
- [`core`]: parameters, profiles, and the correction steps.
- [`io`]: GDAL-backed band reader/writer and provenance sidecars.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::params::CorrectionParams;
pub use core::profile::{ProfileTable, TargetProfile};
pub use error::{Error, Result};
pub use types::{CorrectionStatus, FallbackPolicy};

// Algorithm steps
pub use core::processing::correct::{ClampStats, CorrectionTransform};
pub use core::processing::histogram::Histogram;
pub use core::processing::modes::{Mode, Section, detect_modes, detect_sections};
pub use core::processing::pipeline::{
    BandReport, BandSink, BandSource, ImageReport, Provenance, correct_band, correct_image,
};
pub use core::processing::select::{Selection, select_modes};

// Readers / writers
pub use io::{GdalBandReader, GdalBandWriter, GdalError, GdalMetadata};

// High-level API re-exports
pub use api::{
    BatchReport, collect_histograms_to_path, correct_image_to_path, process_directory_to_path,
    process_directory_with,
};
