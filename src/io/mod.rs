//! I/O layer: GDAL-backed band reader and writer that plug into the
//! correction pipeline, plus `writers` for provenance metadata and sidecars.
pub mod gdal;
pub use gdal::{GdalBandReader, GdalError, GdalMetadata};

pub mod writers;
pub use writers::tiff::GdalBandWriter;
