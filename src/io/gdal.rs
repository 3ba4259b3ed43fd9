use gdal::{Dataset, Metadata, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::processing::pipeline::BandSource;

/// Errors encountered when using the GDAL reader and writer
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Band index {0} out of range (1..={1})")]
    BandOutOfRange(usize, usize),
    #[error("Dimension mismatch: expected {0}x{1}, got {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),
}

/// Metadata extracted from a GDAL-supported dataset
#[derive(Debug, Clone)]
pub struct GdalMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients, if the dataset is georeferenced
    pub geotransform: Option<[f64; 6]>,
    /// Projection in WKT format (may be empty)
    pub projection: String,
    /// Additional metadata key-value pairs
    pub metadata: HashMap<String, String>,
}

/// Reader for multi-band rasters via GDAL
pub struct GdalBandReader {
    pub dataset: Dataset,
    pub metadata: GdalMetadata,
}

impl GdalBandReader {
    /// Open a GDAL-supported dataset (e.g., GeoTIFF, ENVI, HDF)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = dataset.geo_transform().ok();
        let projection = dataset.projection();
        // Collect metadata entries (domain "")
        let mut metadata_map = HashMap::new();
        if let Some(entries) = dataset.metadata_domain("") {
            for entry in entries {
                if let Some((key, val)) = entry.split_once('=') {
                    metadata_map.insert(key.to_string(), val.to_string());
                }
            }
        }
        Ok(GdalBandReader {
            dataset,
            metadata: GdalMetadata {
                size_x: size_x as usize,
                size_y: size_y as usize,
                bands,
                geotransform,
                projection,
                metadata: metadata_map,
            },
        })
    }

    /// Read a single band (1-based index) as an f64 ndarray of shape (height, width).
    /// Pixels equal to the band's no-data value are returned as NaN.
    pub fn read_band(&self, index: usize) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::BandOutOfRange(index, self.metadata.bands));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, None)?;
        let mut data_vec = buf.data().to_vec();
        if let Some(nodata) = band.no_data_value() {
            if !nodata.is_nan() {
                for v in data_vec.iter_mut() {
                    if *v == nodata {
                        *v = f64::NAN;
                    }
                }
            }
        }
        let len = data_vec.len();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(
            |_| {
                GdalError::DimensionMismatch(
                    self.metadata.size_x,
                    self.metadata.size_y,
                    len,
                    1,
                )
            },
        )
    }
}

impl BandSource for GdalBandReader {
    fn band_count(&self) -> usize {
        self.metadata.bands
    }

    fn read_band(&self, index: usize) -> crate::Result<Array2<f64>> {
        Ok(GdalBandReader::read_band(self, index)?)
    }
}
