use gdal::Dataset;
use gdal::DriverManager;
use gdal::Metadata;
use gdal::raster::Buffer;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::processing::pipeline::{BandSink, Provenance};
use crate::io::gdal::{GdalError, GdalMetadata};
use crate::io::writers::metadata::embed_dataset_metadata;

/// Float64 GeoTIFF writer mirroring the size and georeferencing of an input raster.
/// Every band gets NaN as its no-data value.
pub struct GdalBandWriter {
    dataset: Dataset,
    path: PathBuf,
    cols: usize,
    rows: usize,
    provenance: Vec<(usize, Provenance)>,
}

impl GdalBandWriter {
    pub fn create(output: &Path, like: &GdalMetadata) -> Result<Self, GdalError> {
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut ds =
            driver.create_with_band_type::<f64, _>(output, like.size_x, like.size_y, like.bands)?;

        if let Some(gt) = like.geotransform {
            ds.set_geo_transform(&gt)?;
            if !like.projection.is_empty() {
                ds.set_projection(&like.projection)?;
            }
        }
        embed_dataset_metadata(&mut ds)?;

        Ok(Self {
            dataset: ds,
            path: output.to_path_buf(),
            cols: like.size_x,
            rows: like.size_y,
            provenance: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provenance of every band written so far, in write order.
    pub fn provenance(&self) -> &[(usize, Provenance)] {
        &self.provenance
    }

    pub fn write(
        &mut self,
        index: usize,
        data: &Array2<f64>,
        provenance: &Provenance,
    ) -> Result<(), GdalError> {
        let (rows, cols) = data.dim();
        if rows != self.rows || cols != self.cols {
            return Err(GdalError::DimensionMismatch(self.cols, self.rows, cols, rows));
        }
        let mut band = self.dataset.rasterband(index)?;
        band.set_no_data_value(Some(f64::NAN))?;
        let mut buf = Buffer::new((cols, rows), data.iter().copied().collect::<Vec<f64>>());
        band.write((0, 0), (cols, rows), &mut buf)?;
        for (key, value) in provenance {
            band.set_metadata_item(key, value, "")?;
        }
        debug!("Wrote band {} to {:?}", index, self.path);
        self.provenance.push((index, provenance.clone()));
        Ok(())
    }

    /// Flush and close the dataset.
    pub fn finish(self) -> Result<Vec<(usize, Provenance)>, GdalError> {
        let Self {
            dataset,
            provenance,
            ..
        } = self;
        dataset.close()?;
        Ok(provenance)
    }
}

impl BandSink for GdalBandWriter {
    fn write_band(
        &mut self,
        index: usize,
        data: &Array2<f64>,
        provenance: &Provenance,
    ) -> crate::Result<()> {
        Ok(self.write(index, data, provenance)?)
    }
}
