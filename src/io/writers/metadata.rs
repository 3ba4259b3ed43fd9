use gdal::Dataset;
use gdal::Metadata;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::processing::pipeline::Provenance;

pub const TOOL_NAME: &str = "histcorr";

/// Dataset-level provenance: tool, version and conversion time.
pub fn dataset_metadata_fields() -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("CONVERSION_TOOL".to_string(), TOOL_NAME.to_string());
    metadata.insert(
        "CONVERSION_VERSION".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    metadata.insert(
        "CONVERSION_TIMESTAMP".to_string(),
        chrono::Utc::now().to_rfc3339(),
    );
    metadata
}

/// Embed dataset-level provenance into an output dataset
pub fn embed_dataset_metadata(ds: &mut Dataset) -> Result<(), gdal::errors::GdalError> {
    for (key, value) in dataset_metadata_fields() {
        ds.set_metadata_item(&key, &value, "")?;
    }
    Ok(())
}

/// Convert a provenance map to JSON, keys lowercased and numbers parsed
pub fn convert_metadata_to_json(metadata: &Provenance) -> serde_json::Map<String, serde_json::Value> {
    let mut json_metadata = serde_json::Map::new();

    for (key, value) in metadata {
        let json_key = key.to_lowercase();

        // Try to parse as number first, then fall back to string
        let json_value = value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(value.clone()));
        json_metadata.insert(json_key, json_value);
    }

    json_metadata
}

/// Sidecar path for an output raster: same stem, `.json` extension
pub fn sidecar_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("json")
}

/// Write per-band provenance next to the output raster as JSON
pub fn create_provenance_sidecar(
    output_path: &Path,
    bands: &[(usize, Provenance)],
) -> crate::Result<PathBuf> {
    let mut root = serde_json::Map::new();
    for (key, value) in dataset_metadata_fields() {
        root.insert(key.to_lowercase(), serde_json::Value::String(value));
    }
    let band_entries: Vec<serde_json::Value> = bands
        .iter()
        .map(|(index, provenance)| {
            let mut entry = convert_metadata_to_json(provenance);
            entry.insert("band".to_string(), serde_json::Value::from(*index));
            serde_json::Value::Object(entry)
        })
        .collect();
    root.insert("bands".to_string(), serde_json::Value::Array(band_entries));

    let path = sidecar_path(output_path);
    let json_string = serde_json::to_string_pretty(&serde_json::Value::Object(root))?;
    std::fs::write(&path, json_string)?;

    info!("Created provenance sidecar: {:?}", path);
    Ok(path)
}
