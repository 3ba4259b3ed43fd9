//! Core building blocks: run parameters, per-band target profiles, and the
//! histogram-correction processing steps. These are the primitives consumed
//! by the high-level `api` module.
pub mod params;
pub mod processing;
pub mod profile;
