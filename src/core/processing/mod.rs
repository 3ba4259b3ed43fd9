//! The correction algorithm, bottom-up: histogram construction, mode
//! detection, mode-to-target selection, the correction transform, and the
//! band/image pipeline that ties them together.
pub mod collect;
pub mod correct;
pub mod histogram;
pub mod modes;
pub mod pipeline;
pub mod select;
