//! Dataset naming and the decoders for frame rasters and vector files.

/// Dataset registry and on-disk layout.
pub mod dataset;
/// Binary pixel map decoding.
pub mod raster;
/// Motion-vector records.
pub mod vectors;
