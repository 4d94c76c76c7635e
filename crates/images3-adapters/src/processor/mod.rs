//! Image processor adapters.

mod raster;

pub use raster::{RasterProcessor, sniff_format};
