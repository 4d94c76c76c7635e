//! Infrastructure adapters for images3.
//!
//! This crate implements the ports defined in `images3_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod metrics;
pub mod processor;
pub mod store;

// Re-export commonly used adapters
pub use metrics::InMemoryMetrics;
pub use processor::{RasterProcessor, sniff_format};
pub use store::{DEFAULT_PAGE_SIZE, InMemoryStore};
