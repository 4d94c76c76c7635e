//! Image metrics adapters.

mod memory;

pub use memory::InMemoryMetrics;
