//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `images3-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by the aggregate, implemented by infrastructure
//!   - `ImagePlantAccess`, `TemplateAccess`, `ImageAccess`: uniqueness and ids
//!   - `TemplateRepository`, `ImageRepository`, `ImagePlantRepository`: queries
//!   - `ImageProcessor`: format detection and resizing
//!   - `ImageMetricsService`: statistics
//!   - `UnitOfWork`: persistence of life-cycle changes
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    ImageAccess, ImageMetricsService, ImagePlantAccess, ImagePlantRepository, ImageProcessor,
    ImageRepository, TemplateAccess, TemplateRepository, UnitOfWork,
};

#[cfg(test)]
pub use output::{
    MockImageAccess, MockImageMetricsService, MockImagePlantAccess, MockImagePlantRepository,
    MockImageProcessor, MockImageRepository, MockTemplateAccess, MockTemplateRepository,
    MockUnitOfWork,
};
