//! Application layer for images3.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ImagePlantService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. All business rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::ImagePlantService;

// Re-export port traits (for adapter implementation)
pub use ports::{
    ImageAccess, ImageMetricsService, ImagePlantAccess, ImagePlantRepository, ImageProcessor,
    ImageRepository, TemplateAccess, TemplateRepository, UnitOfWork,
};

pub use error::ApplicationError;
