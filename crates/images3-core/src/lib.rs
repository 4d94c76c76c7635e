//! images3 Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the images3
//! image plant: an aggregate that owns resizing templates and the images
//! rendered through them.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           images3-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │          (ImagePlantService)            │
//! └──────────────────┬──────────────────────┘
//!                    │ drives
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (ImagePlantRoot, TemplateEntity,       │
//! │   ImageEntity, factories, lifecycle)    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Access oracles, Repositories,          │
//! │  ImageProcessor, Metrics, UnitOfWork)   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     images3-adapters (Infrastructure)   │
//! │ (InMemoryStore, InMemoryMetrics,        │
//! │  RasterProcessor)                       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use images3_core::prelude::*;
//!
//! # fn run(service: ImagePlantService, jpeg: Vec<u8>) -> Images3Result<()> {
//! let plant = service.create_plant(
//!     "Photos",
//!     BucketRef::new("key", "secret", "photos"),
//!     ResizingConfig::pixels(1024, 768, true)?,
//! )?;
//! service.add_template(plant.id(), "Thumb", ResizingConfig::pixels(64, 64, false)?, true)?;
//! let original = service.upload_image(plant.id(), ImageContent::from(jpeg))?;
//! service.derive_image(plant.id(), original.id().image_id(), "Thumb")?;
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

#[cfg(test)]
pub(crate) mod testing;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ImagePlantService,
        ports::{
            ImageAccess, ImageMetricsService, ImagePlantAccess, ImagePlantRepository,
            ImageProcessor, ImageRepository, TemplateAccess, TemplateRepository, UnitOfWork,
        },
    };
    pub use crate::domain::{
        AggregatePorts, AggregateServices, BucketRef, ImageContent, ImageEntity, ImageFormat,
        ImageMetadata, ImageMetricsType, ImagePlantFactory, ImagePlantRoot, ImageReport,
        Paginated, PlantId, ReportScale, ResizingConfig, TemplateEntity, TimeInterval, Tracked,
        Version,
    };
    pub use crate::error::{Images3Error, Images3Result};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
