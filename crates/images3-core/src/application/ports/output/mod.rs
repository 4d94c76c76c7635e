//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the image plant aggregate needs from the outside:
//! uniqueness oracles and id allocation, paginated queries, image processing,
//! metrics, and a unit of work that turns life-cycle flags into writes.
//! The `images3-adapters` crate provides implementations.
//!
//! ## Design Notes
//!
//! - Uniqueness answers are advisory; storage enforces unique keys on insert
//! - Queries return snapshots; the root rehydrates them into entities it owns
//! - Absent rows are `Ok(None)`, never an error

use crate::domain::{
    ImageContent, ImageEntity, ImageId, ImageMetadata, ImageMetricsRecord, ImagePlantRoot,
    ImagePlantSnapshot, ImageRecord, ImageSnapshot, MetricsKey, Paginated, PlantId,
    ResizingConfig, TemplateEntity, TemplateId, TemplateSnapshot, TimeInterval, Version,
};
use crate::error::Images3Result;

/// Plant-level uniqueness oracle and id allocation.
///
/// Implemented by:
/// - `images3_adapters::store::InMemoryStore`
#[cfg_attr(test, mockall::automock)]
pub trait ImagePlantAccess: Send + Sync {
    fn is_duplicated_image_plant_name(&self, name: &str) -> Images3Result<bool>;

    fn generate_image_plant_id(&self) -> Images3Result<PlantId>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TemplateAccess: Send + Sync {
    fn is_duplicated_template_name(&self, plant_id: &PlantId, name: &str) -> Images3Result<bool>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ImageAccess: Send + Sync {
    fn generate_image_id(&self, plant: &ImagePlantSnapshot) -> Images3Result<String>;

    /// Whether `version` is already taken in the plant, archived templates included.
    fn is_duplicate_version(&self, plant_id: &PlantId, version: &Version) -> Images3Result<bool>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TemplateRepository: Send + Sync {
    fn find_template_by_name(
        &self,
        plant_id: &PlantId,
        name: &str,
    ) -> Images3Result<Option<TemplateSnapshot>>;

    fn find_all_templates_by_plant(
        &self,
        plant_id: &PlantId,
    ) -> Images3Result<Paginated<TemplateSnapshot>>;

    fn find_active_templates_by_plant(
        &self,
        plant_id: &PlantId,
    ) -> Images3Result<Paginated<TemplateSnapshot>>;

    fn find_archived_templates_by_plant(
        &self,
        plant_id: &PlantId,
    ) -> Images3Result<Paginated<TemplateSnapshot>>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ImageRepository: Send + Sync {
    fn find_image_by_id(&self, id: &ImageId) -> Images3Result<Option<ImageRecord>>;

    fn find_image_by_version(
        &self,
        plant_id: &PlantId,
        version: &Version,
    ) -> Images3Result<Option<ImageRecord>>;

    fn find_all_images_by_plant(&self, plant_id: &PlantId)
    -> Images3Result<Paginated<ImageRecord>>;

    fn find_images_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Images3Result<Paginated<ImageRecord>>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ImagePlantRepository: Send + Sync {
    fn find_plant_by_id(&self, id: &PlantId) -> Images3Result<Option<ImagePlantSnapshot>>;

    fn find_all_plants(&self) -> Images3Result<Paginated<ImagePlantSnapshot>>;
}

/// Port for format detection, metadata extraction and resizing.
///
/// Implemented by:
/// - `images3_adapters::processor::RasterProcessor` (backed by the `image` crate)
///
/// All calls are blocking.
#[cfg_attr(test, mockall::automock)]
pub trait ImageProcessor: Send + Sync {
    fn is_supported_format(&self, content: &ImageContent) -> bool;

    fn read_metadata(&self, content: &ImageContent) -> Images3Result<ImageMetadata>;

    /// Resizes `content` (described by `metadata`) to fit `config`.
    fn resize(
        &self,
        metadata: &ImageMetadata,
        content: &ImageContent,
        config: &ResizingConfig,
    ) -> Images3Result<ImageContent>;
}

/// Port for image statistics.
///
/// Implemented by:
/// - `images3_adapters::metrics::InMemoryMetrics`
#[cfg_attr(test, mockall::automock)]
pub trait ImageMetricsService: Send + Sync {
    /// Called once per persisted image.
    fn record(&self, image: &ImageSnapshot) -> Images3Result<()>;

    fn count_images(&self, key: &MetricsKey) -> Images3Result<u64>;

    fn size_of_images(&self, key: &MetricsKey) -> Images3Result<u64>;

    /// Per-second records for `key` inside `interval`.
    fn retrieve_stats(
        &self,
        key: &MetricsKey,
        interval: &TimeInterval,
    ) -> Images3Result<Paginated<ImageMetricsRecord>>;
}

/// Persists aggregate members according to their life-cycle state.
///
/// NEW is inserted, DIRTY updated, VOID deleted, CLEAN left alone.
/// Everything that was written is marked CLEAN afterwards.
#[cfg_attr(test, mockall::automock)]
pub trait UnitOfWork: Send + Sync {
    /// Saves the plant row and the bootstrap template it still holds, if any.
    fn save_plant(&self, plant: &mut ImagePlantRoot) -> Images3Result<()>;

    fn save_template(&self, template: &mut TemplateEntity) -> Images3Result<()>;

    fn save_image(&self, image: &mut ImageEntity) -> Images3Result<()>;
}
