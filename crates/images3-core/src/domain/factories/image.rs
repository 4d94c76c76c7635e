use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::{
    application::ports::{ImageAccess, ImageProcessor},
    domain::{
        entities::{ImageEntity, ImagePlantSnapshot, ImageRecord, ImageSnapshot, TemplateEntity},
        error::DomainError,
        value_objects::{AggregateRef, ImageContent, ImageId},
        version::Version,
    },
    error::Images3Result,
};

use super::reconstitute_each;

pub struct ImageFactory {
    access: Arc<dyn ImageAccess>,
    processor: Arc<dyn ImageProcessor>,
}

impl ImageFactory {
    pub fn new(access: Arc<dyn ImageAccess>, processor: Arc<dyn ImageProcessor>) -> Self {
        Self { access, processor }
    }

    /// An uploaded image, resized by the plant's bootstrap template.
    #[instrument(skip_all, fields(plant = %plant.id, bytes = content.len()))]
    pub fn generate_original(
        &self,
        plant: &ImagePlantSnapshot,
        owner: &AggregateRef,
        master: &TemplateEntity,
        content: ImageContent,
    ) -> Images3Result<ImageEntity> {
        let image_id = self.access.generate_image_id(plant)?;

        if !self.processor.is_supported_format(&content) {
            warn!(image = %image_id, "Unsupported image format");
            return Err(DomainError::UnsupportedImageFormat { image_id }.into());
        }

        let metadata = self.processor.read_metadata(&content)?;
        let resized = self
            .processor
            .resize(&metadata, &content, master.resizing_config())?;

        self.assemble(plant, owner, image_id, Version::original(master.name()), resized)
    }

    /// A rendition of `original` through `template`. Resizes from the
    /// original's stored content, not from anything the caller passes in.
    #[instrument(skip_all, fields(plant = %plant.id, original = %original.id(), template = %template.name()))]
    pub fn generate_derived(
        &self,
        plant: &ImagePlantSnapshot,
        owner: &AggregateRef,
        original: &ImageEntity,
        template: &TemplateEntity,
    ) -> Images3Result<ImageEntity> {
        let version = Version::derived(template.name(), original.id().image_id());

        if self.access.is_duplicate_version(&plant.id, &version)? {
            warn!(version = %version, "Version already exists");
            return Err(DomainError::DuplicateVersion {
                plant_id: plant.id.to_string(),
                template_name: template.name().to_string(),
                original_image_id: original.id().image_id().to_string(),
            }
            .into());
        }

        let content = original
            .content()
            .ok_or_else(|| DomainError::MissingImageContent {
                image_id: original.id().to_string(),
            })?;

        let image_id = self.access.generate_image_id(plant)?;
        let resized =
            self.processor
                .resize(original.metadata(), content, template.resizing_config())?;

        self.assemble(plant, owner, image_id, version, resized)
    }

    fn assemble(
        &self,
        plant: &ImagePlantSnapshot,
        owner: &AggregateRef,
        image_id: String,
        version: Version,
        content: ImageContent,
    ) -> Images3Result<ImageEntity> {
        let created_at = Utc::now();
        let metadata = self.processor.read_metadata(&content)?;

        let mut image = ImageEntity::new(
            owner.clone(),
            ImageSnapshot {
                id: ImageId::new(plant.id.clone(), image_id),
                created_at,
                metadata,
                version,
            },
            Some(content),
        );
        image.mark_as_new()?;
        debug!(
            image = %image.id(),
            version = %image.version(),
            dimension = %metadata.dimension(),
            "Image generated"
        );
        Ok(image)
    }

    pub fn reconstitute(
        &self,
        record: Option<ImageRecord>,
        owner: &AggregateRef,
    ) -> Option<ImageEntity> {
        record.map(|r| self.rehydrate(r, owner))
    }

    pub fn reconstitute_all(
        &self,
        records: Vec<Option<ImageRecord>>,
        owner: &AggregateRef,
    ) -> Result<Vec<ImageEntity>, DomainError> {
        reconstitute_each("image", records, |r| self.rehydrate(r, owner))
    }

    pub(crate) fn rehydrate(&self, record: ImageRecord, owner: &AggregateRef) -> ImageEntity {
        ImageEntity::new(owner.clone(), record.snapshot, record.content)
    }
}
