//! Image Plant Service - one unit of work per use case.
//!
//! Every call loads (or generates) a fresh root, runs a single command
//! through it, and hands the touched members to the [`UnitOfWork`].
//! Entities never outlive the call that produced them, so they can never
//! be reused through another root.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{ImagePlantRepository, UnitOfWork},
    },
    domain::{
        BucketRef, DomainError, ImageContent, ImageEntity, ImageMetricsType, ImagePlantFactory, ImagePlantRoot,
        ImagePlantSnapshot, ImageReport, Paginated, PlantId, ReportScale, ResizingConfig,
        TemplateEntity, TimeInterval,
    },
    error::Images3Result,
};

pub struct ImagePlantService {
    factory: ImagePlantFactory,
    plants: Arc<dyn ImagePlantRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl ImagePlantService {
    pub fn new(
        factory: ImagePlantFactory,
        plants: Arc<dyn ImagePlantRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            factory,
            plants,
            unit_of_work,
        }
    }

    // ========================================================================
    // Plants
    // ========================================================================

    /// Generates a plant with its bootstrap template and persists both.
    #[instrument(skip_all, fields(plant = %name))]
    pub fn create_plant(
        &self,
        name: &str,
        bucket: BucketRef,
        config: ResizingConfig,
    ) -> Images3Result<ImagePlantRoot> {
        let mut root = self.factory.generate(name, bucket, config)?;
        self.unit_of_work.save_plant(&mut root)?;
        info!(id = %root.id(), "Image plant created");
        Ok(root)
    }

    pub fn load_plant(&self, id: &PlantId) -> Images3Result<ImagePlantRoot> {
        let snapshot = self.plants.find_plant_by_id(id)?;
        self.factory
            .reconstitute(snapshot)
            .ok_or_else(|| ApplicationError::PlantNotFound { id: id.to_string() }.into())
    }

    pub fn list_plants(&self) -> Images3Result<Paginated<ImagePlantSnapshot>> {
        self.plants.find_all_plants()
    }

    #[instrument(skip(self))]
    pub fn rename_plant(&self, id: &PlantId, name: &str) -> Images3Result<ImagePlantRoot> {
        let mut root = self.load_plant(id)?;
        root.update_name(name)?;
        self.unit_of_work.save_plant(&mut root)?;
        Ok(root)
    }

    #[instrument(skip(self))]
    pub fn remove_plant(&self, id: &PlantId) -> Images3Result<()> {
        let mut root = self.load_plant(id)?;
        root.remove()?;
        self.unit_of_work.save_plant(&mut root)?;
        info!("Image plant removed");
        Ok(())
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Creates a template. New templates start archived unless `active`.
    #[instrument(skip(self, config))]
    pub fn add_template(
        &self,
        plant_id: &PlantId,
        name: &str,
        config: ResizingConfig,
        active: bool,
    ) -> Images3Result<TemplateEntity> {
        let mut root = self.load_plant(plant_id)?;
        let mut template = root.create_template(name, config)?;
        if active {
            template.unarchive()?;
            root.update_template(&mut template)?;
        }
        self.unit_of_work.save_template(&mut template)?;
        Ok(template)
    }

    #[instrument(skip(self))]
    pub fn archive_template(&self, plant_id: &PlantId, name: &str) -> Images3Result<TemplateEntity> {
        self.change_template(plant_id, name, TemplateEntity::archive)
    }

    #[instrument(skip(self))]
    pub fn unarchive_template(
        &self,
        plant_id: &PlantId,
        name: &str,
    ) -> Images3Result<TemplateEntity> {
        self.change_template(plant_id, name, TemplateEntity::unarchive)
    }

    #[instrument(skip(self))]
    pub fn remove_template(&self, plant_id: &PlantId, name: &str) -> Images3Result<()> {
        let root = self.load_plant(plant_id)?;
        let mut template = Self::template(&root, name)?;
        root.remove_template(&mut template)?;
        self.unit_of_work.save_template(&mut template)?;
        Ok(())
    }

    fn change_template(
        &self,
        plant_id: &PlantId,
        name: &str,
        change: fn(&mut TemplateEntity) -> Result<(), DomainError>,
    ) -> Images3Result<TemplateEntity> {
        let root = self.load_plant(plant_id)?;
        let mut template = Self::template(&root, name)?;
        change(&mut template)?;
        root.update_template(&mut template)?;
        self.unit_of_work.save_template(&mut template)?;
        Ok(template)
    }

    fn template(root: &ImagePlantRoot, name: &str) -> Images3Result<TemplateEntity> {
        root.fetch_template(name)?.ok_or_else(|| {
            ApplicationError::TemplateNotFound {
                plant_id: root.id().to_string(),
                name: name.to_string(),
            }
            .into()
        })
    }

    // ========================================================================
    // Images
    // ========================================================================

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub fn upload_image(
        &self,
        plant_id: &PlantId,
        content: ImageContent,
    ) -> Images3Result<ImageEntity> {
        let mut root = self.load_plant(plant_id)?;
        let mut image = root.create_image(content)?;
        self.unit_of_work.save_image(&mut image)?;
        info!(image = %image.id(), "Image uploaded");
        Ok(image)
    }

    /// Renders an existing image through a template of the same plant.
    #[instrument(skip(self))]
    pub fn derive_image(
        &self,
        plant_id: &PlantId,
        image_id: &str,
        template_name: &str,
    ) -> Images3Result<ImageEntity> {
        let mut root = self.load_plant(plant_id)?;
        let original = root.fetch_image(image_id)?.ok_or_else(|| {
            ApplicationError::ImageNotFound {
                plant_id: plant_id.to_string(),
                image_id: image_id.to_string(),
            }
        })?;
        let template = Self::template(&root, template_name)?;

        let mut image = root.create_derived_image(&template, &original)?;
        self.unit_of_work.save_image(&mut image)?;
        info!(image = %image.id(), version = %image.version(), "Image derived");
        Ok(image)
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    pub fn image_report(
        &self,
        plant_id: &PlantId,
        template_name: Option<&str>,
        interval: TimeInterval,
        scale: ReportScale,
        kind: ImageMetricsType,
    ) -> Images3Result<ImageReport> {
        let root = self.load_plant(plant_id)?;
        let template = template_name
            .map(|name| Self::template(&root, name))
            .transpose()?;
        root.generate_report(template.as_ref(), interval, scale, kind)
    }
}
