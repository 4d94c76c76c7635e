//! The image plant aggregate root.
//!
//! ```text
//! ImagePlantRoot ─┬─ create_template ──▶ TemplateFactory ──▶ TemplateAccess
//!                 ├─ update/remove_template (ownership, removability)
//!                 ├─ create_image / create_derived_image ──▶ ImageFactory
//!                 │                                     ├──▶ ImageAccess
//!                 │                                     └──▶ ImageProcessor
//!                 ├─ fetch/list ──▶ TemplateRepository, ImageRepository
//!                 └─ count/size/report ──▶ ImageMetricsService
//! ```
//!
//! Every invariant of the aggregate is checked here or in a factory the root
//! delegates to. Entities only track their own life-cycle.

use std::{collections::HashSet, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    application::ApplicationError,
    domain::{
        DomainValidator,
        entities::{ImageEntity, ImageRecord, TemplateEntity, TemplateSnapshot},
        error::DomainError,
        factories::AggregateServices,
        lifecycle::{Lifecycle, Tracked},
        pagination::Paginated,
        report::{ImageMetricsType, ImageReport, MetricsKey, ReportScale, TimeInterval},
        value_objects::{AggregateRef, BucketRef, ImageContent, ImageId, PlantId, ResizingConfig},
        version::Version,
    },
    error::Images3Result,
};

/// Persisted shape of an image plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePlantSnapshot {
    pub id: PlantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub bucket: BucketRef,
    pub master_template_name: String,
}

pub struct ImagePlantRoot {
    snapshot: ImagePlantSnapshot,
    lifecycle: Lifecycle,
    aggregate: AggregateRef,
    services: AggregateServices,
    master_template: Option<TemplateEntity>,
    issued_template_names: HashSet<String>,
    issued_versions: HashSet<Version>,
}

impl ImagePlantRoot {
    pub(crate) fn new(snapshot: ImagePlantSnapshot, services: AggregateServices) -> Self {
        let aggregate = AggregateRef::mint(snapshot.id.clone());
        Self {
            snapshot,
            lifecycle: Lifecycle::new(),
            aggregate,
            services,
            master_template: None,
            issued_template_names: HashSet::new(),
            issued_versions: HashSet::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &PlantId {
        &self.snapshot.id
    }

    pub fn name(&self) -> &str {
        &self.snapshot.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.snapshot.created_at
    }

    pub fn bucket(&self) -> &BucketRef {
        &self.snapshot.bucket
    }

    pub fn master_template_name(&self) -> &str {
        &self.snapshot.master_template_name
    }

    pub fn snapshot(&self) -> &ImagePlantSnapshot {
        &self.snapshot
    }

    /// Token carried by every entity this instance produces.
    pub fn aggregate_ref(&self) -> &AggregateRef {
        &self.aggregate
    }

    // ========================================================================
    // Plant commands
    // ========================================================================

    /// Renames the plant. Renaming to the current name does nothing at all.
    #[instrument(skip_all, fields(plant = %self.snapshot.id, name = %name))]
    pub fn update_name(&mut self, name: &str) -> Images3Result<()> {
        self.ensure_not_void()?;
        if self.snapshot.name == name {
            return Ok(());
        }
        DomainValidator::validate_plant_name(name)?;

        if self.services.plant_access.is_duplicated_image_plant_name(name)? {
            warn!("Image plant name already taken");
            return Err(DomainError::DuplicatePlantName {
                name: name.to_string(),
            }
            .into());
        }

        self.snapshot.name = name.to_string();
        self.touch()?;
        Ok(())
    }

    pub fn update_bucket(&mut self, bucket: BucketRef) -> Result<(), DomainError> {
        self.ensure_not_void()?;
        if self.snapshot.bucket == bucket {
            return Ok(());
        }
        self.snapshot.bucket = bucket;
        self.touch()
    }

    /// Retires the whole plant. Nothing can be changed through it afterwards.
    pub fn remove(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_void(&label)
    }

    // ========================================================================
    // Template commands
    // ========================================================================

    #[instrument(skip_all, fields(plant = %self.snapshot.id, template = %name))]
    pub fn create_template(
        &mut self,
        name: &str,
        config: ResizingConfig,
    ) -> Images3Result<TemplateEntity> {
        self.ensure_not_void()?;
        if self.issued_template_names.contains(name) {
            warn!("Template name already issued by this plant instance");
            return Err(DomainError::DuplicateTemplateName {
                plant_id: self.snapshot.id.to_string(),
                name: name.to_string(),
            }
            .into());
        }

        let template = self.services.template_factory.generate(
            &self.snapshot,
            &self.aggregate,
            name,
            config,
        )?;
        self.issued_template_names.insert(name.to_string());
        Ok(template)
    }

    /// Accepts changes made to `template` for persistence.
    pub fn update_template(&self, template: &mut TemplateEntity) -> Result<(), DomainError> {
        self.ensure_not_void()?;
        self.ensure_owned(template.owner(), template)?;
        if !template.is_removable() && template.is_archived() {
            warn!(template = %template.id(), "Bootstrap template must stay active");
            return Err(DomainError::InactiveBootstrapTemplate {
                template_id: template.id().to_string(),
            });
        }
        template.touch()
    }

    pub fn remove_template(&self, template: &mut TemplateEntity) -> Result<(), DomainError> {
        self.ensure_not_void()?;
        self.ensure_owned(template.owner(), template)?;
        if !template.is_removable() {
            warn!(template = %template.id(), "Template is not removable");
            return Err(DomainError::UnremovableTemplate {
                template_id: template.id().to_string(),
            });
        }
        template.mark_as_void()
    }

    // ========================================================================
    // Template queries
    // ========================================================================

    pub fn fetch_template(&self, name: &str) -> Images3Result<Option<TemplateEntity>> {
        let snapshot = self
            .services
            .template_repository
            .find_template_by_name(&self.snapshot.id, name)?;
        Ok(self
            .services
            .template_factory
            .reconstitute(snapshot, &self.aggregate))
    }

    pub fn list_all_templates(&self) -> Images3Result<Paginated<TemplateEntity>> {
        let page = self
            .services
            .template_repository
            .find_all_templates_by_plant(&self.snapshot.id)?;
        Ok(self.templates(page))
    }

    pub fn list_active_templates(&self) -> Images3Result<Paginated<TemplateEntity>> {
        let page = self
            .services
            .template_repository
            .find_active_templates_by_plant(&self.snapshot.id)?;
        Ok(self.templates(page))
    }

    pub fn list_archived_templates(&self) -> Images3Result<Paginated<TemplateEntity>> {
        let page = self
            .services
            .template_repository
            .find_archived_templates_by_plant(&self.snapshot.id)?;
        Ok(self.templates(page))
    }

    /// The bootstrap template. A freshly generated plant still holds it;
    /// otherwise it is fetched by name.
    pub fn master_template(&self) -> Images3Result<TemplateEntity> {
        if let Some(master) = &self.master_template {
            return Ok(master.clone());
        }
        self.fetch_template(&self.snapshot.master_template_name)?
            .ok_or_else(|| {
                ApplicationError::TemplateNotFound {
                    plant_id: self.snapshot.id.to_string(),
                    name: self.snapshot.master_template_name.clone(),
                }
                .into()
            })
    }

    fn templates(&self, page: Paginated<TemplateSnapshot>) -> Paginated<TemplateEntity> {
        let factory = Arc::clone(&self.services.template_factory);
        let owner = self.aggregate.clone();
        page.map(move |snapshot| factory.rehydrate(snapshot, &owner))
    }

    // ========================================================================
    // Image commands
    // ========================================================================

    /// Stores an upload as an original image, resized by the bootstrap template.
    #[instrument(skip_all, fields(plant = %self.snapshot.id))]
    pub fn create_image(&mut self, content: ImageContent) -> Images3Result<ImageEntity> {
        self.ensure_not_void()?;
        let master = self.master_template()?;
        self.services.image_factory.generate_original(
            &self.snapshot,
            &self.aggregate,
            &master,
            content,
        )
    }

    /// Renders `original` through `template`.
    ///
    /// Each (template, original) pair exists at most once per plant, whether
    /// or not the template is archived.
    #[instrument(skip_all, fields(plant = %self.snapshot.id, template = %template.name(), original = %original.id()))]
    pub fn create_derived_image(
        &mut self,
        template: &TemplateEntity,
        original: &ImageEntity,
    ) -> Images3Result<ImageEntity> {
        self.ensure_not_void()?;
        self.ensure_owned(template.owner(), template)?;
        self.ensure_owned(original.owner(), original)?;
        if template.is_void() {
            return Err(DomainError::VoidEntityMutation {
                entity: template.to_string(),
            }
            .into());
        }

        let version = Version::derived(template.name(), original.id().image_id());
        if self.issued_versions.contains(&version) {
            warn!(version = %version, "Version already issued by this plant instance");
            return Err(DomainError::DuplicateVersion {
                plant_id: self.snapshot.id.to_string(),
                template_name: template.name().to_string(),
                original_image_id: original.id().image_id().to_string(),
            }
            .into());
        }

        let image = self.services.image_factory.generate_derived(
            &self.snapshot,
            &self.aggregate,
            original,
            template,
        )?;
        self.issued_versions.insert(version);
        Ok(image)
    }

    // ========================================================================
    // Image queries
    // ========================================================================

    pub fn fetch_image(&self, image_id: &str) -> Images3Result<Option<ImageEntity>> {
        let id = ImageId::new(self.snapshot.id.clone(), image_id);
        let record = self.services.image_repository.find_image_by_id(&id)?;
        Ok(self
            .services
            .image_factory
            .reconstitute(record, &self.aggregate))
    }

    pub fn fetch_image_by_version(&self, version: &Version) -> Images3Result<Option<ImageEntity>> {
        let record = self
            .services
            .image_repository
            .find_image_by_version(&self.snapshot.id, version)?;
        Ok(self
            .services
            .image_factory
            .reconstitute(record, &self.aggregate))
    }

    pub fn list_all_images(&self) -> Images3Result<Paginated<ImageEntity>> {
        let page = self
            .services
            .image_repository
            .find_all_images_by_plant(&self.snapshot.id)?;
        Ok(self.images(page))
    }

    pub fn list_images_by_template(
        &self,
        template: &TemplateEntity,
    ) -> Images3Result<Paginated<ImageEntity>> {
        let page = self
            .services
            .image_repository
            .find_images_by_template(template.id())?;
        Ok(self.images(page))
    }

    fn images(&self, page: Paginated<ImageRecord>) -> Paginated<ImageEntity> {
        let factory = Arc::clone(&self.services.image_factory);
        let owner = self.aggregate.clone();
        page.map(move |record| factory.rehydrate(record, &owner))
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    pub fn count_images(&self, template: Option<&TemplateEntity>) -> Images3Result<u64> {
        self.services.metrics.count_images(&self.metrics_key(template))
    }

    pub fn size_of_images(&self, template: Option<&TemplateEntity>) -> Images3Result<u64> {
        self.services
            .metrics
            .size_of_images(&self.metrics_key(template))
    }

    #[instrument(skip_all, fields(plant = %self.snapshot.id, scale = ?scale, kind = %kind))]
    pub fn generate_report(
        &self,
        template: Option<&TemplateEntity>,
        interval: TimeInterval,
        scale: ReportScale,
        kind: ImageMetricsType,
    ) -> Images3Result<ImageReport> {
        scale.bucket_count(&interval)?;
        let key = self.metrics_key(template);
        let records = self
            .services
            .metrics
            .retrieve_stats(&key, &interval)?
            .collect_all()?;
        debug!(records = records.len(), "Metrics retrieved");
        Ok(ImageReport::aggregate(key, &interval, scale, kind, records)?)
    }

    fn metrics_key(&self, template: Option<&TemplateEntity>) -> MetricsKey {
        match template {
            Some(t) => MetricsKey::Template(t.id().clone()),
            None => MetricsKey::Plant(self.snapshot.id.clone()),
        }
    }

    // ========================================================================
    // Persistence hooks
    // ========================================================================

    /// The bootstrap template a freshly generated plant still holds.
    pub fn master_template_mut(&mut self) -> Option<&mut TemplateEntity> {
        self.master_template.as_mut()
    }

    pub fn mark_as_clean(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_clean(&label)
    }

    pub(crate) fn mark_as_new(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_new(&label)
    }

    pub(crate) fn hold_master_template(&mut self, master: TemplateEntity) {
        self.master_template = Some(master);
    }

    // ========================================================================
    // Guards
    // ========================================================================

    fn touch(&mut self) -> Result<(), DomainError> {
        let label = self.to_string();
        self.lifecycle.mark_as_dirty(&label)
    }

    fn ensure_not_void(&self) -> Result<(), DomainError> {
        self.lifecycle.ensure_not_void(self)
    }

    fn ensure_owned(&self, owner: &AggregateRef, entity: &dyn fmt::Display) -> Result<(), DomainError> {
        if owner != &self.aggregate {
            warn!(entity = %entity, owner = %owner, "Entity belongs to another aggregate instance");
            return Err(DomainError::ForeignEntity {
                entity: entity.to_string(),
                owner: owner.to_string(),
                root: self.aggregate.to_string(),
            });
        }
        Ok(())
    }
}

impl Tracked for ImagePlantRoot {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl fmt::Display for ImagePlantRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image plant {}", self.snapshot.id)
    }
}

impl fmt::Debug for ImagePlantRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePlantRoot")
            .field("snapshot", &self.snapshot)
            .field("lifecycle", &self.lifecycle)
            .field("aggregate", &self.aggregate)
            .field("master_template", &self.master_template)
            .finish_non_exhaustive()
    }
}
