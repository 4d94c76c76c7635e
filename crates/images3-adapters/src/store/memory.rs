//! In-memory storage for plants, templates and images.
//!
//! One store backs every access oracle, every repository and the unit of
//! work. Unique keys are enforced on insert, so a clash that slipped past an
//! oracle still fails with the matching domain error.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use images3_core::{
    application::{
        ApplicationError,
        ports::{
            ImageAccess, ImageMetricsService, ImagePlantAccess, ImagePlantRepository,
            ImageProcessor, ImageRepository, TemplateAccess, TemplateRepository, UnitOfWork,
        },
    },
    domain::{
        AggregatePorts, DomainError, ImageEntity, ImageId, ImagePlantRoot, ImagePlantSnapshot,
        ImageRecord, LifecycleState, Paginated, PlantId, TemplateEntity, TemplateId,
        TemplateSnapshot, Tracked, Version,
    },
    error::Images3Result,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Default)]
struct Tables {
    plants: HashMap<PlantId, ImagePlantSnapshot>,
    templates: HashMap<TemplateId, TemplateSnapshot>,
    images: HashMap<ImageId, ImageRecord>,
}

impl Tables {
    fn insert_plant(&mut self, plant: &ImagePlantSnapshot) -> Images3Result<()> {
        if self.plants.contains_key(&plant.id) {
            return Err(storage(format!("image plant '{}' is already stored", plant.id)));
        }
        self.ensure_unique_plant_name(plant)?;
        self.plants.insert(plant.id.clone(), plant.clone());
        Ok(())
    }

    fn update_plant(&mut self, plant: &ImagePlantSnapshot) -> Images3Result<()> {
        if !self.plants.contains_key(&plant.id) {
            return Err(storage(format!("image plant '{}' is not stored", plant.id)));
        }
        self.ensure_unique_plant_name(plant)?;
        self.plants.insert(plant.id.clone(), plant.clone());
        Ok(())
    }

    /// Puts back the row a failed save replaced, or drops the one it added.
    fn restore_plant(&mut self, id: &PlantId, previous: Option<ImagePlantSnapshot>) {
        match previous {
            Some(row) => self.plants.insert(id.clone(), row),
            None => self.plants.remove(id),
        };
    }

    /// Removes the plant with everything it owns.
    fn delete_plant(&mut self, id: &PlantId) {
        self.plants.remove(id);
        self.templates.retain(|key, _| key.plant_id() != id);
        self.images.retain(|key, _| key.plant_id() != id);
    }

    fn ensure_unique_plant_name(&self, plant: &ImagePlantSnapshot) -> Images3Result<()> {
        let taken = self
            .plants
            .values()
            .any(|other| other.id != plant.id && other.name == plant.name);
        if taken {
            return Err(DomainError::DuplicatePlantName {
                name: plant.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn persist_template(&mut self, template: &TemplateEntity) -> Images3Result<()> {
        let row = template.snapshot();
        match template.state() {
            LifecycleState::New => {
                self.ensure_plant(row.id.plant_id())?;
                if self.templates.contains_key(&row.id) {
                    return Err(DomainError::DuplicateTemplateName {
                        plant_id: row.id.plant_id().to_string(),
                        name: row.id.name().to_string(),
                    }
                    .into());
                }
                self.templates.insert(row.id.clone(), row.clone());
            }
            LifecycleState::Dirty => {
                if !self.templates.contains_key(&row.id) {
                    return Err(storage(format!("template '{}' is not stored", row.id)));
                }
                self.templates.insert(row.id.clone(), row.clone());
            }
            LifecycleState::Void => {
                self.templates.remove(&row.id);
            }
            LifecycleState::Clean => {}
        }
        Ok(())
    }

    fn persist_image(&mut self, image: &ImageEntity) -> Images3Result<()> {
        let record = image.to_record();
        let id = &record.snapshot.id;
        match image.state() {
            LifecycleState::New => {
                self.ensure_plant(id.plant_id())?;
                if self.images.contains_key(id) {
                    return Err(storage(format!("image '{}' is already stored", id)));
                }
                let version = &record.snapshot.version;
                if !version.is_original()
                    && self.version_taken(id.plant_id(), version)
                {
                    return Err(DomainError::DuplicateVersion {
                        plant_id: id.plant_id().to_string(),
                        template_name: version.template_name().to_string(),
                        original_image_id: version
                            .original_image_id()
                            .unwrap_or_default()
                            .to_string(),
                    }
                    .into());
                }
                self.images.insert(id.clone(), record);
            }
            LifecycleState::Dirty => {
                let stored = self
                    .images
                    .get_mut(id)
                    .ok_or_else(|| storage(format!("image '{}' is not stored", id)))?;
                stored.snapshot = record.snapshot;
                if record.content.is_some() {
                    stored.content = record.content;
                }
            }
            LifecycleState::Void => {
                self.images.remove(id);
            }
            LifecycleState::Clean => {}
        }
        Ok(())
    }

    fn ensure_plant(&self, id: &PlantId) -> Images3Result<()> {
        if self.plants.contains_key(id) {
            Ok(())
        } else {
            Err(storage(format!("image plant '{}' is not stored", id)))
        }
    }

    fn version_taken(&self, plant_id: &PlantId, version: &Version) -> bool {
        self.images
            .values()
            .any(|r| r.snapshot.id.plant_id() == plant_id && &r.snapshot.version == version)
    }

    fn plant_images<'a>(
        &'a self,
        plant_id: &'a PlantId,
    ) -> impl Iterator<Item = &'a ImageRecord> + 'a {
        self.images
            .values()
            .filter(move |r| r.snapshot.id.plant_id() == plant_id)
    }
}

fn storage(reason: String) -> images3_core::error::Images3Error {
    ApplicationError::Storage { reason }.into()
}

fn sorted_templates<'a>(rows: impl Iterator<Item = &'a TemplateSnapshot>) -> Vec<TemplateSnapshot> {
    let mut rows: Vec<_> = rows.cloned().collect();
    rows.sort_by(|a, b| a.id.name().cmp(b.id.name()));
    rows
}

fn sorted_images<'a>(rows: impl Iterator<Item = &'a ImageRecord>) -> Vec<ImageRecord> {
    let mut rows: Vec<_> = rows.cloned().collect();
    rows.sort_by(|a, b| {
        (a.snapshot.created_at, a.snapshot.id.image_id())
            .cmp(&(b.snapshot.created_at, b.snapshot.id.image_id()))
    });
    rows
}

/// Thread-safe in-memory store.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    page_size: usize,
    metrics: Option<Arc<dyn ImageMetricsService>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            page_size: DEFAULT_PAGE_SIZE,
            metrics: None,
        }
    }

    /// Items per page for every paginated query.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Report every inserted image to `metrics`.
    ///
    /// A failed record is logged; the image stays stored.
    pub fn with_metrics(mut self, metrics: Arc<dyn ImageMetricsService>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Wires this store into every storage-facing port of the aggregate.
    pub fn aggregate_ports(
        self: &Arc<Self>,
        image_processor: Arc<dyn ImageProcessor>,
        metrics: Arc<dyn ImageMetricsService>,
    ) -> AggregatePorts {
        AggregatePorts {
            plant_access: Arc::clone(self) as Arc<dyn ImagePlantAccess>,
            template_access: Arc::clone(self) as Arc<dyn TemplateAccess>,
            template_repository: Arc::clone(self) as Arc<dyn TemplateRepository>,
            image_access: Arc::clone(self) as Arc<dyn ImageAccess>,
            image_repository: Arc::clone(self) as Arc<dyn ImageRepository>,
            image_processor,
            metrics,
        }
    }

    fn read(&self) -> Images3Result<RwLockReadGuard<'_, Tables>> {
        read_tables(&self.tables)
    }

    fn write(&self) -> Images3Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    /// Live paging: every page re-reads the tables, cursors are offsets.
    fn paginate<T, F>(&self, select: F) -> Paginated<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Tables) -> Vec<T> + Send + Sync + 'static,
    {
        let select = Arc::new(select);
        let page_size = self.page_size;

        let tables = Arc::clone(&self.tables);
        let select_page = Arc::clone(&select);
        let all_tables = Arc::clone(&self.tables);

        Paginated::new(move |cursor| {
            let rows = select_page(&*read_tables(&tables)?);
            let view = Paginated::from_vec(rows, page_size);
            match cursor {
                None => view.first_page(),
                Some(cursor) => view.page(cursor),
            }
        })
        .with_fetch_all(move || Ok(select(&*read_tables(&all_tables)?)))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read_tables(tables: &RwLock<Tables>) -> Images3Result<RwLockReadGuard<'_, Tables>> {
    tables
        .read()
        .map_err(|_| ApplicationError::StoreLockError.into())
}

// ============================================================================
// Access oracles
// ============================================================================

impl ImagePlantAccess for InMemoryStore {
    fn is_duplicated_image_plant_name(&self, name: &str) -> Images3Result<bool> {
        Ok(self.read()?.plants.values().any(|p| p.name == name))
    }

    fn generate_image_plant_id(&self) -> Images3Result<PlantId> {
        Ok(PlantId::new(Uuid::new_v4().to_string()))
    }
}

impl TemplateAccess for InMemoryStore {
    fn is_duplicated_template_name(&self, plant_id: &PlantId, name: &str) -> Images3Result<bool> {
        let key = TemplateId::new(plant_id.clone(), name);
        Ok(self.read()?.templates.contains_key(&key))
    }
}

impl ImageAccess for InMemoryStore {
    fn generate_image_id(&self, _plant: &ImagePlantSnapshot) -> Images3Result<String> {
        Ok(Uuid::new_v4().simple().to_string())
    }

    fn is_duplicate_version(&self, plant_id: &PlantId, version: &Version) -> Images3Result<bool> {
        Ok(self.read()?.version_taken(plant_id, version))
    }
}

// ============================================================================
// Repositories
// ============================================================================

impl ImagePlantRepository for InMemoryStore {
    fn find_plant_by_id(&self, id: &PlantId) -> Images3Result<Option<ImagePlantSnapshot>> {
        Ok(self.read()?.plants.get(id).cloned())
    }

    fn find_all_plants(&self) -> Images3Result<Paginated<ImagePlantSnapshot>> {
        Ok(self.paginate(|tables| {
            let mut rows: Vec<_> = tables.plants.values().cloned().collect();
            rows.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
            rows
        }))
    }
}

impl TemplateRepository for InMemoryStore {
    fn find_template_by_name(
        &self,
        plant_id: &PlantId,
        name: &str,
    ) -> Images3Result<Option<TemplateSnapshot>> {
        let key = TemplateId::new(plant_id.clone(), name);
        Ok(self.read()?.templates.get(&key).cloned())
    }

    fn find_all_templates_by_plant(
        &self,
        plant_id: &PlantId,
    ) -> Images3Result<Paginated<TemplateSnapshot>> {
        let plant_id = plant_id.clone();
        Ok(self.paginate(move |tables| {
            sorted_templates(tables.templates.values().filter(|t| t.id.plant_id() == &plant_id))
        }))
    }

    fn find_active_templates_by_plant(
        &self,
        plant_id: &PlantId,
    ) -> Images3Result<Paginated<TemplateSnapshot>> {
        let plant_id = plant_id.clone();
        Ok(self.paginate(move |tables| {
            sorted_templates(
                tables
                    .templates
                    .values()
                    .filter(|t| t.id.plant_id() == &plant_id && !t.archived),
            )
        }))
    }

    fn find_archived_templates_by_plant(
        &self,
        plant_id: &PlantId,
    ) -> Images3Result<Paginated<TemplateSnapshot>> {
        let plant_id = plant_id.clone();
        Ok(self.paginate(move |tables| {
            sorted_templates(
                tables
                    .templates
                    .values()
                    .filter(|t| t.id.plant_id() == &plant_id && t.archived),
            )
        }))
    }
}

impl ImageRepository for InMemoryStore {
    fn find_image_by_id(&self, id: &ImageId) -> Images3Result<Option<ImageRecord>> {
        Ok(self.read()?.images.get(id).cloned())
    }

    fn find_image_by_version(
        &self,
        plant_id: &PlantId,
        version: &Version,
    ) -> Images3Result<Option<ImageRecord>> {
        Ok(self
            .read()?
            .plant_images(plant_id)
            .find(|r| &r.snapshot.version == version)
            .cloned())
    }

    fn find_all_images_by_plant(
        &self,
        plant_id: &PlantId,
    ) -> Images3Result<Paginated<ImageRecord>> {
        let plant_id = plant_id.clone();
        Ok(self.paginate(move |tables| sorted_images(tables.plant_images(&plant_id))))
    }

    fn find_images_by_template(
        &self,
        template_id: &TemplateId,
    ) -> Images3Result<Paginated<ImageRecord>> {
        let template_id = template_id.clone();
        Ok(self.paginate(move |tables| {
            sorted_images(
                tables
                    .plant_images(template_id.plant_id())
                    .filter(|r| r.snapshot.version.template_name() == template_id.name()),
            )
        }))
    }
}

// ============================================================================
// Unit of work
// ============================================================================

/// Marks a written member clean. Deleted members stay VOID.
fn settle<E: Tracked>(
    entity: &mut E,
    mark_as_clean: impl FnOnce(&mut E) -> Result<(), DomainError>,
) -> Images3Result<()> {
    if !entity.is_void() {
        mark_as_clean(entity)?;
    }
    Ok(())
}

impl UnitOfWork for InMemoryStore {
    #[instrument(skip_all, fields(plant = %plant.id(), state = %plant.state()))]
    fn save_plant(&self, plant: &mut ImagePlantRoot) -> Images3Result<()> {
        let state = plant.state();
        let row = plant.snapshot().clone();
        {
            let mut tables = self.write()?;
            let previous = tables.plants.get(&row.id).cloned();
            match state {
                LifecycleState::New => tables.insert_plant(&row)?,
                LifecycleState::Dirty => tables.update_plant(&row)?,
                LifecycleState::Void => tables.delete_plant(&row.id),
                LifecycleState::Clean => {}
            }
            if state != LifecycleState::Void {
                if let Some(master) = plant.master_template_mut() {
                    if let Err(err) = tables.persist_template(master) {
                        tables.restore_plant(&row.id, previous);
                        return Err(err);
                    }
                }
            }
        }

        if state != LifecycleState::Void {
            if let Some(master) = plant.master_template_mut() {
                settle(master, TemplateEntity::mark_as_clean)?;
            }
        }
        settle(plant, ImagePlantRoot::mark_as_clean)?;
        debug!("Image plant persisted");
        Ok(())
    }

    #[instrument(skip_all, fields(template = %template.id(), state = %template.state()))]
    fn save_template(&self, template: &mut TemplateEntity) -> Images3Result<()> {
        self.write()?.persist_template(template)?;
        settle(template, TemplateEntity::mark_as_clean)?;
        debug!("Template persisted");
        Ok(())
    }

    #[instrument(skip_all, fields(image = %image.id(), state = %image.state()))]
    fn save_image(&self, image: &mut ImageEntity) -> Images3Result<()> {
        let inserted = image.is_new();
        self.write()?.persist_image(image)?;
        if inserted {
            if let Some(metrics) = &self.metrics {
                if let Err(err) = metrics.record(image.snapshot()) {
                    warn!(error = %err, "Image stored without metrics record");
                }
            }
        }
        settle(image, ImageEntity::mark_as_clean)?;
        debug!("Image persisted");
        Ok(())
    }
}
