use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    domain::{
        DomainValidator,
        entities::{ImagePlantRoot, ImagePlantSnapshot},
        error::DomainError,
        value_objects::{BucketRef, ResizingConfig},
    },
    error::Images3Result,
};

use super::{AggregateServices, reconstitute_each};

/// Name of the bootstrap template every plant is created with.
pub const MASTER_TEMPLATE_NAME: &str = "Master";

pub struct ImagePlantFactory {
    services: AggregateServices,
}

impl ImagePlantFactory {
    pub fn new(services: AggregateServices) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &AggregateServices {
        &self.services
    }

    /// A NEW plant holding its bootstrap template.
    ///
    /// The bootstrap template goes through the ordinary template path and is
    /// activated right after; nothing else about it is special.
    #[instrument(skip_all, fields(plant = %name))]
    pub fn generate(
        &self,
        name: &str,
        bucket: BucketRef,
        config: ResizingConfig,
    ) -> Images3Result<ImagePlantRoot> {
        DomainValidator::validate_plant_name(name)?;

        let id = self.services.plant_access.generate_image_plant_id()?;
        let snapshot = ImagePlantSnapshot {
            id,
            name: String::new(),
            created_at: Utc::now(),
            bucket,
            master_template_name: MASTER_TEMPLATE_NAME.to_string(),
        };

        let mut root = ImagePlantRoot::new(snapshot, self.services.clone());
        root.mark_as_new()?;
        root.update_name(name)?;

        let mut master = root.create_template(MASTER_TEMPLATE_NAME, config)?;
        master.unarchive()?;
        root.update_template(&mut master)?;
        root.hold_master_template(master);

        info!(id = %root.id(), "Image plant generated");
        Ok(root)
    }

    pub fn reconstitute(&self, snapshot: Option<ImagePlantSnapshot>) -> Option<ImagePlantRoot> {
        snapshot.map(|s| ImagePlantRoot::new(s, self.services.clone()))
    }

    pub fn reconstitute_all(
        &self,
        snapshots: Vec<Option<ImagePlantSnapshot>>,
    ) -> Result<Vec<ImagePlantRoot>, DomainError> {
        reconstitute_each("image plant", snapshots, |s| {
            ImagePlantRoot::new(s, self.services.clone())
        })
    }
}
