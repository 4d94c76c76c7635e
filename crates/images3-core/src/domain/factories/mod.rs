//! Factory services.
//!
//! Each factory has two ways of producing an entity:
//!
//! - **generate**: allocates identity, checks invariants, returns a NEW entity
//! - **reconstitute**: rehydrates a persisted snapshot without checks, returns
//!   a CLEAN entity; an absent snapshot gives `None`, and a list holding an
//!   absent snapshot fails as a whole

mod image;
mod image_plant;
mod template;

use std::sync::Arc;

pub use image::ImageFactory;
pub use image_plant::{ImagePlantFactory, MASTER_TEMPLATE_NAME};
pub use template::TemplateFactory;

use crate::{
    application::ports::{
        ImageAccess, ImageMetricsService, ImagePlantAccess, ImageProcessor, ImageRepository,
        TemplateAccess, TemplateRepository,
    },
    domain::error::DomainError,
};

/// Every collaborator an image plant aggregate talks to.
#[derive(Clone)]
pub struct AggregatePorts {
    pub plant_access: Arc<dyn ImagePlantAccess>,
    pub template_access: Arc<dyn TemplateAccess>,
    pub template_repository: Arc<dyn TemplateRepository>,
    pub image_access: Arc<dyn ImageAccess>,
    pub image_repository: Arc<dyn ImageRepository>,
    pub image_processor: Arc<dyn ImageProcessor>,
    pub metrics: Arc<dyn ImageMetricsService>,
}

/// Collaborators shared by every root the plant factory produces.
#[derive(Clone)]
pub struct AggregateServices {
    pub(crate) plant_access: Arc<dyn ImagePlantAccess>,
    pub(crate) template_factory: Arc<TemplateFactory>,
    pub(crate) template_repository: Arc<dyn TemplateRepository>,
    pub(crate) image_factory: Arc<ImageFactory>,
    pub(crate) image_repository: Arc<dyn ImageRepository>,
    pub(crate) metrics: Arc<dyn ImageMetricsService>,
}

impl AggregateServices {
    pub fn new(ports: AggregatePorts) -> Self {
        Self {
            plant_access: ports.plant_access,
            template_factory: Arc::new(TemplateFactory::new(ports.template_access)),
            template_repository: ports.template_repository,
            image_factory: Arc::new(ImageFactory::new(
                ports.image_access,
                ports.image_processor,
            )),
            image_repository: ports.image_repository,
            metrics: ports.metrics,
        }
    }

    pub fn template_factory(&self) -> &TemplateFactory {
        &self.template_factory
    }

    pub fn image_factory(&self) -> &ImageFactory {
        &self.image_factory
    }
}

/// Reconstitutes every element or fails on the first absent one.
pub(crate) fn reconstitute_each<S, E>(
    entity: &'static str,
    snapshots: Vec<Option<S>>,
    mut rehydrate: impl FnMut(S) -> E,
) -> Result<Vec<E>, DomainError> {
    snapshots
        .into_iter()
        .enumerate()
        .map(|(index, snapshot)| {
            snapshot
                .map(&mut rehydrate)
                .ok_or(DomainError::MissingSnapshot { entity, index })
        })
        .collect()
}
