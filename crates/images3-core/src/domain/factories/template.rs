use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    application::ports::TemplateAccess,
    domain::{
        DomainValidator,
        entities::{ImagePlantSnapshot, TemplateEntity, TemplateSnapshot},
        error::DomainError,
        value_objects::{AggregateRef, ResizingConfig, TemplateId},
    },
    error::Images3Result,
};

use super::reconstitute_each;

pub struct TemplateFactory {
    access: Arc<dyn TemplateAccess>,
}

impl TemplateFactory {
    pub fn new(access: Arc<dyn TemplateAccess>) -> Self {
        Self { access }
    }

    /// New template, archived until someone activates it. Only the plant's
    /// bootstrap template is created non-removable.
    #[instrument(skip_all, fields(plant = %plant.id, template = %name))]
    pub fn generate(
        &self,
        plant: &ImagePlantSnapshot,
        owner: &AggregateRef,
        name: &str,
        config: ResizingConfig,
    ) -> Images3Result<TemplateEntity> {
        DomainValidator::validate_template_name(name)?;

        if self.access.is_duplicated_template_name(&plant.id, name)? {
            warn!("Template name already taken");
            return Err(DomainError::DuplicateTemplateName {
                plant_id: plant.id.to_string(),
                name: name.to_string(),
            }
            .into());
        }

        let mut template = TemplateEntity::new(
            owner.clone(),
            TemplateSnapshot {
                id: TemplateId::new(plant.id.clone(), name),
                archived: true,
                removable: name != plant.master_template_name,
                resizing_config: config,
            },
        );
        template.mark_as_new()?;
        debug!(removable = template.is_removable(), "Template generated");
        Ok(template)
    }

    pub fn reconstitute(
        &self,
        snapshot: Option<TemplateSnapshot>,
        owner: &AggregateRef,
    ) -> Option<TemplateEntity> {
        snapshot.map(|s| self.rehydrate(s, owner))
    }

    pub fn reconstitute_all(
        &self,
        snapshots: Vec<Option<TemplateSnapshot>>,
        owner: &AggregateRef,
    ) -> Result<Vec<TemplateEntity>, DomainError> {
        reconstitute_each("template", snapshots, |s| self.rehydrate(s, owner))
    }

    pub(crate) fn rehydrate(
        &self,
        snapshot: TemplateSnapshot,
        owner: &AggregateRef,
    ) -> TemplateEntity {
        TemplateEntity::new(owner.clone(), snapshot)
    }
}
