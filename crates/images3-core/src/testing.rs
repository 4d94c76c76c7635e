//! Mocked ports for unit tests.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;

use crate::{
    application::ports::{
        MockImageAccess, MockImageMetricsService, MockImagePlantAccess, MockImageProcessor,
        MockImageRepository, MockTemplateAccess, MockTemplateRepository,
    },
    domain::{
        AggregatePorts, AggregateServices, BucketRef, ImageContent, ImageDimension, ImageFormat,
        ImageMetadata, ImagePlantFactory, ImagePlantSnapshot, PlantId, ResizingConfig,
    },
};

pub(crate) struct MockPorts {
    pub plant_access: MockImagePlantAccess,
    pub template_access: MockTemplateAccess,
    pub template_repository: MockTemplateRepository,
    pub image_access: MockImageAccess,
    pub image_repository: MockImageRepository,
    pub image_processor: MockImageProcessor,
    pub metrics: MockImageMetricsService,
}

impl MockPorts {
    /// Mocks without a single expectation.
    pub fn strict() -> Self {
        Self {
            plant_access: MockImagePlantAccess::new(),
            template_access: MockTemplateAccess::new(),
            template_repository: MockTemplateRepository::new(),
            image_access: MockImageAccess::new(),
            image_repository: MockImageRepository::new(),
            image_processor: MockImageProcessor::new(),
            metrics: MockImageMetricsService::new(),
        }
    }

    /// Oracles that never see a clash, sequential ids (image ids count per
    /// plant), and [`stub_processor`].
    pub fn permissive() -> Self {
        let mut ports = Self::strict();
        ports.plant_access = permissive_plant_access();
        ports.template_access = permissive_template_access();
        ports.image_access = permissive_image_access();
        ports.image_processor = stub_processor();
        ports
    }

    pub fn into_services(self) -> AggregateServices {
        AggregateServices::new(AggregatePorts {
            plant_access: Arc::new(self.plant_access),
            template_access: Arc::new(self.template_access),
            template_repository: Arc::new(self.template_repository),
            image_access: Arc::new(self.image_access),
            image_repository: Arc::new(self.image_repository),
            image_processor: Arc::new(self.image_processor),
            metrics: Arc::new(self.metrics),
        })
    }

    pub fn into_factory(self) -> ImagePlantFactory {
        ImagePlantFactory::new(self.into_services())
    }
}

pub(crate) fn permissive_plant_access() -> MockImagePlantAccess {
    let mut access = MockImagePlantAccess::new();
    access
        .expect_is_duplicated_image_plant_name()
        .returning(|_| Ok(false));
    let mut next = 0;
    access.expect_generate_image_plant_id().returning(move || {
        next += 1;
        Ok(PlantId::new(format!("P{}", next)))
    });
    access
}

pub(crate) fn permissive_template_access() -> MockTemplateAccess {
    let mut access = MockTemplateAccess::new();
    access
        .expect_is_duplicated_template_name()
        .returning(|_, _| Ok(false));
    access
}

pub(crate) fn permissive_image_access() -> MockImageAccess {
    let mut access = MockImageAccess::new();
    let mut issued: HashMap<PlantId, usize> = HashMap::new();
    access.expect_generate_image_id().returning(move |plant| {
        let next = issued.entry(plant.id.clone()).or_default();
        *next += 1;
        Ok(format!("v{}", next))
    });
    access
        .expect_is_duplicate_version()
        .returning(|_, _| Ok(false));
    access
}

/// Accepts anything starting with the JPEG marker. "Resizing" keeps the
/// first `width` bytes; metadata reports the byte length as the width.
pub(crate) fn stub_processor() -> MockImageProcessor {
    let mut processor = MockImageProcessor::new();
    processor
        .expect_is_supported_format()
        .returning(|c| c.as_bytes().starts_with(&[0xFF, 0xD8, 0xFF]));
    processor.expect_read_metadata().returning(|c| {
        Ok(ImageMetadata::new(
            ImageDimension::new(c.len() as u32, 1),
            ImageFormat::Jpeg,
            c.len() as u64,
        ))
    });
    processor.expect_resize().returning(|_, c, config| {
        let keep = (config.width() as usize).min(c.len());
        Ok(ImageContent::from(&c.as_bytes()[..keep]))
    });
    processor
}

pub(crate) fn jpeg(len: usize) -> ImageContent {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(len.max(4), 0);
    ImageContent::from(bytes)
}

pub(crate) fn master_config() -> ResizingConfig {
    ResizingConfig::pixels(100, 200, true).unwrap()
}

pub(crate) fn thumb_config() -> ResizingConfig {
    ResizingConfig::pixels(50, 50, false).unwrap()
}

pub(crate) fn bucket() -> BucketRef {
    BucketRef::new("access", "secret", "images")
}

/// A persisted-looking plant row.
pub(crate) fn plant_snapshot(id: &str, name: &str) -> ImagePlantSnapshot {
    ImagePlantSnapshot {
        id: PlantId::new(id),
        name: name.into(),
        created_at: Utc::now(),
        bucket: bucket(),
        master_template_name: "Master".into(),
    }
}
