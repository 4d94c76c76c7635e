// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for images3.
//!
//! This module contains the image plant aggregate: value objects, life-cycle
//! tracking, the template and image entities, the aggregate root, and the
//! factories that generate or reconstitute them. Everything the aggregate
//! needs from outside goes through the ports in `crate::application::ports`.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: Storage, processing and metrics sit behind ports
//! - **One consistency boundary**: invariants are checked by the root or its factories
//! - **Explicit persistence intent**: every member carries a `LifecycleState`
//!
// Public API - what the world sees
pub mod entities;
pub mod error;
pub mod factories;
pub mod lifecycle;
pub mod pagination;
pub mod report;
pub mod value_objects;
pub mod version;

// Private implementation details - not visible outside domain
mod validation;

// Re-exports for convenience
pub use entities::{
    ImageEntity, ImagePlantRoot, ImagePlantSnapshot, ImageRecord, ImageSnapshot, TemplateEntity,
    TemplateSnapshot,
};

pub use error::{DomainError, ErrorCategory};

pub use factories::{
    AggregatePorts, AggregateServices, ImageFactory, ImagePlantFactory, MASTER_TEMPLATE_NAME,
    TemplateFactory,
};
pub use lifecycle::{Lifecycle, LifecycleState, Tracked};
pub use pagination::{Page, PageCursor, Paginated, Pages};
pub use report::{
    ImageMetricsRecord, ImageMetricsType, ImageReport, MAX_REPORT_BUCKETS, MetricsKey, ReportScale,
    TimeInterval,
};
pub use validation::DomainValidator;
pub use value_objects::{
    AggregateRef, BucketRef, ImageContent, ImageDimension, ImageFormat, ImageId, ImageMetadata,
    PlantId, ResizingConfig, ResizingUnit, TemplateId,
};
pub use version::Version;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{DateTime, TimeDelta, Utc};

    use super::*;
    use crate::{
        application::ports::{MockImagePlantAccess, MockTemplateAccess},
        error::Images3Error,
        testing::{MockPorts, bucket, jpeg, master_config, plant_snapshot, thumb_config},
    };

    fn domain_err(err: Images3Error) -> DomainError {
        match err {
            Images3Error::Domain(e) => e,
            other => panic!("expected a domain error, got {other:?}"),
        }
    }

    fn fresh_plant() -> ImagePlantRoot {
        MockPorts::permissive()
            .into_factory()
            .generate("P1", bucket(), master_config())
            .unwrap()
    }

    // ========================================================================
    // Value Object Tests
    // ========================================================================

    #[test]
    fn resizing_config_rejects_zero_sides() {
        assert!(ResizingConfig::pixels(0, 10, true).is_err());
        assert!(ResizingConfig::new(ResizingUnit::Percent, 10, 0, false).is_err());
    }

    #[test]
    fn resizing_unit_parses_loosely() {
        assert_eq!(ResizingUnit::from_str("pixel").unwrap(), ResizingUnit::Pixel);
        assert_eq!(ResizingUnit::from_str("PERCENT").unwrap(), ResizingUnit::Percent);
        assert_eq!(ResizingUnit::from_str("%").unwrap(), ResizingUnit::Percent);
        assert!(ResizingUnit::from_str("inch").is_err());
    }

    #[test]
    fn percent_config_scales_source_dimension() {
        let half = ResizingConfig::new(ResizingUnit::Percent, 50, 25, true).unwrap();
        assert_eq!(
            half.to_pixels(ImageDimension::new(200, 101)),
            ImageDimension::new(100, 25)
        );

        let tiny = ResizingConfig::new(ResizingUnit::Percent, 1, 1, true).unwrap();
        assert_eq!(
            tiny.to_pixels(ImageDimension::new(10, 10)),
            ImageDimension::new(1, 1)
        );
    }

    #[test]
    fn pixel_config_ignores_source_dimension() {
        let config = ResizingConfig::pixels(50, 60, false).unwrap();
        assert_eq!(
            config.to_pixels(ImageDimension::new(1000, 1000)),
            ImageDimension::new(50, 60)
        );
        assert_eq!(config.to_string(), "50x60px");
    }

    #[test]
    fn bucket_debug_hides_secret() {
        let debug = format!("{:?}", BucketRef::new("ak", "top-secret", "b"));
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("ak"));
    }

    #[test]
    fn snapshots_round_trip_through_json() {
        let plant = fresh_plant();
        let json = serde_json::to_string(plant.snapshot()).unwrap();
        let back: ImagePlantSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, plant.snapshot());

        let master = plant.master_template().unwrap();
        let json = serde_json::to_string(master.snapshot()).unwrap();
        assert!(json.contains(r#""unit":"PIXEL""#));
        let back: TemplateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, master.snapshot());
    }

    // ========================================================================
    // Plant Generation Tests
    // ========================================================================

    #[test]
    fn fresh_plant_has_one_active_unremovable_master() {
        let plant = fresh_plant();
        assert!(plant.is_new());
        assert_eq!(plant.name(), "P1");
        assert_eq!(plant.master_template_name(), MASTER_TEMPLATE_NAME);

        let master = plant.master_template().unwrap();
        assert_eq!(master.name(), "Master");
        assert!(!master.is_removable());
        assert!(!master.is_archived());
        assert!(master.is_new());
        assert_eq!(master.resizing_config(), &master_config());
        assert_eq!(master.owner(), plant.aggregate_ref());
    }

    #[test]
    fn other_templates_default_archived_and_removable() {
        let mut plant = fresh_plant();
        let thumb = plant.create_template("Thumb", thumb_config()).unwrap();
        assert!(thumb.is_new());
        assert!(thumb.is_archived());
        assert!(thumb.is_removable());
    }

    #[test]
    fn generate_rejects_taken_plant_name() {
        let mut ports = MockPorts::permissive();
        ports.plant_access = MockImagePlantAccess::new();
        ports
            .plant_access
            .expect_generate_image_plant_id()
            .returning(|| Ok(PlantId::new("P1")));
        ports
            .plant_access
            .expect_is_duplicated_image_plant_name()
            .times(1)
            .returning(|_| Ok(true));
        ports.template_access = MockTemplateAccess::new();
        ports.template_access.expect_is_duplicated_template_name().times(0);

        let err = ports
            .into_factory()
            .generate("Taken", bucket(), master_config())
            .unwrap_err();
        assert!(matches!(
            domain_err(err),
            DomainError::DuplicatePlantName { .. }
        ));
    }

    #[test]
    fn generate_rejects_blank_name() {
        let err = MockPorts::permissive()
            .into_factory()
            .generate("  ", bucket(), master_config())
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::InvalidName { .. }));
    }

    // ========================================================================
    // Plant Command Tests
    // ========================================================================

    #[test]
    fn renaming_to_current_name_never_asks_the_oracle() {
        let mut ports = MockPorts::strict();
        ports
            .plant_access
            .expect_is_duplicated_image_plant_name()
            .times(0);
        let factory = ports.into_factory();

        let mut plant = factory
            .reconstitute(Some(plant_snapshot("P1", "Photos")))
            .unwrap();
        plant.update_name("Photos").unwrap();
        assert!(!plant.is_dirty());
        assert_eq!(plant.state(), LifecycleState::Clean);
    }

    #[test]
    fn rename_checks_oracle_and_dirties() {
        let mut ports = MockPorts::strict();
        ports
            .plant_access
            .expect_is_duplicated_image_plant_name()
            .returning(|name| Ok(name == "Taken"));
        let factory = ports.into_factory();
        let mut plant = factory
            .reconstitute(Some(plant_snapshot("P1", "Photos")))
            .unwrap();

        let err = plant.update_name("Taken").unwrap_err();
        assert!(matches!(
            domain_err(err),
            DomainError::DuplicatePlantName { .. }
        ));
        assert_eq!(plant.name(), "Photos");
        assert!(!plant.is_dirty());

        plant.update_name("Pictures").unwrap();
        assert_eq!(plant.name(), "Pictures");
        assert!(plant.is_dirty());
    }

    #[test]
    fn bucket_update_dirties_only_on_change() {
        let factory = MockPorts::strict().into_factory();
        let mut plant = factory
            .reconstitute(Some(plant_snapshot("P1", "Photos")))
            .unwrap();

        plant.update_bucket(bucket()).unwrap();
        assert!(!plant.is_dirty());

        plant
            .update_bucket(BucketRef::new("access", "secret", "archive"))
            .unwrap();
        assert!(plant.is_dirty());
        assert_eq!(plant.bucket().name(), "archive");
    }

    #[test]
    fn removed_plant_rejects_every_command() {
        let mut plant = fresh_plant();
        let mut thumb = plant.create_template("Thumb", thumb_config()).unwrap();
        plant.remove().unwrap();
        assert!(plant.is_void());

        assert!(matches!(
            domain_err(plant.update_name("Other").unwrap_err()),
            DomainError::VoidEntityMutation { .. }
        ));
        assert!(matches!(
            domain_err(plant.create_template("Banner", thumb_config()).unwrap_err()),
            DomainError::VoidEntityMutation { .. }
        ));
        assert!(matches!(
            plant.remove_template(&mut thumb),
            Err(DomainError::VoidEntityMutation { .. })
        ));
        assert!(plant.remove().is_err());
    }

    // ========================================================================
    // Template Command Tests
    // ========================================================================

    #[test]
    fn duplicate_template_name_from_oracle() {
        let mut ports = MockPorts::permissive();
        ports.template_access = MockTemplateAccess::new();
        ports
            .template_access
            .expect_is_duplicated_template_name()
            .returning(|_, name| Ok(name == "Thumb"));
        let mut plant = ports
            .into_factory()
            .generate("P1", bucket(), master_config())
            .unwrap();

        let err = plant.create_template("Thumb", thumb_config()).unwrap_err();
        assert!(matches!(
            domain_err(err),
            DomainError::DuplicateTemplateName { .. }
        ));
    }

    #[test]
    fn duplicate_template_name_within_one_root() {
        let mut plant = fresh_plant();
        plant.create_template("Thumb", thumb_config()).unwrap();
        let err = plant.create_template("Thumb", thumb_config()).unwrap_err();
        assert!(domain_err(err).is_duplicate_name());

        let err = plant.create_template("Master", thumb_config()).unwrap_err();
        assert!(domain_err(err).is_duplicate_name());
    }

    #[test]
    fn remove_template_voids_removable_template() {
        let mut plant = fresh_plant();
        let mut thumb = plant.create_template("Thumb", thumb_config()).unwrap();

        plant.remove_template(&mut thumb).unwrap();
        assert!(thumb.is_void());
        assert!(!thumb.is_dirty());

        assert!(matches!(
            plant.remove_template(&mut thumb),
            Err(DomainError::VoidEntityMutation { .. })
        ));
        assert!(matches!(
            plant.update_template(&mut thumb),
            Err(DomainError::VoidEntityMutation { .. })
        ));
    }

    #[test]
    fn master_template_cannot_be_removed() {
        let plant = fresh_plant();
        let mut master = plant.master_template().unwrap();
        assert!(matches!(
            plant.remove_template(&mut master),
            Err(DomainError::UnremovableTemplate { .. })
        ));
        assert!(!master.is_void());
    }

    #[test]
    fn master_template_must_stay_active() {
        let plant = fresh_plant();
        let mut master = plant.master_template().unwrap();
        master.archive().unwrap();
        assert!(matches!(
            plant.update_template(&mut master),
            Err(DomainError::InactiveBootstrapTemplate { .. })
        ));
    }

    #[test]
    fn update_template_dirties_clean_template() {
        let mut ports = MockPorts::strict();
        ports
            .template_repository
            .expect_find_template_by_name()
            .returning(|plant_id, name| {
                Ok(Some(TemplateSnapshot {
                    id: TemplateId::new(plant_id.clone(), name),
                    archived: true,
                    removable: true,
                    resizing_config: thumb_config(),
                }))
            });
        let plant = ports
            .into_factory()
            .reconstitute(Some(plant_snapshot("P1", "Photos")))
            .unwrap();

        let mut thumb = plant.fetch_template("Thumb").unwrap().unwrap();
        assert_eq!(thumb.state(), LifecycleState::Clean);
        thumb.unarchive().unwrap();
        plant.update_template(&mut thumb).unwrap();
        assert!(thumb.is_dirty());
        assert!(!thumb.is_archived());
    }

    #[test]
    fn foreign_root_cannot_touch_templates() {
        let factory = MockPorts::permissive().into_factory();
        let snapshot = plant_snapshot("P1", "Photos");
        let mut owner = factory.reconstitute(Some(snapshot.clone())).unwrap();
        let stranger = factory.reconstitute(Some(snapshot)).unwrap();
        assert_eq!(owner.id(), stranger.id());

        let mut thumb = owner.create_template("Thumb", thumb_config()).unwrap();

        assert!(matches!(
            stranger.update_template(&mut thumb),
            Err(DomainError::ForeignEntity { .. })
        ));
        assert!(matches!(
            stranger.remove_template(&mut thumb),
            Err(DomainError::ForeignEntity { .. })
        ));
        assert!(thumb.is_new());

        owner.remove_template(&mut thumb).unwrap();
        assert!(thumb.is_void());
    }

    #[test]
    fn ownership_survives_serialisation() {
        let plant = fresh_plant();
        let token = serde_json::to_string(plant.aggregate_ref()).unwrap();
        let back: AggregateRef = serde_json::from_str(&token).unwrap();
        assert_eq!(&back, plant.aggregate_ref());
    }

    // ========================================================================
    // Template Query Tests
    // ========================================================================

    #[test]
    fn listed_templates_belong_to_the_listing_root() {
        let mut ports = MockPorts::strict();
        ports
            .template_repository
            .expect_find_active_templates_by_plant()
            .times(1)
            .returning(|plant_id| {
                let rows = ["Master", "Thumb", "Banner"]
                    .into_iter()
                    .map(|name| TemplateSnapshot {
                        id: TemplateId::new(plant_id.clone(), name),
                        archived: false,
                        removable: name != "Master",
                        resizing_config: thumb_config(),
                    })
                    .collect();
                Ok(Paginated::from_vec(rows, 2))
            });
        let plant = ports
            .into_factory()
            .reconstitute(Some(plant_snapshot("P1", "Photos")))
            .unwrap();

        let listing = plant.list_active_templates().unwrap();
        let first = listing.first_page().unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(!first.is_last());

        let mut all = listing.fetch_all().unwrap();
        assert_eq!(all.len(), 3);
        let mut banner = all.pop().unwrap();
        assert_eq!(banner.owner(), plant.aggregate_ref());
        assert_eq!(banner.state(), LifecycleState::Clean);
        assert!(plant.remove_template(&mut banner).is_ok());
    }

    #[test]
    fn missing_template_is_none() {
        let mut ports = MockPorts::strict();
        ports
            .template_repository
            .expect_find_template_by_name()
            .returning(|_, _| Ok(None));
        let plant = ports
            .into_factory()
            .reconstitute(Some(plant_snapshot("P1", "Photos")))
            .unwrap();
        assert!(plant.fetch_template("Nope").unwrap().is_none());
        assert!(plant.master_template().is_err());
    }

    // ========================================================================
    // Image Tests
    // ========================================================================

    #[test]
    fn unsupported_upload_is_rejected() {
        let mut plant = fresh_plant();
        let err = plant
            .create_image(ImageContent::from(b"GIF89a".to_vec()))
            .unwrap_err();
        assert!(matches!(
            domain_err(err),
            DomainError::UnsupportedImageFormat { .. }
        ));
    }

    #[test]
    fn duplicate_version_within_one_root() {
        let mut plant = fresh_plant();
        let thumb = plant.create_template("Thumb", thumb_config()).unwrap();
        let v1 = plant.create_image(jpeg(300)).unwrap();

        plant.create_derived_image(&thumb, &v1).unwrap();
        let err = plant.create_derived_image(&thumb, &v1).unwrap_err();
        assert!(matches!(
            domain_err(err),
            DomainError::DuplicateVersion { .. }
        ));
    }

    #[test]
    fn duplicate_version_is_plant_scoped() {
        let factory = MockPorts::permissive().into_factory();
        let mut p1 = factory.generate("One", bucket(), master_config()).unwrap();
        let mut p2 = factory.generate("Two", bucket(), master_config()).unwrap();
        assert_ne!(p1.id(), p2.id());

        let t1 = p1.create_template("Thumb", thumb_config()).unwrap();
        let t2 = p2.create_template("Thumb", thumb_config()).unwrap();
        let o1 = p1.create_image(jpeg(300)).unwrap();
        let o2 = p2.create_image(jpeg(300)).unwrap();
        assert_eq!(o1.id().image_id(), o2.id().image_id());

        p1.create_derived_image(&t1, &o1).unwrap();
        p2.create_derived_image(&t2, &o2).unwrap();
        assert!(p1.create_derived_image(&t1, &o1).is_err());
    }

    #[test]
    fn archived_template_still_blocks_duplicate_version() {
        let mut plant = fresh_plant();
        let mut thumb = plant.create_template("Thumb", thumb_config()).unwrap();
        let v1 = plant.create_image(jpeg(300)).unwrap();
        plant.create_derived_image(&thumb, &v1).unwrap();

        thumb.archive().unwrap();
        assert!(thumb.is_archived());
        let err = plant.create_derived_image(&thumb, &v1).unwrap_err();
        assert!(matches!(
            domain_err(err),
            DomainError::DuplicateVersion { .. }
        ));
    }

    #[test]
    fn foreign_or_void_template_cannot_derive() {
        let factory = MockPorts::permissive().into_factory();
        let mut plant = factory
            .generate("P1", bucket(), master_config())
            .unwrap();
        let mut other = factory.reconstitute(Some(plant.snapshot().clone())).unwrap();

        let mut thumb = plant.create_template("Thumb", thumb_config()).unwrap();
        let v1 = plant.create_image(jpeg(300)).unwrap();

        assert!(matches!(
            domain_err(other.create_derived_image(&thumb, &v1).unwrap_err()),
            DomainError::ForeignEntity { .. }
        ));

        plant.remove_template(&mut thumb).unwrap();
        assert!(matches!(
            domain_err(plant.create_derived_image(&thumb, &v1).unwrap_err()),
            DomainError::VoidEntityMutation { .. }
        ));
    }

    #[test]
    fn scenario_master_thumb_and_versions() {
        let mut plant = fresh_plant();
        assert_eq!(plant.id().as_str(), "P1");

        let thumb = plant.create_template("Thumb", thumb_config()).unwrap();
        assert!(thumb.is_new());
        assert!(thumb.is_archived());

        let v1 = plant.create_image(jpeg(1_000)).unwrap();
        assert_eq!(v1.version(), &Version::original("Master"));
        assert_eq!(v1.metadata().size(), 100);
        assert!(v1.is_new());

        let v2 = plant.create_derived_image(&thumb, &v1).unwrap();
        assert_eq!(
            v2.version(),
            &Version::derived("Thumb", v1.id().image_id())
        );
        assert_eq!(v2.metadata().size(), 50);

        let err = plant.create_derived_image(&thumb, &v1).unwrap_err();
        assert!(matches!(
            domain_err(err),
            DomainError::DuplicateVersion { .. }
        ));
    }

    // ========================================================================
    // Reporting Tests
    // ========================================================================

    #[test]
    fn counts_are_keyed_by_plant_or_template() {
        let mut ports = MockPorts::permissive();
        ports
            .metrics
            .expect_count_images()
            .returning(|key| match key {
                MetricsKey::Plant(_) => Ok(10),
                MetricsKey::Template(id) if id.name() == "Thumb" => Ok(3),
                MetricsKey::Template(_) => Ok(0),
            });
        ports
            .metrics
            .expect_size_of_images()
            .returning(|key| Ok(if matches!(key, MetricsKey::Plant(_)) { 4096 } else { 512 }));
        let mut plant = ports
            .into_factory()
            .generate("P1", bucket(), master_config())
            .unwrap();
        let thumb = plant.create_template("Thumb", thumb_config()).unwrap();

        assert_eq!(plant.count_images(None).unwrap(), 10);
        assert_eq!(plant.count_images(Some(&thumb)).unwrap(), 3);
        assert_eq!(plant.size_of_images(None).unwrap(), 4096);
        assert_eq!(plant.size_of_images(Some(&thumb)).unwrap(), 512);
    }

    #[test]
    fn report_buckets_metric_records() {
        let start = DateTime::<Utc>::from_timestamp(3_600, 0).unwrap();
        let mut ports = MockPorts::permissive();
        ports
            .metrics
            .expect_retrieve_stats()
            .times(1)
            .returning(move |key, _| {
                let rows = [(0, 2, 200), (30, 1, 100), (150, 4, 400)]
                    .into_iter()
                    .map(|(offset, count, size)| ImageMetricsRecord {
                        plant_id: key.plant_id().clone(),
                        template_name: "Master".into(),
                        second: start + TimeDelta::seconds(offset),
                        count,
                        size,
                    })
                    .collect::<Vec<_>>();
                Ok(Paginated::new(move |_| Ok(Page::new(rows.clone(), None))))
            });
        let plant = ports
            .into_factory()
            .generate("P1", bucket(), master_config())
            .unwrap();

        let interval = TimeInterval::new(start, start + TimeDelta::seconds(179)).unwrap();
        let report = plant
            .generate_report(None, interval, ReportScale::Minute, ImageMetricsType::Count)
            .unwrap();
        assert_eq!(report.values, vec![3, 0, 4]);
        assert_eq!(report.key, MetricsKey::Plant(PlantId::new("P1")));
    }
}
