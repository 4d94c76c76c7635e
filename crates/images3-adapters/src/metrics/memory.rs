//! In-memory image statistics, kept per plant, template and second.

use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard},
};

use chrono::{DateTime, Utc};
use images3_core::{
    application::{ApplicationError, ports::ImageMetricsService},
    domain::{
        ImageMetricsRecord, ImageSnapshot, MetricsKey, Paginated, PlantId, ReportScale,
        TimeInterval,
    },
    error::Images3Result,
};
use tracing::trace;

use crate::store::DEFAULT_PAGE_SIZE;

type Slot = (PlantId, String, DateTime<Utc>);

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    count: u64,
    size: u64,
}

pub struct InMemoryMetrics {
    slots: RwLock<HashMap<Slot, Counters>>,
    page_size: usize,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn read(&self) -> Images3Result<RwLockReadGuard<'_, HashMap<Slot, Counters>>> {
        self.slots
            .read()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    fn matching(&self, key: &MetricsKey) -> Images3Result<Vec<ImageMetricsRecord>> {
        let slots = self.read()?;
        let mut records: Vec<_> = slots
            .iter()
            .map(|((plant_id, template_name, second), counters)| ImageMetricsRecord {
                plant_id: plant_id.clone(),
                template_name: template_name.clone(),
                second: *second,
                count: counters.count,
                size: counters.size,
            })
            .filter(|record| key.matches(record))
            .collect();
        records.sort_by(|a, b| {
            (a.second, &a.template_name).cmp(&(b.second, &b.template_name))
        });
        Ok(records)
    }
}

impl Default for InMemoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageMetricsService for InMemoryMetrics {
    fn record(&self, image: &ImageSnapshot) -> Images3Result<()> {
        let slot = (
            image.id.plant_id().clone(),
            image.version.template_name().to_string(),
            ReportScale::Second.truncate(image.created_at),
        );
        let mut slots = self
            .slots
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        let counters = slots.entry(slot).or_default();
        counters.count += 1;
        counters.size += image.metadata.size();
        trace!(image = %image.id, "Image recorded");
        Ok(())
    }

    fn count_images(&self, key: &MetricsKey) -> Images3Result<u64> {
        Ok(self.matching(key)?.iter().map(|r| r.count).sum())
    }

    fn size_of_images(&self, key: &MetricsKey) -> Images3Result<u64> {
        Ok(self.matching(key)?.iter().map(|r| r.size).sum())
    }

    fn retrieve_stats(
        &self,
        key: &MetricsKey,
        interval: &TimeInterval,
    ) -> Images3Result<Paginated<ImageMetricsRecord>> {
        let records = self
            .matching(key)?
            .into_iter()
            .filter(|r| interval.contains(r.second))
            .collect();
        Ok(Paginated::from_vec(records, self.page_size))
    }
}
