//! Time-bucketed image statistics.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    value_objects::{PlantId, TemplateId},
};

/// Upper bound on the buckets one report may hold.
pub const MAX_REPORT_BUCKETS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidTimeInterval(format!(
                "end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// The `length` leading up to `end`.
    pub fn ending_at(end: DateTime<Utc>, length: TimeDelta) -> Result<Self, DomainError> {
        let start = end.checked_sub_signed(length).ok_or_else(|| {
            DomainError::InvalidTimeInterval(format!("{length} before {end} is out of range"))
        })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportScale {
    Second,
    Minute,
    Hour,
    Day,
}

impl ReportScale {
    pub fn seconds(self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }

    /// Start of the bucket `at` falls into.
    pub fn truncate(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let step = self.seconds();
        let secs = at.timestamp().div_euclid(step) * step;
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(at)
    }

    /// Number of buckets covering `interval`, at most [`MAX_REPORT_BUCKETS`].
    pub fn bucket_count(self, interval: &TimeInterval) -> Result<usize, DomainError> {
        let span = (self.truncate(interval.end()) - self.truncate(interval.start())).num_seconds();
        usize::try_from(span / self.seconds() + 1)
            .ok()
            .filter(|count| *count <= MAX_REPORT_BUCKETS)
            .ok_or_else(|| {
                DomainError::InvalidTimeInterval(format!(
                    "more than {MAX_REPORT_BUCKETS} {self:?} buckets between {} and {}",
                    interval.start(),
                    interval.end()
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageMetricsType {
    Count,
    Size,
}

impl fmt::Display for ImageMetricsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => f.write_str("COUNT"),
            Self::Size => f.write_str("SIZE"),
        }
    }
}

/// What a statistic is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricsKey {
    Plant(PlantId),
    Template(TemplateId),
}

impl MetricsKey {
    pub fn plant_id(&self) -> &PlantId {
        match self {
            Self::Plant(id) => id,
            Self::Template(id) => id.plant_id(),
        }
    }

    pub fn matches(&self, record: &ImageMetricsRecord) -> bool {
        match self {
            Self::Plant(id) => &record.plant_id == id,
            Self::Template(id) => {
                &record.plant_id == id.plant_id() && record.template_name == id.name()
            }
        }
    }
}

impl fmt::Display for MetricsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plant(id) => write!(f, "plant {}", id),
            Self::Template(id) => write!(f, "template {}", id),
        }
    }
}

/// Images stored during one second, per plant and template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetricsRecord {
    pub plant_id: PlantId,
    pub template_name: String,
    pub second: DateTime<Utc>,
    pub count: u64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReport {
    pub key: MetricsKey,
    pub kind: ImageMetricsType,
    pub scale: ReportScale,
    pub times: Vec<DateTime<Utc>>,
    pub values: Vec<u64>,
}

impl ImageReport {
    /// Sums matching records into one bucket per `scale` step of `interval`.
    /// Buckets without records hold zero.
    pub fn aggregate(
        key: MetricsKey,
        interval: &TimeInterval,
        scale: ReportScale,
        kind: ImageMetricsType,
        records: impl IntoIterator<Item = ImageMetricsRecord>,
    ) -> Result<Self, DomainError> {
        let step = TimeDelta::seconds(scale.seconds());
        let first = scale.truncate(interval.start());

        let mut times = Vec::with_capacity(scale.bucket_count(interval)?);
        let mut bucket = Some(first);
        while let Some(at) = bucket.filter(|at| *at <= interval.end()) {
            times.push(at);
            bucket = at.checked_add_signed(step);
        }
        let mut values = vec![0u64; times.len()];

        for record in records {
            if !key.matches(&record) || !interval.contains(record.second) {
                continue;
            }
            let offset = (scale.truncate(record.second) - first).num_seconds() / scale.seconds();
            if let Some(slot) = usize::try_from(offset).ok().and_then(|i| values.get_mut(i)) {
                *slot += match kind {
                    ImageMetricsType::Count => record.count,
                    ImageMetricsType::Size => record.size,
                };
            }
        }

        Ok(Self {
            key,
            kind,
            scale,
            times,
            values,
        })
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn record(template: &str, second: i64, size: u64) -> ImageMetricsRecord {
        ImageMetricsRecord {
            plant_id: PlantId::new("p1"),
            template_name: template.into(),
            second: at(second),
            count: 1,
            size,
        }
    }

    #[test]
    fn interval_must_be_ordered() {
        assert!(TimeInterval::new(at(10), at(5)).is_err());
        assert!(TimeInterval::new(at(5), at(5)).is_ok());
    }

    #[test]
    fn scale_truncates_to_bucket_start() {
        assert_eq!(ReportScale::Minute.truncate(at(119)), at(60));
        assert_eq!(ReportScale::Hour.truncate(at(7_199)), at(3_600));
        assert_eq!(ReportScale::Second.truncate(at(42)), at(42));
    }

    #[test]
    fn buckets_are_zero_filled() {
        let interval = TimeInterval::new(at(0), at(239)).unwrap();
        let report = ImageReport::aggregate(
            MetricsKey::Plant(PlantId::new("p1")),
            &interval,
            ReportScale::Minute,
            ImageMetricsType::Count,
            vec![record("Master", 5, 10), record("Thumb", 130, 3)],
        )
        .unwrap();
        assert_eq!(report.times, vec![at(0), at(60), at(120), at(180)]);
        assert_eq!(report.values, vec![1, 0, 1, 0]);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn template_key_filters_records() {
        let interval = TimeInterval::new(at(0), at(59)).unwrap();
        let key = MetricsKey::Template(TemplateId::new(PlantId::new("p1"), "Thumb"));
        let report = ImageReport::aggregate(
            key,
            &interval,
            ReportScale::Minute,
            ImageMetricsType::Size,
            vec![record("Master", 1, 100), record("Thumb", 2, 7), record("Thumb", 3, 8)],
        )
        .unwrap();
        assert_eq!(report.values, vec![15]);
    }

    #[test]
    fn out_of_range_length_is_rejected() {
        let err = TimeInterval::ending_at(Utc::now(), TimeDelta::MAX).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTimeInterval(_)));
    }

    #[test]
    fn bucket_count_is_capped() {
        let cap = MAX_REPORT_BUCKETS as i64;
        let fits = TimeInterval::new(at(0), at(cap - 1)).unwrap();
        assert_eq!(ReportScale::Second.bucket_count(&fits).unwrap(), MAX_REPORT_BUCKETS);

        let too_long = TimeInterval::new(at(0), at(cap)).unwrap();
        let err = ImageReport::aggregate(
            MetricsKey::Plant(PlantId::new("p1")),
            &too_long,
            ReportScale::Second,
            ImageMetricsType::Count,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTimeInterval(_)));

        // The same span is fine at a coarser scale.
        assert_eq!(ReportScale::Day.bucket_count(&too_long).unwrap(), 2);
    }
}
