//! Dashboard generation input and output models.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Immutable query for one dashboard generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCriteria {
    pub dashboard_id: Uuid,
    /// User on whose behalf activities are fetched.
    pub generator: Uuid,
    pub time_range_start: Option<DateTime<Utc>>,
    pub time_range_end: Option<DateTime<Utc>>,
    /// Activities must carry one of these tags to count. Empty means no restriction.
    pub required_tags: BTreeSet<Uuid>,
}

impl GenerationCriteria {
    pub fn new(
        dashboard_id: Uuid,
        generator: Uuid,
        time_range_start: Option<DateTime<Utc>>,
        time_range_end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            dashboard_id,
            generator,
            time_range_start,
            time_range_end,
            required_tags: BTreeSet::new(),
        }
    }

    pub fn with_required_tags(mut self, tags: impl IntoIterator<Item = Uuid>) -> Self {
        self.required_tags = tags.into_iter().collect();
        self
    }
}

/// Discriminator of a generated bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketType {
    Tag,
    Metric,
    Day,
    Week,
    Month,
}

impl std::fmt::Display for BucketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag => write!(f, "TAG"),
            Self::Metric => write!(f, "METRIC"),
            Self::Day => write!(f, "DAY"),
            Self::Week => write!(f, "WEEK"),
            Self::Month => write!(f, "MONTH"),
        }
    }
}

/// One aggregated group of a generated chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_end: Option<DateTime<Utc>>,
    pub bucket_type: BucketType,
    pub value: Decimal,
    pub percentage: Decimal,
    pub buckets: Vec<Bucket>,
}

impl Bucket {
    /// Creates a categorical leaf bucket.
    pub fn leaf(id: impl Into<String>, bucket_type: BucketType, value: Decimal, percentage: Decimal) -> Self {
        Self {
            id: id.into(),
            range_start: None,
            range_end: None,
            bucket_type,
            value,
            percentage,
            buckets: Vec::new(),
        }
    }
}

/// Chart name plus its top-level buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedChart {
    pub name: String,
    pub buckets: Vec<Bucket>,
}

/// Generated dashboard: its name and charts in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub name: String,
    pub charts: Vec<GeneratedChart>,
}

/// Query parameters of the dashboard data endpoint.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_range_order"))]
pub struct GenerateDashboardQuery {
    /// Range start in milliseconds since epoch
    #[validate(custom(function = "validate_timestamp_millis"))]
    pub range_start: Option<i64>,

    /// Range end in milliseconds since epoch
    #[validate(custom(function = "validate_timestamp_millis"))]
    pub range_end: Option<i64>,

    /// Comma-separated tag IDs
    pub required_tags: Option<String>,
}

impl GenerateDashboardQuery {
    pub fn range_start(&self) -> Option<DateTime<Utc>> {
        self.range_start.and_then(millis_to_instant)
    }

    pub fn range_end(&self) -> Option<DateTime<Utc>> {
        self.range_end.and_then(millis_to_instant)
    }

    /// Parses `required_tags`, ignoring blank entries.
    pub fn required_tag_ids(&self) -> Result<BTreeSet<Uuid>, uuid::Error> {
        self.required_tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Uuid::parse_str)
            .collect()
    }
}

fn millis_to_instant(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn validate_timestamp_millis(millis: i64) -> Result<(), ValidationError> {
    if millis_to_instant(millis).is_none() {
        let mut err = ValidationError::new("timestamp");
        err.message = Some("Timestamp is out of range".into());
        return Err(err);
    }
    Ok(())
}

fn validate_range_order(query: &GenerateDashboardQuery) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (query.range_start, query.range_end) {
        if start > end {
            let mut err = ValidationError::new("range_order");
            err.message = Some("rangeStart must not be after rangeEnd".into());
            return Err(err);
        }
    }
    Ok(())
}
