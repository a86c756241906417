//! Activity entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::ActivityRecord;
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Database row mapping for the activity table.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityEntity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

/// Database row mapping for the activity_tag table.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityTagEntity {
    pub activity_id: Uuid,
    pub tag_id: Uuid,
}

/// Database row mapping for the metric_value table.
#[derive(Debug, Clone, FromRow)]
pub struct MetricValueEntity {
    pub activity_id: Uuid,
    pub metric_id: Uuid,
    pub value: Decimal,
}

impl From<ActivityEntity> for ActivityRecord {
    fn from(entity: ActivityEntity) -> Self {
        Self {
            id: entity.id,
            creator_id: entity.creator_id,
            title: entity.title,
            start_time: entity.start_time,
            end_time: entity.end_time,
            comment: entity.comment,
            tags: HashSet::new(),
            metric_values: HashMap::new(),
        }
    }
}

/// Joins activity rows with their tag and metric rows, keeping row order.
///
/// Tag and metric rows for activities not in `activities` are ignored.
pub fn assemble_activities(
    activities: Vec<ActivityEntity>,
    tags: Vec<ActivityTagEntity>,
    metric_values: Vec<MetricValueEntity>,
) -> Vec<ActivityRecord> {
    let mut tags_by_activity: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for row in tags {
        tags_by_activity
            .entry(row.activity_id)
            .or_default()
            .insert(row.tag_id);
    }

    let mut metrics_by_activity: HashMap<Uuid, HashMap<Uuid, Decimal>> = HashMap::new();
    for row in metric_values {
        *metrics_by_activity
            .entry(row.activity_id)
            .or_default()
            .entry(row.metric_id)
            .or_default() += row.value;
    }

    activities
        .into_iter()
        .map(|entity| {
            let id = entity.id;
            let mut record = ActivityRecord::from(entity);
            record.tags = tags_by_activity.remove(&id).unwrap_or_default();
            record.metric_values = metrics_by_activity.remove(&id).unwrap_or_default();
            record
        })
        .collect()
}
