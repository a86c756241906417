//! Activity domain model.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// One logged time interval as seen by dashboard generation.
///
/// Either bound may be absent in storage (an activity that has not been
/// started or finished yet). Generation only measures activities whose
/// bounds are both resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub tags: HashSet<Uuid>,
    pub metric_values: HashMap<Uuid, Decimal>,
}

impl ActivityRecord {
    /// Returns a copy restricted to the given window.
    ///
    /// The effective start is the later of `range_start` and the activity
    /// start, the effective end the earlier of `range_end` and the activity
    /// end. An absent value on either side imposes no constraint.
    pub fn clipped_to(
        &self,
        range_start: Option<DateTime<Utc>>,
        range_end: Option<DateTime<Utc>>,
    ) -> ActivityRecord {
        ActivityRecord {
            start_time: latest_of(range_start, self.start_time),
            end_time: earliest_of(range_end, self.end_time),
            ..self.clone()
        }
    }

    /// Both bounds are known, so the activity can be measured.
    pub fn is_measurable(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Elapsed time between start and end, if both are resolved.
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    pub fn has_tag(&self, tag: &Uuid) -> bool {
        self.tags.contains(tag)
    }

    /// True when the activity carries at least one of `tags`.
    pub fn has_any_tag(&self, tags: &BTreeSet<Uuid>) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }

    /// Sum of every metric value recorded on the activity.
    pub fn metric_total(&self) -> Decimal {
        self.metric_values.values().copied().sum()
    }
}

/// Earliest of the present instants, or `None` if neither is present.
pub fn earliest_of(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Latest of the present instants, or `None` if neither is present.
pub fn latest_of(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, hour, 0, 0).unwrap()
    }

    fn activity(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> ActivityRecord {
        ActivityRecord {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: Some("Reading".to_string()),
            start_time: start,
            end_time: end,
            comment: None,
            tags: HashSet::new(),
            metric_values: HashMap::new(),
        }
    }

    #[test]
    fn test_clip_inside_window_is_unchanged() {
        let a = activity(Some(at(10)), Some(at(11)));
        let clipped = a.clipped_to(Some(at(8)), Some(at(18)));
        assert_eq!(clipped.start_time, Some(at(10)));
        assert_eq!(clipped.end_time, Some(at(11)));
    }

    #[test]
    fn test_clip_spanning_activity_to_window() {
        let a = activity(Some(at(6)), Some(at(20)));
        let clipped = a.clipped_to(Some(at(8)), Some(at(18)));
        assert_eq!(clipped.start_time, Some(at(8)));
        assert_eq!(clipped.end_time, Some(at(18)));
        assert_eq!(clipped.duration(), Some(Duration::hours(10)));
    }

    #[test]
    fn test_clip_open_window_keeps_activity_bounds() {
        let a = activity(Some(at(6)), Some(at(20)));
        let clipped = a.clipped_to(None, None);
        assert_eq!(clipped.start_time, Some(at(6)));
        assert_eq!(clipped.end_time, Some(at(20)));
    }

    #[test]
    fn test_clip_resolves_open_activity_against_window() {
        let a = activity(Some(at(9)), None);
        let clipped = a.clipped_to(None, Some(at(12)));
        assert!(clipped.is_measurable());
        assert_eq!(clipped.end_time, Some(at(12)));
    }

    #[test]
    fn test_unfinished_activity_without_window_end_is_not_measurable() {
        let a = activity(Some(at(9)), None);
        let clipped = a.clipped_to(Some(at(8)), None);
        assert!(!clipped.is_measurable());
        assert_eq!(clipped.duration(), None);
    }

    #[test]
    fn test_clip_keeps_tags_and_metrics() {
        let tag = Uuid::new_v4();
        let metric = Uuid::new_v4();
        let mut a = activity(Some(at(6)), Some(at(20)));
        a.tags.insert(tag);
        a.metric_values.insert(metric, Decimal::from(3));

        let clipped = a.clipped_to(Some(at(8)), Some(at(18)));
        assert!(clipped.has_tag(&tag));
        assert_eq!(clipped.metric_values.get(&metric), Some(&Decimal::from(3)));
        assert_eq!(clipped.id, a.id);
    }

    #[test]
    fn test_has_any_tag() {
        let tag = Uuid::new_v4();
        let mut a = activity(None, None);
        a.tags.insert(tag);

        assert!(a.has_any_tag(&BTreeSet::from([tag, Uuid::new_v4()])));
        assert!(!a.has_any_tag(&BTreeSet::from([Uuid::new_v4()])));
        assert!(!a.has_any_tag(&BTreeSet::new()));
    }

    #[test]
    fn test_metric_total() {
        let mut a = activity(None, None);
        a.metric_values.insert(Uuid::new_v4(), Decimal::new(15, 1));
        a.metric_values.insert(Uuid::new_v4(), Decimal::from(2));
        assert_eq!(a.metric_total(), Decimal::new(35, 1));
    }

    #[test]
    fn test_earliest_and_latest_of() {
        assert_eq!(earliest_of(Some(at(1)), Some(at(2))), Some(at(1)));
        assert_eq!(earliest_of(None, Some(at(2))), Some(at(2)));
        assert_eq!(latest_of(Some(at(1)), Some(at(2))), Some(at(2)));
        assert_eq!(latest_of(Some(at(1)), None), Some(at(1)));
        assert_eq!(latest_of(None, None), None);
    }
}
