//! Tag-grouped charts.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::chart_generator::measure;
use super::percentage::PercentageCalculator;
use crate::models::{ActivityRecord, AnalysisMetric, Bucket, BucketType, ChartConfig, GeneratedChart};

/// Emits one bucket per configured tag.
///
/// Each tag is measured over the activities carrying it, and its share is
/// taken against the sum of all per-tag measures. An activity with several
/// included tags counts towards each of them, so shares only sum to 100
/// when no activity carries more than one included tag.
#[derive(Debug, Clone)]
pub struct TagChartGenerator {
    calculator: PercentageCalculator,
}

impl TagChartGenerator {
    pub fn new(calculator: PercentageCalculator) -> Self {
        Self { calculator }
    }

    pub fn generate(&self, chart: &ChartConfig, activities: &[ActivityRecord]) -> GeneratedChart {
        GeneratedChart {
            name: chart.name.clone(),
            buckets: self.buckets(&chart.included_tags, chart.analysis_metric, activities),
        }
    }

    /// Tag buckets in tag order, including tags no activity carries.
    pub(crate) fn buckets(
        &self,
        tags: &BTreeSet<Uuid>,
        metric: AnalysisMetric,
        activities: &[ActivityRecord],
    ) -> Vec<Bucket> {
        let measured: Vec<(Uuid, Decimal)> = tags
            .iter()
            .map(|tag| {
                let with_tag = activities.iter().filter(|a| a.has_tag(tag));
                (*tag, measure(metric, with_tag))
            })
            .collect();

        let total: Decimal = measured.iter().map(|(_, value)| *value).sum();

        measured
            .into_iter()
            .map(|(tag, value)| {
                let percentage = self.calculator.percentage(value, total);
                let value = match metric {
                    AnalysisMetric::TagPercentage => percentage,
                    AnalysisMetric::MetricValue => value,
                };
                Bucket::leaf(tag.to_string(), BucketType::Tag, value, percentage)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupBy;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::{HashMap, HashSet};

    fn activity(seconds: i64, tags: &[Uuid]) -> ActivityRecord {
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        ActivityRecord {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: None,
            start_time: Some(start),
            end_time: Some(start + Duration::seconds(seconds)),
            comment: None,
            tags: tags.iter().copied().collect::<HashSet<_>>(),
            metric_values: HashMap::new(),
        }
    }

    fn chart(metric: AnalysisMetric, tags: &[Uuid]) -> ChartConfig {
        ChartConfig::new("By Project", GroupBy::Tag, metric, tags.iter().copied())
    }

    fn bucket_for<'a>(buckets: &'a [Bucket], tag: &Uuid) -> &'a Bucket {
        buckets
            .iter()
            .find(|b| b.id == tag.to_string())
            .expect("bucket for tag")
    }

    #[test]
    fn test_multi_tag_activity_counts_for_each_tag() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let activities = vec![
            activity(3600, &[t1]),
            activity(1800, &[t2]),
            activity(1800, &[t1, t2]),
        ];
        let generator = TagChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(&chart(AnalysisMetric::TagPercentage, &[t1, t2]), &activities);

        // T1 = 5400s, T2 = 3600s, total 9000s
        assert_eq!(generated.buckets.len(), 2);
        let b1 = bucket_for(&generated.buckets, &t1);
        let b2 = bucket_for(&generated.buckets, &t2);
        assert_eq!(b1.percentage, Decimal::from(60));
        assert_eq!(b1.value, Decimal::from(60));
        assert_eq!(b2.percentage, Decimal::from(40));
        assert_eq!(b2.value, Decimal::from(40));
        assert_eq!(b1.bucket_type, BucketType::Tag);
        assert!(b1.buckets.is_empty());
        assert!(b1.range_start.is_none());
    }

    #[test]
    fn test_disjoint_tags_sum_to_one_hundred() {
        let tags: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let activities = vec![
            activity(100, &[tags[0]]),
            activity(200, &[tags[1]]),
            activity(400, &[tags[2]]),
        ];
        let generator = TagChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(&chart(AnalysisMetric::TagPercentage, &tags), &activities);
        let sum: Decimal = generated.buckets.iter().map(|b| b.percentage).sum();

        assert!((sum - Decimal::ONE_HUNDRED).abs() <= Decimal::new(1, 1));
    }

    #[test]
    fn test_tag_without_activities_gets_zero_bucket() {
        let t3 = Uuid::new_v4();
        let generator = TagChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(
            &chart(AnalysisMetric::TagPercentage, &[t3]),
            &[activity(600, &[Uuid::new_v4()])],
        );

        assert_eq!(generated.buckets.len(), 1);
        assert_eq!(generated.buckets[0].id, t3.to_string());
        assert_eq!(generated.buckets[0].value, Decimal::ZERO);
        assert_eq!(generated.buckets[0].percentage, Decimal::ZERO);
    }

    #[test]
    fn test_zero_total_gives_zero_percentages() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let generator = TagChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(&chart(AnalysisMetric::TagPercentage, &[t1, t2]), &[]);

        assert_eq!(generated.buckets.len(), 2);
        assert!(generated.buckets.iter().all(|b| b.percentage.is_zero()));
    }

    #[test]
    fn test_no_configured_tags_gives_empty_chart() {
        let generator = TagChartGenerator::new(PercentageCalculator::default());
        let generated = generator.generate(
            &chart(AnalysisMetric::TagPercentage, &[]),
            &[activity(600, &[Uuid::new_v4()])],
        );
        assert!(generated.buckets.is_empty());
    }

    #[test]
    fn test_buckets_follow_tag_order() {
        let tags = [Uuid::from_u128(3), Uuid::from_u128(1), Uuid::from_u128(2)];
        let generator = TagChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(&chart(AnalysisMetric::TagPercentage, &tags), &[]);
        let ids: Vec<_> = generated.buckets.iter().map(|b| b.id.clone()).collect();

        assert_eq!(
            ids,
            vec![
                Uuid::from_u128(1).to_string(),
                Uuid::from_u128(2).to_string(),
                Uuid::from_u128(3).to_string(),
            ]
        );
    }

    #[test]
    fn test_metric_value_keeps_raw_sum_as_value() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let mut a = activity(60, &[t1]);
        a.metric_values.insert(Uuid::new_v4(), Decimal::from(30));
        let mut b = activity(60, &[t2]);
        b.metric_values.insert(Uuid::new_v4(), Decimal::from(10));
        let generator = TagChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(&chart(AnalysisMetric::MetricValue, &[t1, t2]), &[a, b]);

        let b1 = bucket_for(&generated.buckets, &t1);
        assert_eq!(b1.value, Decimal::from(30));
        assert_eq!(b1.percentage, Decimal::from(75));
        let b2 = bucket_for(&generated.buckets, &t2);
        assert_eq!(b2.value, Decimal::from(10));
        assert_eq!(b2.percentage, Decimal::from(25));
    }
}
