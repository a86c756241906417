//! Metric-grouped charts.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::chart_generator::in_tag_scope;
use super::percentage::PercentageCalculator;
use crate::models::{ActivityRecord, Bucket, BucketType, ChartConfig, GeneratedChart};

/// Emits one bucket per metric observed on the chart's activities, valued
/// at the sum of that metric's values.
#[derive(Debug, Clone)]
pub struct MetricChartGenerator {
    calculator: PercentageCalculator,
}

impl MetricChartGenerator {
    pub fn new(calculator: PercentageCalculator) -> Self {
        Self { calculator }
    }

    pub fn generate(&self, chart: &ChartConfig, activities: &[ActivityRecord]) -> GeneratedChart {
        let mut sums: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        for activity in in_tag_scope(&chart.included_tags, activities) {
            for (metric, value) in &activity.metric_values {
                *sums.entry(*metric).or_default() += *value;
            }
        }

        let total: Decimal = sums.values().copied().sum();

        let buckets = sums
            .into_iter()
            .map(|(metric, value)| {
                Bucket::leaf(
                    metric.to_string(),
                    BucketType::Metric,
                    value,
                    self.calculator.percentage(value, total),
                )
            })
            .collect();

        GeneratedChart {
            name: chart.name.clone(),
            buckets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisMetric, GroupBy};
    use std::collections::{HashMap, HashSet};

    fn activity(tags: &[Uuid], metrics: &[(Uuid, Decimal)]) -> ActivityRecord {
        ActivityRecord {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: None,
            start_time: None,
            end_time: None,
            comment: None,
            tags: tags.iter().copied().collect::<HashSet<_>>(),
            metric_values: metrics.iter().copied().collect::<HashMap<_, _>>(),
        }
    }

    fn chart(tags: &[Uuid]) -> ChartConfig {
        ChartConfig::new("Distance", GroupBy::Metric, AnalysisMetric::MetricValue, tags.iter().copied())
    }

    #[test]
    fn test_sums_values_per_metric() {
        let km = Uuid::from_u128(1);
        let kcal = Uuid::from_u128(2);
        let activities = vec![
            activity(&[], &[(km, Decimal::from(5)), (kcal, Decimal::from(300))]),
            activity(&[], &[(km, Decimal::new(25, 1))]),
        ];
        let generator = MetricChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(&chart(&[]), &activities);

        assert_eq!(generated.buckets.len(), 2);
        assert_eq!(generated.buckets[0].id, km.to_string());
        assert_eq!(generated.buckets[0].value, Decimal::new(75, 1));
        assert_eq!(generated.buckets[0].bucket_type, BucketType::Metric);
        assert_eq!(generated.buckets[1].value, Decimal::from(300));
        // 7.5 / 307.5 -> 2.44 %
        assert_eq!(generated.buckets[0].percentage, Decimal::new(244, 2));
    }

    #[test]
    fn test_restricts_to_chart_tags() {
        let run = Uuid::new_v4();
        let km = Uuid::new_v4();
        let activities = vec![
            activity(&[run], &[(km, Decimal::from(5))]),
            activity(&[Uuid::new_v4()], &[(km, Decimal::from(100))]),
        ];
        let generator = MetricChartGenerator::new(PercentageCalculator::default());

        let generated = generator.generate(&chart(&[run]), &activities);

        assert_eq!(generated.buckets.len(), 1);
        assert_eq!(generated.buckets[0].value, Decimal::from(5));
        assert_eq!(generated.buckets[0].percentage, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_no_activities_gives_empty_chart() {
        let generator = MetricChartGenerator::new(PercentageCalculator::default());
        let generated = generator.generate(&chart(&[]), &[]);
        assert_eq!(generated.name, "Distance");
        assert!(generated.buckets.is_empty());
    }
}
