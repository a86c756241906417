//! Chart generator selection and shared aggregation helpers.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::time::Instant;
use thiserror::Error;

use super::metric_chart::MetricChartGenerator;
use super::percentage::PercentageCalculator;
use super::tag_chart::TagChartGenerator;
use super::time_chart::{TimeChartGenerator, TimePeriod};
use crate::models::{ActivityRecord, AnalysisMetric, ChartConfig, GeneratedChart, GroupBy};

/// Why a single chart could not be generated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("Chart '{chart}' spans more than {limit} periods")]
    TooManyPeriods { chart: String, limit: usize },

    #[error("Chart generation ran past its deadline")]
    DeadlineExceeded,
}

/// Instant by which chart generation has to finish.
///
/// Generators check it between units of work; an elapsed deadline aborts the
/// chart instead of finishing it late.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub const NONE: Self = Self(None);

    pub fn after(budget: std::time::Duration) -> Self {
        Self(Instant::now().checked_add(budget))
    }

    pub fn check(&self) -> Result<(), ChartError> {
        match self.0 {
            Some(at) if Instant::now() >= at => Err(ChartError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Closed set of chart generators, one per grouping strategy.
#[derive(Debug, Clone)]
pub enum ChartGenerator {
    Tag(TagChartGenerator),
    Metric(MetricChartGenerator),
    Time(TimeChartGenerator),
}

impl ChartGenerator {
    /// Selects the generator for a chart's grouping strategy.
    ///
    /// The window bounds are those of the generation criteria; time charts
    /// split them into at most `max_periods` periods.
    pub fn for_chart(
        chart: &ChartConfig,
        range_start: Option<DateTime<Utc>>,
        range_end: Option<DateTime<Utc>>,
        calculator: PercentageCalculator,
        max_periods: usize,
    ) -> Self {
        let period = match chart.group_by {
            GroupBy::Tag => return Self::Tag(TagChartGenerator::new(calculator)),
            GroupBy::Metric => return Self::Metric(MetricChartGenerator::new(calculator)),
            GroupBy::Day => TimePeriod::Day,
            GroupBy::Week => TimePeriod::Week,
            GroupBy::Month => TimePeriod::Month,
        };
        Self::Time(
            TimeChartGenerator::new(period, range_start, range_end, calculator)
                .with_max_periods(max_periods),
        )
    }

    pub fn generate(
        &self,
        chart: &ChartConfig,
        activities: &[ActivityRecord],
        deadline: Deadline,
    ) -> Result<GeneratedChart, ChartError> {
        deadline.check()?;
        match self {
            Self::Tag(generator) => Ok(generator.generate(chart, activities)),
            Self::Metric(generator) => Ok(generator.generate(chart, activities)),
            Self::Time(generator) => generator.generate(chart, activities, deadline),
        }
    }
}

/// Summed elapsed time of the measurable activities.
pub(crate) fn total_duration<'a>(activities: impl IntoIterator<Item = &'a ActivityRecord>) -> Duration {
    activities
        .into_iter()
        .filter_map(ActivityRecord::duration)
        .fold(Duration::zero(), |total, d| total + d)
}

/// Duration in whole seconds, sub-second remainder truncated.
pub(crate) fn whole_seconds(duration: Duration) -> Decimal {
    Decimal::from(duration.num_seconds())
}

/// The quantity a chart aggregates over a group of activities.
pub(crate) fn measure<'a>(
    metric: AnalysisMetric,
    activities: impl IntoIterator<Item = &'a ActivityRecord>,
) -> Decimal {
    match metric {
        AnalysisMetric::TagPercentage => whole_seconds(total_duration(activities)),
        AnalysisMetric::MetricValue => activities.into_iter().map(ActivityRecord::metric_total).sum(),
    }
}

/// Activities within the chart's tag scope; a chart without tags keeps all.
pub(crate) fn in_tag_scope<'a>(
    tags: &'a BTreeSet<uuid::Uuid>,
    activities: &'a [ActivityRecord],
) -> impl Iterator<Item = &'a ActivityRecord> + 'a {
    activities
        .iter()
        .filter(move |a| tags.is_empty() || a.has_any_tag(tags))
}
