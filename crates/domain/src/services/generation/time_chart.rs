//! Time-period charts (day, week, month).
//!
//! The generation window is cut into consecutive UTC calendar periods. Each
//! period becomes a bucket carrying its range, the measured quantity within
//! it and, when the chart includes tags, per-tag sub-buckets.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;

use super::chart_generator::{in_tag_scope, measure, ChartError, Deadline};
use super::percentage::PercentageCalculator;
use super::tag_chart::TagChartGenerator;
use crate::models::{ActivityRecord, AnalysisMetric, Bucket, BucketType, ChartConfig, GeneratedChart};

/// Calendar period a time chart is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    Day,
    /// ISO week, starting on Monday.
    Week,
    Month,
}

impl TimePeriod {
    /// Start of the period containing `instant`.
    pub fn start_of(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let date = instant.date_naive();
        let first_day = match self {
            Self::Day => date,
            Self::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?,
        };
        Some(midnight(first_day))
    }

    /// Start of the period following the one starting at `period_start`.
    pub fn next(&self, period_start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => period_start.checked_add_signed(Duration::days(1)),
            Self::Week => period_start.checked_add_signed(Duration::weeks(1)),
            Self::Month => {
                let date = period_start.date_naive();
                let (year, month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1).map(midnight)
            }
        }
    }

    /// Human-readable identifier of the period starting at `period_start`.
    pub fn label(&self, period_start: DateTime<Utc>) -> String {
        match self {
            Self::Day => period_start.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let week = period_start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Month => period_start.format("%Y-%m").to_string(),
        }
    }

    pub fn bucket_type(&self) -> BucketType {
        match self {
            Self::Day => BucketType::Day,
            Self::Week => BucketType::Week,
            Self::Month => BucketType::Month,
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Periods a time chart may span unless configured otherwise.
pub const DEFAULT_MAX_PERIODS: usize = 1000;

/// One period of the window, clipped to the window bounds.
#[derive(Debug, Clone, Copy)]
struct Span {
    period: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Splits the generation window into periods and measures each of them.
#[derive(Debug, Clone)]
pub struct TimeChartGenerator {
    period: TimePeriod,
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
    calculator: PercentageCalculator,
    max_periods: usize,
}

impl TimeChartGenerator {
    pub fn new(
        period: TimePeriod,
        range_start: Option<DateTime<Utc>>,
        range_end: Option<DateTime<Utc>>,
        calculator: PercentageCalculator,
    ) -> Self {
        Self {
            period,
            range_start,
            range_end,
            calculator,
            max_periods: DEFAULT_MAX_PERIODS,
        }
    }

    pub fn with_max_periods(mut self, max_periods: usize) -> Self {
        self.max_periods = max_periods;
        self
    }

    pub fn generate(
        &self,
        chart: &ChartConfig,
        activities: &[ActivityRecord],
        deadline: Deadline,
    ) -> Result<GeneratedChart, ChartError> {
        Ok(GeneratedChart {
            name: chart.name.clone(),
            buckets: self.buckets(chart, activities, deadline)?,
        })
    }

    fn buckets(
        &self,
        chart: &ChartConfig,
        activities: &[ActivityRecord],
        deadline: Deadline,
    ) -> Result<Vec<Bucket>, ChartError> {
        let scoped: Vec<&ActivityRecord> = in_tag_scope(&chart.included_tags, activities).collect();

        // Open bounds fall back to the extent of the activities themselves.
        let start = self
            .range_start
            .or_else(|| scoped.iter().filter_map(|a| a.start_time).min());
        let end = self
            .range_end
            .or_else(|| scoped.iter().filter_map(|a| a.end_time).max());
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(Vec::new());
        };

        let spans = self.spans(&chart.name, start, end, deadline)?;
        let members = self.members(chart.analysis_metric, &scoped, &spans, deadline)?;

        let tag_buckets = TagChartGenerator::new(self.calculator);
        let measured: Vec<(Decimal, Vec<Bucket>)> = members
            .iter()
            .map(|group| {
                (
                    measure(chart.analysis_metric, group),
                    tag_buckets.buckets(&chart.included_tags, chart.analysis_metric, group),
                )
            })
            .collect();
        let total: Decimal = measured.iter().map(|(value, _)| *value).sum();

        Ok(spans
            .iter()
            .zip(measured)
            .map(|(span, (value, children))| Bucket {
                id: self.period.label(span.period),
                range_start: Some(span.start),
                range_end: Some(span.end),
                bucket_type: self.period.bucket_type(),
                value,
                percentage: self.calculator.percentage(value, total),
                buckets: children,
            })
            .collect())
    }

    /// Consecutive periods covering `[start, end)`, at most `max_periods`.
    fn spans(
        &self,
        chart: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        deadline: Deadline,
    ) -> Result<Vec<Span>, ChartError> {
        let mut spans = Vec::new();
        let mut period_start = self.period.start_of(start);

        while let Some(current) = period_start.filter(|p| *p < end) {
            if spans.len() == self.max_periods {
                return Err(ChartError::TooManyPeriods {
                    chart: chart.to_string(),
                    limit: self.max_periods,
                });
            }
            deadline.check()?;

            let Some(next) = self.period.next(current) else {
                break;
            };
            spans.push(Span {
                period: current,
                start: current.max(start),
                end: next.min(end),
            });
            period_start = Some(next);
        }
        Ok(spans)
    }

    /// Activities attributed to each span, in one pass over the activities.
    ///
    /// Durations are split across periods by clipping; metric values are
    /// attributed whole to the period in which the activity starts.
    fn members(
        &self,
        metric: AnalysisMetric,
        scoped: &[&ActivityRecord],
        spans: &[Span],
        deadline: Deadline,
    ) -> Result<Vec<Vec<ActivityRecord>>, ChartError> {
        let mut members: Vec<Vec<ActivityRecord>> = vec![Vec::new(); spans.len()];

        for activity in scoped {
            deadline.check()?;
            match metric {
                AnalysisMetric::TagPercentage => {
                    let (Some(activity_start), Some(activity_end)) =
                        (activity.start_time, activity.end_time)
                    else {
                        continue;
                    };
                    let first = spans.partition_point(|span| span.end <= activity_start);
                    for (index, span) in spans.iter().enumerate().skip(first) {
                        if span.start >= activity_end {
                            break;
                        }
                        members[index].push(activity.clipped_to(Some(span.start), Some(span.end)));
                    }
                }
                AnalysisMetric::MetricValue => {
                    if let Some(index) = activity.start_time.and_then(|s| starting_span(spans, s)) {
                        members[index].push((*activity).clone());
                    }
                }
            }
        }
        Ok(members)
    }
}

/// Index of the span an activity starting at `instant` belongs to.
///
/// The last span also owns the closing instant of the window, so activities
/// starting exactly at the window end are still counted.
fn starting_span(spans: &[Span], instant: DateTime<Utc>) -> Option<usize> {
    let index = spans.partition_point(|span| span.end <= instant);
    match spans.get(index) {
        Some(span) => (span.start <= instant).then_some(index),
        None => spans
            .last()
            .filter(|span| span.end == instant)
            .map(|_| spans.len() - 1),
    }
}
