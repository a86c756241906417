//! Dashboard definition models.
//!
//! A dashboard is configured elsewhere; generation only reads its name and
//! the ordered list of charts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Grouping strategy of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupBy {
    /// One bucket per configured tag. Stored as `SELF` by older dashboards.
    #[serde(alias = "SELF")]
    Tag,
    /// One bucket per observed metric.
    Metric,
    Day,
    Week,
    Month,
}

impl std::fmt::Display for GroupBy {
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

impl FromStr for GroupBy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TAG" | "SELF" => Ok(Self::Tag),
            "METRIC" => Ok(Self::Metric),
            "DAY" => Ok(Self::Day),
            "WEEK" => Ok(Self::Week),
            "MONTH" => Ok(Self::Month),
            _ => Err(UnknownVariant::GroupBy(s.to_string())),
        }
    }
}

/// Quantity aggregated by a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisMetric {
    /// Share of elapsed duration.
    TagPercentage,
    /// Sum of numeric metric values.
    ///
    /// Charts carry no metric id, so every metric recorded on an activity is
    /// added into one number regardless of unit. Metric-grouped charts keep
    /// them apart; tag and time charts do not.
    MetricValue,
}

impl std::fmt::Display for AnalysisMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TagPercentage => write!(f, "TAG_PERCENTAGE"),
            Self::MetricValue => write!(f, "METRIC_VALUE"),
        }
    }
}

impl FromStr for AnalysisMetric {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TAG_PERCENTAGE" => Ok(Self::TagPercentage),
            "METRIC_VALUE" => Ok(Self::MetricValue),
            _ => Err(UnknownVariant::AnalysisMetric(s.to_string())),
        }
    }
}

/// Error returned when a stored enum name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnknownVariant {
    #[error("Unknown chart grouping: {0}")]
    GroupBy(String),
    #[error("Unknown analysis metric: {0}")]
    AnalysisMetric(String),
}

/// A configured chart within a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub id: Uuid,
    pub name: String,
    pub group_by: GroupBy,
    pub analysis_metric: AnalysisMetric,
    /// Tags the chart is scoped to, kept ordered so output is deterministic.
    pub included_tags: BTreeSet<Uuid>,
}

impl ChartConfig {
    pub fn new(
        name: impl Into<String>,
        group_by: GroupBy,
        analysis_metric: AnalysisMetric,
        included_tags: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            group_by,
            analysis_metric,
            included_tags: included_tags.into_iter().collect(),
        }
    }
}

/// Dashboard name and its charts in stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDefinition {
    pub id: Uuid,
    pub name: String,
    pub charts: Vec<ChartConfig>,
}
