//! Dashboard generation engine.
//!
//! Generation runs in three steps:
//! 1. [`ActivityFinder`] pages through the data source and clips every
//!    activity to the criteria window.
//! 2. Each configured chart is handed to the [`ChartGenerator`] matching its
//!    grouping strategy.
//! 3. The generated charts are assembled, in stored order, into a
//!    [`GenerationResult`].

pub mod activity_finder;
pub mod chart_generator;
pub mod metric_chart;
pub mod percentage;
pub mod tag_chart;
pub mod time_chart;

pub use activity_finder::{ActivityFinder, DEFAULT_PAGE_SIZE};
pub use chart_generator::{ChartError, ChartGenerator, Deadline};
pub use metric_chart::MetricChartGenerator;
pub use percentage::PercentageCalculator;
pub use tag_chart::TagChartGenerator;
pub use time_chart::{TimeChartGenerator, TimePeriod, DEFAULT_MAX_PERIODS};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    ActivityRecord, ChartConfig, DashboardDefinition, GeneratedChart, GenerationCriteria,
    GenerationResult,
};
use crate::services::data_source::{ActivityDataSource, DataSourceError};

/// Failure of a whole generation run. No partial result is ever returned.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Activity data source failed: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("Dashboard generation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Chart '{chart}' would span more than {limit} periods")]
    TooManyPeriods { chart: String, limit: usize },

    #[error("Chart generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Turns a dashboard definition into chart data for one user and window.
#[derive(Clone)]
pub struct DashboardGenerationEngine {
    finder: ActivityFinder,
    calculator: PercentageCalculator,
    max_periods: usize,
}

impl DashboardGenerationEngine {
    pub fn new(
        data_source: Arc<dyn ActivityDataSource>,
        page_size: u32,
        calculator: PercentageCalculator,
    ) -> Self {
        Self {
            finder: ActivityFinder::new(data_source, page_size),
            calculator,
            max_periods: DEFAULT_MAX_PERIODS,
        }
    }

    /// Caps the number of periods a single time chart may span.
    pub fn with_max_periods(mut self, max_periods: usize) -> Self {
        self.max_periods = max_periods;
        self
    }

    pub fn calculator(&self) -> PercentageCalculator {
        self.calculator
    }

    /// Generates every chart of `dashboard` from one activity fetch.
    pub async fn generate_dashboard(
        &self,
        dashboard: &DashboardDefinition,
        criteria: &GenerationCriteria,
    ) -> Result<GenerationResult, GenerationError> {
        self.generate(dashboard, criteria, None).await
    }

    /// Like [`generate_dashboard`](Self::generate_dashboard), failing with
    /// [`GenerationError::DeadlineExceeded`] once `deadline` elapses.
    pub async fn generate_dashboard_within(
        &self,
        dashboard: &DashboardDefinition,
        criteria: &GenerationCriteria,
        deadline: Duration,
    ) -> Result<GenerationResult, GenerationError> {
        let result = tokio::time::timeout(deadline, self.generate(dashboard, criteria, Some(deadline)))
            .await
            .unwrap_or(Err(GenerationError::DeadlineExceeded(deadline)));

        if let Err(GenerationError::DeadlineExceeded(_)) = &result {
            warn!(
                dashboard_id = %dashboard.id,
                deadline_ms = deadline.as_millis() as u64,
                "Dashboard generation deadline exceeded"
            );
        }
        result
    }

    async fn generate(
        &self,
        dashboard: &DashboardDefinition,
        criteria: &GenerationCriteria,
        budget: Option<Duration>,
    ) -> Result<GenerationResult, GenerationError> {
        let started = Instant::now();
        let deadline = budget.map(Deadline::after).unwrap_or(Deadline::NONE);

        if dashboard.charts.is_empty() {
            debug!(dashboard_id = %dashboard.id, "Dashboard has no charts");
            return Ok(GenerationResult {
                name: dashboard.name.clone(),
                charts: Vec::new(),
            });
        }

        let activities = self.finder.find(criteria).await?;
        let activity_count = activities.len();

        // Chart building is CPU-bound; keep it off the async workers.
        let job = ChartJob {
            charts: dashboard.charts.clone(),
            range_start: criteria.time_range_start,
            range_end: criteria.time_range_end,
            calculator: self.calculator,
            max_periods: self.max_periods,
        };
        let charts = tokio::task::spawn_blocking(move || job.run(&activities, deadline))
            .await?
            .map_err(|err| match err {
                ChartError::DeadlineExceeded => {
                    GenerationError::DeadlineExceeded(budget.unwrap_or_default())
                }
                ChartError::TooManyPeriods { chart, limit } => {
                    GenerationError::TooManyPeriods { chart, limit }
                }
            })?;

        info!(
            dashboard_id = %dashboard.id,
            generator = %criteria.generator,
            charts = charts.len(),
            activities = activity_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dashboard generated"
        );

        Ok(GenerationResult {
            name: dashboard.name.clone(),
            charts,
        })
    }
}

/// Everything chart building needs, owned so it can leave the async task.
struct ChartJob {
    charts: Vec<ChartConfig>,
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
    calculator: PercentageCalculator,
    max_periods: usize,
}

impl ChartJob {
    /// Charts in stored order; the first failing chart fails the job.
    fn run(
        &self,
        activities: &[ActivityRecord],
        deadline: Deadline,
    ) -> Result<Vec<GeneratedChart>, ChartError> {
        self.charts
            .iter()
            .map(|chart| {
                let generated = ChartGenerator::for_chart(
                    chart,
                    self.range_start,
                    self.range_end,
                    self.calculator,
                    self.max_periods,
                )
                .generate(chart, activities, deadline)?;
                debug!(
                    chart = %chart.name,
                    group_by = %chart.group_by,
                    buckets = generated.buckets.len(),
                    "Chart generated"
                );
                Ok(generated)
            })
            .collect()
    }
}
