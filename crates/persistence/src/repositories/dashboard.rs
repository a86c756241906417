//! Dashboard definition repository for database operations.

use async_trait::async_trait;
use domain::models::DashboardDefinition;
use domain::services::data_source::{DashboardStore, DataSourceError};
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use crate::entities::{assemble_dashboard, ChartEntity, ChartTagEntity, DashboardEntity};
use crate::metrics::QueryTimer;

/// Repository for dashboard definitions and their charts.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a dashboard the requester owns or has been granted.
    pub async fn find_accessible(
        &self,
        dashboard_id: Uuid,
        requester: Uuid,
    ) -> Result<Option<DashboardEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_accessible_dashboard");
        let result = sqlx::query_as::<_, DashboardEntity>(
            r#"
            SELECT d.id, d.creator_id, d.name
            FROM dashboard d
            WHERE d.id = $1
              AND d.deleted = false
              AND (
                  d.creator_id = $2
                  OR EXISTS (
                      SELECT 1 FROM dashboard_share s
                      WHERE s.dashboard_id = d.id AND s.grantee_id = $2
                  )
              )
            "#,
        )
        .bind(dashboard_id)
        .bind(requester)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find the charts of a dashboard in display order.
    pub async fn find_charts(&self, dashboard_id: Uuid) -> Result<Vec<ChartEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_dashboard_charts");
        let result = sqlx::query_as::<_, ChartEntity>(
            r#"
            SELECT id, dashboard_id, name, group_by, analysis_metric, position
            FROM chart
            WHERE dashboard_id = $1 AND deleted = false
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(dashboard_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find the non-deleted tags charts are scoped to.
    pub async fn find_chart_tags(
        &self,
        chart_ids: &[Uuid],
    ) -> Result<Vec<ChartTagEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_chart_tags");
        let result = sqlx::query_as::<_, ChartTagEntity>(
            r#"
            SELECT ct.chart_id, ct.tag_id
            FROM chart_tag ct
            JOIN tag t ON t.id = ct.tag_id AND t.deleted = false
            WHERE ct.chart_id = ANY($1)
            "#,
        )
        .bind(chart_ids)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}

fn query_error(err: sqlx::Error) -> DataSourceError {
    error!(error = %err, "Dashboard query failed");
    DataSourceError::Query(err.to_string())
}

#[async_trait]
impl DashboardStore for DashboardRepository {
    async fn find_dashboard(
        &self,
        dashboard_id: Uuid,
        requester: Uuid,
    ) -> Result<Option<DashboardDefinition>, DataSourceError> {
        let Some(dashboard) = self
            .find_accessible(dashboard_id, requester)
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        let charts = self.find_charts(dashboard_id).await.map_err(query_error)?;
        let chart_ids: Vec<Uuid> = charts.iter().map(|chart| chart.id).collect();
        let chart_tags = if chart_ids.is_empty() {
            Vec::new()
        } else {
            self.find_chart_tags(&chart_ids).await.map_err(query_error)?
        };

        assemble_dashboard(dashboard, charts, chart_tags)
            .map(Some)
            .map_err(|e| {
                warn!(dashboard_id = %dashboard_id, error = %e, "Stored chart is not readable");
                DataSourceError::InvalidData(e.to_string())
            })
    }
}
