//! Dashboard data endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::{GenerateDashboardQuery, GenerationCriteria, GenerationResult};
use domain::services::GenerationError;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Actor;
use crate::middleware::record_dashboard_generation;

/// Generate the chart data of a dashboard.
///
/// GET /api/dashboard/:dashboard_id/data?rangeStart=&rangeEnd=&requiredTags=
///
/// The dashboard must be owned by or shared with the requesting user;
/// otherwise it is reported as not found.
pub async fn get_dashboard_data(
    State(state): State<AppState>,
    actor: Actor,
    Path(dashboard_id): Path<Uuid>,
    Query(query): Query<GenerateDashboardQuery>,
) -> Result<Json<GenerationResult>, ApiError> {
    query.validate()?;
    let required_tags = query.required_tag_ids().map_err(|_| {
        ApiError::Validation("requiredTags must be a comma-separated list of UUIDs".to_string())
    })?;

    let dashboard = state
        .dashboards
        .find_dashboard(dashboard_id, actor.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dashboard not found".to_string()))?;

    let criteria = GenerationCriteria::new(
        dashboard_id,
        actor.user_id,
        query.range_start(),
        query.range_end(),
    )
    .with_required_tags(required_tags);

    let started = Instant::now();
    let result = state
        .engine
        .generate_dashboard_within(&dashboard, &criteria, state.config.generation.deadline())
        .await;
    let outcome = match &result {
        Ok(_) => "success",
        Err(GenerationError::DataSource(_)) => "data_source_error",
        Err(GenerationError::DeadlineExceeded(_)) => "deadline_exceeded",
        Err(GenerationError::TooManyPeriods { .. }) => "too_many_periods",
        Err(GenerationError::Task(_)) => "task_failed",
    };
    record_dashboard_generation(outcome, started.elapsed().as_secs_f64());

    let generated = result?;

    info!(
        dashboard_id = %dashboard_id,
        user_id = %actor.user_id,
        charts = generated.charts.len(),
        "Dashboard data served"
    );

    Ok(Json(generated))
}
