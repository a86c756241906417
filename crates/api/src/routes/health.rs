//! Health and probe endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
    pub generation: GenerationSettings,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: u64,
    pub pool_size: u32,
}

/// Effective generation limits, so operators can see what a node runs with.
#[derive(Debug, Serialize)]
pub struct GenerationSettings {
    pub page_size: u32,
    pub timeout_secs: u64,
    pub percentage_scale: u32,
    pub max_periods: usize,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub status: &'static str,
}

async fn ping(state: &AppState) -> bool {
    sqlx::query("SELECT 1").execute(&state.pool).await.is_ok()
}

/// GET /api/health
///
/// 503 while the database cannot be reached, since no dashboard could be
/// generated from it.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let started = Instant::now();
    if !ping(&state).await {
        tracing::warn!("Health check failed: database unreachable");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let generation = &state.config.generation;
    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            connected: true,
            latency_ms: started.elapsed().as_millis() as u64,
            pool_size: state.pool.size(),
        },
        generation: GenerationSettings {
            page_size: generation.page_size,
            timeout_secs: generation.timeout_secs,
            percentage_scale: generation.percentage_scale,
            max_periods: generation.max_periods,
        },
    }))
}

/// GET /api/health/live
pub async fn live() -> Json<ProbeResponse> {
    Json(ProbeResponse { status: "alive" })
}

/// GET /api/health/ready
pub async fn ready(State(state): State<AppState>) -> Result<Json<ProbeResponse>, StatusCode> {
    if ping(&state).await {
        Ok(Json(ProbeResponse { status: "ready" }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
