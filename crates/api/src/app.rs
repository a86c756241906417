use axum::{middleware, routing::get, Router};
use domain::services::{
    ActivityDataSource, DashboardGenerationEngine, DashboardStore, PercentageCalculator,
};
use persistence::repositories::{ActivityRepository, DashboardRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{dashboard, health};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub dashboards: Arc<dyn DashboardStore>,
    pub engine: Arc<DashboardGenerationEngine>,
}

impl AppState {
    /// State reading dashboards and activities from PostgreSQL.
    pub fn new(config: Config, pool: PgPool) -> Self {
        let activities: Arc<dyn ActivityDataSource> = Arc::new(ActivityRepository::new(pool.clone()));
        let dashboards: Arc<dyn DashboardStore> = Arc::new(DashboardRepository::new(pool.clone()));
        Self::with_sources(config, pool, dashboards, activities)
    }

    /// State over arbitrary data sources, configured from `config.generation`.
    pub fn with_sources(
        config: Config,
        pool: PgPool,
        dashboards: Arc<dyn DashboardStore>,
        activities: Arc<dyn ActivityDataSource>,
    ) -> Self {
        let engine = DashboardGenerationEngine::new(
            activities,
            config.generation.page_size,
            PercentageCalculator::new(config.generation.percentage_scale),
        )
        .with_max_periods(config.generation.max_periods);

        Self {
            pool,
            config: Arc::new(config),
            dashboards,
            engine: Arc::new(engine),
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    create_app_with_state(AppState::new(config, pool))
}

pub fn create_app_with_state(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Identity comes from the X-User-Id header set by the gateway
    let dashboard_routes = Router::new().route(
        "/api/dashboard/:dashboard_id/data",
        get(dashboard::get_dashboard_data),
    );

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(dashboard_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
