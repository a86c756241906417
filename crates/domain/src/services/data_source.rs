//! Data sources consumed by dashboard generation.
//!
//! Provides the activity source and dashboard store abstractions, plus
//! in-memory implementations used by tests and local tooling.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ActivityRecord, DashboardDefinition};

/// Error raised by a data source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Access-scoped time window request for one page of activities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPageQuery {
    /// Only activities visible to this user are returned.
    pub requester: Uuid,
    pub time_range_start: Option<DateTime<Utc>>,
    pub time_range_end: Option<DateTime<Utc>>,
    pub page_size: u32,
    /// Token returned by the previous page; `None` or empty for the first page.
    pub page_id: Option<String>,
}

/// One page of activities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityPage {
    pub results: Vec<ActivityRecord>,
    /// Token of the next page, `None` when this was the last one.
    pub next_page_id: Option<String>,
}

/// Source of activities visible to a user.
#[async_trait::async_trait]
pub trait ActivityDataSource: Send + Sync {
    /// Fetch one page of activities overlapping the query window.
    async fn find_activities(&self, query: &ActivityPageQuery)
        -> Result<ActivityPage, DataSourceError>;
}

/// Store of dashboard definitions.
#[async_trait::async_trait]
pub trait DashboardStore: Send + Sync {
    /// Find a dashboard the requester may read.
    async fn find_dashboard(
        &self,
        dashboard_id: Uuid,
        requester: Uuid,
    ) -> Result<Option<DashboardDefinition>, DataSourceError>;
}

/// In-memory activity source paging over a fixed list.
///
/// Activities are visible to their creator only. Page tokens are offsets.
#[derive(Debug, Default)]
pub struct InMemoryActivityDataSource {
    activities: Vec<ActivityRecord>,
    /// Fail when this (zero-based) page is requested.
    fail_on_page: Option<usize>,
    /// Sleep before answering each page.
    latency: Option<std::time::Duration>,
    requests: AtomicUsize,
}

impl InMemoryActivityDataSource {
    pub fn new(activities: Vec<ActivityRecord>) -> Self {
        Self {
            activities,
            ..Default::default()
        }
    }

    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of pages requested so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn overlaps(activity: &ActivityRecord, query: &ActivityPageQuery) -> bool {
        let ends_after_start = match (query.time_range_start, activity.end_time) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        };
        let starts_before_end = match (query.time_range_end, activity.start_time) {
            (Some(end), Some(start)) => start <= end,
            _ => true,
        };
        ends_after_start && starts_before_end
    }
}

#[async_trait::async_trait]
impl ActivityDataSource for InMemoryActivityDataSource {
    async fn find_activities(
        &self,
        query: &ActivityPageQuery,
    ) -> Result<ActivityPage, DataSourceError> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.fail_on_page == Some(request) {
            tracing::warn!(page = request, "In-memory source simulating failure");
            return Err(DataSourceError::Query("Simulated failure".to_string()));
        }

        let offset = match query.page_id.as_deref() {
            None | Some("") => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| DataSourceError::InvalidPageToken(token.to_string()))?,
        };

        let visible: Vec<&ActivityRecord> = self
            .activities
            .iter()
            .filter(|a| a.creator_id == query.requester && Self::overlaps(a, query))
            .collect();

        let page_size = query.page_size as usize;
        let results: Vec<ActivityRecord> = visible
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|a| (*a).clone())
            .collect();

        let next = offset + page_size;
        let next_page_id = (next < visible.len()).then(|| next.to_string());

        Ok(ActivityPage {
            results,
            next_page_id,
        })
    }
}

/// In-memory dashboard store keyed by dashboard ID.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDashboardStore {
    dashboards: HashMap<Uuid, (Uuid, Arc<DashboardDefinition>)>,
}

impl InMemoryDashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a dashboard readable by `owner`.
    pub fn with_dashboard(mut self, owner: Uuid, dashboard: DashboardDefinition) -> Self {
        self.dashboards
            .insert(dashboard.id, (owner, Arc::new(dashboard)));
        self
    }
}

#[async_trait::async_trait]
impl DashboardStore for InMemoryDashboardStore {
    async fn find_dashboard(
        &self,
        dashboard_id: Uuid,
        requester: Uuid,
    ) -> Result<Option<DashboardDefinition>, DataSourceError> {
        Ok(self
            .dashboards
            .get(&dashboard_id)
            .filter(|(owner, _)| *owner == requester)
            .map(|(_, dashboard)| dashboard.as_ref().clone()))
    }
}
