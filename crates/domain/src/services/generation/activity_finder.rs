//! Paginated retrieval of the activities a dashboard is generated from.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{ActivityRecord, GenerationCriteria};
use crate::services::data_source::{ActivityDataSource, ActivityPageQuery, DataSourceError};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Fetches every activity visible to the generating user within the
/// criteria window, clipped to that window.
#[derive(Clone)]
pub struct ActivityFinder {
    data_source: Arc<dyn ActivityDataSource>,
    page_size: u32,
}

impl ActivityFinder {
    pub fn new(data_source: Arc<dyn ActivityDataSource>, page_size: u32) -> Self {
        Self {
            data_source,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Pages through the source until it stops returning a page token.
    ///
    /// Activities that cannot be clipped to a concrete interval, or that do
    /// not carry any of the criteria's required tags, are dropped. Any page
    /// failure fails the whole lookup.
    pub async fn find(
        &self,
        criteria: &GenerationCriteria,
    ) -> Result<Vec<ActivityRecord>, DataSourceError> {
        let mut activities = Vec::new();
        let mut page_id: Option<String> = None;
        let mut pages = 0usize;
        let mut excluded = 0usize;

        loop {
            let query = ActivityPageQuery {
                requester: criteria.generator,
                time_range_start: criteria.time_range_start,
                time_range_end: criteria.time_range_end,
                page_size: self.page_size,
                page_id: page_id.take(),
            };
            let page = self.data_source.find_activities(&query).await?;
            pages += 1;

            let fetched = page.results.len();
            let before = activities.len();
            activities.extend(
                page.results
                    .iter()
                    .map(|a| a.clipped_to(criteria.time_range_start, criteria.time_range_end))
                    .filter(|a| a.is_measurable())
                    .filter(|a| criteria.required_tags.is_empty() || a.has_any_tag(&criteria.required_tags)),
            );
            excluded += fetched - (activities.len() - before);

            debug!(page = pages, fetched, "Fetched activity page");

            match page.next_page_id {
                Some(next) if !next.is_empty() => page_id = Some(next),
                _ => break,
            }
        }

        if excluded > 0 {
            warn!(
                generator = %criteria.generator,
                excluded,
                "Activities without a resolvable interval or required tag were skipped"
            );
        }

        debug!(
            generator = %criteria.generator,
            pages,
            activities = activities.len(),
            "Activities collected for generation"
        );

        Ok(activities)
    }
}
