//! Activity repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::services::data_source::{
    ActivityDataSource, ActivityPage, ActivityPageQuery, DataSourceError,
};
use shared::pagination::{decode_page_id, encode_page_id};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::entities::{assemble_activities, ActivityEntity, ActivityTagEntity, MetricValueEntity};
use crate::metrics::QueryTimer;

/// Repository for activity-related database operations.
#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    /// Creates a new ActivityRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find activities visible to `requester` that overlap the window,
    /// ordered by ID and starting at `from_id` when given.
    ///
    /// An activity is visible when the requester created it or it carries a
    /// non-deleted tag shared with the requester.
    pub async fn find_visible(
        &self,
        requester: Uuid,
        range_start: Option<DateTime<Utc>>,
        range_end: Option<DateTime<Utc>>,
        from_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<ActivityEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_visible_activities");
        let result = sqlx::query_as::<_, ActivityEntity>(
            r#"
            SELECT a.id, a.creator_id, a.title, a.start_time, a.end_time, a.comment
            FROM activity a
            WHERE a.deleted = false
              AND (
                  a.creator_id = $1
                  OR EXISTS (
                      SELECT 1
                      FROM activity_tag at
                      JOIN tag t ON t.id = at.tag_id AND t.deleted = false
                      JOIN tag_share ts ON ts.tag_id = t.id
                      WHERE at.activity_id = a.id AND ts.grantee_id = $1
                  )
              )
              AND ($2::timestamptz IS NULL OR a.end_time IS NULL OR a.end_time >= $2)
              AND ($3::timestamptz IS NULL OR a.start_time IS NULL OR a.start_time <= $3)
              AND ($4::uuid IS NULL OR a.id >= $4)
            ORDER BY a.id ASC
            LIMIT $5
            "#,
        )
        .bind(requester)
        .bind(range_start)
        .bind(range_end)
        .bind(from_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find the non-deleted tags of the given activities.
    pub async fn find_tags(
        &self,
        activity_ids: &[Uuid],
    ) -> Result<Vec<ActivityTagEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_activity_tags");
        let result = sqlx::query_as::<_, ActivityTagEntity>(
            r#"
            SELECT at.activity_id, at.tag_id
            FROM activity_tag at
            JOIN tag t ON t.id = at.tag_id AND t.deleted = false
            WHERE at.activity_id = ANY($1)
            "#,
        )
        .bind(activity_ids)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find the metric values recorded on the given activities.
    pub async fn find_metric_values(
        &self,
        activity_ids: &[Uuid],
    ) -> Result<Vec<MetricValueEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_metric_values");
        let result = sqlx::query_as::<_, MetricValueEntity>(
            r#"
            SELECT activity_id, metric_id, value
            FROM metric_value
            WHERE activity_id = ANY($1)
            "#,
        )
        .bind(activity_ids)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}

/// Splits one over-fetched row set into the page and the ID the next page
/// starts at.
fn split_page(mut rows: Vec<ActivityEntity>, page_size: usize) -> (Vec<ActivityEntity>, Option<Uuid>) {
    if rows.len() > page_size {
        let next = rows.get(page_size).map(|row| row.id);
        rows.truncate(page_size);
        (rows, next)
    } else {
        (rows, None)
    }
}

fn query_error(err: sqlx::Error) -> DataSourceError {
    error!(error = %err, "Activity query failed");
    DataSourceError::Query(err.to_string())
}

#[async_trait]
impl ActivityDataSource for ActivityRepository {
    async fn find_activities(
        &self,
        query: &ActivityPageQuery,
    ) -> Result<ActivityPage, DataSourceError> {
        let from_id = match query.page_id.as_deref() {
            Some(token) => decode_page_id(token)
                .map_err(|e| DataSourceError::InvalidPageToken(e.to_string()))?,
            None => None,
        };
        let page_size = query.page_size.max(1) as usize;

        // One extra row tells whether another page follows.
        let rows = self
            .find_visible(
                query.requester,
                query.time_range_start,
                query.time_range_end,
                from_id,
                page_size as i64 + 1,
            )
            .await
            .map_err(query_error)?;
        let (rows, next_id) = split_page(rows, page_size);

        if rows.is_empty() {
            return Ok(ActivityPage {
                results: Vec::new(),
                next_page_id: None,
            });
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let tags = self.find_tags(&ids).await.map_err(query_error)?;
        let metric_values = self.find_metric_values(&ids).await.map_err(query_error)?;

        Ok(ActivityPage {
            results: assemble_activities(rows, tags, metric_values),
            next_page_id: next_id.map(encode_page_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(count: usize) -> Vec<ActivityEntity> {
        let mut ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
        ids.sort();
        ids.into_iter()
            .map(|id| ActivityEntity {
                id,
                creator_id: Uuid::new_v4(),
                title: None,
                start_time: None,
                end_time: None,
                comment: None,
            })
            .collect()
    }

    #[test]
    fn test_split_page_with_more_rows() {
        let fetched = rows(501);
        let expected_next = fetched[500].id;

        let (page, next) = split_page(fetched, 500);

        assert_eq!(page.len(), 500);
        assert_eq!(next, Some(expected_next));
    }

    #[test]
    fn test_split_page_last_page() {
        let (page, next) = split_page(rows(200), 500);
        assert_eq!(page.len(), 200);
        assert_eq!(next, None);
    }

    #[test]
    fn test_split_page_exactly_full() {
        let (page, next) = split_page(rows(500), 500);
        assert_eq!(page.len(), 500);
        assert_eq!(next, None);
    }

    #[test]
    fn test_query_error_maps_to_query_variant() {
        let err = query_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, DataSourceError::Query(_)));
    }
}
