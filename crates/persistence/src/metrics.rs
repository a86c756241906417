//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record connection pool gauges (active, idle, total).
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Number of rows a query produced.
pub trait RowCount {
    fn row_count(&self) -> usize;
}

impl<T> RowCount for Vec<T> {
    fn row_count(&self) -> usize {
        self.len()
    }
}

impl<T> RowCount for Option<T> {
    fn row_count(&self) -> usize {
        usize::from(self.is_some())
    }
}

/// Times one repository query and records its outcome.
///
/// ```ignore
/// let rows = QueryTimer::new("find_chart_tags")
///     .finish(sqlx::query_as::<_, ChartTagEntity>(SQL).fetch_all(&pool).await)?;
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Records duration, outcome and row count, then hands the result back.
    pub fn finish<T: RowCount>(self, result: Result<T, sqlx::Error>) -> Result<T, sqlx::Error> {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query_name,
            "outcome" => outcome
        )
        .record(self.start.elapsed().as_secs_f64());

        if let Ok(rows) = &result {
            counter!("database_query_rows_total", "query" => self.query_name)
                .increment(rows.row_count() as u64);
        }
        result
    }
}
