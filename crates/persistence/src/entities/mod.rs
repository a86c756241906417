//! Database entity definitions.

pub mod activity;
pub mod dashboard;

pub use activity::{assemble_activities, ActivityEntity, ActivityTagEntity, MetricValueEntity};
pub use dashboard::{assemble_dashboard, ChartEntity, ChartTagEntity, DashboardEntity};
