//! Domain models for activity dashboards.

pub mod activity;
pub mod dashboard;
pub mod generation;

pub use activity::{earliest_of, latest_of, ActivityRecord};
pub use dashboard::{AnalysisMetric, ChartConfig, DashboardDefinition, GroupBy, UnknownVariant};
pub use generation::{
    Bucket, BucketType, GenerateDashboardQuery, GeneratedChart, GenerationCriteria,
    GenerationResult,
};
