//! Domain services for dashboard generation.
//!
//! Services contain the generation logic and the data-source seams it reads through.

pub mod data_source;
pub mod generation;

pub use data_source::{
    ActivityDataSource, ActivityPage, ActivityPageQuery, DashboardStore, DataSourceError,
    InMemoryActivityDataSource, InMemoryDashboardStore,
};

pub use generation::{
    ActivityFinder, ChartGenerator, DashboardGenerationEngine, GenerationError,
    PercentageCalculator, DEFAULT_MAX_PERIODS, DEFAULT_PAGE_SIZE,
};
