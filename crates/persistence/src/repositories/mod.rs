//! Repository implementations for database operations.

pub mod activity;
pub mod dashboard;

pub use activity::ActivityRepository;
pub use dashboard::DashboardRepository;
