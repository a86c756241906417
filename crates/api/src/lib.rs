//! HTTP API of the activity tracker backend.
//!
//! Serves generated dashboard data on top of the domain generation engine
//! and the PostgreSQL repositories.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
