//! Domain layer for the activity tracker backend.
//!
//! This crate contains:
//! - Domain models (ActivityRecord, DashboardDefinition, Bucket)
//! - The dashboard generation engine and its chart generators
//! - Data-source traits with in-memory implementations
//! - Domain error types

pub mod models;
pub mod services;
