//! Persistence layer for the activity tracker backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations backing the generation data sources

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
