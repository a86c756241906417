//! Shared utilities for the activity tracker backend.
//!
//! Currently provides the page-token encoding used between the persistence
//! layer and callers paging through activity sources.

pub mod pagination;
