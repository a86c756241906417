//! HTTP route handlers.

pub mod dashboard;
pub mod health;
