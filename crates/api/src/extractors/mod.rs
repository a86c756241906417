//! Custom Axum extractors.

pub mod actor;

pub use actor::{Actor, USER_ID_HEADER};
