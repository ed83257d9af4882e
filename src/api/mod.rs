//! Typed access to the log-analysis backend

pub mod client;
// Wire records mirror the backend; not every field is shown.
#[allow(dead_code)]
pub mod types;

pub use client::{ApiClient, ApiError, DEFAULT_API_URL, DEFAULT_TIMELINE_LIMIT};
pub use types::*;
