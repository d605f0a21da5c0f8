//! Access to the time tracking backend. The daemon only depends on the narrow traits declared
//! here, [http::HttpWorkApi] is the implementation talking to the REST api.

pub mod entities;
pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};

use entities::WorkReportTotal;

/// Provides total worked time for a range of time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkTotalsProvider: Send + Sync {
    /// `start` is inclusive, `end` is exclusive.
    async fn get_total(&self, start: DateTime<Local>, end: DateTime<Local>)
        -> Result<WorkReportTotal>;
}

/// Answers whether the user is working on some task right now.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActiveTaskQuery: Send + Sync {
    async fn has_active_task(&self) -> Result<bool>;
}
