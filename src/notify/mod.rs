//! Report publishing.
//!
//! Defines the `Publisher` trait and the `ScanReport` payload it sends.
//! Discord is the only destination.

pub mod discord;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One labelled block of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportField {
    pub name: String,
    pub value: String,
}

/// Everything a destination needs to render one cycle's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<ReportField>,
}

/// Abstraction over report destinations.
///
/// A failed publish is logged by the caller and never retried; the next
/// cycle's report supersedes it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, report: &ScanReport) -> Result<()>;
}
