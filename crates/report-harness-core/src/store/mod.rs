//! Storage abstraction for Report Harness.
//!
//! The [`Store`] trait is the storage engine the report pipeline and the
//! query executor run against, enabling pluggable backends (SQLite,
//! in-memory).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Report, ScoredReport};

/// Structural constraints applied by both execution strategies.
///
/// The default filter matches every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportFilter {
    /// Only reports with `stored_at >= stored_at_gte`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_at_gte: Option<DateTime<Utc>>,
}

impl ReportFilter {
    pub fn is_empty(&self) -> bool {
        self.stored_at_gte.is_none()
    }

    /// Evaluate the filter against a report. Used by stores without a
    /// native query language.
    pub fn matches(&self, report: &Report) -> bool {
        match self.stored_at_gte {
            Some(gte) => report.stored_at.is_some_and(|ts| ts >= gte),
            None => true,
        }
    }
}

/// Whether a commit created the report or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Inserted,
    Updated,
}

/// Abstract storage engine for reports.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_report`](Store::get_report) | Fetch the committed state of a report |
/// | [`commit_report`](Store::commit_report) | Insert or overwrite a report |
/// | [`find_reports`](Store::find_reports) | Filtered scan in storage order |
/// | [`text_search`](Store::text_search) | Ranked full-text search over `content` |
#[async_trait]
pub trait Store: Send + Sync {
    /// Retrieve a committed report by ID.
    async fn get_report(&self, id: &str) -> Result<Option<Report>>;

    /// Insert or overwrite a report, reporting which one happened.
    async fn commit_report(&self, report: &Report) -> Result<CommitOutcome>;

    /// Return reports matching `filter` in storage order, at most `limit`.
    async fn find_reports(&self, filter: &ReportFilter, limit: usize) -> Result<Vec<Report>>;

    /// Full-text search over report content, scoped by `filter`.
    ///
    /// Results are ordered by descending relevance, at most `limit`.
    async fn text_search(
        &self,
        keywords: &str,
        filter: &ReportFilter,
        limit: usize,
    ) -> Result<Vec<ScoredReport>>;
}
