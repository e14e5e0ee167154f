//! Query executor for committed reports.
//!
//! A [`ReportQuery`] is normalized in place and then executed with one of
//! two strategies, operating entirely through the [`Store`] trait:
//!
//! | Keywords | Strategy | Order |
//! |----------|----------|-------|
//! | absent / blank | filtered scan ([`Store::find_reports`]) | storage order |
//! | present | ranked text search ([`Store::text_search`]) | descending relevance |
//!
//! Both strategies share the same filter and limit. Every call rewrites
//! `since` on the caller's descriptor to the time of the call, so passing the
//! same descriptor back returns only reports stored after the previous call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Report;
use crate::store::{ReportFilter, Store};

/// Result cap used when a query does not set `limit`.
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// Executor tuning parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub default_limit: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

/// A caller-owned query descriptor.
///
/// `ReportQuery::default()` matches every report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Free-text query. Selects ranked text search when non-blank.
    #[serde(default)]
    pub keywords: Option<String>,
    /// Structural constraints. Rebuilt from `since` on every call.
    #[serde(skip_deserializing)]
    pub filter: ReportFilter,
    /// Watermark: only reports stored at or after this instant. Overwritten
    /// with the call time on every call.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ReportQuery {
    pub fn keywords(keywords: impl Into<String>) -> Self {
        Self {
            keywords: Some(keywords.into()),
            ..Self::default()
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Keywords with surrounding whitespace removed, `None` when blank.
    fn normalize_keywords(&mut self) {
        self.keywords = self
            .keywords
            .take()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }
}

/// Normalize a query in place, returning the effective limit.
///
/// A missing or zero limit falls back to `params.default_limit`.
/// Afterwards `limit` is populated, `filter` holds exactly the constraints
/// derived from the incoming `since`, and `since` is `now`.
pub fn normalize_query(query: &mut ReportQuery, params: &QueryParams, now: DateTime<Utc>) -> usize {
    query.normalize_keywords();

    let limit = query.limit.filter(|&l| l > 0).unwrap_or(params.default_limit);
    query.limit = Some(limit);

    query.filter = ReportFilter::default();
    if let Some(since) = query.since {
        query.filter.stored_at_gte = Some(since);
    }

    query.since = Some(now);
    limit
}

/// Normalize and execute a query against a [`Store`] backend.
///
/// Returns plain reports; ranking scores from text search are discarded.
pub async fn query_reports<S: Store + ?Sized>(
    store: &S,
    query: &mut ReportQuery,
    params: &QueryParams,
) -> Result<Vec<Report>> {
    let limit = normalize_query(query, params, Utc::now());

    match query.keywords.as_deref() {
        None => {
            tracing::debug!(filter = ?query.filter, limit, "Running filtered report scan.");
            store
                .find_reports(&query.filter, limit)
                .await
                .map_err(Error::query)
        }
        Some(keywords) => {
            tracing::debug!(keywords, filter = ?query.filter, limit, "Running report text search.");
            let hits = store
                .text_search(keywords, &query.filter, limit)
                .await
                .map_err(Error::query)?;
            Ok(hits.into_iter().map(|hit| hit.report).collect())
        }
    }
}
