//! In-memory [`Store`] implementation for testing and embedding.
//!
//! Reports live in a `HashMap` behind `std::sync::RwLock`, with a separate
//! insertion-order list so filtered scans return storage order. Text search
//! scores a report by the number of distinct query terms its content
//! contains (case-insensitive).

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Report, ScoredReport};

use super::{CommitOutcome, ReportFilter, Store};

#[derive(Default)]
struct Inner {
    reports: HashMap<String, Report>,
    order: Vec<String>,
}

/// In-memory store for testing.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of committed reports.
    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

fn score(content: &str, terms: &[String]) -> usize {
    let content_lower = content.to_lowercase();
    terms
        .iter()
        .filter(|t| content_lower.contains(t.as_str()))
        .count()
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_report(&self, id: &str) -> Result<Option<Report>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.reports.get(id).cloned())
    }

    async fn commit_report(&self, report: &Report) -> Result<CommitOutcome> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let outcome = match inner.reports.insert(report.id.clone(), report.clone()) {
            Some(_) => CommitOutcome::Updated,
            None => {
                inner.order.push(report.id.clone());
                CommitOutcome::Inserted
            }
        };
        Ok(outcome)
    }

    async fn find_reports(&self, filter: &ReportFilter, limit: usize) -> Result<Vec<Report>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.reports.get(id))
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn text_search(
        &self,
        keywords: &str,
        filter: &ReportFilter,
        limit: usize,
    ) -> Result<Vec<ScoredReport>> {
        let mut terms: Vec<String> = keywords
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        terms.sort_unstable();
        terms.dedup();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.inner.read().map_err(poisoned)?;
        let mut hits: Vec<ScoredReport> = inner
            .order
            .iter()
            .filter_map(|id| inner.reports.get(id))
            .filter(|r| filter.matches(r))
            .filter_map(|r| {
                let matches = score(r.content.as_deref().unwrap_or_default(), &terms);
                (matches > 0).then(|| ScoredReport {
                    report: r.clone(),
                    score: matches as f64,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }
}
