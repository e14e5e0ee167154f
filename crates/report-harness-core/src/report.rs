//! The report save pipeline.
//!
//! [`ReportService::save`] composes three stages around a single commit:
//!
//! 1. [`normalize`] resolves the report's source reference through the
//!    [`SourceDirectory`] and stamps `stored_at`. A failed or empty lookup
//!    aborts the save before anything reaches the store.
//! 2. [`Store::commit_report`] persists the report and reports whether it
//!    was inserted or updated.
//! 3. [`classify`] compares the committed report with its previous state and
//!    yields at most one [`ReportEvent`], which is published on the
//!    injected [`EventBus`].
//!
//! Events are only published after a successful commit.

use chrono::{DateTime, Utc};

use crate::directory::SourceDirectory;
use crate::error::{Error, Result};
use crate::events::{EventBus, ReportEvent};
use crate::models::Report;
use crate::query::{self, QueryParams, ReportQuery};
use crate::store::{CommitOutcome, Store};

/// Resolve the source reference and stamp `stored_at`.
///
/// `previous_stored_at` is the committed `stored_at` of the same report, if
/// any; the new stamp never moves behind it.
pub async fn normalize<D: SourceDirectory + ?Sized>(
    directory: &D,
    mut report: Report,
    previous_stored_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Report> {
    if let Some(key) = report.source.take().filter(|k| !k.trim().is_empty()) {
        let source = match directory.lookup(&key).await {
            Ok(Some(source)) => source,
            Ok(None) => {
                return Err(Error::Resolution {
                    key,
                    message: "no matching source".to_string(),
                })
            }
            Err(err) => {
                return Err(Error::Resolution {
                    key,
                    message: format!("{:#}", err),
                })
            }
        };
        tracing::debug!(key = %key, source_id = %source.id, "Resolved report source.");
        report.source = Some(source.id);
    }

    report.stored_at = Some(match previous_stored_at {
        Some(prev) if prev > now => prev,
        _ => now,
    });
    Ok(report)
}

/// Decide which event, if any, a successful commit produces.
///
/// `previous` is the committed state before this write, `None` when the
/// write created the report.
pub fn classify(previous: Option<&Report>, current: &Report) -> Option<ReportEvent> {
    match previous {
        None => Some(ReportEvent::Created {
            id: current.id.clone(),
        }),
        Some(prev) if prev.status != current.status => Some(ReportEvent::StatusChanged {
            id: current.id.clone(),
            status: current.status.clone(),
        }),
        Some(_) => None,
    }
}

/// Persists, resolves and queries reports.
pub struct ReportService<S, D, B> {
    store: S,
    directory: D,
    bus: B,
    params: QueryParams,
}

impl<S, D, B> ReportService<S, D, B>
where
    S: Store,
    D: SourceDirectory,
    B: EventBus,
{
    pub fn new(store: S, directory: D, bus: B) -> Self {
        Self {
            store,
            directory,
            bus,
            params: QueryParams::default(),
        }
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Normalize, commit and announce a report.
    ///
    /// Returns the committed report, with the canonical source id and the
    /// new `stored_at`.
    pub async fn save(&self, report: Report) -> Result<Report> {
        let previous = self
            .store
            .get_report(&report.id)
            .await
            .map_err(Error::storage)?;

        let report = normalize(
            &self.directory,
            report,
            previous.as_ref().and_then(|p| p.stored_at),
            Utc::now(),
        )
        .await?;

        let outcome = self
            .store
            .commit_report(&report)
            .await
            .map_err(Error::storage)?;
        tracing::debug!(report_id = %report.id, ?outcome, "Committed report.");

        let previous = match outcome {
            CommitOutcome::Inserted => None,
            CommitOutcome::Updated => previous.as_ref(),
        };
        if let Some(event) = classify(previous, &report) {
            tracing::info!(topic = event.topic(), report_id = %report.id, "Publishing report event.");
            self.bus.publish(event);
        }

        Ok(report)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Report>> {
        self.store.get_report(id).await.map_err(Error::storage)
    }

    /// Load a committed report, replace its status and save it again.
    pub async fn update_status(&self, id: &str, status: Option<String>) -> Result<Report> {
        let mut report = self.get(id).await?.ok_or_else(|| Error::NotFound {
            id: id.to_string(),
        })?;
        report.status = status;
        self.save(report).await
    }

    /// See [`query::query_reports`].
    pub async fn query_reports(&self, query: &mut ReportQuery) -> Result<Vec<Report>> {
        query::query_reports(&self.store, query, &self.params).await
    }
}
