//! Query commands: `rh query` and `rh watch`.
//!
//! Both build a [`ReportQuery`] and run it through the service's query
//! executor. `watch` keeps reusing the same descriptor, so each round only
//! returns reports stored since the previous round.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::time::Duration;

use report_harness_core::models::Report;
use report_harness_core::query::ReportQuery;

use crate::config::Config;
use crate::service;

/// Parse a watermark given as RFC 3339 or as a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_since(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid --since '{}': expected RFC 3339 or YYYY-MM-DD", value))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid --since '{}'", value))
}

fn build_query(
    keywords: Option<String>,
    since: Option<&str>,
    limit: Option<usize>,
) -> Result<ReportQuery> {
    Ok(ReportQuery {
        keywords,
        since: since.map(parse_since).transpose()?,
        limit,
        ..ReportQuery::default()
    })
}

/// Query output in `--json` mode.
#[derive(Debug, Serialize)]
pub struct QueryOutput<'a> {
    /// Watermark to pass as `--since` on the next call.
    pub since: Option<DateTime<Utc>>,
    pub reports: &'a [Report],
}

fn print_report(report: &Report) {
    let stored = report
        .stored_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    let content: String = report
        .content
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(80)
        .collect();
    println!(
        "{}  {}  [{}]  {}",
        report.id,
        stored,
        report.status.as_deref().unwrap_or("-"),
        content.replace('\n', " ")
    );
}

pub async fn run_query(
    config: &Config,
    keywords: Option<String>,
    since: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut query = build_query(keywords, since.as_deref(), limit)?;
    let svc = service::open(config).await?;
    let result = svc.query_reports(&mut query).await;
    service::close(svc).await;
    let reports = result?;

    if json {
        let output = QueryOutput {
            since: query.since,
            reports: &reports,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No results.");
    }
    for report in &reports {
        print_report(report);
    }
    if let Some(since) = query.since {
        println!("since: {}", since.to_rfc3339());
    }
    Ok(())
}

/// Poll for new reports every `interval`, for `rounds` rounds (forever if `None`).
pub async fn run_watch(
    config: &Config,
    keywords: Option<String>,
    since: Option<String>,
    interval: Duration,
    rounds: Option<u64>,
) -> Result<()> {
    let mut query = build_query(keywords, since.as_deref(), None)?;
    let svc = service::open(config).await?;

    let mut round = 0u64;
    let result: Result<()> = loop {
        if rounds.is_some_and(|max| round >= max) {
            break Ok(());
        }
        if round > 0 {
            tokio::time::sleep(interval).await;
        }
        round += 1;

        match svc.query_reports(&mut query).await {
            Ok(reports) => {
                tracing::debug!(round, count = reports.len(), since = ?query.since, "Watch round complete.");
                for report in &reports {
                    print_report(report);
                }
            }
            Err(err) => break Err(err.into()),
        }
    };

    service::close(svc).await;
    result
}
