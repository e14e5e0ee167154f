//! SQLite-backed [`Store`] implementation.
//!
//! Reports live in the `reports` table; their `content` is mirrored into
//! the `reports_fts` FTS5 table, which backs ranked text search with
//! `bm25()`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use report_harness_core::models::{Report, ScoredReport};
use report_harness_core::store::{CommitOutcome, ReportFilter, Store};

const REPORT_COLUMNS: &str = "r.id AS id, r.authored_at AS authored_at, \
     r.fetched_at AS fetched_at, r.stored_at AS stored_at, r.timebox AS timebox, \
     r.content AS content, r.author AS author, r.status AS status, r.url AS url, \
     r.source_id AS source_id";

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn to_millis(ts: Option<DateTime<Utc>>) -> Option<i64> {
    ts.map(|t| t.timestamp_millis())
}

pub(crate) fn from_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(DateTime::from_timestamp_millis)
}

fn row_to_report(row: &SqliteRow) -> Result<Report> {
    Ok(Report {
        id: row.try_get("id")?,
        authored_at: from_millis(row.try_get("authored_at")?),
        fetched_at: from_millis(row.try_get("fetched_at")?),
        stored_at: from_millis(row.try_get("stored_at")?),
        timebox: row.try_get("timebox")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        status: row.try_get("status")?,
        url: row.try_get("url")?,
        source: row.try_get("source_id")?,
    })
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ReportFilter) {
    if let Some(gte) = filter.stored_at_gte {
        qb.push(" AND r.stored_at >= ");
        qb.push_bind(gte.timestamp_millis());
    }
}

/// Turn free text into an FTS5 match expression.
///
/// Each whitespace-separated term becomes a quoted string and the terms are
/// OR-ed, so punctuation and FTS operators in user input are matched
/// literally. Terms without any alphanumeric character are dropped.
/// Returns `None` when nothing searchable remains.
pub fn fts_match_expr(keywords: &str) -> Option<String> {
    let terms: Vec<String> = keywords
        .split_whitespace()
        .map(|t| t.replace('"', ""))
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(|t| format!("\"{}\"", t))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_report(&self, id: &str) -> Result<Option<Report>> {
        let row = sqlx::query(&format!("SELECT {} FROM reports r WHERE r.id = ?", REPORT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_report).transpose()
    }

    async fn commit_report(&self, report: &Report) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        let existed: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM reports WHERE id = ?")
            .bind(&report.id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO reports (id, authored_at, fetched_at, stored_at, timebox,
                                 content, author, status, url, source_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                authored_at = excluded.authored_at,
                fetched_at = excluded.fetched_at,
                stored_at = excluded.stored_at,
                timebox = excluded.timebox,
                content = excluded.content,
                author = excluded.author,
                status = excluded.status,
                url = excluded.url,
                source_id = excluded.source_id
            "#,
        )
        .bind(&report.id)
        .bind(to_millis(report.authored_at))
        .bind(to_millis(report.fetched_at))
        .bind(to_millis(report.stored_at).unwrap_or_else(|| Utc::now().timestamp_millis()))
        .bind(report.timebox)
        .bind(&report.content)
        .bind(&report.author)
        .bind(&report.status)
        .bind(&report.url)
        .bind(&report.source)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM reports_fts WHERE report_id = ?")
            .bind(&report.id)
            .execute(&mut *tx)
            .await?;

        if let Some(content) = &report.content {
            sqlx::query("INSERT INTO reports_fts (report_id, content) VALUES (?, ?)")
                .bind(&report.id)
                .bind(content)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(if existed {
            CommitOutcome::Updated
        } else {
            CommitOutcome::Inserted
        })
    }

    async fn find_reports(&self, filter: &ReportFilter, limit: usize) -> Result<Vec<Report>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM reports r WHERE 1 = 1",
            REPORT_COLUMNS
        ));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY r.rowid LIMIT ");
        qb.push_bind(limit as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_report).collect()
    }

    async fn text_search(
        &self,
        keywords: &str,
        filter: &ReportFilter,
        limit: usize,
    ) -> Result<Vec<ScoredReport>> {
        let Some(expr) = fts_match_expr(keywords) else {
            return Ok(Vec::new());
        };

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {}, bm25(reports_fts) AS bm25_rank \
             FROM reports_fts JOIN reports r ON r.id = reports_fts.report_id \
             WHERE reports_fts MATCH ",
            REPORT_COLUMNS
        ));
        qb.push_bind(expr);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY bm25_rank LIMIT ");
        qb.push_bind(limit as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<ScoredReport> {
                let rank: f64 = row.try_get("bm25_rank")?;
                Ok(ScoredReport {
                    report: row_to_report(row)?,
                    score: -rank,
                })
            })
            .collect()
    }
}
