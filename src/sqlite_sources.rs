//! SQLite-backed [`SourceDirectory`].
//!
//! Sources are registered with `rh source add` and resolved when a report
//! is saved. Lookup prefers an id match, then name, then url.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use report_harness_core::directory::SourceDirectory;
use report_harness_core::models::Source;

pub struct SqliteDirectory {
    pool: SqlitePool,
}

fn row_to_source(row: &SqliteRow) -> Result<Source> {
    let created_at: i64 = row.try_get("created_at")?;
    Ok(Source {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
    })
}

impl SqliteDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new source. A random UUID is used when `id` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if the id or name is already taken.
    pub async fn add_source(&self, name: &str, url: Option<&str>, id: Option<&str>) -> Result<Source> {
        if name.trim().is_empty() {
            bail!("source name must not be empty");
        }
        let source = Source {
            id: id
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: name.to_string(),
            url: url.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO sources (id, name, url, created_at) VALUES (?, ?, ?, ?)")
            .bind(&source.id)
            .bind(&source.name)
            .bind(&source.url)
            .bind(source.created_at.timestamp_millis())
            .execute(&self.pool)
            .await?;

        tracing::info!(source_id = %source.id, name = %source.name, "Registered source.");
        Ok(source)
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query("SELECT id, name, url, created_at FROM sources ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_source).collect()
    }
}

#[async_trait]
impl SourceDirectory for SqliteDirectory {
    async fn lookup(&self, key: &str) -> Result<Option<Source>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, url, created_at,
                   CASE WHEN id = ? THEN 0 WHEN name = ? THEN 1 ELSE 2 END AS priority
            FROM sources
            WHERE id = ? OR name = ? OR url = ?
            ORDER BY priority ASC
            LIMIT 1
            "#,
        )
        .bind(key)
        .bind(key)
        .bind(key)
        .bind(key)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_source).transpose()
    }
}
