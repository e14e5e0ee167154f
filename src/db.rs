//! SQLite database connection management.
//!
//! Provides a connection pool to the SQLite database with WAL mode and
//! foreign-key enforcement enabled. The database file and its parent
//! directories are created automatically if they don't exist.
//!
//! # Write-Ahead Logging (WAL)
//!
//! WAL mode allows concurrent readers and a single writer without
//! blocking, so a `watch` loop can poll while saves are committed.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Create a connection pool to the configured SQLite database.
///
/// # Errors
///
/// Returns an error if the database cannot be created or connected to.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!(path = %db_path.display(), "Connected to report database.");
    Ok(pool)
}
