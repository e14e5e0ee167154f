//! Wiring of the SQLite backends and the broadcast bus into a
//! [`ReportService`].

use anyhow::Result;

use report_harness_core::ReportService;

use crate::bus::BroadcastBus;
use crate::config::Config;
use crate::db;
use crate::sqlite_sources::SqliteDirectory;
use crate::sqlite_store::SqliteStore;

pub type AppService = ReportService<SqliteStore, SqliteDirectory, BroadcastBus>;

/// Open the configured database and build a service on top of it.
///
/// The schema must already exist (`rh init`).
pub async fn open(config: &Config) -> Result<AppService> {
    let pool = db::connect(config).await?;
    let service = ReportService::new(
        SqliteStore::new(pool.clone()),
        SqliteDirectory::new(pool),
        BroadcastBus::new(config.events.capacity),
    )
    .with_params(config.query_params());
    Ok(service)
}

/// Close the connection pool shared by the store and the directory.
pub async fn close(service: AppService) {
    service.store().pool().close().await;
}
