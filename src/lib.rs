//! # Report Harness
//!
//! A local-first report ingestion and retrieval service.
//!
//! Reports are saved through a pipeline that resolves their source reference
//! to a canonical source, stamps the storage time, commits them to SQLite
//! and announces lifecycle events. Committed reports can be queried with
//! structural filters or ranked full-text search, incrementally via a
//! `since` watermark.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────────┐   ┌─────────────┐
//! │   save    │──▶│ normalize ▸ commit ▸ │──▶│   SQLite    │
//! │ (rh save) │   │      classify        │   │ reports+FTS5│
//! └───────────┘   └──────────┬───────────┘   └──────┬──────┘
//!                            ▼                      │
//!                     ┌─────────────┐        ┌──────┴──────┐
//!                     │ event bus   │        │   query     │
//!                     │ (broadcast) │        │  executor   │
//!                     └─────────────┘        └─────────────┘
//! ```
//!
//! The save pipeline, query executor and traits live in
//! [`report_harness_core`]; this crate supplies the SQLite backends, the
//! broadcast event bus, configuration and the `rh` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite [`Store`](report_harness_core::store::Store) with FTS5 search |
//! | [`sqlite_sources`] | SQLite [`SourceDirectory`](report_harness_core::directory::SourceDirectory) |
//! | [`bus`] | `tokio::sync::broadcast` event bus and listener tasks |
//! | [`service`] | Wires the backends into a [`ReportService`](report_harness_core::ReportService) |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`save`] | `rh save` / `rh status` |
//! | [`query`] | `rh query` / `rh watch` |
//! | [`get`] | `rh get` |
//! | [`sources`] | `rh source add` / `rh source list` |

pub mod bus;
pub mod config;
pub mod db;
pub mod get;
pub mod logging;
pub mod migrate;
pub mod query;
pub mod save;
pub mod service;
pub mod sources;
pub mod sqlite_sources;
pub mod sqlite_store;

pub use report_harness_core::{events, models, store, Error, ReportService};
