//! # Report Harness Core
//!
//! Shared, runtime-agnostic logic for Report Harness: report models, the
//! source directory and store abstractions, the save pipeline with its
//! lifecycle events, and the query executor.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Backends plug in through the
//! [`store::Store`] and [`directory::SourceDirectory`] traits, and event
//! delivery through [`events::EventBus`].

pub mod directory;
pub mod error;
pub mod events;
pub mod models;
pub mod query;
pub mod report;
pub mod store;

pub use error::{Error, Result};
pub use report::ReportService;
