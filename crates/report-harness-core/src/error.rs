pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by [`ReportService`](crate::report::ReportService) and
/// [`query_reports`](crate::query::query_reports).
///
/// None of these are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source reference could not be resolved. The report was not committed.
    #[error("Could not resolve source '{key}': {message}")]
    Resolution { key: String, message: String },
    /// Reading or committing a report failed.
    #[error("Storage error: {message}")]
    Storage { message: String },
    /// A filtered scan or text search failed. No partial results are returned.
    #[error("Query execution failed: {message}")]
    QueryExecution { message: String },
    #[error("Report not found: {id}")]
    NotFound { id: String },
}

impl Error {
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Self::Storage {
            message: format!("{:#}", err),
        }
    }

    pub(crate) fn query(err: anyhow::Error) -> Self {
        Self::QueryExecution {
            message: format!("{:#}", err),
        }
    }
}
