//! Core data models shared by the store, the query executor and the CLI.
//!
//! A [`Report`] is a persisted content record with provenance, status and
//! timestamps. Its `source` field starts out as a loose lookup key supplied
//! by the caller and is replaced by the canonical [`Source::id`] when the
//! report is saved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A report document.
///
/// Deserializing a report without an `id` generates a fresh UUID, so
/// callers can submit new reports as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// System-generated identifier, immutable after creation.
    #[serde(default = "new_report_id")]
    pub id: String,
    /// When the underlying content was produced.
    #[serde(default)]
    pub authored_at: Option<DateTime<Utc>>,
    /// When this system retrieved the content.
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    /// When this system last committed the report. Assigned on every save;
    /// any caller-supplied value is overwritten.
    #[serde(default)]
    pub stored_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timebox: Option<f64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Source reference. A lookup key (id, name or url) before save, the
    /// canonical source id after.
    #[serde(default)]
    pub source: Option<String>,
}

fn new_report_id() -> String {
    Uuid::new_v4().to_string()
}

impl Report {
    /// A blank report with a freshly generated id.
    pub fn new() -> Self {
        Self {
            id: new_report_id(),
            authored_at: None,
            fetched_at: None,
            stored_at: None,
            timebox: None,
            content: None,
            author: None,
            status: None,
            url: None,
            source: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical provenance entity a report's source reference resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A report returned by ranked text search, with its relevance score.
///
/// Higher scores are more relevant.
#[derive(Debug, Clone)]
pub struct ScoredReport {
    pub report: Report,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_generates_id() {
        let a: Report = serde_json::from_str(r#"{"content": "flood warning"}"#).unwrap();
        let b: Report = serde_json::from_str(r#"{"content": "flood warning"}"#).unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(a.content.as_deref(), Some("flood warning"));
        assert!(a.stored_at.is_none());
    }

    #[test]
    fn test_deserialize_keeps_explicit_id() {
        let r: Report =
            serde_json::from_str(r#"{"id": "r-1", "source": "src-42", "timebox": 60}"#).unwrap();
        assert_eq!(r.id, "r-1");
        assert_eq!(r.source.as_deref(), Some("src-42"));
        assert_eq!(r.timebox, Some(60.0));
    }

    #[test]
    fn test_deserialize_fractional_timebox() {
        let r: Report = serde_json::from_str(r#"{"timebox": 1.5}"#).unwrap();
        assert_eq!(r.timebox, Some(1.5));
    }
}
