//! Source directory abstraction.
//!
//! A [`SourceDirectory`] resolves a loose source reference (an id, a name or
//! a url) to the canonical [`Source`] entity. Reports are only committed
//! with a source reference that went through [`SourceDirectory::lookup`].

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::Source;

#[async_trait]
pub trait SourceDirectory: Send + Sync {
    /// Find the canonical source for `key`.
    ///
    /// `Ok(None)` means no source matches; `Err` is an infrastructure failure.
    async fn lookup(&self, key: &str) -> Result<Option<Source>>;
}

/// In-memory directory for testing.
///
/// Lookup prefers an exact id match, then name, then url.
pub struct InMemoryDirectory {
    sources: RwLock<HashMap<String, Source>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Register a source under an explicit id.
    pub fn insert(&self, id: &str, name: &str, url: Option<&str>) -> Result<Source> {
        let source = Source {
            id: id.to_string(),
            name: name.to_string(),
            url: url.map(str::to_string),
            created_at: Utc::now(),
        };
        self.sources
            .write()
            .map_err(|_| anyhow!("directory lock poisoned"))?
            .insert(source.id.clone(), source.clone());
        Ok(source)
    }

    /// Register a source with a generated id.
    pub fn add(&self, name: &str, url: Option<&str>) -> Result<Source> {
        self.insert(&Uuid::new_v4().to_string(), name, url)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceDirectory for InMemoryDirectory {
    async fn lookup(&self, key: &str) -> Result<Option<Source>> {
        let sources = self
            .sources
            .read()
            .map_err(|_| anyhow!("directory lock poisoned"))?;
        if let Some(s) = sources.get(key) {
            return Ok(Some(s.clone()));
        }
        let by_name = sources.values().find(|s| s.name == key);
        let found = by_name.or_else(|| sources.values().find(|s| s.url.as_deref() == Some(key)));
        Ok(found.cloned())
    }
}
