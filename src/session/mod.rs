//! Session layer
//!
//! Exactly one active dataset at a time. A session is an immutable snapshot;
//! loading replaces it wholesale with a single pointer swap.

use crate::metrics::MetricsSnapshot;
use crate::models::FinancialRecord;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A loaded record set plus its derived metrics
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub content_hash: String,
    pub records: Vec<FinancialRecord>,
    pub metrics: MetricsSnapshot,
}

impl Session {
    /// Compute metrics for a freshly parsed record set
    pub fn build(source: impl Into<String>, raw: &[u8], records: Vec<FinancialRecord>) -> Self {
        let metrics = MetricsSnapshot::from_records(&records);
        Self {
            session_id: Uuid::new_v4(),
            source: source.into(),
            loaded_at: Utc::now(),
            content_hash: content_hash(raw),
            records,
            metrics,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            source: self.source.clone(),
            loaded_at: self.loaded_at,
            content_hash: self.content_hash.clone(),
            record_count: self.records.len(),
            companies: self.metrics.company_names().map(String::from).collect(),
            years: self.metrics.years(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub content_hash: String,
    pub record_count: usize,
    pub companies: Vec<String>,
    pub years: Vec<i32>,
}

/// SHA256 fingerprint of the raw input
pub fn content_hash(raw: &[u8]) -> String {
    hex::encode(Sha256::digest(raw))
}

/// Trait for holding the active session
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace the active session, returning the installed snapshot
    async fn install(&self, session: Session) -> Result<Arc<Session>>;
    async fn current(&self) -> Result<Option<Arc<Session>>>;
}

/// In-memory session store
pub struct InMemorySessionStore {
    active: Arc<RwLock<Option<Arc<Session>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            active: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn install(&self, session: Session) -> Result<Arc<Session>> {
        let session = Arc::new(session);
        let mut active = self.active.write().await;
        *active = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn current(&self) -> Result<Option<Arc<Session>>> {
        let active = self.active.read().await;
        Ok(active.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sample_dataset;

    #[tokio::test]
    async fn test_store_starts_empty() {
        let store = InMemorySessionStore::new();
        assert!(store.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_install_replaces_wholesale() {
        let store = InMemorySessionStore::new();

        let first = store
            .install(Session::build("first", b"a", sample_dataset()))
            .await
            .unwrap();

        let mut records = sample_dataset();
        records.retain(|r| r.company == "Tesla");
        let second = store
            .install(Session::build("second", b"b", records))
            .await
            .unwrap();

        let current = store.current().await.unwrap().unwrap();
        assert_eq!(current.session_id, second.session_id);
        assert_ne!(current.session_id, first.session_id);
        assert_eq!(current.summary().companies, vec!["Tesla"]);

        // Readers holding the old snapshot are unaffected
        assert_eq!(first.metrics.companies.len(), 3);
    }

    #[test]
    fn test_current_shares_installed_snapshot() {
        let store = InMemorySessionStore::new();
        let installed = tokio_test::block_on(
            store.install(Session::build("sample", b"", sample_dataset())),
        )
        .unwrap();
        let current = tokio_test::block_on(store.current()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&installed, &current));
    }

    #[test]
    fn test_summary() {
        let session = Session::build("sample", b"abc", sample_dataset());
        let summary = session.summary();
        assert_eq!(summary.record_count, 9);
        assert_eq!(summary.years, vec![2021, 2022, 2023]);
        assert_eq!(
            summary.content_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
