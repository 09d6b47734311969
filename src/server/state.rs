//! Shared application state for the API server

use crate::dataset::Dataset;
use crate::transaction::{SourceError, TransactionSource};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared application state
pub struct AppState {
    /// Upstream table reader, used again only on explicit reload
    /// Wrapped in Mutex because SQLite connections are not thread-safe
    pub source: Arc<Mutex<Box<dyn TransactionSource + Send>>>,
    /// Current immutable snapshot; requests clone the `Arc` and release the lock
    pub dataset: RwLock<Arc<Dataset>>,
}

impl AppState {
    /// Creates a new application state wrapped for sharing across handlers
    pub fn new(source: impl TransactionSource + Send + 'static, dataset: Dataset) -> Arc<Self> {
        Arc::new(AppState {
            source: Arc::new(Mutex::new(Box::new(source))),
            dataset: RwLock::new(Arc::new(dataset)),
        })
    }

    pub async fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&*self.dataset.read().await)
    }

    /// Re-reads the source and swaps in a new snapshot.
    ///
    /// The read runs on the blocking pool. On failure the previous snapshot
    /// stays in place.
    pub async fn reload(&self) -> Result<Arc<Dataset>, SourceError> {
        let source = Arc::clone(&self.source).lock_owned().await;
        let loaded = tokio::task::spawn_blocking(move || Dataset::load(&**source))
            .await
            .map_err(|e| SourceError::Query(format!("Reload task failed: {}", e)))?;
        let fresh = Arc::new(loaded?);
        *self.dataset.write().await = Arc::clone(&fresh);
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student_id::StudentId;
    use crate::transaction::{InMemoryTransactionSource, Transaction};

    struct FailingSource;

    impl TransactionSource for FailingSource {
        fn load_transactions(&self) -> Result<Vec<Transaction>, SourceError> {
            Err(SourceError::TableNotFound("cafteria".to_string()))
        }
    }

    fn lunch(id: &str) -> Transaction {
        Transaction::new(
            StudentId::new(id).unwrap(),
            Some("F".to_string()),
            Some("2024-01-15 12:00:00".to_string()),
            4.0,
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reload_swaps_snapshot() {
        let source = InMemoryTransactionSource::new(vec![lunch("s1"), lunch("s2")]);
        let state = AppState::new(source, Dataset::from_transactions(Vec::new()));

        let before = state.snapshot().await;
        let fresh = state.reload().await.unwrap();
        assert!(before.is_empty());
        assert_eq!(fresh.len(), 2);
        assert_eq!(state.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let state = AppState::new(FailingSource, Dataset::from_transactions(vec![lunch("s1")]));

        let err = state.reload().await.unwrap_err();
        assert_eq!(err, SourceError::TableNotFound("cafteria".to_string()));
        assert_eq!(state.snapshot().await.len(), 1);
    }
}
