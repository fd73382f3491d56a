use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DocumentKey, DocumentStore, SessionDocument};
use crate::error::StoreError;

/// In-process store for local-only sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<DocumentKey, SessionDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &DocumentKey) -> Result<Option<SessionDocument>, StoreError> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &DocumentKey, doc: &SessionDocument) -> Result<(), StoreError> {
        self.docs.write().await.insert(key.clone(), doc.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> DocumentKey {
        DocumentKey {
            collection: "a@b.c-pomodoro".into(),
            document_id: "2024-01-01".into(),
        }
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryStore::new();
        assert!(store.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryStore::new();
        store
            .set(&key(), &SessionDocument { pomodoro_counter: vec![1500] })
            .await
            .unwrap();
        store
            .set(&key(), &SessionDocument { pomodoro_counter: vec![1500, 1500] })
            .await
            .unwrap();
        let doc = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(doc.pomodoro_counter, vec![1500, 1500]);
        assert_eq!(store.len().await, 1);
    }
}
