use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{DocumentKey, DocumentStore, SessionDocument};
use crate::error::StoreError;
use crate::storage::Database;

/// Session-log documents kept in the local SQLite database.
///
/// Queries run on tokio's blocking pool so a slow disk never stalls the
/// tick loop.
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open `<data_dir>/pomotally.db`.
    pub fn open() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open()?))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_at(path)?))
    }
}

fn read(db: &Mutex<Database>, key: &DocumentKey) -> Result<Option<SessionDocument>, StoreError> {
    let db = db.lock().map_err(|_| StoreError::Poisoned)?;
    match db.document_get(&key.collection, &key.document_id)? {
        Some(body) => {
            let doc = serde_json::from_str(&body).map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

fn write(db: &Mutex<Database>, key: &DocumentKey, doc: &SessionDocument) -> Result<(), StoreError> {
    let body = serde_json::to_string(doc)?;
    let db = db.lock().map_err(|_| StoreError::Poisoned)?;
    db.document_put(&key.collection, &key.document_id, &body)?;
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &DocumentKey) -> Result<Option<SessionDocument>, StoreError> {
        let db = Arc::clone(&self.db);
        let key = key.clone();
        tokio::task::spawn_blocking(move || read(&db, &key)).await?
    }

    async fn set(&self, key: &DocumentKey, doc: &SessionDocument) -> Result<(), StoreError> {
        let db = Arc::clone(&self.db);
        let key = key.clone();
        let doc = doc.clone();
        tokio::task::spawn_blocking(move || write(&db, &key, &doc)).await?
    }
}
