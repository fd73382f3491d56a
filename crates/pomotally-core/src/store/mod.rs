//! Keyed document stores holding one session log per user and date.
//!
//! Every store behaves as last-write-wins: `set` overwrites the document
//! without a version check, so two open sessions for the same user race.

mod firestore;
mod memory;
mod sqlite;

pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;
use crate::identity::UserId;
use crate::timer::SessionLog;

/// Suffix appended to the user identity to form the collection name.
pub const COLLECTION_SUFFIX: &str = "-pomodoro";

/// Address of a document: (collection, document id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    pub collection: String,
    pub document_id: String,
}

impl DocumentKey {
    /// `"<user>-pomodoro"` / `YYYY-MM-DD`.
    pub fn session_log(user: &UserId, date: NaiveDate) -> Self {
        Self {
            collection: format!("{user}{COLLECTION_SUFFIX}"),
            document_id: date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document_id)
    }
}

/// Stored document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDocument {
    #[serde(rename = "pomodoroCounter", default)]
    pub pomodoro_counter: Vec<u64>,
}

impl From<&SessionLog> for SessionDocument {
    fn from(log: &SessionLog) -> Self {
        Self {
            pomodoro_counter: log.entries().to_vec(),
        }
    }
}

impl From<SessionDocument> for SessionLog {
    fn from(doc: SessionDocument) -> Self {
        SessionLog::from(doc.pomodoro_counter)
    }
}

/// Keyed document read/write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Fetch a document. `Ok(None)` when it does not exist.
    async fn get(&self, key: &DocumentKey) -> Result<Option<SessionDocument>, StoreError>;

    /// Create or overwrite a document.
    async fn set(&self, key: &DocumentKey, doc: &SessionDocument) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_log_key_uses_user_and_iso_date() {
        let user = UserId::new("ada@example.com").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let key = DocumentKey::session_log(&user, date);
        assert_eq!(key.collection, "ada@example.com-pomodoro");
        assert_eq!(key.document_id, "2024-03-09");
        assert_eq!(key.to_string(), "ada@example.com-pomodoro/2024-03-09");
    }

    #[test]
    fn document_uses_camel_case_field_name() {
        let doc = SessionDocument {
            pomodoro_counter: vec![1500, 300],
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            serde_json::json!({"pomodoroCounter": [1500, 300]})
        );
    }
}
