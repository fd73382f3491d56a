//! Hosted document database client (Firestore REST API).
//!
//! Documents live at
//! `{base}/v1/projects/{project}/databases/(default)/documents/{collection}/{id}`.
//! `PATCH` without an update mask replaces the whole document, which gives
//! the same overwrite semantics as the web SDK's `setDoc`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{DocumentKey, DocumentStore, SessionDocument};
use crate::error::StoreError;

/// Connection settings for [`FirestoreStore`].
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    /// Web API key sent as `?key=`.
    pub api_key: Option<String>,
    /// Signed-in user's ID token sent as a bearer token.
    pub id_token: Option<String>,
}

pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

// Wire format: typed field values.

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireDocument {
    #[serde(default)]
    fields: WireFields,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireFields {
    #[serde(rename = "pomodoroCounter", default, skip_serializing_if = "Option::is_none")]
    pomodoro_counter: Option<WireArray>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireArray {
    #[serde(rename = "arrayValue", default)]
    array_value: WireValues,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireValues {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<WireScalar>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireScalar {
    #[serde(rename = "integerValue", default, skip_serializing_if = "Option::is_none")]
    integer_value: Option<String>,
    #[serde(rename = "doubleValue", default, skip_serializing_if = "Option::is_none")]
    double_value: Option<f64>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn document_url(&self, key: &DocumentKey) -> Result<Url, StoreError> {
        let raw = format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.project_id),
            urlencoding::encode(&key.collection),
            urlencoding::encode(&key.document_id),
        );
        let mut url = Url::parse(&raw)?;
        if let Some(api_key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", api_key);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn encode(doc: &SessionDocument) -> WireDocument {
        WireDocument {
            fields: WireFields {
                pomodoro_counter: Some(WireArray {
                    array_value: WireValues {
                        values: doc
                            .pomodoro_counter
                            .iter()
                            .map(|secs| WireScalar {
                                integer_value: Some(secs.to_string()),
                                double_value: None,
                            })
                            .collect(),
                    },
                }),
            },
        }
    }

    fn decode(key: &DocumentKey, wire: WireDocument) -> Result<SessionDocument, StoreError> {
        let malformed = |message: String| StoreError::Malformed {
            key: key.to_string(),
            message,
        };

        let values = wire
            .fields
            .pomodoro_counter
            .map(|array| array.array_value.values)
            .unwrap_or_default();

        let mut counter = Vec::with_capacity(values.len());
        for value in values {
            let secs = match (value.integer_value, value.double_value) {
                (Some(int), _) => int
                    .parse::<u64>()
                    .map_err(|e| malformed(format!("integerValue '{int}': {e}")))?,
                (None, Some(d)) if d.is_finite() && d >= 0.0 => d.round() as u64,
                _ => return Err(malformed("expected a non-negative number".into())),
            };
            counter.push(secs);
        }
        Ok(SessionDocument {
            pomodoro_counter: counter,
        })
    }

    async fn status_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StoreError::Status { status, message }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    async fn get(&self, key: &DocumentKey) -> Result<Option<SessionDocument>, StoreError> {
        let url = self.document_url(key)?;
        debug!(%key, "fetching document");
        let response = self.authorize(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let wire: WireDocument = response.json().await?;
        Self::decode(key, wire).map(Some)
    }

    async fn set(&self, key: &DocumentKey, doc: &SessionDocument) -> Result<(), StoreError> {
        let url = self.document_url(key)?;
        debug!(%key, entries = doc.pomodoro_counter.len(), "writing document");
        let response = self
            .authorize(self.client.patch(url))
            .json(&Self::encode(doc))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }
}
