//! HTTP client for the Cloud Firestore REST API (v1).
//!
//! This module provides a synchronous HTTP client that can be used from async contexts
//! via `tokio::task::spawn_blocking`. The client handles bearer authentication, error
//! mapping and the conversion between plain JSON documents and Firestore typed values.

mod async_wrapper;
pub mod codec;
pub mod structured_query;

pub use async_wrapper::{AsyncFirestoreClient, AsyncFirestoreClientImpl};
pub use structured_query::{FieldOp, StructuredQuery};

use crate::config::Config;
use crate::error::{RegistryError, RegistryResult};
use crate::metrics::{Metrics, RequestTimer};
use codec::{decode_fields, encode_fields};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Alias under which the aggregation query reports its count.
const COUNT_ALIAS: &str = "total";

/// A document read back from Firestore, with its fields decoded to plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreDocument {
    /// Last segment of the document's resource name
    pub id: String,
    pub fields: Map<String, Value>,
}

/// A document write inside an atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    pub collection: String,
    pub id: String,
    pub fields: Map<String, Value>,
}

impl DocumentWrite {
    /// A write that fails the whole commit if the document already exists.
    pub fn create(
        collection: impl Into<String>,
        id: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Value,
}

impl From<RawDocument> for FirestoreDocument {
    fn from(raw: RawDocument) -> Self {
        let id = raw
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            id,
            fields: decode_fields(&raw.fields),
        }
    }
}

/// One element of a `:runQuery` response stream. Elements that only carry
/// a `readTime` have no document.
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// HTTP client for Firestore.
///
/// This client uses `ureq` for synchronous HTTP requests and can be called
/// from async contexts using `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct FirestoreClient {
    /// e.g. `https://firestore.googleapis.com/v1`
    base_url: String,

    /// `projects/{project}/databases/{database}/documents`
    documents_path: String,

    access_token: String,

    agent: Arc<ureq::Agent>,

    metrics: Metrics,
}

impl FirestoreClient {
    /// Create a new FirestoreClient from configuration.
    pub fn new(config: &Config, metrics: Metrics) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout))
            .build();

        Self {
            base_url: config.firestore_base_url.trim_end_matches('/').to_string(),
            documents_path: documents_path(
                &config.firestore_project_id,
                &config.firestore_database,
            ),
            access_token: config.firestore_access_token.clone(),
            agent: Arc::new(agent),
            metrics,
        }
    }

    /// Create a client against a custom base URL (useful for testing).
    #[doc(hidden)]
    pub fn with_base_url(base_url: String, project_id: &str, access_token: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            documents_path: documents_path(project_id, crate::config::DEFAULT_DATABASE),
            access_token,
            agent: Arc::new(agent),
            metrics: Metrics::new(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Full resource name of a document, as used inside commit bodies.
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_path, collection, id)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            self.documents_path,
            collection,
            urlencoding::encode(id)
        )
    }

    /// URL of a `documents:<method>` RPC such as `runQuery` or `commit`.
    fn rpc_url(&self, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, self.documents_path, method)
    }

    fn send(
        &self,
        method: &str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ureq::Response, RegistryError> {
        let timer = RequestTimer::start(&self.metrics);
        tracing::debug!("{} {}", method, url);

        let request = self
            .agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .set("Content-Type", "application/json");

        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        }
        .map_err(|e| self.map_error(e));

        match &result {
            Ok(response) => tracing::debug!("{} {} - status {}", method, url, response.status()),
            Err(e) => tracing::warn!("{} {} - error: {}", method, url, e),
        }
        timer.finish(result.is_ok());

        result
    }

    fn read_json(response: ureq::Response) -> RegistryResult<Value> {
        let body = response
            .into_string()
            .map_err(|e| RegistryError::HttpError(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(RegistryError::JsonError)
    }

    /// Map a ureq error to a RegistryError.
    fn map_error(&self, error: ureq::Error) -> RegistryError {
        match error {
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_string()
                    .map(|body| error_message(&body))
                    .unwrap_or_else(|_| "Unknown error".to_string());

                match code {
                    401 | 403 => RegistryError::Unauthorized,
                    404 => RegistryError::NotFound(message),
                    409 => RegistryError::Conflict(message),
                    429 => RegistryError::RateLimitExceeded,
                    _ => RegistryError::ApiError {
                        status: code,
                        message,
                    },
                }
            }
            ureq::Error::Transport(transport) => match transport.kind() {
                ureq::ErrorKind::ConnectionFailed => {
                    RegistryError::HttpError("Connection failed".to_string())
                }
                ureq::ErrorKind::Io => RegistryError::Timeout,
                _ => RegistryError::HttpError(transport.to_string()),
            },
        }
    }

    // ========================= Document Operations =========================

    /// Read one document; `None` if it does not exist.
    pub fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> RegistryResult<Option<FirestoreDocument>> {
        let url = self.document_url(collection, id);
        match self.send("GET", &url, None) {
            Ok(response) => {
                let raw: RawDocument = serde_json::from_value(Self::read_json(response)?)?;
                Ok(Some(raw.into()))
            }
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the fields named in `mask` with the values in `fields`.
    ///
    /// Masked fields missing from `fields` are removed from the document.
    /// Fails with `NotFound` if the document does not exist.
    pub fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
        mask: &[String],
    ) -> RegistryResult<()> {
        let mut url = format!(
            "{}?currentDocument.exists=true",
            self.document_url(collection, id)
        );
        for path in mask {
            url.push_str("&updateMask.fieldPaths=");
            url.push_str(&urlencoding::encode(path));
        }

        let body = json!({ "fields": encode_fields(fields) });
        self.send("PATCH", &url, Some(&body))?;
        Ok(())
    }

    pub fn delete_document(&self, collection: &str, id: &str) -> RegistryResult<()> {
        let url = self.document_url(collection, id);
        self.send("DELETE", &url, None)?;
        Ok(())
    }

    /// Apply all writes atomically; each write requires its document to be new.
    pub fn commit(&self, writes: &[DocumentWrite]) -> RegistryResult<()> {
        let writes: Vec<Value> = writes
            .iter()
            .map(|w| {
                json!({
                    "update": {
                        "name": self.document_name(&w.collection, &w.id),
                        "fields": encode_fields(&w.fields),
                    },
                    "currentDocument": { "exists": false },
                })
            })
            .collect();

        let body = json!({ "writes": writes });
        self.send("POST", &self.rpc_url("commit"), Some(&body))?;
        Ok(())
    }

    // ========================= Query Operations =========================

    /// Run a structured query and return the matching documents in order.
    pub fn run_query(&self, query: &StructuredQuery) -> RegistryResult<Vec<FirestoreDocument>> {
        let body = json!({ "structuredQuery": query.to_json() });
        let response = self.send("POST", &self.rpc_url("runQuery"), Some(&body))?;

        let items: Vec<RunQueryItem> = serde_json::from_value(Self::read_json(response)?)?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(FirestoreDocument::from)
            .collect())
    }

    /// Count the documents matching a query (ordering and paging are ignored).
    pub fn run_count(&self, query: &StructuredQuery) -> RegistryResult<usize> {
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": query.without_paging().to_json(),
                "aggregations": [{ "alias": COUNT_ALIAS, "count": {} }],
            }
        });
        let response = self.send("POST", &self.rpc_url("runAggregationQuery"), Some(&body))?;
        let value = Self::read_json(response)?;

        let count = value
            .as_array()
            .into_iter()
            .flatten()
            .find_map(|item| item.pointer(&format!("/result/aggregateFields/{}", COUNT_ALIAS)))
            .map(codec::decode_value)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| {
                RegistryError::Other("Missing count in aggregation response".to_string())
            })?;

        Ok(count as usize)
    }
}

fn documents_path(project_id: &str, database: &str) -> String {
    format!("projects/{}/databases/{}/documents", project_id, database)
}

/// Extract `error.message` from a Google API error body, or return the body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FirestoreClient {
        FirestoreClient::with_base_url(
            "http://localhost:8080/v1/".to_string(),
            "ong",
            "token".to_string(),
        )
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.document_url("customers", "c1"),
            "http://localhost:8080/v1/projects/ong/databases/(default)/documents/customers/c1"
        );
        assert_eq!(
            client.rpc_url("runQuery"),
            "http://localhost:8080/v1/projects/ong/databases/(default)/documents:runQuery"
        );
        assert_eq!(
            client.document_name("tokens", "abcd-xyz"),
            "projects/ong/databases/(default)/documents/tokens/abcd-xyz"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":409,"message":"Document already exists","status":"ALREADY_EXISTS"}}"#;
        assert_eq!(error_message(body), "Document already exists");
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[test]
    fn test_raw_document_id() {
        let raw = RawDocument {
            name: "projects/ong/databases/(default)/documents/customers/abc123".into(),
            fields: json!({ "name": { "stringValue": "Ana" } }),
        };
        let doc = FirestoreDocument::from(raw);
        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.fields["name"], json!("Ana"));
    }
}
