//! Async wrapper around the synchronous FirestoreClient.
//!
//! Each call runs on tokio's blocking pool via `tokio::task::spawn_blocking`
//! so HTTP round trips never stall the runtime.

use crate::client::{DocumentWrite, FirestoreClient, FirestoreDocument, StructuredQuery};
use crate::error::{RegistryError, RegistryResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Async document store operations used by the repositories.
#[async_trait]
pub trait AsyncFirestoreClient: Send + Sync {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> RegistryResult<Option<FirestoreDocument>>;

    async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        mask: Vec<String>,
    ) -> RegistryResult<()>;

    async fn delete_document(&self, collection: &str, id: &str) -> RegistryResult<()>;

    async fn commit(&self, writes: Vec<DocumentWrite>) -> RegistryResult<()>;

    async fn run_query(&self, query: StructuredQuery) -> RegistryResult<Vec<FirestoreDocument>>;

    async fn run_count(&self, query: StructuredQuery) -> RegistryResult<usize>;
}

#[derive(Clone)]
pub struct AsyncFirestoreClientImpl {
    client: Arc<FirestoreClient>,
}

impl AsyncFirestoreClientImpl {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

/// Run a blocking client call on the blocking pool.
async fn blocking<T, F>(f: F) -> RegistryResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> RegistryResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RegistryError::HttpError(format!("Task join error: {}", e)))?
}

#[async_trait]
impl AsyncFirestoreClient for AsyncFirestoreClientImpl {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> RegistryResult<Option<FirestoreDocument>> {
        let client = self.client.clone();
        let collection = collection.to_string();
        let id = id.to_string();

        blocking(move || client.get_document(&collection, &id)).await
    }

    async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        mask: Vec<String>,
    ) -> RegistryResult<()> {
        let client = self.client.clone();
        let collection = collection.to_string();
        let id = id.to_string();

        blocking(move || client.patch_document(&collection, &id, &fields, &mask)).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> RegistryResult<()> {
        let client = self.client.clone();
        let collection = collection.to_string();
        let id = id.to_string();

        blocking(move || client.delete_document(&collection, &id)).await
    }

    async fn commit(&self, writes: Vec<DocumentWrite>) -> RegistryResult<()> {
        let client = self.client.clone();
        blocking(move || client.commit(&writes)).await
    }

    async fn run_query(&self, query: StructuredQuery) -> RegistryResult<Vec<FirestoreDocument>> {
        let client = self.client.clone();
        blocking(move || client.run_query(&query)).await
    }

    async fn run_count(&self, query: StructuredQuery) -> RegistryResult<usize> {
        let client = self.client.clone();
        blocking(move || client.run_count(&query)).await
    }
}
