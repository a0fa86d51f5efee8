use async_trait::async_trait;
use customer_registry_mcp::domain::{Cpf, CustomerId};
use customer_registry_mcp::error::{RegistryError, RegistryResult};
use customer_registry_mcp::models::{CardToken, Customer, CustomerFilter, SortSpec};
use customer_registry_mcp::repositories::{CustomerRepository, InMemoryCustomerRepository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Mock customer repository for testing.
///
/// Stores records in an `InMemoryCustomerRepository`, counts calls per
/// method and can be told to fail every write or hold `count` replies.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockCustomerRepository {
    inner: Arc<InMemoryCustomerRepository>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    fail_writes: Arc<Mutex<bool>>,
    count_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

#[allow(dead_code)]
impl MockCustomerRepository {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryCustomerRepository::new()),
            call_counts: Arc::new(Mutex::new(HashMap::new())),
            fail_writes: Arc::new(Mutex::new(false)),
            count_gate: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_customers(customers: Vec<Customer>) -> Self {
        Self {
            inner: Arc::new(InMemoryCustomerRepository::with_customers(customers)),
            ..Self::new()
        }
    }

    /// Get the number of times a method was called.
    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    pub fn reset_call_counts(&self) {
        self.call_counts.lock().unwrap().clear();
    }

    /// Make every subsequent create/update/delete fail with an API error.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// Hold every `count` reply, already computed, until `release_counts`.
    pub fn hold_counts(&self) {
        *self.count_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_counts(&self) {
        if let Some(gate) = self.count_gate.lock().unwrap().take() {
            gate.close();
        }
    }

    fn track_call(&self, method: &str) {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;
    }

    fn check_write(&self) -> RegistryResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(RegistryError::ApiError {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MockCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerRepository for MockCustomerRepository {
    async fn get(&self, id: &CustomerId) -> RegistryResult<Option<Customer>> {
        self.track_call("get");
        self.inner.get(id).await
    }

    async fn find_by_doc(&self, doc: &Cpf) -> RegistryResult<Option<Customer>> {
        self.track_call("find_by_doc");
        self.inner.find_by_doc(doc).await
    }

    async fn query(
        &self,
        filter: &CustomerFilter,
        sort: &SortSpec,
        offset: usize,
        limit: usize,
    ) -> RegistryResult<Vec<Customer>> {
        self.track_call("query");
        self.inner.query(filter, sort, offset, limit).await
    }

    async fn count(&self, filter: &CustomerFilter) -> RegistryResult<usize> {
        self.track_call("count");
        let result = self.inner.count(filter).await;
        let gate = self.count_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
        result
    }

    async fn list_all(&self) -> RegistryResult<Vec<Customer>> {
        self.track_call("list_all");
        self.inner.list_all().await
    }

    async fn create(&self, customer: &Customer, token: &CardToken) -> RegistryResult<()> {
        self.track_call("create");
        self.check_write()?;
        self.inner.create(customer, token).await
    }

    async fn update(&self, customer: &Customer) -> RegistryResult<()> {
        self.track_call("update");
        self.check_write()?;
        self.inner.update(customer).await
    }

    async fn delete(&self, id: &CustomerId) -> RegistryResult<()> {
        self.track_call("delete");
        self.check_write()?;
        self.inner.delete(id).await
    }

    async fn token_for(&self, customer_id: &CustomerId) -> RegistryResult<Option<CardToken>> {
        self.track_call("token_for");
        self.inner.token_for(customer_id).await
    }
}
