use crate::domain::{Cpf, CustomerId};
use crate::error::RegistryResult;
use crate::models::{CardToken, Customer, CustomerFilter, SortSpec};
use async_trait::async_trait;

/// Storage for customer records and their card tokens.
///
/// Implementations follow Firestore semantics: sorting on a field leaves out
/// records that do not have that field, and `delete` of a missing record is
/// not an error.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Fetch a customer by ID.
    async fn get(&self, id: &CustomerId) -> RegistryResult<Option<Customer>>;

    /// Fetch the customer whose stored document digits equal `doc`.
    async fn find_by_doc(&self, doc: &Cpf) -> RegistryResult<Option<Customer>>;

    /// One page of customers matching `filter`, ordered by `sort`.
    async fn query(
        &self,
        filter: &CustomerFilter,
        sort: &SortSpec,
        offset: usize,
        limit: usize,
    ) -> RegistryResult<Vec<Customer>>;

    /// Number of customers matching `filter`.
    async fn count(&self, filter: &CustomerFilter) -> RegistryResult<usize>;

    /// Every customer, in no particular order.
    async fn list_all(&self) -> RegistryResult<Vec<Customer>>;

    /// Store a new customer and its card token in one atomic write.
    async fn create(&self, customer: &Customer, token: &CardToken) -> RegistryResult<()>;

    /// Replace a stored customer. Fails with `NotFound` if it does not exist.
    async fn update(&self, customer: &Customer) -> RegistryResult<()>;

    async fn delete(&self, id: &CustomerId) -> RegistryResult<()>;

    /// The card token issued to a customer, if any.
    async fn token_for(&self, customer_id: &CustomerId) -> RegistryResult<Option<CardToken>>;
}
