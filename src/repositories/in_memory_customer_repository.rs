use crate::domain::{Cpf, CustomerId};
use crate::error::{RegistryError, RegistryResult};
use crate::models::{
    flat_field, CardToken, Customer, CustomerFilter, FieldFilter, SortSpec,
};
use crate::repositories::traits::CustomerRepository;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Store {
    customers: HashMap<String, Customer>,
    /// Keyed by token string
    tokens: HashMap<String, CardToken>,
}

/// Process-local customer store with the same query semantics as Firestore.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    store: RwLock<Store>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, for fixtures.
    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let repo = Self::new();
        if let Ok(mut store) = repo.store.write() {
            for customer in customers {
                store
                    .customers
                    .insert(customer.id.as_str().to_string(), customer);
            }
        }
        repo
    }

    fn read(&self) -> RegistryResult<std::sync::RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|_| RegistryError::Other("In-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> RegistryResult<std::sync::RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|_| RegistryError::Other("In-memory store lock poisoned".to_string()))
    }

    /// Flattened copies of every customer matching `filter`.
    fn matching(&self, filter: &CustomerFilter) -> RegistryResult<Vec<(Customer, Map<String, Value>)>> {
        let store = self.read()?;
        let mut out = Vec::new();
        for customer in store.customers.values() {
            if let Some(term) = &filter.keyword {
                if !term.matches_slice(&customer.keywords) {
                    continue;
                }
            }
            let flat = customer.to_flat()?;
            if let Some(field_filter) = &filter.field {
                if !field_matches(field_filter, &flat) {
                    continue;
                }
            }
            out.push((customer.clone(), flat));
        }
        Ok(out)
    }
}

fn field_matches(filter: &FieldFilter, flat: &Map<String, Value>) -> bool {
    match filter {
        FieldFilter::Equals { field, value } => {
            matches!(flat_field(flat, field), Some(Value::String(s)) if s == value)
        }
        FieldFilter::NonEmpty { field } => {
            matches!(flat_field(flat, field), Some(Value::String(s)) if !s.is_empty())
        }
    }
}

/// Rank of a JSON type in Firestore's cross-type ordering.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn get(&self, id: &CustomerId) -> RegistryResult<Option<Customer>> {
        Ok(self.read()?.customers.get(id.as_str()).cloned())
    }

    async fn find_by_doc(&self, doc: &Cpf) -> RegistryResult<Option<Customer>> {
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.doc == *doc)
            .cloned())
    }

    async fn query(
        &self,
        filter: &CustomerFilter,
        sort: &SortSpec,
        offset: usize,
        limit: usize,
    ) -> RegistryResult<Vec<Customer>> {
        // Records without the sort field are left out, as Firestore does.
        let mut rows: Vec<(Customer, Value)> = self
            .matching(filter)?
            .into_iter()
            .filter_map(|(customer, flat)| {
                flat_field(&flat, &sort.field)
                    .cloned()
                    .map(|key| (customer, key))
            })
            .collect();

        rows.sort_by(|(a, ka), (b, kb)| {
            sort.direction
                .apply(compare_values(ka, kb))
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(customer, _)| customer)
            .collect())
    }

    async fn count(&self, filter: &CustomerFilter) -> RegistryResult<usize> {
        Ok(self.matching(filter)?.len())
    }

    async fn list_all(&self) -> RegistryResult<Vec<Customer>> {
        Ok(self.read()?.customers.values().cloned().collect())
    }

    async fn create(&self, customer: &Customer, token: &CardToken) -> RegistryResult<()> {
        let mut store = self.write()?;
        if store.customers.contains_key(customer.id.as_str()) {
            return Err(RegistryError::Conflict(format!(
                "Customer {} already exists",
                customer.id
            )));
        }
        if store.tokens.contains_key(&token.token) {
            return Err(RegistryError::Conflict("Token already exists".to_string()));
        }

        store
            .customers
            .insert(customer.id.as_str().to_string(), customer.clone());
        store.tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn update(&self, customer: &Customer) -> RegistryResult<()> {
        let mut store = self.write()?;
        match store.customers.get_mut(customer.id.as_str()) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(())
            }
            None => Err(RegistryError::NotFound(format!(
                "Customer {}",
                customer.id
            ))),
        }
    }

    async fn delete(&self, id: &CustomerId) -> RegistryResult<()> {
        self.write()?.customers.remove(id.as_str());
        Ok(())
    }

    async fn token_for(&self, customer_id: &CustomerId) -> RegistryResult<Option<CardToken>> {
        Ok(self
            .read()?
            .tokens
            .values()
            .find(|t| t.customer_id == *customer_id)
            .cloned())
    }
}
