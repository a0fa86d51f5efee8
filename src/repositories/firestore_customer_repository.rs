use crate::client::{
    AsyncFirestoreClient, DocumentWrite, FieldOp, FirestoreDocument, StructuredQuery,
};
use crate::domain::{Cpf, CustomerId};
use crate::error::{RegistryError, RegistryResult};
use crate::models::{
    CardToken, Customer, CustomerFilter, FieldFilter, SortDirection, SortSpec,
};
use crate::repositories::traits::CustomerRepository;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const CUSTOMERS_COLLECTION: &str = "customers";
pub const TOKENS_COLLECTION: &str = "tokens";

/// Optional fields that an update may remove; always part of the update mask.
const CLEARABLE_FIELDS: &[&str] = &["contact_phone", "contact_email", "imageUrl"];

/// Customer repository backed by Cloud Firestore.
pub struct FirestoreCustomerRepository {
    client: Arc<dyn AsyncFirestoreClient>,
}

impl FirestoreCustomerRepository {
    pub fn new(client: Arc<dyn AsyncFirestoreClient>) -> Self {
        Self { client }
    }

    fn base_query(filter: &CustomerFilter) -> StructuredQuery {
        let mut query = StructuredQuery::collection(CUSTOMERS_COLLECTION);

        match &filter.field {
            Some(FieldFilter::Equals { field, value }) => {
                query = query.filter(field.as_str(), FieldOp::Equal, json!(value));
            }
            Some(FieldFilter::NonEmpty { field }) => {
                query = query.filter(field.as_str(), FieldOp::GreaterThan, json!(""));
            }
            None => {}
        }
        if let Some(term) = &filter.keyword {
            query = query.filter("keywords", FieldOp::ArrayContains, json!(term.as_str()));
        }

        query
    }

    fn decode(doc: FirestoreDocument) -> RegistryResult<Customer> {
        let mut fields = doc.fields;
        fields
            .entry("id")
            .or_insert_with(|| Value::String(doc.id.clone()));
        Customer::from_flat(&fields)
    }

    /// Decode a result set, skipping documents that are not valid customers.
    fn decode_all(docs: Vec<FirestoreDocument>) -> Vec<Customer> {
        docs.into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match Self::decode(doc) {
                    Ok(customer) => Some(customer),
                    Err(e) => {
                        tracing::warn!("Skipping malformed customer document {}: {}", id, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl CustomerRepository for FirestoreCustomerRepository {
    async fn get(&self, id: &CustomerId) -> RegistryResult<Option<Customer>> {
        self.client
            .get_document(CUSTOMERS_COLLECTION, id.as_str())
            .await?
            .map(Self::decode)
            .transpose()
    }

    async fn find_by_doc(&self, doc: &Cpf) -> RegistryResult<Option<Customer>> {
        let query = StructuredQuery::collection(CUSTOMERS_COLLECTION)
            .filter("doc", FieldOp::Equal, json!(doc.as_str()))
            .limit(1);
        let docs = self.client.run_query(query).await?;
        Ok(Self::decode_all(docs).into_iter().next())
    }

    async fn query(
        &self,
        filter: &CustomerFilter,
        sort: &SortSpec,
        offset: usize,
        limit: usize,
    ) -> RegistryResult<Vec<Customer>> {
        let query = Self::base_query(filter)
            .order_by(
                sort.field.as_str(),
                sort.direction == SortDirection::Descending,
            )
            .offset(offset)
            .limit(limit);
        let docs = self.client.run_query(query).await?;
        Ok(Self::decode_all(docs))
    }

    async fn count(&self, filter: &CustomerFilter) -> RegistryResult<usize> {
        self.client.run_count(Self::base_query(filter)).await
    }

    async fn list_all(&self) -> RegistryResult<Vec<Customer>> {
        let docs = self
            .client
            .run_query(StructuredQuery::collection(CUSTOMERS_COLLECTION))
            .await?;
        Ok(Self::decode_all(docs))
    }

    async fn create(&self, customer: &Customer, token: &CardToken) -> RegistryResult<()> {
        let token_fields = match serde_json::to_value(token)? {
            Value::Object(map) => map,
            _ => return Err(RegistryError::Other("Token did not serialize to an object".into())),
        };

        let writes = vec![
            DocumentWrite::create(CUSTOMERS_COLLECTION, customer.id.as_str(), customer.to_flat()?),
            DocumentWrite::create(TOKENS_COLLECTION, token.token.as_str(), token_fields),
        ];
        self.client.commit(writes).await
    }

    async fn update(&self, customer: &Customer) -> RegistryResult<()> {
        let fields = customer.to_flat()?;
        let mut mask: Vec<String> = fields.keys().cloned().collect();
        for field in CLEARABLE_FIELDS {
            if !fields.contains_key(*field) {
                mask.push((*field).to_string());
            }
        }

        self.client
            .patch_document(CUSTOMERS_COLLECTION, customer.id.as_str(), fields, mask)
            .await
    }

    async fn delete(&self, id: &CustomerId) -> RegistryResult<()> {
        self.client
            .delete_document(CUSTOMERS_COLLECTION, id.as_str())
            .await
    }

    async fn token_for(&self, customer_id: &CustomerId) -> RegistryResult<Option<CardToken>> {
        let query = StructuredQuery::collection(TOKENS_COLLECTION)
            .filter("customerId", FieldOp::Equal, json!(customer_id.as_str()))
            .limit(1);

        match self.client.run_query(query).await?.into_iter().next() {
            Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc.fields))?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchTerm;

    #[test]
    fn test_base_query_combines_filters() {
        let filter = CustomerFilter {
            field: Some(FieldFilter::NonEmpty {
                field: "contact_email".into(),
            }),
            keyword: SearchTerm::parse("Pau"),
        };
        let json = FirestoreCustomerRepository::base_query(&filter).to_json();
        let filters = &json["where"]["compositeFilter"]["filters"];

        assert_eq!(filters[0]["fieldFilter"]["field"]["fieldPath"], json!("contact_email"));
        assert_eq!(filters[0]["fieldFilter"]["value"], json!({ "stringValue": "" }));
        assert_eq!(filters[1]["fieldFilter"]["value"], json!({ "stringValue": "pau" }));
    }

    #[test]
    fn test_decode_fills_missing_id() {
        let mut fields = serde_json::Map::new();
        fields.insert("name".into(), json!("Ana"));
        fields.insert("doc".into(), json!("12345678909"));

        let customer = FirestoreCustomerRepository::decode(FirestoreDocument {
            id: "abc".into(),
            fields,
        })
        .unwrap();
        assert_eq!(customer.id.as_str(), "abc");
    }
}
