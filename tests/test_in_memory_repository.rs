//! Tests for the in-memory customer store's Firestore-like query semantics.

use customer_registry_mcp::domain::{Cpf, CustomerId};
use customer_registry_mcp::models::{CardToken, CustomerFilter, SortSpec};
use customer_registry_mcp::repositories::{CustomerRepository, InMemoryCustomerRepository};
use customer_registry_mcp::{Customer, RegistryError};

fn customer(id: &str, name: &str, doc: &str) -> Customer {
    Customer::new(CustomerId::new(id).unwrap(), name, Cpf::new(doc).unwrap())
}

fn token(customer: &Customer, value: &str) -> CardToken {
    CardToken {
        token: value.to_string(),
        id: value.to_string(),
        customer_id: customer.id.clone(),
        created_at: "2024-05-02T10:00:00Z".parse().unwrap(),
        expires_at: None,
    }
}

fn ids(customers: &[Customer]) -> Vec<&str> {
    customers.iter().map(|c| c.id.as_str()).collect()
}

fn fixture() -> InMemoryCustomerRepository {
    let mut ana = customer("c1", "Ana Paula", "111");
    ana.contact.email = Some("ana@ong.org".into());
    let bruno = customer("c2", "Bruno", "222");
    let mut carla = customer("c3", "Carla", "333");
    carla.contact.email = Some("carla@ong.org".into());
    InMemoryCustomerRepository::with_customers(vec![carla, ana, bruno])
}

#[tokio::test]
async fn test_query_sorts_and_pages() {
    let repo = fixture();
    let sort = SortSpec::default();

    let page = repo.query(&CustomerFilter::default(), &sort, 0, 2).await.unwrap();
    assert_eq!(ids(&page), vec!["c1", "c2"]);

    let page = repo.query(&CustomerFilter::default(), &sort, 2, 2).await.unwrap();
    assert_eq!(ids(&page), vec!["c3"]);

    let page = repo.query(&CustomerFilter::default(), &sort, 5, 2).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_sort_excludes_records_missing_the_field() {
    let repo = fixture();
    let sort: SortSpec = "contact_email:desc".parse().unwrap();

    let page = repo.query(&CustomerFilter::default(), &sort, 0, 10).await.unwrap();
    assert_eq!(ids(&page), vec!["c3", "c1"]);

    // Counting ignores the sort field.
    assert_eq!(repo.count(&CustomerFilter::default()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_equal_sort_keys_fall_back_to_id() {
    let repo = InMemoryCustomerRepository::with_customers(vec![
        customer("b", "Ana", "111"),
        customer("a", "Ana", "222"),
    ]);
    let page = repo
        .query(&CustomerFilter::default(), &SortSpec::default(), 0, 10)
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["a", "b"]);
}

#[tokio::test]
async fn test_keyword_and_field_filters_combine() {
    let repo = fixture();

    let filter = CustomerFilter::from_params(Some("contact_email"), Some(""), Some("car")).unwrap();
    assert_eq!(repo.count(&filter).await.unwrap(), 1);

    let filter = CustomerFilter::from_params(Some("contact_email"), Some(""), Some("bru")).unwrap();
    assert_eq!(repo.count(&filter).await.unwrap(), 0);

    let filter = CustomerFilter::equals("status", "active");
    assert_eq!(repo.count(&filter).await.unwrap(), 3);
}

#[tokio::test]
async fn test_find_by_doc() {
    let repo = fixture();
    let found = repo.find_by_doc(&Cpf::new("222").unwrap()).await.unwrap();
    assert_eq!(found.map(|c| c.name), Some("Bruno".to_string()));
    assert!(repo.find_by_doc(&Cpf::new("999").unwrap()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_stores_customer_and_token() {
    let repo = InMemoryCustomerRepository::new();
    let ana = customer("c1", "Ana", "111");

    repo.create(&ana, &token(&ana, "c1-secret")).await.unwrap();

    assert_eq!(repo.get(&ana.id).await.unwrap(), Some(ana.clone()));
    let stored = repo.token_for(&ana.id).await.unwrap().unwrap();
    assert_eq!(stored.token, "c1-secret");

    let err = repo.create(&ana, &token(&ana, "other")).await.unwrap_err();
    assert!(matches!(err, RegistryError::Conflict(_)));

    let bruno = customer("c2", "Bruno", "222");
    let err = repo.create(&bruno, &token(&bruno, "c1-secret")).await.unwrap_err();
    assert!(matches!(err, RegistryError::Conflict(_)));
    assert!(repo.get(&bruno.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_and_delete() {
    let repo = fixture();
    let id = CustomerId::new("c2").unwrap();

    let mut bruno = repo.get(&id).await.unwrap().unwrap();
    bruno.name = "Bruna".into();
    bruno.reindex();
    repo.update(&bruno).await.unwrap();

    let filter = CustomerFilter::from_params(None, None, Some("bruna")).unwrap();
    assert_eq!(repo.count(&filter).await.unwrap(), 1);

    repo.delete(&id).await.unwrap();
    assert!(repo.get(&id).await.unwrap().is_none());
    assert_eq!(repo.list_all().await.unwrap().len(), 2);

    // Deleting again is a no-op; updating is not.
    repo.delete(&id).await.unwrap();
    assert!(matches!(
        repo.update(&bruno).await,
        Err(RegistryError::NotFound(_))
    ));
}
