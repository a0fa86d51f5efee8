mod firestore_customer_repository;
mod in_memory_customer_repository;
mod traits;

pub use firestore_customer_repository::{
    FirestoreCustomerRepository, CUSTOMERS_COLLECTION, TOKENS_COLLECTION,
};
pub use in_memory_customer_repository::InMemoryCustomerRepository;
pub use traits::CustomerRepository;
