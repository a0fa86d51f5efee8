//! Data models for the customer registry.
//!
//! Customers are stored as flat documents (see [`flat`]) and exchanged with
//! callers as nested JSON.

pub mod customer;
pub mod flat;
pub mod query;

pub use customer::{
    CardToken, ContactInfo, Customer, CustomerDetails, CustomerDraft, CustomerStatus, DocType,
};
pub use flat::{flat_field, flatten, nest, FLAT_SEPARATOR};
pub use query::{
    CustomerFilter, CustomerPage, CustomerQuery, CustomerStats, FieldFilter, SortDirection,
    SortSpec, DEFAULT_SORT_FIELD, FILTER_ALL,
};
