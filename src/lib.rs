//! Customer Registry MCP Server - keyword-searchable customer records for an NGO
//! dashboard, served over the Model Context Protocol.
//!
//! Customers are identified by their CPF. Every record carries a derived
//! `keywords` set so that "search as you type" reduces to a single
//! array-membership query in the document store.
//!
//! # Architecture
//!
//! - **search**: text normalization, keyword generation and search terms
//! - **domain**: value objects (customer IDs, CPF, phone, email) and formatters
//! - **models**: customer records, flat storage layout, listing types
//! - **client**: Firestore REST client (sync `ureq`, async wrapper)
//! - **repositories**: Firestore and in-memory customer stores
//! - **services**: registry business rules
//! - **export**: CSV export
//! - **cache** / **metrics**: stats cache and counters
//! - **config** / **error**: environment configuration and error types
//! - **server**: MCP tool handlers

pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod search;
pub mod server;
pub mod services;

pub use cache::TimedCache;
pub use client::FirestoreClient;
pub use config::{Config, StoreBackend};
pub use error::{ConfigError, RegistryError, RegistryResult};
pub use metrics::{Metrics, MetricsSummary};
pub use models::{Customer, CustomerDraft, CustomerPage, CustomerQuery, CustomerStats};
pub use search::{generate_keywords, normalize, KeywordSet, SearchTerm};
pub use server::CustomerRegistryServer;
pub use services::{CustomerService, CustomerServiceImpl};
