//! Application service layer.
//!
//! Services hold the registry's business rules and sit between the MCP
//! handlers and the repositories.

mod customer_service;

pub use customer_service::{
    CustomerService, CustomerServiceImpl, TOKEN_BYTES, TOKEN_PREFIX_LEN,
};
