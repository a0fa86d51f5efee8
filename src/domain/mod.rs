//! Domain value objects and types.
//!
//! Type-safe wrappers for customer IDs, CPF document numbers, phone numbers
//! and email addresses, plus the display formatters the dashboard uses.
//! Value objects validate or sanitize at construction time.

pub mod cpf;
pub mod customer_id;
pub mod email;
pub mod errors;
pub mod phone;

pub use cpf::{format_cpf, Cpf};
pub use customer_id::CustomerId;
pub use email::EmailAddress;
pub use errors::ValidationError;
pub use phone::{format_phone, PhoneNumber};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9]+").expect("Failed to compile non-digit regex"));

/// Strip everything but ASCII digits.
pub fn digits_only(input: &str) -> String {
    NON_DIGIT.replace_all(input, "").into_owned()
}

/// Render a timestamp as `dd/mm/yyyy`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}
