//! Domain validation errors.

use std::fmt;

/// Errors that can occur during domain value object validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided ID is empty.
    EmptyId,

    /// A required field was missing or blank.
    MissingField(&'static str),

    /// The provided CPF has the wrong length or check digits.
    InvalidCpf(String),

    /// The provided email address is invalid.
    InvalidEmail(String),

    /// The provided phone number is invalid.
    InvalidPhone(String),

    /// The named field cannot be filtered or sorted on.
    InvalidField(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "ID cannot be empty"),
            Self::MissingField(field) => write!(f, "{} is required", field),
            Self::InvalidCpf(cpf) => write!(f, "Invalid CPF: {}", cpf),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
            Self::InvalidPhone(phone) => write!(f, "Invalid phone number: {}", phone),
            Self::InvalidField(field) => write!(f, "Invalid field name: {}", field),
        }
    }
}

impl std::error::Error for ValidationError {}
