//! Customer model representing a registered person (customer or volunteer).

use super::flat::{flatten, nest};
use crate::domain::{Cpf, CustomerId};
use crate::error::{RegistryError, RegistryResult};
use crate::search::{generate_keywords, KeywordSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Whether a customer is currently active in the organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

/// Kind of identity document stored in `doc`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    #[default]
    Cpf,
}

/// Contact channels of a customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A customer record as stored in the `customers` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Document ID (also stored as a field)
    pub id: CustomerId,

    /// Full name
    pub name: String,

    #[serde(default)]
    pub status: CustomerStatus,

    /// CPF digits
    pub doc: Cpf,

    #[serde(default)]
    pub doc_type: DocType,

    #[serde(default)]
    pub contact: ContactInfo,

    /// Profile photo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Search tokens derived from `name` and `doc`
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl Customer {
    /// Create a new active customer with indexed keywords and no timestamps.
    pub fn new(id: CustomerId, name: impl Into<String>, doc: Cpf) -> Self {
        let mut customer = Self {
            id,
            name: name.into(),
            status: CustomerStatus::Active,
            doc,
            doc_type: DocType::Cpf,
            contact: ContactInfo::default(),
            image_url: None,
            keywords: Vec::new(),
            created_at: None,
            updated_at: None,
            deleted_at: None,
            is_deleted: None,
        };
        customer.reindex();
        customer
    }

    /// The keyword set for this customer's searchable fields.
    pub fn keyword_set(&self) -> KeywordSet {
        let mut keywords = generate_keywords(&self.name);
        keywords.extend(generate_keywords(self.doc.as_str()));
        keywords
    }

    /// Recompute `keywords` from the current name and document.
    pub fn reindex(&mut self) {
        self.keywords = self.keyword_set().into_iter().collect();
    }

    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }

    /// Serialize into the flat stored layout (`contact_phone`, ...).
    pub fn to_flat(&self) -> RegistryResult<Map<String, Value>> {
        let value = serde_json::to_value(self)?;
        Ok(flatten(&value))
    }

    /// Deserialize from the flat stored layout.
    pub fn from_flat(flat: &Map<String, Value>) -> RegistryResult<Self> {
        serde_json::from_value(nest(flat)).map_err(RegistryError::JsonError)
    }
}

/// Fields supplied by a caller when creating or updating a customer.
///
/// Everything is optional here; the service layer enforces which fields
/// are required for each operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: Option<String>,
    pub doc: Option<String>,
    pub status: Option<CustomerStatus>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

/// Card token issued to a customer at registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardToken {
    pub token: String,
    pub id: String,
    pub customer_id: CustomerId,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A customer together with its card token (empty if none was issued).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerDetails {
    #[serde(flatten)]
    pub customer: Customer,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Customer {
        let mut customer = Customer::new(
            CustomerId::new("c1").unwrap(),
            "Ana Paula",
            Cpf::new("12345678901").unwrap(),
        );
        customer.contact.phone = Some("11987654321".into());
        customer
    }

    #[test]
    fn test_new_customer_is_indexed() {
        let customer = sample();
        assert!(customer.keywords.contains(&"ana paula".to_string()));
        assert!(customer.keywords.contains(&"pau".to_string()));
        assert!(customer.keywords.contains(&"12345".to_string()));
        assert!(customer.keywords.contains(&"a".to_string()));
        assert!(customer.keywords.contains(&"1".to_string()));
        assert!(customer.is_active());
    }

    #[test]
    fn test_reindex_after_rename() {
        let mut customer = sample();
        customer.name = "Beatriz".into();
        customer.reindex();
        assert!(customer.keywords.contains(&"bea".to_string()));
        assert!(!customer.keywords.contains(&"pau".to_string()));
    }

    #[test]
    fn test_flat_layout() {
        let customer = sample();
        let flat = customer.to_flat().unwrap();

        assert_eq!(flat["contact_phone"], json!("11987654321"));
        assert_eq!(flat["docType"], json!("cpf"));
        assert_eq!(flat["status"], json!("active"));
        assert_eq!(flat["doc"], json!("12345678901"));

        let back = Customer::from_flat(&flat).unwrap();
        assert_eq!(back, customer);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Active".parse::<CustomerStatus>(), Ok(CustomerStatus::Active));
        assert_eq!(" inactive".parse::<CustomerStatus>(), Ok(CustomerStatus::Inactive));
        assert!("archived".parse::<CustomerStatus>().is_err());
    }

    #[test]
    fn test_details_serialize_flattened() {
        let details = CustomerDetails {
            customer: sample(),
            token: "c1xx-abc".into(),
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["id"], json!("c1"));
        assert_eq!(value["token"], json!("c1xx-abc"));
        assert_eq!(value["contact"]["phone"], json!("11987654321"));
    }
}
